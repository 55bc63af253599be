// src/auth/authenticate.rs
use super::exec::ExecCredentialProvider;
use crate::cert::non_empty;
use crate::cert::pem::{client_identity, decode_data};
use crate::config::AuthInfo;
use crate::error::{ResolveError, Result};
use crate::types::Authentication;
use crate::utils::{Environment, Logger};
use chrono::Utc;
use std::io;
use std::path::Path;

/// The credential schemes a user record can satisfy, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Token,
    TokenFile,
    ClientCertificateFile,
    ClientCertificateData,
    Exec,
}

impl AuthScheme {
    pub const LADDER: [AuthScheme; 6] = [
        AuthScheme::Basic,
        AuthScheme::Token,
        AuthScheme::TokenFile,
        AuthScheme::ClientCertificateFile,
        AuthScheme::ClientCertificateData,
        AuthScheme::Exec,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AuthScheme::Basic => "basic",
            AuthScheme::Token => "token",
            AuthScheme::TokenFile => "tokenFile",
            AuthScheme::ClientCertificateFile => "client-certificate",
            AuthScheme::ClientCertificateData => "client-certificate-data",
            AuthScheme::Exec => "exec",
        }
    }
}

pub struct AuthenticationResolver<'a> {
    env: &'a dyn Environment,
}

impl<'a> AuthenticationResolver<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self { env }
    }

    /// Walks the ladder and returns the first scheme that produces a
    /// credential. Schemes that apply but fail are logged and skipped.
    pub fn authenticate(&self, user: &AuthInfo, logger: &mut dyn Logger) -> Option<Authentication> {
        self.authenticate_with_scheme(user, logger)
            .map(|(_, authentication)| authentication)
    }

    pub fn authenticate_with_scheme(
        &self,
        user: &AuthInfo,
        logger: &mut dyn Logger,
    ) -> Option<(AuthScheme, Authentication)> {
        for scheme in AuthScheme::LADDER {
            match self.attempt(scheme, user, logger) {
                None => continue,
                Some(Ok(authentication)) => {
                    logger.debug_log(&format!("Authenticating with {}", scheme.name()));
                    return Some((scheme, authentication));
                }
                Some(Err(e)) => {
                    logger.warn(&format!("Skipping {} credentials: {}", scheme.name(), e));
                }
            }
        }
        None
    }

    /// `None` when the record does not configure `scheme` at all.
    fn attempt(
        &self,
        scheme: AuthScheme,
        user: &AuthInfo,
        logger: &mut dyn Logger,
    ) -> Option<Result<Authentication>> {
        match scheme {
            AuthScheme::Basic => {
                let username = non_empty(&user.username)?;
                let password = user.password.as_deref()?;
                Some(Ok(Authentication::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                }))
            }
            AuthScheme::Token => {
                let token = non_empty(&user.token)?;
                Some(Ok(Authentication::BearerToken(token.to_string())))
            }
            AuthScheme::TokenFile => {
                let path = non_empty(&user.token_file)?;
                Some(self.token_from_file(Path::new(path)))
            }
            AuthScheme::ClientCertificateFile => {
                let cert = non_empty(&user.client_certificate)?;
                let key = non_empty(&user.client_key)?;
                Some(self.identity_from_files(Path::new(cert), Path::new(key)))
            }
            AuthScheme::ClientCertificateData => {
                let cert = non_empty(&user.client_certificate_data)?;
                let key = non_empty(&user.client_key_data)?;
                Some(decode_data(cert).and_then(|cert| {
                    let key = decode_data(key)?;
                    client_identity(&cert, &key)
                }))
            }
            AuthScheme::Exec => {
                let exec = user.exec.as_ref().filter(|e| !e.command.is_empty())?;
                let provider = ExecCredentialProvider::new(self.env);
                Some(provider.fetch(exec).and_then(|credential| {
                    if credential.is_expired(Utc::now()) {
                        logger.warn(&format!(
                            "Exec credential from {} is already expired",
                            exec.command
                        ));
                    }
                    Ok(Authentication::BearerToken(credential.token()?.to_string()))
                }))
            }
        }
    }

    fn token_from_file(&self, path: &Path) -> Result<Authentication> {
        let token = self
            .env
            .read_to_string(path)
            .map_err(|source| ResolveError::RequiredFileMissing {
                path: path.to_path_buf(),
                source,
            })?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ResolveError::RequiredFileMissing {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidData, "token file is empty"),
            });
        }
        Ok(Authentication::BearerToken(token.to_string()))
    }

    fn identity_from_files(&self, cert: &Path, key: &Path) -> Result<Authentication> {
        let read = |path: &Path| {
            self.env
                .read_file(path)
                .map_err(|source| ResolveError::RequiredFileMissing {
                    path: path.to_path_buf(),
                    source,
                })
        };
        client_identity(&read(cert)?, &read(key)?)
    }
}
