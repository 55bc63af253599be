// src/error.rs
use std::io;
use std::path::PathBuf;

/// Everything that can stop a configuration from being resolved.
///
/// The `Option`-returning entry points swallow these after logging them; the
/// `try_*` variants hand them back so callers can tell the outcomes apart.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("context not found: {0}")]
    ContextNotFound(String),

    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("invalid server URL {url:?}: {source}")]
    InvalidServerUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no usable authentication for user {0}")]
    NoAuthenticationAvailable(String),

    #[error("failed to load certificate material: {0}")]
    CertificateLoad(String),

    #[error("environment variable {0} is not set")]
    EnvironmentVariableMissing(&'static str),

    #[error("unable to read {path}: {source}")]
    RequiredFileMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("exec credential plugin failed: {0}")]
    ExecFailure(String),

    #[error("unable to decode exec credential: {0}")]
    CredentialDecode(String),

    #[error("unable to load kubeconfig {path}: {message}")]
    DocumentLoad { path: PathBuf, message: String },
}

impl From<openssl::error::ErrorStack> for ResolveError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        ResolveError::CertificateLoad(error.to_string())
    }
}

impl From<base64::DecodeError> for ResolveError {
    fn from(error: base64::DecodeError) -> Self {
        ResolveError::CertificateLoad(format!("invalid base64 data: {}", error))
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
