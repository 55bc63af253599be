// src/kubeconfig/in_cluster.rs
//! Configuration for a process running inside a pod, built from the
//! service account the kubelet mounts into every container.

use crate::cert::TrustRoots;
use crate::error::{ResolveError, Result};
use crate::types::{Authentication, ClientConfig, RedirectPolicy, Timeout};
use crate::utils::{Environment, Logger};
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

pub const SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
pub const SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";
pub const SERVICE_ACCOUNT_ROOT: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

pub struct ServiceAccountResolver<'a> {
    env: &'a dyn Environment,
    mount_root: PathBuf,
}

impl<'a> ServiceAccountResolver<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self::with_mount_root(env, SERVICE_ACCOUNT_ROOT)
    }

    pub fn with_mount_root(env: &'a dyn Environment, mount_root: impl Into<PathBuf>) -> Self {
        Self {
            env,
            mount_root: mount_root.into(),
        }
    }

    pub fn namespace_path(&self) -> PathBuf {
        self.mount_root.join("namespace")
    }

    pub fn token_path(&self) -> PathBuf {
        self.mount_root.join("token")
    }

    pub fn ca_path(&self) -> PathBuf {
        self.mount_root.join("ca.crt")
    }

    /// `None` outside a cluster, or when the mounted token is unreadable.
    pub fn resolve(
        &self,
        timeout: Timeout,
        redirect_policy: RedirectPolicy,
        logger: &mut dyn Logger,
    ) -> Option<ClientConfig> {
        match self.try_resolve(timeout, redirect_policy, logger) {
            Ok(config) => Some(config),
            Err(e @ ResolveError::EnvironmentVariableMissing(_)) => {
                logger.debug_log(&format!("Not running in a cluster: {}", e));
                None
            }
            Err(e) => {
                logger.warn(&format!("No in-cluster configuration: {}", e));
                None
            }
        }
    }

    pub fn try_resolve(
        &self,
        timeout: Timeout,
        redirect_policy: RedirectPolicy,
        logger: &mut dyn Logger,
    ) -> Result<ClientConfig> {
        let host = self.required_var(SERVICE_HOST_ENV)?;
        let port = self.required_var(SERVICE_PORT_ENV)?;

        let server = format!("https://{}", join_host_port(&host, &port));
        let server_url = Url::parse(&server).map_err(|source| ResolveError::InvalidServerUrl {
            url: server.clone(),
            source,
        })?;

        let namespace = match self.env.read_to_string(&self.namespace_path()) {
            Ok(namespace) => Some(namespace.trim().to_string()),
            Err(e) => {
                logger.debug_log(&format!(
                    "No namespace at {}: {}",
                    self.namespace_path().display(),
                    e
                ));
                None
            }
        };

        let token_path = self.token_path();
        let token = self
            .env
            .read_to_string(&token_path)
            .map_err(|source| ResolveError::RequiredFileMissing {
                path: token_path.clone(),
                source,
            })?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ResolveError::RequiredFileMissing {
                path: token_path,
                source: io::Error::new(io::ErrorKind::InvalidData, "token file is empty"),
            });
        }

        let trust_roots = self.trust_roots(&self.ca_path(), logger);
        let insecure_skip_verify = trust_roots.is_none();

        Ok(ClientConfig::new(
            server_url,
            namespace,
            Authentication::BearerToken(token.to_string()),
            trust_roots,
            insecure_skip_verify,
            timeout,
            redirect_policy,
            None,
        ))
    }

    fn required_var(&self, key: &'static str) -> Result<String> {
        self.env
            .var(key)
            .filter(|value| !value.is_empty())
            .ok_or(ResolveError::EnvironmentVariableMissing(key))
    }

    fn trust_roots(&self, path: &Path, logger: &mut dyn Logger) -> Option<TrustRoots> {
        let loaded = self
            .env
            .read_file(path)
            .map_err(|source| ResolveError::RequiredFileMissing {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|pem| TrustRoots::from_pem(&pem));

        match loaded {
            Ok(roots) => Some(roots),
            Err(e) => {
                logger.warn(&format!(
                    "Service account CA unavailable, TLS verification disabled: {}",
                    e
                ));
                None
            }
        }
    }
}

/// Go's `net.JoinHostPort`: IPv6 literals get brackets.
fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        return format!("[{}]:{}", host, port);
    }
    format!("{}:{}", host, port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::fixtures;
    use crate::utils::{MemoryLogger, StaticEnvironment};

    const ROOT: &str = "/sa";

    fn in_cluster(host: &str, port: &str) -> StaticEnvironment {
        StaticEnvironment::new()
            .env(SERVICE_HOST_ENV, host)
            .env(SERVICE_PORT_ENV, port)
    }

    fn resolve(env: &StaticEnvironment) -> (Option<ClientConfig>, MemoryLogger) {
        let mut logger = MemoryLogger::new();
        let config = ServiceAccountResolver::with_mount_root(env, ROOT).resolve(
            Timeout::default(),
            RedirectPolicy::default(),
            &mut logger,
        );
        (config, logger)
    }

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("127.0.0.1", "443"), "127.0.0.1:443");
        assert_eq!(join_host_port("::", "1234"), "[::]:1234");
        assert_eq!(
            join_host_port("2001:db8::8a2e:370:7334", "1234"),
            "[2001:db8::8a2e:370:7334]:1234"
        );
        assert_eq!(join_host_port("example.com", "1234"), "example.com:1234");
    }

    #[test]
    fn test_token_without_ca() {
        let env = in_cluster("10.0.0.1", "443").file("/sa/token", "xyz");
        let (config, logger) = resolve(&env);
        let config = config.unwrap();

        // The url crate drops the scheme's default port when serialising.
        assert_eq!(config.server_url().scheme(), "https");
        assert_eq!(config.server_url().host_str(), Some("10.0.0.1"));
        assert_eq!(config.server_url().port_or_known_default(), Some(443));
        assert_eq!(config.authentication(), &Authentication::BearerToken("xyz".to_string()));
        assert!(config.insecure_skip_verify());
        assert!(config.trust_roots().is_none());
        assert_eq!(config.namespace(), "default");
        assert_eq!(logger.warnings().len(), 1);
    }

    #[test]
    fn test_full_mount() {
        let (ca, _) = fixtures::self_signed("kube-ca");
        let env = in_cluster("10.96.0.1", "6443")
            .file("/sa/token", "eyJhbGciOi\n")
            .file("/sa/namespace", "monitoring\n")
            .file("/sa/ca.crt", ca);
        let (config, logger) = resolve(&env);
        let config = config.unwrap();

        assert_eq!(config.server_url().as_str(), "https://10.96.0.1:6443/");
        assert_eq!(config.namespace(), "monitoring");
        assert_eq!(
            config.authentication(),
            &Authentication::BearerToken("eyJhbGciOi".to_string())
        );
        assert_eq!(config.trust_roots().map(|r| r.len()), Some(1));
        assert!(!config.insecure_skip_verify());
        assert!(logger.warnings().is_empty());
    }

    #[test]
    fn test_ipv6_host() {
        let env = in_cluster("::1", "6443").file("/sa/token", "xyz");
        let (config, _) = resolve(&env);
        assert_eq!(config.unwrap().server_url().as_str(), "https://[::1]:6443/");
    }

    #[test]
    fn test_missing_environment() {
        let env = StaticEnvironment::new()
            .env(SERVICE_HOST_ENV, "10.0.0.1")
            .file("/sa/token", "xyz");
        let (config, logger) = resolve(&env);
        assert!(config.is_none());
        assert!(logger.warnings().is_empty());

        let env = StaticEnvironment::new()
            .env(SERVICE_PORT_ENV, "443")
            .file("/sa/token", "xyz");
        assert!(resolve(&env).0.is_none());
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let (ca, _) = fixtures::self_signed("kube-ca");
        let env = in_cluster("10.0.0.1", "443").file("/sa/ca.crt", ca);
        let err = ServiceAccountResolver::with_mount_root(&env, ROOT)
            .try_resolve(
                Timeout::default(),
                RedirectPolicy::default(),
                &mut MemoryLogger::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::RequiredFileMissing { path, .. } if path == Path::new("/sa/token")));
    }

    #[test]
    fn test_empty_token_is_fatal() {
        let env = in_cluster("10.0.0.1", "443").file("/sa/token", "\n");
        let err = ServiceAccountResolver::with_mount_root(&env, ROOT)
            .try_resolve(
                Timeout::default(),
                RedirectPolicy::default(),
                &mut MemoryLogger::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::RequiredFileMissing { path, .. } if path == Path::new("/sa/token")));

        let (config, logger) = resolve(&env);
        assert!(config.is_none());
        assert!(logger.warnings()[0].contains("token file is empty"));
    }

    #[test]
    fn test_unparseable_ca_disables_verification() {
        let env = in_cluster("10.0.0.1", "443")
            .file("/sa/token", "xyz")
            .file("/sa/ca.crt", "garbage");
        let (config, logger) = resolve(&env);
        let config = config.unwrap();
        assert!(config.trust_roots().is_none());
        assert!(config.insecure_skip_verify());
        assert!(logger.warnings()[0].contains("TLS verification disabled"));
    }

    #[test]
    fn test_default_mount_paths() {
        let env = StaticEnvironment::new();
        let resolver = ServiceAccountResolver::new(&env);
        assert_eq!(
            resolver.token_path(),
            Path::new("/var/run/secrets/kubernetes.io/serviceaccount/token")
        );
        assert_eq!(
            resolver.ca_path(),
            Path::new("/var/run/secrets/kubernetes.io/serviceaccount/ca.crt")
        );
    }
}
