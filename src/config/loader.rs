// config/loader.rs
use super::KubeConfig;
use crate::error::{ResolveError, Result};
use crate::utils::{Environment, Logger};
use std::io;
use std::path::{Path, PathBuf};

pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

impl KubeConfig {
    /// Reads and parses a single kubeconfig, anchoring relative file
    /// references at the file's directory.
    pub fn load(path: &Path, env: &dyn Environment) -> Result<Self> {
        let content = env.read_to_string(path).map_err(|e| ResolveError::DocumentLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut config = KubeConfig::from_yaml(&content).map_err(|e| ResolveError::DocumentLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base, env);
        Ok(config)
    }

    /// Loads every file `KUBECONFIG` names (or the default
    /// `~/.kube/config`) and merges them in order. Files that do not exist
    /// are skipped; `Ok(None)` means none were found.
    pub fn load_default(env: &dyn Environment, logger: &mut dyn Logger) -> Result<Option<Self>> {
        let paths = kubeconfig_paths(env);
        let mut merged: Option<KubeConfig> = None;

        for path in paths {
            match KubeConfig::load(&path, env) {
                Ok(config) => {
                    logger.debug_log(&format!("Loaded kubeconfig {}", path.display()));
                    match merged.as_mut() {
                        Some(existing) => existing.merge(config),
                        None => merged = Some(config),
                    }
                }
                Err(ResolveError::DocumentLoad { .. }) if !exists(&path, env) => {
                    logger.debug_log(&format!("Skipping missing kubeconfig {}", path.display()));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(merged)
    }

    pub fn resolve_paths(&mut self, base: &Path, env: &dyn Environment) {
        for named in &mut self.clusters {
            resolve_in_place(&mut named.cluster.certificate_authority, base, env);
        }
        for named in &mut self.users {
            let user = &mut named.user;
            resolve_in_place(&mut user.token_file, base, env);
            resolve_in_place(&mut user.client_certificate, base, env);
            resolve_in_place(&mut user.client_key, base, env);
            if let Some(exec) = user.exec.as_mut() {
                // Bare names are looked up on PATH at exec time.
                if exec.command.contains(std::path::MAIN_SEPARATOR) || exec.command.contains('/') {
                    exec.command = resolve_path(&exec.command, base, env);
                }
            }
        }
    }
}

/// Every candidate kubeconfig path, in priority order.
pub fn kubeconfig_paths(env: &dyn Environment) -> Vec<PathBuf> {
    if let Some(value) = env.var(KUBECONFIG_ENV).filter(|v| !v.trim().is_empty()) {
        return std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
    }

    env.home_dir()
        .map(|home| vec![home.join(".kube").join("config")])
        .unwrap_or_default()
}

fn exists(path: &Path, env: &dyn Environment) -> bool {
    !matches!(env.read_file(path), Err(e) if e.kind() == io::ErrorKind::NotFound)
}

fn resolve_in_place(field: &mut Option<String>, base: &Path, env: &dyn Environment) {
    if let Some(value) = field.as_mut() {
        if !value.is_empty() {
            *value = resolve_path(value, base, env);
        }
    }
}

fn resolve_path(value: &str, base: &Path, env: &dyn Environment) -> String {
    let home = || env.home_dir().map(|home| home.to_string_lossy().into_owned());
    let expanded = shellexpand::tilde_with_context(value, home).into_owned();
    let path = Path::new(&expanded);
    if path.is_absolute() {
        expanded
    } else {
        base.join(path).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{MemoryLogger, StaticEnvironment};

    const DOCUMENT: &str = r#"
current-context: local
clusters:
- name: local
  cluster:
    server: https://127.0.0.1:6443
    certificate-authority: pki/ca.crt
users:
- name: local
  user:
    client-certificate: /abs/client.crt
    client-key: client.key
    exec:
      command: ./bin/token-helper
contexts:
- name: local
  context:
    cluster: local
    user: local
"#;

    #[test]
    fn test_load_resolves_relative_paths() {
        let env = StaticEnvironment::new().file("/home/dev/.kube/config", DOCUMENT);
        let config = KubeConfig::load(Path::new("/home/dev/.kube/config"), &env).unwrap();

        let cluster = &config.cluster("local").unwrap().cluster;
        assert_eq!(
            cluster.certificate_authority.as_deref(),
            Some("/home/dev/.kube/pki/ca.crt")
        );
        let user = &config.user("local").unwrap().user;
        assert_eq!(user.client_certificate.as_deref(), Some("/abs/client.crt"));
        assert_eq!(user.client_key.as_deref(), Some("/home/dev/.kube/client.key"));
        assert_eq!(
            user.exec.as_ref().unwrap().command,
            "/home/dev/.kube/./bin/token-helper"
        );
    }

    #[test]
    fn test_bare_exec_command_is_left_for_path_lookup() {
        let mut config = KubeConfig::from_yaml(
            "users:\n- name: u\n  user:\n    exec:\n      command: gke-gcloud-auth-plugin\n",
        )
        .unwrap();
        config.resolve_paths(Path::new("/etc/kube"), &StaticEnvironment::new());
        assert_eq!(
            config.user("u").unwrap().user.exec.as_ref().unwrap().command,
            "gke-gcloud-auth-plugin"
        );
    }

    #[test]
    fn test_tilde_expands_against_environment_home() {
        let mut config = KubeConfig::from_yaml(
            "users:\n- name: u\n  user:\n    tokenFile: ~/tokens/dev\n    client-key: ~/dev.key\n",
        )
        .unwrap();
        let env = StaticEnvironment::new().env("HOME", "/home/dev");
        config.resolve_paths(Path::new("/etc/kube"), &env);

        let user = &config.user("u").unwrap().user;
        assert_eq!(user.token_file.as_deref(), Some("/home/dev/tokens/dev"));
        assert_eq!(user.client_key.as_deref(), Some("/home/dev/dev.key"));

        // Without a home the path stays literal and is anchored like any other.
        let mut config = KubeConfig::from_yaml(
            "users:\n- name: u\n  user:\n    tokenFile: ~/tokens/dev\n",
        )
        .unwrap();
        config.resolve_paths(Path::new("/etc/kube"), &StaticEnvironment::new());
        assert_eq!(
            config.user("u").unwrap().user.token_file.as_deref(),
            Some("/etc/kube/~/tokens/dev")
        );
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let env = StaticEnvironment::new().file("/cfg", "clusters: [unterminated");
        let err = KubeConfig::load(Path::new("/cfg"), &env).unwrap_err();
        assert!(matches!(err, ResolveError::DocumentLoad { .. }));
    }

    #[test]
    fn test_kubeconfig_paths_from_env() {
        let env = StaticEnvironment::new()
            .env(KUBECONFIG_ENV, "/a/config:/b/config")
            .env("HOME", "/home/dev");
        assert_eq!(
            kubeconfig_paths(&env),
            vec![PathBuf::from("/a/config"), PathBuf::from("/b/config")]
        );

        let env = StaticEnvironment::new().env("HOME", "/home/dev");
        assert_eq!(
            kubeconfig_paths(&env),
            vec![PathBuf::from("/home/dev/.kube/config")]
        );
    }

    #[test]
    fn test_load_default_merges_and_skips_missing() {
        let env = StaticEnvironment::new()
            .env(KUBECONFIG_ENV, "/missing:/a:/b")
            .file("/a", "clusters:\n- name: one\n  cluster:\n    server: https://a\n")
            .file(
                "/b",
                "current-context: ctx\nclusters:\n- name: one\n  cluster:\n    server: https://b\n",
            );
        let mut logger = MemoryLogger::new();

        let config = KubeConfig::load_default(&env, &mut logger).unwrap().unwrap();
        assert_eq!(config.cluster("one").unwrap().cluster.server, "https://a");
        assert_eq!(config.current_context.as_deref(), Some("ctx"));
        assert!(logger.contains("Skipping missing kubeconfig /missing"));
    }

    #[test]
    fn test_load_default_with_nothing_on_disk() {
        let env = StaticEnvironment::new().env("HOME", "/nowhere");
        let mut logger = MemoryLogger::new();
        assert!(KubeConfig::load_default(&env, &mut logger).unwrap().is_none());
    }
}
