// src/auth/exec.rs
use crate::config::{ExecConfig, ExecEnvVar};
use crate::error::{ResolveError, Result};
use crate::utils::Environment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const EXEC_INFO_ENV: &str = "KUBERNETES_EXEC_INFO";
const DEFAULT_API_VERSION: &str = "client.authentication.k8s.io/v1beta1";

/// The payload an exec credential plugin prints on stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCredential {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub spec: ExecCredentialSpec,
    #[serde(default)]
    pub status: ExecCredentialStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCredentialSpec {
    #[serde(default)]
    pub cluster: Option<serde_json::Value>,
    #[serde(default)]
    pub interactive: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCredentialStatus {
    #[serde(default, deserialize_with = "rfc3339")]
    pub expiration_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub client_certificate_data: Option<String>,
    #[serde(default)]
    pub client_key_data: Option<String>,
}

impl ExecCredential {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ResolveError::CredentialDecode(e.to_string()))
    }

    pub fn token(&self) -> Result<&str> {
        self.status
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ResolveError::CredentialDecode("status.token is missing".to_string()))
    }

    /// The expiry is informational only; nothing refreshes the token.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status
            .expiration_timestamp
            .map_or(false, |expires| expires <= now)
    }
}

fn rfc3339<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| {
        DateTime::parse_from_rfc3339(&value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| serde::de::Error::custom(format!("invalid expirationTimestamp {:?}: {}", value, e)))
    })
    .transpose()
}

/// Runs exec credential plugins.
pub struct ExecCredentialProvider<'a> {
    env: &'a dyn Environment,
}

impl<'a> ExecCredentialProvider<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self { env }
    }

    pub fn fetch_token(&self, command: &str, args: &[String]) -> Result<String> {
        let exec = ExecConfig {
            command: command.to_string(),
            args: args.to_vec(),
            ..Default::default()
        };
        Ok(self.fetch(&exec)?.token()?.to_string())
    }

    /// Spawns the plugin and decodes what it prints. The child is always
    /// waited on and its stdout read to the end before decoding starts.
    pub fn fetch(&self, exec: &ExecConfig) -> Result<ExecCredential> {
        let program = self.resolve_command(&exec.command)?;
        let api_version = exec.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION);

        let output = Command::new(&program)
            .args(&exec.args)
            .envs(exec.env.iter().map(|ExecEnvVar { name, value }| (name, value)))
            .env(EXEC_INFO_ENV, exec_info(api_version))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                ResolveError::ExecFailure(format!("failed to run {}: {}", program.display(), e))
            })?;

        if !output.status.success() {
            return Err(ResolveError::ExecFailure(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        ExecCredential::from_slice(&output.stdout)
    }

    fn resolve_command(&self, command: &str) -> Result<PathBuf> {
        let path = Path::new(command);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }

        let search_path = self.env.var("PATH").unwrap_or_default();
        find_executable(command, &search_path).ok_or_else(|| {
            ResolveError::ExecFailure(format!("{} not found in PATH", command))
        })
    }
}

/// `which`-style lookup over a `PATH`-formatted list of directories.
pub fn find_executable(name: &str, search_path: &str) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

fn exec_info(api_version: &str) -> String {
    serde_json::json!({
        "apiVersion": api_version,
        "kind": "ExecCredential",
        "spec": { "interactive": false },
    })
    .to_string()
}
