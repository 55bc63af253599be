// src/discovery/mod.rs
use crate::config::{ContextSelector, KubeConfig};
use crate::kubeconfig::{ConfigResolver, ServiceAccountResolver};
use crate::types::{ClientConfig, RedirectPolicy, Timeout};
use crate::utils::{Environment, Logger};
use serde::Serialize;

/// Caller-supplied settings that pass through resolution untouched.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub context: Option<String>,
    pub timeout: Timeout,
    pub redirect_policy: RedirectPolicy,
    pub use_compression: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigSource {
    Kubeconfig,
    ServiceAccount,
}

/// Local kubeconfig first, then the in-cluster service account.
pub fn discover(
    env: &dyn Environment,
    options: &ClientOptions,
    logger: &mut dyn Logger,
) -> Option<(ConfigSource, ClientConfig)> {
    if let Some(config) = from_kubeconfig(env, options, logger) {
        return Some((ConfigSource::Kubeconfig, config));
    }

    ServiceAccountResolver::new(env)
        .resolve(options.timeout, options.redirect_policy, logger)
        .map(|config| {
            (
                ConfigSource::ServiceAccount,
                config.with_compression(options.use_compression),
            )
        })
}

fn from_kubeconfig(
    env: &dyn Environment,
    options: &ClientOptions,
    logger: &mut dyn Logger,
) -> Option<ClientConfig> {
    let document = match KubeConfig::load_default(env, logger) {
        Ok(Some(document)) => document,
        Ok(None) => {
            logger.debug_log("No kubeconfig found");
            return None;
        }
        Err(e) => {
            logger.warn(&e.to_string());
            return None;
        }
    };

    let selector = ContextSelector::from(options.context.clone());
    ConfigResolver::new(env)
        .resolve(
            &document,
            &selector,
            options.timeout,
            options.redirect_policy,
            logger,
        )
        .map(|config| config.with_compression(options.use_compression))
}
