// src/kubeconfig/resolver.rs
use crate::auth::AuthenticationResolver;
use crate::cert::{non_empty, TrustRootResolver};
use crate::config::{ContextSelector, KubeConfig};
use crate::error::{ResolveError, Result};
use crate::types::{ClientConfig, RedirectPolicy, Timeout};
use crate::utils::{Environment, Logger};
use url::Url;

/// Builds a [`ClientConfig`] from one context of a kubeconfig document.
pub struct ConfigResolver<'a> {
    env: &'a dyn Environment,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self { env }
    }

    /// `None` is an ordinary outcome (no such context, nothing to
    /// authenticate with); the reason is logged.
    pub fn resolve(
        &self,
        document: &KubeConfig,
        selector: &ContextSelector,
        timeout: Timeout,
        redirect_policy: RedirectPolicy,
        logger: &mut dyn Logger,
    ) -> Option<ClientConfig> {
        match self.try_resolve(document, selector, timeout, redirect_policy, logger) {
            Ok(config) => Some(config),
            Err(e) => {
                logger.warn(&format!("No configuration from kubeconfig: {}", e));
                None
            }
        }
    }

    pub fn try_resolve(
        &self,
        document: &KubeConfig,
        selector: &ContextSelector,
        timeout: Timeout,
        redirect_policy: RedirectPolicy,
        logger: &mut dyn Logger,
    ) -> Result<ClientConfig> {
        let context = document.context(selector).ok_or_else(|| {
            ResolveError::ContextNotFound(match selector {
                ContextSelector::Current => document
                    .current_context
                    .clone()
                    .unwrap_or_else(|| "<current-context unset>".to_string()),
                ContextSelector::Named(name) => name.clone(),
            })
        })?;
        logger.debug_log(&format!("Using context {}", context.name));

        let cluster = document
            .cluster(&context.context.cluster)
            .ok_or_else(|| ResolveError::ClusterNotFound(context.context.cluster.clone()))?;
        let user = document
            .user(&context.context.user)
            .ok_or_else(|| ResolveError::UserNotFound(context.context.user.clone()))?;

        let server_url =
            Url::parse(&cluster.cluster.server).map_err(|source| ResolveError::InvalidServerUrl {
                url: cluster.cluster.server.clone(),
                source,
            })?;

        let authentication = AuthenticationResolver::new(self.env)
            .authenticate(&user.user, logger)
            .ok_or_else(|| ResolveError::NoAuthenticationAvailable(user.name.clone()))?;

        let trust_roots = TrustRootResolver::new(self.env).trust_roots(&cluster.cluster, logger);

        let proxy_url = non_empty(&cluster.cluster.proxy_url).and_then(|proxy| {
            Url::parse(proxy)
                .map_err(|e| logger.warn(&format!("Ignoring proxy-url {:?}: {}", proxy, e)))
                .ok()
        });

        Ok(ClientConfig::new(
            server_url,
            context.context.namespace.clone(),
            authentication,
            trust_roots,
            cluster.cluster.insecure_skip_tls_verify.unwrap_or(true),
            timeout,
            redirect_policy,
            proxy_url,
        ))
    }
}
