// types.rs
use crate::cert::TrustRoots;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_NAMESPACE: &str = "default";

/// The one credential a resolved configuration authenticates with.
#[derive(Clone, PartialEq, Eq)]
pub enum Authentication {
    Basic { username: String, password: String },
    BearerToken(String),
    /// PEM-encoded certificate and private key, both already parsed once.
    ClientCertificate { certificate: Vec<u8>, key: Vec<u8> },
}

impl Authentication {
    pub fn kind(&self) -> &'static str {
        match self {
            Authentication::Basic { .. } => "basic",
            Authentication::BearerToken(_) => "bearer-token",
            Authentication::ClientCertificate { .. } => "client-certificate",
        }
    }
}

// Secrets never reach logs through Debug.
impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authentication::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Authentication::BearerToken(_) => f.debug_tuple("BearerToken").field(&"<redacted>").finish(),
            Authentication::ClientCertificate { certificate, .. } => f
                .debug_struct("ClientCertificate")
                .field("certificate", &format!("{} bytes", certificate.len()))
                .field("key", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum RedirectPolicy {
    Disallow,
    Follow { max: usize, allow_cycles: bool },
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        RedirectPolicy::Follow {
            max: 5,
            allow_cycles: false,
        }
    }
}

/// Transport timeouts. Passed through untouched; resolution itself is not
/// time-limited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Timeout {
    pub connect: Option<Duration>,
    pub read: Option<Duration>,
}

impl Timeout {
    pub fn new(connect: Option<Duration>, read: Option<Duration>) -> Self {
        Self { connect, read }
    }
}

/// A fully resolved, frozen client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    server_url: Url,
    namespace: String,
    authentication: Authentication,
    trust_roots: Option<TrustRoots>,
    insecure_skip_verify: bool,
    timeout: Timeout,
    redirect_policy: RedirectPolicy,
    proxy_url: Option<Url>,
    use_compression: bool,
}

impl ClientConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        server_url: Url,
        namespace: Option<String>,
        authentication: Authentication,
        trust_roots: Option<TrustRoots>,
        insecure_skip_verify: bool,
        timeout: Timeout,
        redirect_policy: RedirectPolicy,
        proxy_url: Option<Url>,
    ) -> Self {
        Self {
            server_url,
            namespace: namespace
                .filter(|ns| !ns.is_empty())
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            authentication,
            trust_roots,
            insecure_skip_verify,
            timeout,
            redirect_policy,
            proxy_url,
            use_compression: false,
        }
    }

    pub fn with_compression(mut self, use_compression: bool) -> Self {
        self.use_compression = use_compression;
        self
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn authentication(&self) -> &Authentication {
        &self.authentication
    }

    pub fn trust_roots(&self) -> Option<&TrustRoots> {
        self.trust_roots.as_ref()
    }

    pub fn insecure_skip_verify(&self) -> bool {
        self.insecure_skip_verify
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn redirect_policy(&self) -> RedirectPolicy {
        self.redirect_policy
    }

    pub fn proxy_url(&self) -> Option<&Url> {
        self.proxy_url.as_ref()
    }

    pub fn use_compression(&self) -> bool {
        self.use_compression
    }
}
