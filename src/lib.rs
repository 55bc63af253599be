//! Resolves a Kubernetes client configuration (server, namespace, credential,
//! trust roots, transport policy) from a kubeconfig document or from the
//! in-cluster service account.

pub mod auth;
pub mod cert;
pub mod config;
pub mod discovery;
pub mod error;
pub mod kubeconfig;
pub mod types;
pub mod utils;

pub use auth::{AuthScheme, AuthenticationResolver, ExecCredential, ExecCredentialProvider};
pub use cert::{TrustRootResolver, TrustRoots};
pub use config::{ContextSelector, KubeConfig};
pub use discovery::{discover, ClientOptions, ConfigSource};
pub use error::ResolveError;
pub use kubeconfig::{ConfigResolver, ServiceAccountResolver};
pub use types::{Authentication, ClientConfig, RedirectPolicy, Timeout};
