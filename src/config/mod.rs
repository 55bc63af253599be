mod loader;
mod types;

pub use loader::{kubeconfig_paths, KUBECONFIG_ENV};
pub use types::{
    AuthInfo, Cluster, Context, ContextSelector, ExecConfig, ExecEnvVar, KubeConfig, NamedAuthInfo,
    NamedCluster, NamedContext,
};
