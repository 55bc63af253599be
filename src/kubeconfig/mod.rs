mod in_cluster;
mod resolver;

pub use in_cluster::{
    ServiceAccountResolver, SERVICE_ACCOUNT_ROOT, SERVICE_HOST_ENV, SERVICE_PORT_ENV,
};
pub use resolver::ConfigResolver;
