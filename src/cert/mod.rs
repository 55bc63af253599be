// src/cert/mod.rs
pub mod inspect;
pub mod pem;
mod trust;

#[cfg(test)]
pub(crate) mod fixtures;

pub use inspect::{describe, CertificateSummary};
pub use trust::{TrustRootResolver, TrustRoots, TrustSource};
pub(crate) use trust::non_empty;
