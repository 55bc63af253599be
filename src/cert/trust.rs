// src/cert/trust.rs
use super::pem::{decode_data, parse_certificates};
use crate::config::Cluster;
use crate::error::{ResolveError, Result};
use crate::utils::{Environment, Logger};
use openssl::x509::X509;
use std::fmt;
use std::path::Path;

/// CA certificates a transport should trust for one server.
#[derive(Clone)]
pub struct TrustRoots {
    certificates: Vec<X509>,
}

impl TrustRoots {
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        Ok(Self {
            certificates: parse_certificates(pem)?,
        })
    }

    pub fn certificates(&self) -> &[X509] {
        &self.certificates
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn to_pem(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for cert in &self.certificates {
            out.extend_from_slice(&cert.to_pem()?);
        }
        Ok(out)
    }
}

impl fmt::Debug for TrustRoots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subjects: Vec<String> = self
            .certificates
            .iter()
            .map(|c| subject_line(c))
            .collect();
        f.debug_struct("TrustRoots").field("subjects", &subjects).finish()
    }
}

/// Where a cluster's CA material comes from. Order matters: the first
/// source that is configured decides the outcome, even when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustSource {
    File,
    Data,
}

impl TrustSource {
    pub const ORDER: [TrustSource; 2] = [TrustSource::File, TrustSource::Data];
}

pub struct TrustRootResolver<'a> {
    env: &'a dyn Environment,
}

impl<'a> TrustRootResolver<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self { env }
    }

    /// Best-effort: any failure is logged and becomes `None`.
    pub fn trust_roots(&self, cluster: &Cluster, logger: &mut dyn Logger) -> Option<TrustRoots> {
        match self.try_trust_roots(cluster) {
            Ok(Some((source, roots))) => {
                logger.debug_log(&format!(
                    "Loaded {} trust root(s) from {:?}",
                    roots.len(),
                    source
                ));
                Some(roots)
            }
            Ok(None) => None,
            Err(e) => {
                logger.warn(&format!("Ignoring cluster CA: {}", e));
                None
            }
        }
    }

    pub fn try_trust_roots(&self, cluster: &Cluster) -> Result<Option<(TrustSource, TrustRoots)>> {
        for source in TrustSource::ORDER {
            if let Some(result) = self.load(source, cluster) {
                return result.map(|roots| Some((source, roots)));
            }
        }
        Ok(None)
    }

    fn load(&self, source: TrustSource, cluster: &Cluster) -> Option<Result<TrustRoots>> {
        match source {
            TrustSource::File => {
                let path = non_empty(&cluster.certificate_authority)?;
                Some(self.from_file(Path::new(path)))
            }
            TrustSource::Data => {
                let data = non_empty(&cluster.certificate_authority_data)?;
                Some(decode_data(data).and_then(|pem| TrustRoots::from_pem(&pem)))
            }
        }
    }

    fn from_file(&self, path: &Path) -> Result<TrustRoots> {
        let pem = self.env.read_file(path).map_err(|e| {
            ResolveError::CertificateLoad(format!("{}: {}", path.display(), e))
        })?;
        TrustRoots::from_pem(&pem)
    }
}

pub(crate) fn subject_line(cert: &X509) -> String {
    cert.subject_name()
        .entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("?");
            format!("{}={}", key, String::from_utf8_lossy(entry.data().as_slice()))
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
