// src/cert/inspect.rs
use crate::error::{ResolveError, Result};
use chrono::{DateTime, TimeZone, Utc};
use openssl::x509::X509;
use serde::Serialize;
use x509_parser::prelude::{FromDer, ParsedExtension, X509Certificate};

#[derive(Debug, Clone, Serialize)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub serial: String,
    pub fingerprint: String,
    pub is_ca: bool,
}

impl CertificateSummary {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.not_after < now
    }
}

pub fn describe(cert: &X509) -> Result<CertificateSummary> {
    let cert_der = cert.to_der()?;
    describe_der(&cert_der)
}

pub fn describe_der(cert_der: &[u8]) -> Result<CertificateSummary> {
    let (_remainder, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| ResolveError::CertificateLoad(e.to_string()))?;

    let not_before = Utc
        .timestamp_opt(cert.validity().not_before.timestamp(), 0)
        .single()
        .ok_or_else(|| ResolveError::CertificateLoad("Invalid not_before timestamp".to_string()))?;
    let not_after = Utc
        .timestamp_opt(cert.validity().not_after.timestamp(), 0)
        .single()
        .ok_or_else(|| ResolveError::CertificateLoad("Invalid not_after timestamp".to_string()))?;

    let is_ca = cert
        .extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => Some(bc.ca),
            _ => None,
        })
        .unwrap_or(false);

    Ok(CertificateSummary {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        not_before,
        not_after,
        serial: hex::encode(cert.raw_serial()),
        fingerprint: hex::encode(openssl::hash::hash(
            openssl::hash::MessageDigest::sha256(),
            cert_der,
        )?),
        is_ca,
    })
}
