// src/cert/pem.rs
use crate::error::{ResolveError, Result};
use crate::types::Authentication;
use base64::{engine::general_purpose, Engine as _};
use openssl::pkey::PKey;
use openssl::x509::X509;

/// Decodes the base64 `*-data` fields of a kubeconfig. Embedded whitespace
/// is ignored.
pub fn decode_data(data: &str) -> Result<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(general_purpose::STANDARD.decode(compact)?)
}

/// Parses one or more PEM certificates. An input with no certificate at all
/// is an error.
pub fn parse_certificates(pem: &[u8]) -> Result<Vec<X509>> {
    let certificates = X509::stack_from_pem(pem)?;
    if certificates.is_empty() {
        return Err(ResolveError::CertificateLoad(
            "no PEM certificate found".to_string(),
        ));
    }
    Ok(certificates)
}

/// Checks that both halves of a client identity parse and keeps them as PEM.
pub fn client_identity(certificate: &[u8], key: &[u8]) -> Result<Authentication> {
    parse_certificates(certificate)?;
    PKey::private_key_from_pem(key)?;

    Ok(Authentication::ClientCertificate {
        certificate: certificate.to_vec(),
        key: key.to_vec(),
    })
}
