//! Ed25519 signature verification for the interaction webhook.
//!
//! The platform signs `timestamp + raw body` with the application's key
//! pair; requests that do not carry a valid signature must be rejected or
//! the webhook registration gets revoked.

use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::infra::error::InfraError;

use super::AppState;

const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Interaction payloads are small JSON documents; anything bigger is noise.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Build a verifier from the application public key as configured
    /// (64 hex characters).
    pub fn from_hex(public_key: &str) -> Result<Self, InfraError> {
        let decoded = hex::decode(public_key).map_err(|err| {
            InfraError::configuration(format!("discord public key is not valid hex: {err}"))
        })?;
        let bytes: [u8; 32] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| InfraError::configuration("discord public key must be 32 bytes"))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|err| {
            InfraError::configuration(format!("discord public key is not a valid ed25519 key: {err}"))
        })?;
        Ok(Self { key })
    }

    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> bool {
        let Ok(decoded) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&decoded) else {
            return false;
        };

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        self.key.verify(&message, &signature).is_ok()
    }
}

pub(super) async fn verify_signature(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let signature = header_value(&parts.headers, SIGNATURE_HEADER);
    let timestamp = header_value(&parts.headers, TIMESTAMP_HEADER);
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        return (StatusCode::BAD_REQUEST, "Invalid request").into_response();
    };

    let Ok(bytes) = to_bytes(body, MAX_BODY_BYTES).await else {
        return (StatusCode::BAD_REQUEST, "Invalid request").into_response();
    };

    if !state.verifier.verify(&signature, &timestamp, &bytes) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    next.run(request).await
}

fn header_value(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::SignatureVerifier;

    fn keypair() -> (SigningKey, SignatureVerifier) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let verifier = SignatureVerifier::from_hex(&hex::encode(signing.verifying_key().as_bytes()))
            .expect("verifier builds from the public key");
        (signing, verifier)
    }

    #[test]
    fn valid_signature_over_timestamp_and_body_verifies() {
        let (signing, verifier) = keypair();
        let timestamp = "1700000000";
        let body = br#"{"type":1}"#;
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = hex::encode(signing.sign(&message).to_bytes());

        assert!(verifier.verify(&signature, timestamp, body));
    }

    #[test]
    fn tampered_body_fails_verification() {
        let (signing, verifier) = keypair();
        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(br#"{"type":1}"#);
        let signature = hex::encode(signing.sign(&message).to_bytes());

        assert!(!verifier.verify(&signature, timestamp, br#"{"type":2}"#));
    }

    #[test]
    fn malformed_signature_hex_is_rejected_not_a_panic() {
        let (_, verifier) = keypair();
        assert!(!verifier.verify("zz-not-hex", "0", b"{}"));
        assert!(!verifier.verify("abcd", "0", b"{}"));
    }

    #[test]
    fn bad_public_keys_are_configuration_errors() {
        assert!(SignatureVerifier::from_hex("nothex").is_err());
        assert!(SignatureVerifier::from_hex("abcd").is_err());
    }
}
