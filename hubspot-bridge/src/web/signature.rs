//! HubSpot webhook signature verification.
//!
//! HubSpot signs webhook requests (signature v1) with a SHA-256 digest of the
//! app secret followed by the raw request body, sent hex-encoded in the
//! `X-HubSpot-Signature` header.

use sha2::{Digest, Sha256};
use tracing::{error, warn};

use crate::error::SignatureError;

/// Header carrying the provider signature.
pub const SIGNATURE_HEADER: &str = "X-HubSpot-Signature";

/// Compute the expected signature: lowercase hex of `SHA256(secret || body)`.
pub fn expected_signature(secret: &[u8], body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// Check a provided signature against the request body.
pub fn check_signature(
    secret: &[u8],
    body: &[u8],
    provided: Option<&str>,
) -> Result<(), SignatureError> {
    let provided = provided.ok_or(SignatureError::Missing)?;

    let expected = expected_signature(secret, body);
    if constant_time_compare(&expected, provided) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Verify a HubSpot webhook signature.
///
/// # Arguments
///
/// * `secret` - The HubSpot app secret
/// * `body` - The raw request body, exactly as received
/// * `provided` - The `X-HubSpot-Signature` header value, if any
///
/// # Returns
///
/// `true` only when the header is present and matches. Never panics.
pub fn verify_signature(secret: &[u8], body: &[u8], provided: Option<&str>) -> bool {
    match check_signature(secret, body, provided) {
        Ok(()) => true,
        Err(SignatureError::Missing) => {
            warn!(body_length = body.len(), "hubspot_signature_missing");
            false
        }
        Err(SignatureError::Mismatch) => {
            error!(
                body_length = body.len(),
                provided_length = provided.map(str::len).unwrap_or(0),
                "hubspot_signature_mismatch"
            );
            false
        }
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-app-secret";
    const BODY: &[u8] = br#"[{"objectId":697680835,"propertyName":"dealstage","propertyValue":"closedwon","eventId":1228532628,"occurredAt":1556105815815,"subscriptionType":"deal.propertyChange"}]"#;

    #[test]
    fn test_expected_signature_known_vector() {
        // sha256("abc")
        assert_eq!(
            expected_signature(b"a", b"bc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_signature_valid() {
        let signature = expected_signature(SECRET, BODY);

        assert_eq!(signature.len(), 64);
        assert!(verify_signature(SECRET, BODY, Some(&signature)));
    }

    #[test]
    fn test_verify_signature_missing() {
        assert!(!verify_signature(SECRET, BODY, None));
        assert_eq!(
            check_signature(SECRET, BODY, None),
            Err(SignatureError::Missing)
        );
    }

    #[test]
    fn test_verify_signature_mismatch() {
        let signature = expected_signature(SECRET, BODY);

        assert!(!verify_signature(SECRET, BODY, Some("invalid_signature")));
        assert!(!verify_signature(SECRET, BODY, Some("")));
        assert!(!verify_signature(b"other-secret", BODY, Some(&signature)));
        assert!(!verify_signature(SECRET, b"[]", Some(&signature)));
        assert_eq!(
            check_signature(SECRET, BODY, Some("invalid_signature")),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_is_case_sensitive() {
        let signature = expected_signature(SECRET, BODY).to_uppercase();

        assert!(!verify_signature(SECRET, BODY, Some(&signature)));
    }

    #[test]
    fn test_secret_and_body_are_concatenated() {
        assert_eq!(
            expected_signature(b"secret", b"body"),
            expected_signature(b"sec", b"retbody")
        );
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
