//! GitHub webhook signature verification using HMAC-SHA1.
//!
//! GitHub signs webhook payloads with the shared secret and sends the digest in
//! the `X-Hub-Signature` header as `sha1=<hex>`. Verification happens before the
//! body is parsed; a request that fails it is rejected without further work.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Parses a GitHub signature header (e.g., "sha1=abc123...") into raw bytes.
///
/// Returns `None` for malformed headers (missing prefix, invalid hex, etc.).
/// GitHub always sends lowercase hex, so uppercase digits are malformed too.
/// Never panics.
///
/// # Examples
///
/// ```
/// use hook_relay::webhooks::parse_signature_header;
///
/// assert!(parse_signature_header("sha1=abcd1234").is_some());
///
/// // Invalid: missing prefix
/// assert!(parse_signature_header("abcd1234").is_none());
///
/// // Invalid: wrong algorithm
/// assert!(parse_signature_header("sha256=abcd1234").is_none());
///
/// // Invalid: bad hex
/// assert!(parse_signature_header("sha1=xyz").is_none());
///
/// // Invalid: uppercase hex
/// assert!(parse_signature_header("sha1=ABCD1234").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha1=")?;
    if hex_sig.bytes().any(|b| b.is_ascii_uppercase()) {
        return None;
    }
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA1 signature of a payload using the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a GitHub-style header value: `sha1=<lowercase hex>`.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha1={}", hex::encode(signature))
}

/// Verifies a GitHub webhook signature against the payload and secret.
///
/// Returns `true` only if the header is well formed and matches the HMAC of
/// the payload. The digest comparison is constant-time.
///
/// # Examples
///
/// ```
/// use hook_relay::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let payload = b"Hello, World!";
/// let secret = b"my-secret-key";
/// let header = format_signature_header(&compute_signature(payload, secret));
///
/// assert!(verify_signature(payload, &header, secret));
/// assert!(!verify_signature(payload, &header, b"wrong-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let expected_signature = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha1::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // verify_slice rejects length mismatches and compares in constant time
    mac.verify_slice(&expected_signature).is_ok()
}
