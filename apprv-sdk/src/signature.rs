//! Slack request signing.
//!
//! Slack signs every request it sends with the app's signing secret:
//!
//! ```text
//! X-Slack-Request-Timestamp: {unix_timestamp}
//! X-Slack-Signature:         v0={hex(HMAC-SHA256("v0:{timestamp}:{raw_body}", secret))}
//! ```
//!
//! The server verifies this before trusting a callback payload.

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Header carrying the timestamp the signature was computed over.
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

/// Version prefix of the signing scheme.
pub const SIGNATURE_VERSION: &str = "v0";

/// Maximum allowed clock distance of a signed request (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

fn base_string(timestamp: i64, body: &[u8]) -> Vec<u8> {
    let mut data = format!("{SIGNATURE_VERSION}:{timestamp}:").into_bytes();
    data.extend_from_slice(body);
    data
}

/// Sign a request body, returning the `X-Slack-Signature` header value.
pub fn sign_request(timestamp: i64, body: &[u8], secret: &[u8]) -> String {
    let tag = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        &base_string(timestamp, body),
    );
    format!("{SIGNATURE_VERSION}={}", hex::encode(tag.as_ref()))
}

/// Parse an `X-Slack-Signature` header value into raw signature bytes.
pub fn parse_signature_header(value: &str) -> Result<Box<[u8]>, SignatureError> {
    let encoded = value
        .strip_prefix(SIGNATURE_VERSION)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or(SignatureError::InvalidFormat)?;
    hex::decode(encoded)
        .map(Vec::into_boxed_slice)
        .map_err(|_| SignatureError::InvalidHex)
}

/// Parse an `X-Slack-Request-Timestamp` header value.
pub fn parse_timestamp_header(value: &str) -> Result<i64, SignatureError> {
    value
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)
}

/// Check that a request timestamp is within [`MAX_SIGNATURE_AGE`] of now.
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if (now - timestamp).abs() > MAX_SIGNATURE_AGE {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

/// Verify a signed request body against its two Slack headers.
pub fn verify_request(
    timestamp_header: &str,
    signature_header: &str,
    body: &[u8],
    secret: &[u8],
) -> Result<(), SignatureError> {
    let timestamp = parse_timestamp_header(timestamp_header)?;
    let signature = parse_signature_header(signature_header)?;
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        &base_string(timestamp, body),
        &signature,
    )?;
    check_timestamp(timestamp)?;
    Ok(())
}
