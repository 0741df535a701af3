use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify the code-hosting webhook signature.
///
/// The signature header carries `sha256=<hex hmac>` computed over the exact
/// raw body bytes; the body passed here must be the same buffer the caller
/// later parses as JSON, never a re-serialization. The comparison is
/// constant-time. An absent header or empty secret fails verification; it
/// never panics.
pub(super) fn verify_github(
    secret: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), &'static str> {
    let secret = secret
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or("missing_secret")?;
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|value| value.to_str().ok())
        .ok_or("missing_signature")?;
    let signature_hex = signature
        .strip_prefix("sha256=")
        .ok_or("malformed_signature")?;
    let expected = hex::decode(signature_hex).map_err(|_| "malformed_signature")?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "bad_secret")?;
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| "invalid_signature")
}
