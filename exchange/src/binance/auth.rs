//! HMAC-SHA256 request signing for Binance signed endpoints.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign a query string with HMAC-SHA256.
///
/// Returns the hex-encoded signature to append as `&signature=<sig>`.
pub fn sign(query_string: &str, secret_key: &str) -> String {
    // HMAC accepts keys of any length, so this never takes the error branch.
    let mut mac = match HmacSha256::new_from_slice(secret_key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(query_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Append `timestamp`, `recvWindow` and the signature to `params`.
pub fn signed_query(
    params: &str,
    secret_key: &str,
    timestamp_ms: u64,
    recv_window_ms: u64,
) -> String {
    let mut query = String::from(params);
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(&format!("recvWindow={recv_window_ms}&timestamp={timestamp_ms}"));
    let signature = sign(&query, secret_key);
    format!("{query}&signature={signature}")
}
