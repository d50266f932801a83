//! Binance REST API client.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use super::auth;
use super::types::{AccountInfo, ExchangeInfo, OrderResponse, TickerPrice};
use crate::error::{ExchangeError, Result};

/// How long a signed request stays valid on the server side.
const RECV_WINDOW_MS: u64 = 5000;

/// Blocking Binance REST client.
pub struct BinanceClient {
    client: Client,
    api_key: String,
    secret_key: Zeroizing<String>,
    base_url: String,
}

impl BinanceClient {
    /// Create a new Binance client.
    pub fn new(api_key: &str, secret_key: &str, testnet: bool) -> Self {
        let base_url = if testnet {
            "https://testnet.binance.vision"
        } else {
            "https://api.binance.com"
        };

        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            secret_key: Zeroizing::new(secret_key.to_string()),
            base_url: base_url.to_string(),
        }
    }

    /// Test connectivity (GET /api/v3/ping).
    pub fn ping(&self) -> Result<()> {
        let url = format!("{}/api/v3/ping", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ExchangeError::Connection(format!("ping failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(ExchangeError::Connection(format!(
                "ping returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Get account information (GET /api/v3/account).
    pub fn account_info(&self) -> Result<AccountInfo> {
        let query = self.sign("");
        let url = format!("{}/api/v3/account?{query}", self.base_url);

        let resp = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .map_err(|e| ExchangeError::Connection(format!("account request failed: {e}")))?;

        read_json(resp, "account", ExchangeError::Connection)
    }

    /// Trading rules of every symbol (GET /api/v3/exchangeInfo).
    pub fn exchange_info(&self) -> Result<ExchangeInfo> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ExchangeError::Connection(format!("exchangeInfo request failed: {e}")))?;

        read_json(resp, "exchangeInfo", ExchangeError::Connection)
    }

    /// Latest trade price for a symbol (GET /api/v3/ticker/price).
    pub fn ticker_price(&self, symbol: &str) -> Result<TickerPrice> {
        let url = format!("{}/api/v3/ticker/price?symbol={symbol}", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ExchangeError::Connection(format!("ticker request failed: {e}")))?;

        read_json(resp, "ticker", ExchangeError::Connection)
    }

    /// Submit a market order (POST /api/v3/order).
    pub fn submit_market_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: &str,
    ) -> Result<OrderResponse> {
        let params = format!("symbol={symbol}&side={side}&type=MARKET&quantity={quantity}");
        let body = self.sign(&params);
        let url = format!("{}/api/v3/order", self.base_url);

        debug!("Submitting Binance order: {params}");

        let resp = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .map_err(|e| ExchangeError::Order(format!("order request failed: {e}")))?;

        read_json(resp, "order", ExchangeError::Order)
    }

    fn sign(&self, params: &str) -> String {
        auth::signed_query(params, &self.secret_key, current_timestamp_ms(), RECV_WINDOW_MS)
    }
}

/// Map HTTP failures onto exchange errors and decode a successful body.
fn read_json<T: DeserializeOwned>(
    resp: Response,
    what: &str,
    err: fn(String) -> ExchangeError,
) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(status_error(status, what, &body, err));
    }

    resp.json::<T>()
        .map_err(|e| err(format!("failed to parse {what}: {e}")))
}

/// Error for a non-success HTTP status.
fn status_error(
    status: StatusCode,
    what: &str,
    body: &str,
    err: fn(String) -> ExchangeError,
) -> ExchangeError {
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::IM_A_TEAPOT => ExchangeError::RateLimit,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ExchangeError::Auth(format!("{what} returned {status}: {body}"))
        }
        _ => err(format!("{what} returned {status}: {body}")),
    }
}

/// Current timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_maps_to_rate_limit() {
        for status in [StatusCode::TOO_MANY_REQUESTS, StatusCode::IM_A_TEAPOT] {
            assert!(matches!(
                status_error(status, "order", "", ExchangeError::Order),
                ExchangeError::RateLimit
            ));
        }
    }

    #[test]
    fn rejected_key_maps_to_auth() {
        let e = status_error(
            StatusCode::UNAUTHORIZED,
            "account",
            "{\"code\":-2015}",
            ExchangeError::Connection,
        );
        assert!(matches!(e, ExchangeError::Auth(ref m) if m.contains("-2015")));
    }

    #[test]
    fn other_statuses_use_caller_error() {
        let e = status_error(
            StatusCode::BAD_REQUEST,
            "order",
            "Filter failure: LOT_SIZE",
            ExchangeError::Order,
        );
        assert!(matches!(e, ExchangeError::Order(ref m) if m.contains("LOT_SIZE")));
    }
}
