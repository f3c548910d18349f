// =============================================================================
// Bittrex public market-data client
// =============================================================================
//
// Only the unauthenticated GetTicks endpoint is used, so there is no key
// material and no request signing. Every request carries an explicit timeout
// and transient failures (transport / non-2xx) are retried with a linear
// backoff. Provider-level failures are never retried.
// =============================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, instrument, warn};

use super::error::RemoteDataError;
use super::model::{parse_ticks_response, RawTick};
use crate::runtime_config::RuntimeConfig;
use crate::types::Pair;

const TICKS_PATH: &str = "/Api/v2.0/pub/market/GetTicks";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";

/// Public ticker client for one-minute candles.
#[derive(Clone)]
pub struct TickerClient {
    base_url: String,
    client: reqwest::Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl TickerClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url`     : scheme + host, e.g. `https://bittrex.com`.
    /// * `timeout`      : per-request timeout (connect + body).
    /// * `max_retries`  : extra attempts after the first transient failure.
    /// * `retry_backoff`: base delay; attempt `n` waits `n * retry_backoff`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Result<Self, RemoteDataError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, ?timeout, max_retries, "TickerClient initialised");

        Ok(Self {
            base_url,
            client,
            max_retries,
            retry_backoff,
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, RemoteDataError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
            config.max_retries,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    fn ticks_url(&self) -> String {
        format!("{}{}", self.base_url, TICKS_PATH)
    }

    // -------------------------------------------------------------------------
    // Public market data
    // -------------------------------------------------------------------------

    /// GET /Api/v2.0/pub/market/GetTicks for `pair` at one-minute resolution.
    ///
    /// `minimum_date` is only sent as the cache-busting `_` parameter; the
    /// provider returns its full recent window and the normalizer applies the
    /// cutoff.
    #[instrument(skip(self, pair), fields(pair = %pair), name = "bittrex::get_ticks")]
    pub async fn get_ticks(
        &self,
        pair: &Pair,
        minimum_date: DateTime<Utc>,
    ) -> Result<Vec<RawTick>, RemoteDataError> {
        let mut attempt: u32 = 0;
        loop {
            match self.fetch_ticks_once(pair, minimum_date).await {
                Ok(ticks) => {
                    debug!(count = ticks.len(), attempt, "ticks fetched");
                    return Ok(ticks);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_backoff * attempt;
                    warn!(error = %e, attempt, ?delay, "GetTicks failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_ticks_once(
        &self,
        pair: &Pair,
        minimum_date: DateTime<Utc>,
    ) -> Result<Vec<RawTick>, RemoteDataError> {
        let market = pair.market_name();
        let cache_buster = minimum_date.timestamp_millis().to_string();
        let resp = self
            .client
            .get(self.ticks_url())
            .query(&[
                ("marketName", market.as_str()),
                ("tickInterval", "OneMin"),
                ("_", cache_buster.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(RemoteDataError::Status {
                status: status.as_u16(),
                body: body.chars().take(256).collect(),
            });
        }

        parse_ticks_response(&body)
    }
}

impl std::fmt::Debug for TickerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bittrex::model::tests::RESULT_BITTREX;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct Stub {
        hits: Arc<AtomicUsize>,
        fail_first: usize,
        body: &'static str,
        seen: Arc<parking_lot::Mutex<Vec<HashMap<String, String>>>>,
    }

    async fn ticks(
        State(stub): State<Stub>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, String) {
        stub.seen.lock().push(params);
        let n = stub.hits.fetch_add(1, Ordering::SeqCst);
        if n < stub.fail_first {
            (StatusCode::SERVICE_UNAVAILABLE, "busy".to_string())
        } else {
            (StatusCode::OK, stub.body.to_string())
        }
    }

    async fn serve(stub: Stub) -> String {
        let app = Router::new()
            .route(TICKS_PATH, get(ticks))
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn stub(fail_first: usize, body: &'static str) -> Stub {
        Stub {
            hits: Arc::new(AtomicUsize::new(0)),
            fail_first,
            body,
            seen: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    fn client(base_url: &str, max_retries: u32) -> TickerClient {
        TickerClient::new(
            base_url,
            Duration::from_secs(5),
            max_retries,
            Duration::from_millis(1),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn sends_market_interval_and_cache_buster() {
        let stub = stub(0, RESULT_BITTREX);
        let base = serve(stub.clone()).await;
        let minimum = Utc.with_ymd_and_hms(2017, 8, 30, 10, 0, 0).unwrap();

        let ticks = client(&base, 0)
            .get_ticks(&Pair::new("BTC_ANT"), minimum)
            .await
            .unwrap();
        assert_eq!(ticks.len(), 4);

        let seen = stub.seen.lock();
        let params = &seen[0];
        assert_eq!(params["marketName"], "BTC-ANT");
        assert_eq!(params["tickInterval"], "OneMin");
        assert_eq!(params["_"], minimum.timestamp_millis().to_string());
    }

    #[tokio::test]
    async fn retries_transient_status_then_succeeds() {
        let stub = stub(2, RESULT_BITTREX);
        let base = serve(stub.clone()).await;

        let ticks = client(&base, 2)
            .get_ticks(&Pair::new("BTC_ETH"), Utc::now())
            .await
            .unwrap();
        assert_eq!(ticks.len(), 4);
        assert_eq!(stub.hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let stub = stub(10, RESULT_BITTREX);
        let base = serve(stub.clone()).await;

        let err = client(&base, 1)
            .get_ticks(&Pair::new("BTC_ETH"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteDataError::Status { status: 503, .. }));
        assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn provider_failure_is_not_retried() {
        let stub = stub(
            0,
            r#"{"success": false, "message": "INVALID_MARKET", "result": null}"#,
        );
        let base = serve(stub.clone()).await;

        let err = client(&base, 3)
            .get_ticks(&Pair::new("BTC_NOPE"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteDataError::Provider(ref m) if m == "INVALID_MARKET"));
        assert_eq!(stub.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_provider_times_out_and_is_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                TICKS_PATH,
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    RESULT_BITTREX
                }),
            )
            .with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = TickerClient::new(
            format!("http://{addr}"),
            Duration::from_millis(50),
            2,
            Duration::from_millis(1),
        )
        .unwrap();
        let err = client
            .get_ticks(&Pair::new("BTC_ANT"), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, RemoteDataError::Transport(ref e) if e.is_timeout()));
        assert!(err.is_transient());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn debug_output_and_url() {
        let c = client("https://bittrex.com/", 0);
        assert_eq!(c.ticks_url(), "https://bittrex.com/Api/v2.0/pub/market/GetTicks");
        assert!(format!("{c:?}").contains("bittrex.com"));
    }
}
