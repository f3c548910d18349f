// =============================================================================
// Signal Engine — one stateless evaluation per pair per cycle
// =============================================================================
//
// Pipeline:
//   1. Fetch one-minute ticks newer than `now - lookback`
//   2. Normalize into an ascending candle series
//   3. Populate indicator columns and the per-row buy trend
//   4. Classify the latest row (predicate + freshness gate)
//
// Nothing survives between calls; the driver owns scheduling.
// =============================================================================

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::analysis::{analyze, AnalyzedSeries};
use crate::bittrex::{RawTick, RemoteDataError, TickerClient};
use crate::decision::SignalDecision;
use crate::market_data::normalize;
use crate::runtime_config::RuntimeConfig;
use crate::signal::classify;
use crate::types::Pair;

/// Result of one pair evaluation: the decision plus the series it came from
/// (kept for chart export).
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub decision: SignalDecision,
    pub series: AnalyzedSeries,
}

pub struct SignalEngine;

impl SignalEngine {
    /// Run steps 2–4 on ticks that were already fetched.
    pub fn evaluate_ticks(
        pair: &Pair,
        ticks: Vec<RawTick>,
        minimum_date: DateTime<Utc>,
        config: &RuntimeConfig,
        now: DateTime<Utc>,
    ) -> Evaluation {
        let candles = normalize(ticks, minimum_date);
        let series = analyze(candles, &config.indicators, config.stochrsi_buy_below);
        debug!(pair = %pair, candles = series.len(), "series analysed");

        let decision = classify(
            pair,
            &series,
            config.stochrsi_buy_below,
            now,
            config.freshness(),
        );
        Evaluation { decision, series }
    }

    /// Fetch, analyse and classify `pair`.
    ///
    /// Fetch failures propagate; the caller decides whether to keep polling.
    pub async fn evaluate_pair(
        client: &TickerClient,
        config: &RuntimeConfig,
        pair: &Pair,
    ) -> Result<Evaluation, RemoteDataError> {
        let minimum_date = Utc::now() - config.lookback();
        let ticks = client.get_ticks(pair, minimum_date).await?;
        // Retries and timeouts can take a while; gate freshness on the time
        // the data actually arrived.
        Ok(Self::evaluate_ticks(pair, ticks, minimum_date, config, Utc::now()))
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalOutcome;
    use chrono::{Duration, TimeZone};

    /// One-minute ticks ending one minute before `now`, newest first.
    fn fixture(now: DateTime<Utc>, closes: &[f64]) -> Vec<RawTick> {
        let n = closes.len() as i64;
        let mut ticks: Vec<RawTick> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                RawTick {
                    open,
                    high: open.max(close) * 1.001,
                    low: open.min(close) * 0.999,
                    close,
                    volume: 25.0,
                    time: now - Duration::minutes(n - i as i64),
                    base_volume: Some(0.01),
                }
            })
            .collect();
        ticks.reverse();
        ticks
    }

    fn steady_uptrend() -> Vec<f64> {
        (0..100).map(|i| 100.0 * 1.002_f64.powi(i)).collect()
    }

    fn uptrend_then_dip() -> Vec<f64> {
        (0..100)
            .map(|i| {
                if i < 92 {
                    100.0 + 0.5 * i as f64 + if i % 3 == 0 { 0.8 } else { 0.0 }
                } else {
                    100.0 + 0.5 * 91.0 - 0.6 * (i - 91) as f64
                }
            })
            .collect()
    }

    fn uptrend_then_small_dip() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..99).map(|i| 100.0 * 1.002_f64.powi(i)).collect();
        let last = closes[98];
        closes.push(last * 0.999);
        closes
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 14, 30, 0).unwrap()
    }

    fn run(closes: &[f64], now: DateTime<Utc>, eval_at: DateTime<Utc>) -> Evaluation {
        let config = RuntimeConfig::default();
        SignalEngine::evaluate_ticks(
            &Pair::new("BTC_ANT"),
            fixture(now, closes),
            now - config.lookback(),
            &config,
            eval_at,
        )
    }

    #[test]
    fn golden_steady_uptrend_buys() {
        let eval = run(&steady_uptrend(), now(), now());
        assert_eq!(eval.series.len(), 100);

        let row = eval.series.latest().unwrap();
        // RSI is pinned at 100 so every %K window is flat.
        assert_eq!(row.stochrsi, Some(0.0));
        assert!(row.macd.unwrap() > row.macds.unwrap());
        assert!(row.close > row.sar.unwrap());

        assert!(eval.decision.buy);
        assert_eq!(eval.decision.outcome, SignalOutcome::Buy);
        assert_eq!(eval.decision.candle_time, Some(now() - Duration::minutes(1)));
        // First row where every input is warmed up is the MACD signal warm-up.
        let first_buy = eval.series.buy.iter().position(|b| *b);
        assert_eq!(first_buy, Some(33));
    }

    #[test]
    fn golden_uptrend_then_dip_does_not_buy() {
        let eval = run(&uptrend_then_dip(), now(), now());
        let row = eval.series.latest().unwrap();
        assert!(row.close < row.sar.unwrap());
        assert!(row.macd.unwrap() < row.macds.unwrap());
        assert!(!eval.decision.buy);
        assert!(!eval.decision.predicate);
        assert_eq!(eval.decision.outcome, SignalOutcome::NoBuy);
        assert!(eval.series.buy.iter().all(|b| !b));
    }

    #[test]
    fn golden_small_dip_loses_macd_cross() {
        let eval = run(&uptrend_then_small_dip(), now(), now());
        let row = eval.series.latest().unwrap();
        assert_eq!(row.stochrsi, Some(0.0));
        assert!(row.close > row.sar.unwrap());
        assert!(row.macd.unwrap() < row.macds.unwrap());
        assert!(!eval.decision.buy);
        // The row before the dip still qualified.
        assert!(eval.series.buy[98]);
        assert_eq!(eval.series.buy_price[98], Some(eval.series.candles[98].close));
    }

    #[test]
    fn stale_fixture_is_forced_off() {
        let eval = run(&steady_uptrend(), now(), now() + Duration::minutes(15));
        assert!(eval.decision.predicate);
        assert!(!eval.decision.buy);
        assert_eq!(eval.decision.outcome, SignalOutcome::Stale);
    }

    #[test]
    fn ticks_older_than_lookback_give_insufficient_data() {
        let config = RuntimeConfig::default();
        let old = now() - Duration::hours(7);
        let eval = SignalEngine::evaluate_ticks(
            &Pair::new("BTC_ANT"),
            fixture(old, &steady_uptrend()),
            now() - config.lookback(),
            &config,
            now(),
        );
        assert!(eval.series.is_empty());
        assert!(!eval.decision.buy);
        assert_eq!(eval.decision.outcome, SignalOutcome::InsufficientData);
    }

    #[test]
    fn short_history_never_buys() {
        let closes: Vec<f64> = steady_uptrend().into_iter().take(30).collect();
        let eval = run(&closes, now(), now());
        assert_eq!(eval.series.len(), 30);
        assert!(!eval.decision.buy);
        assert_eq!(eval.decision.outcome, SignalOutcome::NoBuy);
    }

    #[tokio::test]
    async fn freshness_is_judged_after_the_fetch() {
        use axum::routing::get;

        let fetched_from = Utc::now();
        let records: Vec<serde_json::Value> = fixture(fetched_from, &steady_uptrend())
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "O": t.open, "H": t.high, "L": t.low, "C": t.close, "V": t.volume,
                    "T": t.time.to_rfc3339(), "BV": t.base_volume,
                })
            })
            .collect();
        let body = serde_json::json!({ "success": true, "message": "", "result": records })
            .to_string();

        let app = axum::Router::new().route(
            "/Api/v2.0/pub/market/GetTicks",
            get(move || async move {
                tokio::time::sleep(std::time::Duration::from_millis(300)).await;
                body
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = RuntimeConfig {
            base_url: format!("http://{addr}"),
            ..RuntimeConfig::default()
        };
        let client = TickerClient::from_config(&config).unwrap();
        let eval = SignalEngine::evaluate_pair(&client, &config, &Pair::new("BTC_ANT"))
            .await
            .unwrap();

        assert_eq!(eval.series.len(), 100);
        assert!(eval.decision.evaluated_at - fetched_from >= Duration::milliseconds(300));
        assert!(eval.decision.buy);
    }
}
