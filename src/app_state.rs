// =============================================================================
// Signal Board — shared view of the latest decisions and fetch errors
// =============================================================================
//
// Written by the polling task, read by the status API.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the decision map and the error log.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::bittrex::RemoteDataError;
use crate::decision::SignalDecision;
use crate::types::Pair;

// =============================================================================
// Error Record
// =============================================================================

/// A failed evaluation, as shown by `GET /api/v1/errors`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub pair: Pair,
    pub message: String,
    /// HTTP status for provider status errors.
    pub code: Option<String>,
    pub transient: bool,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// SignalBoard
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

pub struct SignalBoard {
    /// Bumped on every recorded decision or error.
    pub state_version: AtomicU64,

    pub pairs: Vec<Pair>,

    latest: RwLock<BTreeMap<Pair, SignalDecision>>,

    recent_errors: RwLock<Vec<ErrorRecord>>,

    pub start_time: std::time::Instant,
}

impl SignalBoard {
    pub fn new(pairs: Vec<Pair>) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            pairs,
            latest: RwLock::new(BTreeMap::new()),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Decisions ───────────────────────────────────────────────────────

    /// Replace the latest decision for the decision's pair.
    pub fn record_decision(&self, decision: SignalDecision) {
        self.latest.write().insert(decision.pair.clone(), decision);
        self.increment_version();
    }

    /// Latest decision of every pair evaluated so far, ordered by pair.
    pub fn latest_decisions(&self) -> Vec<SignalDecision> {
        self.latest.read().values().cloned().collect()
    }

    pub fn decision(&self, pair: &Pair) -> Option<SignalDecision> {
        self.latest.read().get(pair).cloned()
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record a failed fetch. The log is capped at [`MAX_RECENT_ERRORS`];
    /// oldest entries are evicted first.
    pub fn push_error(&self, pair: &Pair, err: &RemoteDataError) {
        let code = match err {
            RemoteDataError::Status { status, .. } => Some(status.to_string()),
            _ => None,
        };
        let record = ErrorRecord {
            pair: pair.clone(),
            message: err.to_string(),
            code,
            transient: err.is_transient(),
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    /// Recent errors, newest last.
    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.recent_errors.read().clone()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
