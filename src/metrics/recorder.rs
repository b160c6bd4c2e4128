//! Metrics recorder for client-side transfer activity
//!
//! Records offers, decisions, progress notifications and backend requests.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    // Offer counters
    describe_counter!(
        "chunkstream_console_offers_received_total",
        "Total number of file offers received"
    );
    describe_counter!(
        "chunkstream_console_offers_overwritten_total",
        "Offers replaced by a newer offer before a decision was made"
    );
    describe_counter!(
        "chunkstream_console_decisions_sent_total",
        "Accept/reject decisions delivered to the backend"
    );

    // Progress
    describe_counter!(
        "chunkstream_console_progress_updates_total",
        "Progress notifications applied, by direction"
    );

    // Requests
    describe_counter!(
        "chunkstream_console_requests_total",
        "Backend requests by kind and outcome"
    );
    describe_counter!(
        "chunkstream_console_validation_failures_total",
        "User actions refused before contacting the backend"
    );
    describe_histogram!(
        "chunkstream_console_request_duration_seconds",
        "Backend request latency"
    );
}

// ============== Offers ==============

/// Record an incoming offer; `overwrote` is set when it replaced a pending one
pub fn record_offer_received(overwrote: bool) {
    counter!("chunkstream_console_offers_received_total").increment(1);
    if overwrote {
        counter!("chunkstream_console_offers_overwritten_total").increment(1);
    }
}

pub fn record_decision_sent(accept: bool) {
    counter!("chunkstream_console_decisions_sent_total", "accept" => accept.to_string())
        .increment(1);
}

// ============== Progress ==============

pub fn record_progress_update(mode: &'static str) {
    counter!("chunkstream_console_progress_updates_total", "mode" => mode).increment(1);
}

// ============== Requests ==============

/// Record a finished backend request
pub fn record_request(kind: &'static str, ok: bool, duration: Duration) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("chunkstream_console_requests_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
    histogram!("chunkstream_console_request_duration_seconds", "kind" => kind)
        .record(duration.as_secs_f64());
}

pub fn record_validation_failure(kind: &'static str) {
    counter!("chunkstream_console_validation_failures_total", "kind" => kind).increment(1);
}

/// Helper struct to time one backend request
pub struct RequestTimer {
    kind: &'static str,
    start_time: Instant,
}

impl RequestTimer {
    pub fn start(kind: &'static str) -> Self {
        Self {
            kind,
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Stop timing and record the request
    pub fn finish(self, ok: bool) {
        record_request(self.kind, ok, self.start_time.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        // Should not panic when called multiple times
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_request_timer() {
        let timer = RequestTimer::start("connect");
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
        timer.finish(true); // Should not panic
    }

    #[test]
    fn test_recording_without_recorder() {
        record_offer_received(true);
        record_decision_sent(false);
        record_progress_update("send");
        record_validation_failure("missing_file");
    }
}
