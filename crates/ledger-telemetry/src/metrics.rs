//! Prometheus metrics for the trade ledger.
//!
//! All metrics follow the naming convention: `tl_ledger_<metric>_<unit>`
//! and live in a private registry exposed through [`gather_text`].

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Ledger metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Invocations by function name and outcome (ok / error)
    pub static ref INVOCATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("tl_ledger_invocations_total", "Total ledger invocations"),
        &["function", "outcome"]
    ).expect("metric creation failed");

    /// Invocation latency by function name
    pub static ref INVOCATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "tl_ledger_invocation_duration_seconds",
            "Time spent handling a ledger invocation"
        ).buckets(exponential_buckets(0.00005, 2.0, 16).expect("valid bucket layout")),
        &["function"]
    ).expect("metric creation failed");
}

/// Register the ledger metrics. Registering twice is not an error.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(INVOCATIONS.clone()),
        Box::new(INVOCATION_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Record one finished invocation.
pub fn record_invocation(function: &str, ok: bool, seconds: f64) {
    let outcome = if ok { "ok" } else { "error" };
    crate::metric_inc!(INVOCATIONS, &[function, outcome]);
    crate::metric_observe!(INVOCATION_DURATION, &[function], seconds);
}

/// Encode all ledger metrics in the Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Observes the elapsed time of one invocation when dropped.
///
/// A timer dropped without [`finish`](Self::finish) counts as a failed
/// invocation.
pub struct InvocationTimer {
    function: String,
    start: std::time::Instant,
    ok: bool,
}

impl InvocationTimer {
    pub fn start(function: &str) -> Self {
        Self {
            function: function.to_string(),
            start: std::time::Instant::now(),
            ok: false,
        }
    }

    /// Stop the timer and count the invocation under `ok`.
    pub fn finish(mut self, ok: bool) {
        self.ok = ok;
    }
}

impl Drop for InvocationTimer {
    fn drop(&mut self) {
        record_invocation(&self.function, self.ok, self.start.elapsed().as_secs_f64());
    }
}
