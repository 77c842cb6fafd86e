use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    pub static ref RECONCILE_DURATION: HistogramVec = register_histogram_vec!(
        "reconcile_operation_duration_seconds",
        "Reconciler operation duration in seconds",
        &["operation", "resource_kind", "status"]
    )
    .expect("reconcile duration histogram registers once");

    pub static ref RECONCILE_COUNTER: IntCounterVec = register_int_counter_vec!(
        "reconcile_operations_total",
        "Total number of reconciler operations",
        &["operation", "resource_kind", "status"]
    )
    .expect("reconcile counter registers once");
}

pub fn record_operation(operation: &str, resource_kind: &str, success: bool, duration: f64) {
    let status = if success { "success" } else { "failure" };
    RECONCILE_DURATION
        .with_label_values(&[operation, resource_kind, status])
        .observe(duration);
    RECONCILE_COUNTER
        .with_label_values(&[operation, resource_kind, status])
        .inc();
}

/// Everything in the default registry, in the Prometheus text format.
pub fn gather_text() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
