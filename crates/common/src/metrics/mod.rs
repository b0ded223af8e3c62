//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all PdfQuery metrics
pub const METRICS_PREFIX: &str = "pdfquery";

/// Buckets for provider latency (LLM calls are slow)
pub const COMPLETION_BUCKETS: &[f64] = &[
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Ingestion metrics
    describe_counter!(
        format!("{}_documents_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total PDF documents ingested"
    );

    describe_counter!(
        format!("{}_ingestion_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Total failed PDF ingestions"
    );

    describe_histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "PDF extraction and persistence latency in seconds"
    );

    // Query metrics
    describe_counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total queries answered"
    );

    describe_histogram!(
        format!("{}_prompt_chars", METRICS_PREFIX),
        Unit::Count,
        "Prompt size in characters"
    );

    // Provider metrics
    describe_counter!(
        format!("{}_completion_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total LLM completion requests"
    );

    describe_histogram!(
        format!("{}_completion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "LLM completion latency in seconds"
    );

    describe_counter!(
        format!("{}_completion_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total LLM completion errors"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record ingestion metrics
pub fn record_ingestion(duration_secs: f64, success: bool) {
    if success {
        counter!(format!("{}_documents_ingested_total", METRICS_PREFIX)).increment(1);
        histogram!(format!("{}_ingestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    } else {
        counter!(format!("{}_ingestion_failures_total", METRICS_PREFIX)).increment(1);
    }
}

/// Helper to record query metrics
pub fn record_query(prompt_chars: usize) {
    counter!(format!("{}_queries_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_prompt_chars", METRICS_PREFIX)).record(prompt_chars as f64);
}

/// Helper to record provider metrics
pub fn record_completion(duration_secs: f64, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_completion_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_completion_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
    } else {
        counter!(
            format!("{}_completion_errors_total", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in COMPLETION_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: calls must be no-ops
        record_ingestion(0.1, true);
        record_query(128);
        record_completion(1.5, "mock-llm", false);
    }
}
