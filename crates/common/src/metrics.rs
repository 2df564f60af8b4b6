use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, CounterVec, Encoder, TextEncoder,
};

lazy_static! {
    // Mutation metrics
    pub static ref ORDER_MUTATIONS: CounterVec = register_counter_vec!(
        "order_mutations_total",
        "Total number of order mutations attempted",
        &["operation", "outcome"]
    )
    .expect("metric cannot be created");

    pub static ref STATUS_TRANSITIONS: CounterVec = register_counter_vec!(
        "order_status_transitions_total",
        "Applied order status transitions",
        &["from", "to", "source"]
    )
    .expect("metric cannot be created");

    // Publisher metrics
    pub static ref PUBLISH_FAILURES: CounterVec = register_counter_vec!(
        "order_event_publish_failures_total",
        "Outbound events that could not be handed to the broker",
        &["event_type"]
    )
    .expect("metric cannot be created");

    // Consumer metrics
    pub static ref CONSUMER_OUTCOMES: CounterVec = register_counter_vec!(
        "order_consumer_outcomes_total",
        "Status consumer message outcomes",
        &["outcome"]
    )
    .expect("metric cannot be created");
}

pub fn record_mutation(operation: &str, outcome: &str) {
    ORDER_MUTATIONS.with_label_values(&[operation, outcome]).inc();
}

pub fn record_transition(from: &str, to: &str, source: &str) {
    STATUS_TRANSITIONS.with_label_values(&[from, to, source]).inc();
}

pub fn record_publish_failure(event_type: &str) {
    PUBLISH_FAILURES.with_label_values(&[event_type]).inc();
}

pub fn record_consumer_outcome(outcome: &str) {
    CONSUMER_OUTCOMES.with_label_values(&[outcome]).inc();
}

/// Render the default registry in the Prometheus text exposition format.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_register_and_increment() {
        record_mutation("create_order", "ok");
        record_transition("PENDING", "CONFIRMED", "saga");
        record_consumer_outcome("applied");
        record_publish_failure("order.created");

        let rendered = gather_metrics().unwrap();
        assert!(rendered.contains("order_mutations_total"));
        assert!(rendered.contains("order_consumer_outcomes_total"));
    }
}
