use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignments_total: IntCounterVec,
    pub status_transitions_total: IntCounterVec,
    pub deliveries_completed_total: IntCounter,
    pub location_updates_total: IntCounter,
    pub active_assignments: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Assignment attempts by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Delivery status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid status_transitions_total metric");

        let deliveries_completed_total = IntCounter::new(
            "deliveries_completed_total",
            "Orders that reached the delivered state",
        )
        .expect("valid deliveries_completed_total metric");

        let location_updates_total = IntCounter::new(
            "location_updates_total",
            "Partner location reports accepted",
        )
        .expect("valid location_updates_total metric");

        let active_assignments = IntGauge::new(
            "active_assignments",
            "Orders currently bound to a partner and not yet delivered",
        )
        .expect("valid active_assignments metric");

        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(deliveries_completed_total.clone()))
            .expect("register deliveries_completed_total");
        registry
            .register(Box::new(location_updates_total.clone()))
            .expect("register location_updates_total");
        registry
            .register(Box::new(active_assignments.clone()))
            .expect("register active_assignments");

        Self {
            registry,
            assignments_total,
            status_transitions_total,
            deliveries_completed_total,
            location_updates_total,
            active_assignments,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
