use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignments_total: IntCounterVec,
    pub trips_pending: IntGauge,
    pub assignment_latency_seconds: HistogramVec,
    pub earnings_credited_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignments_total = IntCounterVec::new(
            Opts::new(
                "dispatch_assignments_total",
                "Total assignment attempts by outcome",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_assignments_total metric");

        let trips_pending = IntGauge::new("trips_pending", "Trips currently awaiting a driver")
            .expect("valid trips_pending metric");

        let assignment_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "dispatch_assignment_latency_seconds",
                "Latency of assignment processing in seconds",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_assignment_latency_seconds metric");

        let earnings_credited_total = IntCounterVec::new(
            Opts::new(
                "earnings_credited_total",
                "Earnings records created by category",
            ),
            &["category"],
        )
        .expect("valid earnings_credited_total metric");

        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register dispatch_assignments_total");
        registry
            .register(Box::new(trips_pending.clone()))
            .expect("register trips_pending");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register dispatch_assignment_latency_seconds");
        registry
            .register(Box::new(earnings_credited_total.clone()))
            .expect("register earnings_credited_total");

        Self {
            registry,
            assignments_total,
            trips_pending,
            assignment_latency_seconds,
            earnings_credited_total,
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
