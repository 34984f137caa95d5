use prometheus::{Encoder, GaugeVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub fare_quotes_total: IntCounterVec,
    pub orders_created_total: IntCounter,
    pub assignments_total: IntCounterVec,
    pub rider_utilization: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let fare_quotes_total = IntCounterVec::new(
            Opts::new("fare_quotes_total", "Fare quotes computed by vehicle class"),
            &["vehicle"],
        )
        .expect("valid fare_quotes_total metric");

        let orders_created_total =
            IntCounter::new("orders_created_total", "Total orders created")
                .expect("valid orders_created_total metric");

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Assignment operations by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let rider_utilization = GaugeVec::new(
            Opts::new(
                "rider_utilization",
                "Rider load over vehicle-class cap [0..1]",
            ),
            &["rider_id"],
        )
        .expect("valid rider_utilization metric");

        registry
            .register(Box::new(fare_quotes_total.clone()))
            .expect("register fare_quotes_total");
        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(rider_utilization.clone()))
            .expect("register rider_utilization");

        Self {
            registry,
            fare_quotes_total,
            orders_created_total,
            assignments_total,
            rider_utilization,
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
