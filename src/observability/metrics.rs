use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bookings_created_total: IntCounter,
    pub ride_transitions_total: IntCounterVec,
    pub active_rides: IntGauge,
    pub emails_sent_total: IntCounterVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_created_total =
            IntCounter::new("bookings_created_total", "Total booking requests created")
                .expect("valid bookings_created_total metric");

        let ride_transitions_total = IntCounterVec::new(
            Opts::new("ride_transitions_total", "Ride status transitions by target status"),
            &["to"],
        )
        .expect("valid ride_transitions_total metric");

        let active_rides =
            IntGauge::new("active_rides", "Rides between confirmation and completion")
                .expect("valid active_rides metric");

        let emails_sent_total = IntCounterVec::new(
            Opts::new("emails_sent_total", "Relayed emails by outcome"),
            &["outcome"],
        )
        .expect("valid emails_sent_total metric");

        registry
            .register(Box::new(bookings_created_total.clone()))
            .expect("register bookings_created_total");
        registry
            .register(Box::new(ride_transitions_total.clone()))
            .expect("register ride_transitions_total");
        registry
            .register(Box::new(active_rides.clone()))
            .expect("register active_rides");
        registry
            .register(Box::new(emails_sent_total.clone()))
            .expect("register emails_sent_total");

        Self {
            registry,
            bookings_created_total,
            ride_transitions_total,
            active_rides,
            emails_sent_total,
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
