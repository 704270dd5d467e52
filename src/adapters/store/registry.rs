use std::collections::HashMap;
use std::sync::RwLock;

use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::domain::{
    Counter, DirectionSummary, Gauge, MeasurementReport, Target, NAMESPACE, SUBSYSTEM,
};
use crate::ports::{MetricStore, StoreError};

/// Metric store backed by its own Prometheus registry
pub struct PrometheusStore {
    registry: Registry,
    gauges: HashMap<Gauge, GaugeVec>,
    errors: IntCounterVec,
    // Held for writing while a group of gauges changes, for reading while rendering
    group: RwLock<()>,
}

impl PrometheusStore {
    pub fn new() -> Result<Self, StoreError> {
        let registry = Registry::new();

        let mut gauges = HashMap::with_capacity(Gauge::ALL.len());
        for gauge in Gauge::ALL {
            let vec = GaugeVec::new(opts(gauge.name(), gauge.help()), &Target::LABELS)?;
            registry.register(Box::new(vec.clone()))?;
            gauges.insert(gauge, vec);
        }

        let errors = IntCounterVec::new(
            opts(Counter::Errors.name(), Counter::Errors.help()),
            &Target::LABELS,
        )?;
        registry.register(Box::new(errors.clone()))?;

        Ok(Self {
            registry,
            gauges,
            errors,
            group: RwLock::new(()),
        })
    }

    fn counter_vec(&self, counter: Counter) -> &IntCounterVec {
        match counter {
            Counter::Errors => &self.errors,
        }
    }

    fn gauge_vec(&self, gauge: Gauge) -> &GaugeVec {
        // Every variant is inserted in `new`
        &self.gauges[&gauge]
    }

    // Caller holds `group`
    fn read_gauge(&self, gauge: Gauge, target: &Target) -> Option<f64> {
        let families = self.gauge_vec(gauge).collect();
        find_value(&families, target, |metric| metric.get_gauge().get_value())
    }
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE).subsystem(SUBSYSTEM)
}

/// Find the series labelled with `target` without creating it
fn find_value<F>(families: &[MetricFamily], target: &Target, read: F) -> Option<f64>
where
    F: Fn(&prometheus::proto::Metric) -> f64,
{
    let [server, port] = target.label_values();
    families
        .iter()
        .flat_map(|family| family.get_metric())
        .find(|metric| {
            let labels = metric.get_label();
            let has = |name: &str, value: &str| {
                labels
                    .iter()
                    .any(|pair| pair.get_name() == name && pair.get_value() == value)
            };
            has(Target::LABELS[0], &server) && has(Target::LABELS[1], &port)
        })
        .map(read)
}

impl MetricStore for PrometheusStore {
    fn set(&self, gauge: Gauge, target: &Target, value: f64) {
        let [server, port] = target.label_values();
        self.gauge_vec(gauge)
            .with_label_values(&[server.as_str(), port.as_str()])
            .set(value);
    }

    fn clear(&self, gauge: Gauge, target: &Target) {
        let [server, port] = target.label_values();
        // Clearing a series that was never set is not an error here
        if self
            .gauge_vec(gauge)
            .remove_label_values(&[server.as_str(), port.as_str()])
            .is_err()
        {
            debug!("{} already absent for {}", gauge.name(), target);
        }
    }

    fn increment(&self, counter: Counter, target: &Target) {
        let [server, port] = target.label_values();
        self.counter_vec(counter)
            .with_label_values(&[server.as_str(), port.as_str()])
            .inc();
    }

    fn gauge(&self, gauge: Gauge, target: &Target) -> Option<f64> {
        let _group = self.group.read().unwrap_or_else(|e| e.into_inner());
        self.read_gauge(gauge, target)
    }

    fn published(&self, target: &Target) -> Option<MeasurementReport> {
        let _group = self.group.read().unwrap_or_else(|e| e.into_inner());
        Some(MeasurementReport::new(
            DirectionSummary::new(
                self.read_gauge(Gauge::SentBitsPerSecond, target)?,
                self.read_gauge(Gauge::SentRetransmits, target)?,
            ),
            DirectionSummary::new(
                self.read_gauge(Gauge::ReceivedBitsPerSecond, target)?,
                self.read_gauge(Gauge::ReceivedRetransmits, target)?,
            ),
        ))
    }

    fn count(&self, counter: Counter, target: &Target) -> u64 {
        let families = self.counter_vec(counter).collect();
        find_value(&families, target, |metric| metric.get_counter().get_value())
            .map(|value| value as u64)
            .unwrap_or(0)
    }

    fn render(&self) -> Result<String, StoreError> {
        let families = {
            let _group = self.group.read().unwrap_or_else(|e| e.into_inner());
            self.registry.gather()
        };

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn publish(&self, target: &Target, report: &MeasurementReport) {
        let _group = self.group.write().unwrap_or_else(|e| e.into_inner());
        for gauge in Gauge::ALL {
            self.set(gauge, target, gauge.value_of(report));
        }
    }

    fn reset(&self, target: &Target) {
        let _group = self.group.write().unwrap_or_else(|e| e.into_inner());
        for gauge in Gauge::ALL {
            self.clear(gauge, target);
        }
    }
}
