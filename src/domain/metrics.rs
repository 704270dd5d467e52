use super::MeasurementReport;

pub const NAMESPACE: &str = "network";
pub const SUBSYSTEM: &str = "iperf3";

/// Throughput gauges published per target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gauge {
    SentBitsPerSecond,
    SentRetransmits,
    ReceivedBitsPerSecond,
    ReceivedRetransmits,
}

impl Gauge {
    pub const ALL: [Gauge; 4] = [
        Gauge::SentBitsPerSecond,
        Gauge::SentRetransmits,
        Gauge::ReceivedBitsPerSecond,
        Gauge::ReceivedRetransmits,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Gauge::SentBitsPerSecond => "sent_bits_per_second",
            Gauge::SentRetransmits => "sent_retransmits",
            Gauge::ReceivedBitsPerSecond => "received_bits_per_second",
            Gauge::ReceivedRetransmits => "received_retransmits",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Gauge::SentBitsPerSecond => "Sender throughput of the last iperf3 run in bits per second",
            Gauge::SentRetransmits => "Sender retransmits of the last iperf3 run",
            Gauge::ReceivedBitsPerSecond => "Receiver throughput of the last iperf3 run in bits per second",
            Gauge::ReceivedRetransmits => "Receiver retransmits of the last iperf3 run",
        }
    }

    /// Pick this gauge's value out of a report
    pub fn value_of(&self, report: &MeasurementReport) -> f64 {
        match self {
            Gauge::SentBitsPerSecond => report.sent.bits_per_second,
            Gauge::SentRetransmits => report.sent.retransmits,
            Gauge::ReceivedBitsPerSecond => report.received.bits_per_second,
            Gauge::ReceivedRetransmits => report.received.retransmits,
        }
    }
}

/// Monotonic per-target counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Errors,
}

impl Counter {
    pub fn name(&self) -> &'static str {
        match self {
            Counter::Errors => "error_count",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Counter::Errors => "Number of failed iperf3 runs since startup",
        }
    }
}
