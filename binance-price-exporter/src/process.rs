//! Process metrics collected at render time.

use parking_lot::Mutex;
use prometheus_client::collector::Collector;
use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric};
use prometheus_client::metrics::MetricType;
use prometheus_client::metrics::gauge::ConstGauge;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Point-in-time resource usage of the exporter process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSample {
    pub resident_memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    pub start_time_seconds: u64,
    pub cpu_usage_percent: f32,
}

/// Collector exposing `process_*` gauges for the current process.
///
/// The process entry is refreshed on every encode, so values track the
/// scrape that renders them.
#[derive(Debug)]
pub struct ProcessCollector {
    system: Mutex<System>,
    pid: Pid,
}

impl ProcessCollector {
    /// Create a collector for the running process.
    ///
    /// Returns `None` on platforms where sysinfo cannot resolve the current pid.
    pub fn new() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        Some(Self {
            system: Mutex::new(System::new()),
            pid,
        })
    }

    /// Refresh and read the current process usage.
    pub fn sample(&self) -> Option<ProcessSample> {
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );

        let process = system.process(self.pid)?;
        Some(ProcessSample {
            resident_memory_bytes: process.memory(),
            virtual_memory_bytes: process.virtual_memory(),
            start_time_seconds: process.start_time(),
            cpu_usage_percent: process.cpu_usage(),
        })
    }
}

impl Collector for ProcessCollector {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        let Some(sample) = self.sample() else {
            return Ok(());
        };

        let gauges = [
            (
                "process_resident_memory_bytes",
                "Resident memory size in bytes.",
                sample.resident_memory_bytes as f64,
            ),
            (
                "process_virtual_memory_bytes",
                "Virtual memory size in bytes.",
                sample.virtual_memory_bytes as f64,
            ),
            (
                "process_start_time_seconds",
                "Start time of the process since unix epoch in seconds.",
                sample.start_time_seconds as f64,
            ),
            (
                "process_cpu_usage_percent",
                "CPU usage of the process since the previous scrape, in percent.",
                f64::from(sample.cpu_usage_percent),
            ),
        ];

        for (name, help, value) in gauges {
            let metric_encoder = encoder.encode_descriptor(name, help, None, MetricType::Gauge)?;
            ConstGauge::new(value).encode(metric_encoder)?;
        }

        Ok(())
    }
}
