//! Network interface counter sampling.
//!
//! A [`CounterSource`] owns one pair of counters (download/upload) per
//! network interface, enumerated once at startup — there is no hot-plug
//! handling. [`NetSampler`] sums the per-interface readings into a single
//! [`SampleReading`] each tick.
//!
//! Failure policy: a counter that fails to read contributes zero to that
//! tick's sum and must not zero out or abort its siblings. No error state
//! is retained, so the next tick re-reads everything naturally. If
//! enumeration itself fails at startup, the sampler degrades to an empty
//! counter set and every reading is zero for the rest of the run.

use thiserror::Error;

pub mod netdev;
#[cfg(target_os = "windows")]
pub mod pdh;

/// Instantaneous throughput summed across all interfaces, in bytes/sec.
///
/// Recomputed every tick; never retained between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleReading {
    pub down_bytes_per_sec: f64,
    pub up_bytes_per_sec: f64,
}

/// Failure reading a single counter on a single tick.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter read failed for '{instance}' (status {status:#010x})")]
    Read { instance: String, status: u32 },

    #[error("counter data not yet valid for '{instance}'")]
    NotReady { instance: String },
}

/// Failure building the platform counter source at startup.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("failed to open performance counter query (status {0:#010x})")]
    OpenQuery(u32),

    #[error("failed to enumerate network interfaces (status {0:#010x})")]
    EnumerateInstances(u32),

    #[error("failed to open counter for '{instance}' (status {status:#010x})")]
    OpenCounter { instance: String, status: u32 },
}

/// One interface's pair of per-second readings for a single tick.
#[derive(Debug)]
pub struct InterfaceReading {
    pub instance: String,
    pub down: Result<f64, CounterError>,
    pub up: Result<f64, CounterError>,
}

/// Source of per-interface readings; one implementation per OS backend.
pub trait CounterSource {
    /// Read every interface once. Called once per tick.
    fn read(&mut self) -> Vec<InterfaceReading>;
}

/// A source with no counters; every sample sums to zero.
struct EmptySource;

impl CounterSource for EmptySource {
    fn read(&mut self) -> Vec<InterfaceReading> {
        Vec::new()
    }
}

#[cfg(target_os = "windows")]
fn default_source() -> Result<Box<dyn CounterSource>, SamplerError> {
    Ok(Box::new(pdh::PdhSource::new()?))
}

#[cfg(not(target_os = "windows"))]
fn default_source() -> Result<Box<dyn CounterSource>, SamplerError> {
    Ok(Box::new(netdev::NetdevSource::new()))
}

/// Sums per-interface counter readings into one [`SampleReading`] per tick.
pub struct NetSampler {
    source: Box<dyn CounterSource>,
}

impl NetSampler {
    /// Build the platform-default counter source.
    ///
    /// Never fails: if enumeration errors out, the sampler falls back to
    /// an empty counter set and readings stay at zero for this run.
    pub fn new() -> Self {
        match default_source() {
            Ok(source) => Self { source },
            Err(err) => {
                tracing::warn!(%err, "counter enumeration failed; readings will stay at zero");
                Self {
                    source: Box::new(EmptySource),
                }
            }
        }
    }

    pub fn with_source(source: Box<dyn CounterSource>) -> Self {
        Self { source }
    }

    /// Sum all interface counters into this tick's reading.
    pub fn sample(&mut self) -> SampleReading {
        let mut down = 0.0;
        let mut up = 0.0;

        for iface in self.source.read() {
            // Error-as-zero: a failed read contributes nothing this tick
            // and the next tick re-reads the counter.
            match iface.down {
                Ok(v) => down += v,
                Err(err) => {
                    tracing::debug!(instance = %iface.instance, %err, "download counter read failed");
                }
            }
            match iface.up {
                Ok(v) => up += v,
                Err(err) => {
                    tracing::debug!(instance = %iface.instance, %err, "upload counter read failed");
                }
            }
        }

        SampleReading {
            down_bytes_per_sec: down,
            up_bytes_per_sec: up,
        }
    }
}

impl Default for NetSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Vec<(&'static str, Result<f64, u32>, Result<f64, u32>)>);

    impl CounterSource for FixedSource {
        fn read(&mut self) -> Vec<InterfaceReading> {
            self.0
                .iter()
                .copied()
                .map(|(name, down, up)| InterfaceReading {
                    instance: name.to_string(),
                    down: down.map_err(|status| CounterError::Read {
                        instance: name.to_string(),
                        status,
                    }),
                    up: up.map_err(|status| CounterError::Read {
                        instance: name.to_string(),
                        status,
                    }),
                })
                .collect()
        }
    }

    #[test]
    fn test_sample_with_no_counters_is_zero() {
        let mut sampler = NetSampler::with_source(Box::new(EmptySource));
        let reading = sampler.sample();
        assert_eq!(reading.down_bytes_per_sec, 0.0);
        assert_eq!(reading.up_bytes_per_sec, 0.0);
    }

    #[test]
    fn test_failed_counter_does_not_poison_siblings() {
        let mut sampler = NetSampler::with_source(Box::new(FixedSource(vec![
            ("eth0", Ok(1000.0), Ok(100.0)),
            ("eth1", Err(0x800007d5), Ok(50.0)),
            ("wlan0", Ok(250.0), Ok(25.0)),
        ])));

        let reading = sampler.sample();
        assert_eq!(reading.down_bytes_per_sec, 1250.0);
        assert_eq!(reading.up_bytes_per_sec, 175.0);
    }

    #[test]
    fn test_sample_is_recomputed_each_tick() {
        struct Alternating(bool);
        impl CounterSource for Alternating {
            fn read(&mut self) -> Vec<InterfaceReading> {
                self.0 = !self.0;
                let value = if self.0 { 2048.0 } else { 0.0 };
                vec![InterfaceReading {
                    instance: "eth0".to_string(),
                    down: Ok(value),
                    up: Ok(value / 4.0),
                }]
            }
        }

        let mut sampler = NetSampler::with_source(Box::new(Alternating(false)));
        assert_eq!(sampler.sample().down_bytes_per_sec, 2048.0);
        assert_eq!(sampler.sample().down_bytes_per_sec, 0.0);
        assert_eq!(sampler.sample().down_bytes_per_sec, 2048.0);
    }
}
