//! Portable counter source backed by cumulative interface totals.
//!
//! `sysinfo` exposes total bytes received/transmitted since boot per
//! interface; rates are the per-interface deltas divided by the elapsed
//! wall time since the previous refresh. The first sample has no baseline
//! and reads as zero.

use std::collections::HashMap;
use std::time::Instant;

use sysinfo::Networks;

use super::{CounterSource, InterfaceReading};

pub struct NetdevSource {
    networks: Networks,
    /// Previous totals per interface: name -> (rx_bytes, tx_bytes)
    prev: HashMap<String, (u64, u64)>,
    last_refresh: Option<Instant>,
}

impl NetdevSource {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
            prev: HashMap::new(),
            last_refresh: None,
        }
    }
}

impl Default for NetdevSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for NetdevSource {
    fn read(&mut self) -> Vec<InterfaceReading> {
        self.networks.refresh(true);

        let now = Instant::now();
        let elapsed = self
            .last_refresh
            .map(|t| now.duration_since(t).as_secs_f64());
        self.last_refresh = Some(now);

        let mut readings = Vec::new();
        for (name, data) in self.networks.iter() {
            let rx = data.total_received();
            let tx = data.total_transmitted();

            let (down, up) = match (self.prev.get(name.as_str()), elapsed) {
                (Some(&(prev_rx, prev_tx)), Some(secs)) if secs > 0.0 => (
                    rx.saturating_sub(prev_rx) as f64 / secs,
                    tx.saturating_sub(prev_tx) as f64 / secs,
                ),
                _ => (0.0, 0.0),
            };
            self.prev.insert(name.clone(), (rx, tx));

            readings.push(InterfaceReading {
                instance: name.clone(),
                down: Ok(down),
                up: Ok(up),
            });
        }
        readings
    }
}
