//! netpulse — live network throughput in a small always-on-top overlay.
//!
//! The process is parameterless: no CLI flags, no required configuration.
//! A single thread owns the window, the sampler and the tray icon;
//! pointer and tray events are drained between 1 Hz sampling ticks.

use std::time::{Duration, Instant};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use netpulse_core::config::AppConfig;
use netpulse_core::sampler::NetSampler;
use netpulse_overlay::platform::NativeOverlay;
use netpulse_overlay::speed::SpeedOverlay;
use netpulse_overlay::tray::{TrayEvent, TrayIcon};
use netpulse_overlay::PlatformError;

fn main() -> Result<(), PlatformError> {
    init_logging();

    let config = AppConfig::load();
    let interval = Duration::from_millis(config.sample_interval_ms);

    let mut sampler = NetSampler::new();
    let mut overlay = SpeedOverlay::<NativeOverlay>::new(config.appearance)?;
    let mut tray = TrayIcon::new("netpulse")?;

    tracing::info!(interval_ms = interval.as_millis() as u64, "netpulse started");

    // First update runs immediately so the window sizes itself to real
    // text before it is ever seen.
    overlay.on_tick(sampler.sample());
    let mut last_tick = Instant::now();

    loop {
        if !overlay.pump() {
            tracing::info!("overlay window closed");
            break;
        }

        let mut exit = false;
        for event in tray.drain_events() {
            match event {
                TrayEvent::ToggleOverlay => overlay.toggle_visible(),
                TrayEvent::Exit => exit = true,
            }
        }
        if exit {
            tracing::info!("exit requested from tray");
            break;
        }

        if last_tick.elapsed() >= interval {
            overlay.on_tick(sampler.sample());
            last_tick = Instant::now();
        }

        // Keep the loop responsive for drags without busy-waiting.
        std::thread::sleep(Duration::from_millis(10));
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .init();
}
