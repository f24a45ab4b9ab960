//! netpulse core
//!
//! Platform-independent kernel of the netpulse throughput overlay:
//!
//! - [`sampler`] — network interface counter enumeration and per-tick
//!   summed readings, with per-counter failure isolation
//! - [`rate`] — byte-rate formatting and the two-line display text
//! - [`controller`] — the overlay window state machines (auto placement,
//!   drag session, visibility)
//! - [`config`] — optional TOML configuration
//!
//! Everything here runs without a display server; the `netpulse-overlay`
//! crate supplies rendering and the per-OS window/tray backends.

pub mod config;
pub mod controller;
pub mod geometry;
pub mod rate;
pub mod sampler;

pub use controller::OverlayController;
pub use sampler::{NetSampler, SampleReading};
