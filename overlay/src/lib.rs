//! netpulse overlay
//!
//! Presentation layer of the throughput overlay:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  speed                      │
//! │   SpeedOverlay (tick → render, drag wiring) │
//! ├─────────────────────────────────────────────┤
//! │                 renderer                    │
//! │     tiny-skia + cosmic-text (text + bg)     │
//! ├─────────────────────────────────────────────┤
//! │              platform / tray                │
//! │   Win32 layered window + Shell_NotifyIcon   │
//! │       (headless backend elsewhere)          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The overlay logic itself (placement, drag, visibility) lives in
//! `netpulse-core`; this crate adapts platform events into it and draws
//! what it decides.

pub mod platform;
pub mod renderer;
pub mod speed;
pub mod tray;

pub use platform::{NativeOverlay, OverlayPlatform, OverlayWindowConfig, PlatformError};
pub use speed::SpeedOverlay;
