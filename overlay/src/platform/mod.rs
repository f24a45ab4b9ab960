//! Platform abstraction for the overlay window.
//!
//! The trait keeps the overlay code display-agnostic: the Windows backend
//! owns a layered Win32 window, while other targets get a headless
//! backend that only tracks geometry (it doubles as the test backend).
//!
//! Pointer events are reported with absolute cursor coordinates and the
//! drag policy lives entirely in `netpulse_core::controller` — backends
//! never move the window on their own.

use netpulse_core::geometry::{Point, Rect};
use thiserror::Error;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(target_os = "windows"))]
pub mod headless;

/// Information about a connected monitor.
#[derive(Debug, Clone)]
pub struct MonitorInfo {
    /// Device name reported by the OS.
    pub name: String,
    /// Full monitor bounds in virtual screen space.
    pub bounds: Rect,
    /// Bounds minus OS-reserved regions (taskbar, docks).
    pub work_area: Rect,
    pub is_primary: bool,
}

/// A pointer event with the cursor position in virtual screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
}

/// Errors from platform operations.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to register window class: {0}")]
    RegisterClass(String),

    #[error("failed to create window: {0}")]
    CreateWindow(String),

    #[error("pixel buffer error: {0}")]
    Buffer(String),

    #[error("failed to create tray icon: {0}")]
    Tray(String),
}

/// Window creation parameters.
#[derive(Debug, Clone)]
pub struct OverlayWindowConfig {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for OverlayWindowConfig {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 120,
            height: 40,
            title: "netpulse".to_string(),
        }
    }
}

/// Trait all platform backends implement.
pub trait OverlayPlatform: Sized {
    /// Create a borderless, always-on-top overlay window.
    fn new(config: OverlayWindowConfig) -> Result<Self, PlatformError>;

    fn x(&self) -> i32;
    fn y(&self) -> i32;
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn set_position(&mut self, x: i32, y: i32);
    fn set_size(&mut self, width: u32, height: u32);

    fn set_visible(&mut self, visible: bool);
    fn is_visible(&self) -> bool;

    /// Mutable access to the RGBA pixel buffer for the current size.
    fn pixel_buffer(&mut self) -> Option<&mut [u8]>;

    /// Present the current pixel buffer on screen.
    fn commit(&mut self);

    /// Pump pending window messages (non-blocking).
    /// Returns false once the window is gone.
    fn poll_events(&mut self) -> bool;

    /// Pointer events queued since the last call, oldest first.
    fn drain_pointer_events(&mut self) -> Vec<PointerEvent>;

    /// All connected monitors.
    fn monitors(&self) -> Vec<MonitorInfo>;

    /// Work area of the primary monitor, when one is reported.
    fn primary_work_area(&self) -> Option<Rect> {
        self.monitors()
            .into_iter()
            .find(|m| m.is_primary)
            .map(|m| m.work_area)
    }
}

#[cfg(target_os = "windows")]
pub use windows::WindowsOverlay as NativeOverlay;

#[cfg(not(target_os = "windows"))]
pub use headless::HeadlessOverlay as NativeOverlay;
