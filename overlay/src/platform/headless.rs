//! Headless backend: geometry bookkeeping without a display.
//!
//! Used on targets without the Win32 backend and as the backend for
//! overlay tests. Reports a single 1920x1080 primary monitor whose work
//! area equals its bounds; tests can replace the monitor list and inject
//! pointer events.

use std::mem;

use netpulse_core::geometry::Rect;

use super::{MonitorInfo, OverlayPlatform, OverlayWindowConfig, PlatformError, PointerEvent};

pub struct HeadlessOverlay {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    visible: bool,
    pixel_data: Vec<u8>,
    pointer_events: Vec<PointerEvent>,
    monitors: Vec<MonitorInfo>,
}

impl HeadlessOverlay {
    /// Queue a pointer event, as the real backend's message pump would.
    pub fn push_pointer_event(&mut self, event: PointerEvent) {
        self.pointer_events.push(event);
    }

    /// Replace the reported monitor list.
    pub fn set_monitors(&mut self, monitors: Vec<MonitorInfo>) {
        self.monitors = monitors;
    }
}

impl OverlayPlatform for HeadlessOverlay {
    fn new(config: OverlayWindowConfig) -> Result<Self, PlatformError> {
        let bounds = Rect {
            left: 0,
            top: 0,
            right: 1920,
            bottom: 1080,
        };
        Ok(Self {
            x: config.x,
            y: config.y,
            width: config.width,
            height: config.height,
            visible: true,
            pixel_data: vec![0u8; (config.width * config.height * 4) as usize],
            pointer_events: Vec::new(),
            monitors: vec![MonitorInfo {
                name: "headless-0".to_string(),
                bounds,
                work_area: bounds,
                is_primary: true,
            }],
        })
    }

    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixel_data.resize((width * height * 4) as usize, 0);
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn pixel_buffer(&mut self) -> Option<&mut [u8]> {
        Some(&mut self.pixel_data)
    }

    fn commit(&mut self) {}

    fn poll_events(&mut self) -> bool {
        true
    }

    fn drain_pointer_events(&mut self) -> Vec<PointerEvent> {
        mem::take(&mut self.pointer_events)
    }

    fn monitors(&self) -> Vec<MonitorInfo> {
        self.monitors.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netpulse_core::geometry::Point;

    #[test]
    fn test_geometry_bookkeeping() {
        let mut overlay = HeadlessOverlay::new(OverlayWindowConfig::default()).unwrap();
        overlay.set_size(100, 40);
        overlay.set_position(1820, 1040);
        assert_eq!((overlay.x(), overlay.y()), (1820, 1040));
        assert_eq!((overlay.width(), overlay.height()), (100, 40));
        assert_eq!(overlay.pixel_buffer().map(|b| b.len()), Some(100 * 40 * 4));

        overlay.set_visible(false);
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_pointer_events_drain_in_order() {
        let mut overlay = HeadlessOverlay::new(OverlayWindowConfig::default()).unwrap();
        overlay.push_pointer_event(PointerEvent::Down(Point { x: 10, y: 10 }));
        overlay.push_pointer_event(PointerEvent::Up);

        let events = overlay.drain_pointer_events();
        assert_eq!(
            events,
            vec![PointerEvent::Down(Point { x: 10, y: 10 }), PointerEvent::Up]
        );
        assert!(overlay.drain_pointer_events().is_empty());
    }

    #[test]
    fn test_primary_work_area_reported() {
        let overlay = HeadlessOverlay::new(OverlayWindowConfig::default()).unwrap();
        let wa = overlay.primary_work_area().unwrap();
        assert_eq!((wa.right, wa.bottom), (1920, 1080));
    }
}
