//! The network speed overlay.
//!
//! Glues the pieces together: platform pointer events are routed into the
//! core controller's drag machine, and each 1 Hz tick formats the
//! reading, resizes the window to the text's natural bounds, applies the
//! controller's placement decision and redraws.
//!
//! The window size equals the measured text exactly — the text touches
//! the edges, matching the original utility.

use tiny_skia::Color;

use netpulse_core::config::AppearanceConfig;
use netpulse_core::controller::OverlayController;
use netpulse_core::geometry::{Rect, Size};
use netpulse_core::rate;
use netpulse_core::sampler::SampleReading;

use crate::platform::{OverlayPlatform, OverlayWindowConfig, PlatformError, PointerEvent};
use crate::renderer::Renderer;

/// Background matches the original utility's dark gray window.
const BACKGROUND_RGB: (u8, u8, u8) = (30, 30, 30);
const CORNER_RADIUS: f32 = 4.0;

pub struct SpeedOverlay<P: OverlayPlatform> {
    window: P,
    renderer: Renderer,
    controller: OverlayController,
    appearance: AppearanceConfig,
    text: String,
}

impl<P: OverlayPlatform> SpeedOverlay<P> {
    pub fn new(appearance: AppearanceConfig) -> Result<Self, PlatformError> {
        let window = P::new(OverlayWindowConfig::default())?;
        let controller = OverlayController::new(Size {
            width: window.width(),
            height: window.height(),
        });

        Ok(Self {
            window,
            renderer: Renderer::new(),
            controller,
            appearance,
            text: String::new(),
        })
    }

    /// Pump window events and route pointer events through the drag
    /// machine. Returns false once the window is gone.
    pub fn pump(&mut self) -> bool {
        if !self.window.poll_events() {
            return false;
        }

        let work_area = self.work_area();
        for event in self.window.drain_pointer_events() {
            match event {
                PointerEvent::Down(cursor) => self.controller.on_drag_start(cursor),
                PointerEvent::Move(cursor) => {
                    if let Some(pos) = self.controller.on_drag_move(cursor, work_area) {
                        self.window.set_position(pos.x, pos.y);
                    }
                }
                PointerEvent::Up => self.controller.on_drag_end(),
            }
        }
        true
    }

    /// One tick: format the reading, resize to the text's natural bounds,
    /// auto-position while the placement phase allows it, redraw.
    pub fn on_tick(&mut self, reading: SampleReading) {
        self.text = rate::display_text(&reading);

        let (text_w, text_h) = self
            .renderer
            .measure_text(&self.text, self.appearance.font_size);
        let size = Size {
            width: (text_w.ceil() as u32).max(1),
            height: (text_h.ceil() as u32).max(1),
        };

        let auto_position = self.controller.on_tick(size, self.work_area());
        self.window.set_size(size.width, size.height);
        if let Some(pos) = auto_position {
            self.window.set_position(pos.x, pos.y);
        }

        self.render();
    }

    /// Flip visibility; bound to the tray icon's double-click.
    pub fn toggle_visible(&mut self) {
        let visible = self.controller.toggle_visible();
        self.window.set_visible(visible);
    }

    pub fn window(&self) -> &P {
        &self.window
    }

    /// Mutable access to the underlying window
    pub fn window_mut(&mut self) -> &mut P {
        &mut self.window
    }

    fn work_area(&self) -> Rect {
        self.window.primary_work_area().unwrap_or(Rect {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        })
    }

    fn render(&mut self) {
        let width = self.window.width();
        let height = self.window.height();
        let (r, g, b) = BACKGROUND_RGB;
        let bg = Color::from_rgba8(r, g, b, self.appearance.background_alpha);
        let font_size = self.appearance.font_size;

        let Some(buffer) = self.window.pixel_buffer() else {
            return;
        };

        self.renderer
            .clear(buffer, width, height, Color::TRANSPARENT);
        self.renderer.fill_rounded_rect(
            buffer,
            width,
            height,
            0.0,
            0.0,
            width as f32,
            height as f32,
            CORNER_RADIUS,
            bg,
        );
        self.renderer.draw_text(
            buffer,
            width,
            height,
            &self.text,
            0.0,
            0.0,
            font_size,
            Color::WHITE,
        );

        self.window.commit();
    }
}

#[cfg(not(target_os = "windows"))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessOverlay;
    use netpulse_core::geometry::Point;

    fn reading(down: f64, up: f64) -> SampleReading {
        SampleReading {
            down_bytes_per_sec: down,
            up_bytes_per_sec: up,
        }
    }

    #[test]
    fn test_window_parks_bottom_right_then_follows_drag() {
        let mut overlay =
            SpeedOverlay::<HeadlessOverlay>::new(AppearanceConfig::default()).unwrap();

        // Ticks 0 and 1: bottom-right of the 1920x1080 headless work area
        // for whatever size the text measured to.
        overlay.on_tick(reading(2048.0, 512.0));
        let (w, h) = (overlay.window().width(), overlay.window().height());
        assert_eq!(overlay.window().x(), 1920 - w as i32);
        assert_eq!(overlay.window().y(), 1080 - h as i32);

        overlay.on_tick(reading(2048.0, 512.0));
        let settled = Point {
            x: overlay.window().x(),
            y: overlay.window().y(),
        };

        // Drag: press at the settled corner, move 40px up-left.
        let window = overlay.window_mut();
        window.push_pointer_event(PointerEvent::Down(Point { x: 1900, y: 1070 }));
        window.push_pointer_event(PointerEvent::Move(Point { x: 1860, y: 1030 }));
        window.push_pointer_event(PointerEvent::Up);
        assert!(overlay.pump());
        assert_eq!(overlay.window().x(), settled.x - 40);
        assert_eq!(overlay.window().y(), settled.y - 40);

        // Later ticks keep the dragged position.
        overlay.on_tick(reading(0.0, 0.0));
        assert_eq!(overlay.window().x(), settled.x - 40);
        assert_eq!(overlay.window().y(), settled.y - 40);
    }

    #[test]
    fn test_toggle_visible_round_trip() {
        let mut overlay =
            SpeedOverlay::<HeadlessOverlay>::new(AppearanceConfig::default()).unwrap();
        assert!(overlay.window().is_visible());
        overlay.toggle_visible();
        assert!(!overlay.window().is_visible());
        overlay.toggle_visible();
        assert!(overlay.window().is_visible());
    }
}
