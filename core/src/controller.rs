//! Overlay window state machines.
//!
//! [`OverlayController`] is the single owner of the overlay's window
//! state: position, size, visibility, the auto-placement phase and the
//! in-flight drag session. The platform layer feeds it events and applies
//! whatever geometry it returns; no window state lives anywhere else.

use crate::geometry::{Point, Rect, Size};

/// Number of ticks the window is auto-positioned after creation.
///
/// The window parks itself in the bottom-right corner while the first
/// readings establish its size, then stops fighting the user's position.
const AUTO_POSITION_TICKS: u8 = 2;

/// Auto-placement phase. `Settled` is terminal: once reached, resizes
/// never trigger a reposition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementPhase {
    AutoPending(u8),
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging {
        anchor_cursor: Point,
        anchor_window: Point,
    },
}

pub struct OverlayController {
    position: Point,
    size: Size,
    visible: bool,
    phase: PlacementPhase,
    drag: DragState,
}

impl OverlayController {
    pub fn new(initial_size: Size) -> Self {
        Self {
            position: Point { x: 0, y: 0 },
            size: initial_size,
            visible: true,
            phase: PlacementPhase::AutoPending(0),
            drag: DragState::Idle,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn phase(&self) -> PlacementPhase {
        self.phase
    }

    /// Record this tick's measured text size; while the placement phase
    /// is pending, compute the bottom-right position for that size and
    /// advance the phase.
    ///
    /// Returns the position to apply, or `None` once settled. Dragging
    /// never resets the phase — a drag during the pending ticks is
    /// overridden by the next auto-position.
    pub fn on_tick(&mut self, text_size: Size, work_area: Rect) -> Option<Point> {
        self.size = text_size;

        match self.phase {
            PlacementPhase::AutoPending(count) => {
                let position = Point {
                    x: work_area.right - self.size.width as i32,
                    y: work_area.bottom - self.size.height as i32,
                };
                self.position = position;
                self.phase = if count + 1 >= AUTO_POSITION_TICKS {
                    PlacementPhase::Settled
                } else {
                    PlacementPhase::AutoPending(count + 1)
                };
                Some(position)
            }
            PlacementPhase::Settled => None,
        }
    }

    /// Begin a drag: remember where the cursor and the window were.
    pub fn on_drag_start(&mut self, cursor: Point) {
        self.drag = DragState::Dragging {
            anchor_cursor: cursor,
            anchor_window: self.position,
        };
    }

    /// Move the window by the cursor delta, keeping the whole rectangle
    /// inside the work area. Returns the clamped position to apply, or
    /// `None` when no drag is active.
    pub fn on_drag_move(&mut self, cursor: Point, work_area: Rect) -> Option<Point> {
        let DragState::Dragging {
            anchor_cursor,
            anchor_window,
        } = self.drag
        else {
            return None;
        };

        let mut x = anchor_window.x + (cursor.x - anchor_cursor.x);
        let mut y = anchor_window.y + (cursor.y - anchor_cursor.y);
        let width = self.size.width as i32;
        let height = self.size.height as i32;

        // Clamp order matters: right/bottom are applied last so they win
        // when the window is larger than the work area.
        if x < work_area.left {
            x = work_area.left;
        }
        if y < work_area.top {
            y = work_area.top;
        }
        if x + width > work_area.right {
            x = work_area.right - width;
        }
        if y + height > work_area.bottom {
            y = work_area.bottom - height;
        }

        self.position = Point { x, y };
        Some(self.position)
    }

    pub fn on_drag_end(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Flip visibility and return the new state. The tray double-click is
    /// the only caller.
    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::display_text;
    use crate::sampler::{CounterSource, InterfaceReading, NetSampler};

    const WORK_AREA: Rect = Rect {
        left: 0,
        top: 0,
        right: 1920,
        bottom: 1080,
    };

    fn size(width: u32, height: u32) -> Size {
        Size { width, height }
    }

    #[test]
    fn test_auto_position_tracks_size_for_first_two_ticks() {
        let mut ctrl = OverlayController::new(size(1, 1));

        // Tick 0: positioned bottom-right for this tick's size.
        assert_eq!(
            ctrl.on_tick(size(80, 30), WORK_AREA),
            Some(Point { x: 1840, y: 1050 })
        );
        // Tick 1: size changed, position recomputed to match.
        assert_eq!(
            ctrl.on_tick(size(120, 40), WORK_AREA),
            Some(Point { x: 1800, y: 1040 })
        );
        // Ticks 2..4: settled; size changes no longer move the window.
        for tick_size in [size(90, 35), size(200, 60), size(120, 40)] {
            assert_eq!(ctrl.on_tick(tick_size, WORK_AREA), None);
            assert_eq!(ctrl.position(), Point { x: 1800, y: 1040 });
        }
        assert_eq!(ctrl.phase(), PlacementPhase::Settled);
    }

    #[test]
    fn test_drag_clamps_to_work_area_edges() {
        let mut ctrl = OverlayController::new(size(1, 1));
        ctrl.on_tick(size(100, 40), WORK_AREA);
        ctrl.on_tick(size(100, 40), WORK_AREA);

        // Drag far off the top-left corner.
        ctrl.on_drag_start(Point { x: 500, y: 500 });
        let pos = ctrl.on_drag_move(Point { x: -5000, y: -5000 }, WORK_AREA);
        assert_eq!(pos, Some(Point { x: 0, y: 0 }));

        // Same drag continues far off the bottom-right corner.
        let pos = ctrl.on_drag_move(Point { x: 9000, y: 9000 }, WORK_AREA);
        assert_eq!(pos, Some(Point { x: 1820, y: 1040 }));
        ctrl.on_drag_end();
        assert!(!ctrl.is_dragging());
    }

    #[test]
    fn test_oversized_window_clamps_to_right_bottom() {
        let mut ctrl = OverlayController::new(size(1, 1));
        let narrow = Rect {
            left: 0,
            top: 0,
            right: 80,
            bottom: 30,
        };
        ctrl.on_tick(size(100, 40), narrow);
        ctrl.on_tick(size(100, 40), narrow);

        ctrl.on_drag_start(Point { x: 10, y: 10 });
        // Window is larger than the area: left/top clamps are overwritten
        // by the right/bottom clamps.
        let pos = ctrl.on_drag_move(Point { x: 0, y: 0 }, narrow);
        assert_eq!(pos, Some(Point { x: -20, y: -10 }));
    }

    #[test]
    fn test_drag_move_without_start_is_ignored() {
        let mut ctrl = OverlayController::new(size(100, 40));
        assert_eq!(ctrl.on_drag_move(Point { x: 50, y: 50 }, WORK_AREA), None);
    }

    #[test]
    fn test_drag_before_settling_is_overridden_by_auto_position() {
        let mut ctrl = OverlayController::new(size(1, 1));
        ctrl.on_tick(size(100, 40), WORK_AREA);

        ctrl.on_drag_start(Point { x: 1850, y: 1050 });
        ctrl.on_drag_move(Point { x: 500, y: 500 }, WORK_AREA);
        ctrl.on_drag_end();
        assert_ne!(ctrl.position(), Point { x: 1820, y: 1040 });

        // The second pending tick still parks the window bottom-right.
        assert_eq!(
            ctrl.on_tick(size(100, 40), WORK_AREA),
            Some(Point { x: 1820, y: 1040 })
        );
    }

    #[test]
    fn test_toggle_visible_flips_flag_only() {
        let mut ctrl = OverlayController::new(size(100, 40));
        ctrl.on_tick(size(100, 40), WORK_AREA);
        let position = ctrl.position();

        assert!(ctrl.is_visible());
        assert!(!ctrl.toggle_visible());
        assert!(ctrl.toggle_visible());
        assert_eq!(ctrl.position(), position);
    }

    #[test]
    fn test_end_to_end_sample_format_place_drag() {
        struct Constant;
        impl CounterSource for Constant {
            fn read(&mut self) -> Vec<InterfaceReading> {
                vec![InterfaceReading {
                    instance: "Ethernet".to_string(),
                    down: Ok(2048.0),
                    up: Ok(512.0),
                }]
            }
        }

        let mut sampler = NetSampler::with_source(Box::new(Constant));
        let mut ctrl = OverlayController::new(size(1, 1));

        let text = display_text(&sampler.sample());
        assert_eq!(text, "↓ 2.0 KB/s\n↑ 512.0 B/s");

        // Ticks 0 and 1: bottom-right for the measured size.
        let measured = size(100, 40);
        assert_eq!(
            ctrl.on_tick(measured, WORK_AREA),
            Some(Point { x: 1820, y: 1040 })
        );
        assert_eq!(
            ctrl.on_tick(measured, WORK_AREA),
            Some(Point { x: 1820, y: 1040 })
        );

        // User drags the settled window to (100, 100).
        ctrl.on_drag_start(Point { x: 1850, y: 1050 });
        assert_eq!(
            ctrl.on_drag_move(Point { x: 130, y: 110 }, WORK_AREA),
            Some(Point { x: 100, y: 100 })
        );
        ctrl.on_drag_end();

        // New readings keep arriving; the position no longer moves.
        assert_eq!(ctrl.on_tick(measured, WORK_AREA), None);
        assert_eq!(ctrl.on_tick(size(110, 40), WORK_AREA), None);
        assert_eq!(ctrl.position(), Point { x: 100, y: 100 });
    }
}
