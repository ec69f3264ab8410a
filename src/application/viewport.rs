// Viewport controller - drag-to-zoom and drag-to-pan over the time axis
use serde::{Deserialize, Serialize};

use crate::domain::zoom::{clamp_domain, shift_domain, ShiftDirection, TimeBounds, ZoomDomain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Leave,
}

/// Pointer input as reported by the chart renderer.
///
/// `ts` is the pointer position mapped to a data timestamp through the
/// chart's x scale, `px` the raw pixel x-coordinate inside the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    #[serde(default)]
    pub ts: Option<f64>,
    #[serde(default)]
    pub px: Option<f64>,
    #[serde(default)]
    pub plot_width: Option<f64>,
    #[serde(default)]
    pub modifier: bool,
}

/// One gesture at a time: the variant is the mutual exclusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Idle,
    Selecting {
        anchor: i64,
        current: i64,
    },
    Panning {
        origin: ZoomDomain,
        press_ts: Option<i64>,
        press_px: Option<f64>,
        /// Latest translated domain, applied on the next animation frame
        pending: Option<ZoomDomain>,
    },
}

/// Provisional drag-to-zoom rectangle, edges in data timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionArea {
    pub left: i64,
    pub right: i64,
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    zoom: Option<ZoomDomain>,
    bounds: Option<TimeBounds>,
    interaction: Interaction,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportController {
    pub fn new() -> Self {
        Self {
            zoom: None,
            bounds: None,
            interaction: Interaction::Idle,
        }
    }

    pub fn zoom(&self) -> Option<ZoomDomain> {
        self.zoom
    }

    pub fn bounds(&self) -> Option<TimeBounds> {
        self.bounds
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn selection(&self) -> Option<SelectionArea> {
        match self.interaction {
            Interaction::Selecting { anchor, current } => Some(SelectionArea { left: anchor, right: current }),
            _ => None,
        }
    }

    /// Track the extent of the loaded series. A zoom that the new extent no
    /// longer encloses is dropped back to full extent.
    pub fn set_bounds(&mut self, bounds: Option<TimeBounds>) {
        self.bounds = bounds;
        let still_valid = match (self.zoom, bounds) {
            (Some(zoom), Some(b)) => !b.is_degenerate() && b.encloses(&zoom),
            (Some(_), None) => false,
            (None, _) => true,
        };
        if !still_valid {
            tracing::debug!("Zoom {:?} outside data bounds {:?}, resetting", self.zoom, bounds);
            self.zoom = None;
            if matches!(self.interaction, Interaction::Panning { .. }) {
                self.interaction = Interaction::Idle;
            }
            return;
        }

        // A pan waiting for its frame was clamped against the old extent
        if let (Interaction::Panning { pending, .. }, Some(b)) = (&mut self.interaction, bounds) {
            *pending = pending.and_then(|p| clamp_domain(p, b));
        }
    }

    pub fn apply(&mut self, event: PointerEvent) {
        match event.kind {
            PointerKind::Down => self.pointer_down(event.ts, event.px, event.modifier),
            PointerKind::Move => self.pointer_move(event.ts, event.px, event.plot_width),
            PointerKind::Up => self.pointer_up(),
            PointerKind::Leave => self.pointer_leave(),
        }
    }

    pub fn pointer_down(&mut self, ts: Option<f64>, px: Option<f64>, modifier: bool) {
        self.flush();
        let ts = ts.and_then(to_timestamp);
        let px = px.filter(|p| p.is_finite());

        self.interaction = match self.zoom {
            Some(origin) if !modifier => {
                if ts.is_none() && px.is_none() {
                    Interaction::Idle
                } else {
                    Interaction::Panning { origin, press_ts: ts, press_px: px, pending: None }
                }
            }
            _ => match ts {
                Some(t) => Interaction::Selecting { anchor: t, current: t },
                None => Interaction::Idle,
            },
        };
    }

    pub fn pointer_move(&mut self, ts: Option<f64>, px: Option<f64>, plot_width: Option<f64>) {
        let ts = ts.and_then(to_timestamp);
        let bounds = self.bounds;

        match &mut self.interaction {
            Interaction::Idle => {}
            Interaction::Selecting { current, .. } => {
                if let Some(t) = ts {
                    *current = t;
                }
            }
            Interaction::Panning { origin, press_ts, press_px, pending } => {
                let Some(delta) = pan_delta(*origin, *press_ts, *press_px, ts, px, plot_width) else {
                    return;
                };
                let candidate = origin.translate(delta);
                let next = match bounds {
                    Some(b) => clamp_domain(candidate, b),
                    None => Some(candidate),
                };
                if next.is_some() {
                    *pending = next;
                }
            }
        }
    }

    pub fn pointer_up(&mut self) {
        match self.interaction {
            Interaction::Selecting { anchor, current } => {
                self.interaction = Interaction::Idle;
                if anchor == current {
                    return;
                }
                if let Some(selected) = ZoomDomain::spanning(anchor, current) {
                    self.zoom = match self.bounds {
                        Some(b) => clamp_domain(selected, b),
                        None => Some(selected),
                    };
                }
            }
            Interaction::Panning { .. } => {
                self.flush();
                self.interaction = Interaction::Idle;
            }
            Interaction::Idle => {}
        }
    }

    pub fn pointer_leave(&mut self) {
        if matches!(self.interaction, Interaction::Panning { .. }) {
            self.flush();
            self.interaction = Interaction::Idle;
        }
    }

    /// Apply the coalesced pan update, if any. Returns whether the zoom changed.
    pub fn animation_frame(&mut self) -> bool {
        if let Interaction::Panning { pending, .. } = &mut self.interaction {
            if let Some(next) = pending.take() {
                let changed = self.zoom != Some(next);
                self.zoom = Some(next);
                return changed;
            }
        }
        false
    }

    /// Synchronously apply any pending pan update
    pub fn flush(&mut self) {
        self.animation_frame();
    }

    /// Flush and drop any gesture in progress
    pub fn teardown(&mut self) {
        self.flush();
        self.interaction = Interaction::Idle;
    }

    pub fn shift(&mut self, direction: ShiftDirection) {
        if let (Some(zoom), Some(bounds)) = (self.zoom, self.bounds) {
            self.zoom = shift_domain(zoom, direction, bounds);
        }
    }

    pub fn reset(&mut self) {
        self.zoom = None;
        self.interaction = Interaction::Idle;
    }
}

fn to_timestamp(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.round() as i64)
}

/// Translation for a drag, in milliseconds. Dragging right moves the view
/// back in time. Pixel geometry is preferred over the timestamp under the
/// pointer since it does not depend on the x-axis sampling.
fn pan_delta(
    origin: ZoomDomain,
    press_ts: Option<i64>,
    press_px: Option<f64>,
    ts: Option<i64>,
    px: Option<f64>,
    plot_width: Option<f64>,
) -> Option<i64> {
    let width = plot_width.filter(|w| w.is_finite() && *w > 0.0);
    if let (Some(p0), Some(p), Some(w)) = (press_px, px.filter(|p| p.is_finite()), width) {
        let delta = (p0 - p) / w * origin.width() as f64;
        return Some(delta.round() as i64);
    }
    match (press_ts, ts) {
        (Some(t0), Some(t)) => Some(t0 - t),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoomed(from: i64, to: i64) -> ViewportController {
        let mut vp = ViewportController::new();
        vp.set_bounds(Some(TimeBounds::new(0, 100_000)));
        vp.pointer_down(Some(from as f64), None, false);
        vp.pointer_move(Some(to as f64), None, None);
        vp.pointer_up();
        vp
    }

    #[test]
    fn test_drag_selects_zoom_in_any_direction() {
        let vp = zoomed(60_000, 20_000);
        assert_eq!(vp.zoom(), ZoomDomain::new(20_000, 60_000));
        assert_eq!(vp.interaction(), Interaction::Idle);
    }

    #[test]
    fn test_click_without_drag_keeps_zoom() {
        let mut vp = ViewportController::new();
        vp.set_bounds(Some(TimeBounds::new(0, 100_000)));
        vp.pointer_down(Some(5_000.0), None, false);
        assert_eq!(vp.selection(), Some(SelectionArea { left: 5_000, right: 5_000 }));
        vp.pointer_up();

        assert_eq!(vp.zoom(), None);
        assert_eq!(vp.selection(), None);
    }

    #[test]
    fn test_pan_by_pixels_preserves_width() {
        let mut vp = zoomed(20_000, 40_000);

        vp.pointer_down(Some(30_000.0), Some(400.0), false);
        assert!(matches!(vp.interaction(), Interaction::Panning { .. }));

        // 100 px right on an 800 px plot = 1/8 of 20 s back in time
        vp.pointer_move(Some(32_500.0), Some(500.0), Some(800.0));
        assert_eq!(vp.zoom(), ZoomDomain::new(20_000, 40_000));

        assert!(vp.animation_frame());
        assert_eq!(vp.zoom(), ZoomDomain::new(17_500, 37_500));
        assert_eq!(vp.zoom().unwrap().width(), 20_000);
    }

    #[test]
    fn test_pan_falls_back_to_timestamps() {
        let mut vp = zoomed(20_000, 40_000);

        vp.pointer_down(Some(30_000.0), None, false);
        vp.pointer_move(Some(25_000.0), None, None);
        vp.pointer_up();

        assert_eq!(vp.zoom(), ZoomDomain::new(25_000, 45_000));
    }

    #[test]
    fn test_pan_clamps_at_bounds() {
        let mut vp = zoomed(10_000, 30_000);

        vp.pointer_down(None, Some(0.0), false);
        vp.pointer_move(None, Some(800.0), Some(800.0));
        vp.pointer_leave();

        assert_eq!(vp.zoom(), ZoomDomain::new(0, 20_000));
        assert_eq!(vp.interaction(), Interaction::Idle);
    }

    #[test]
    fn test_coalesced_moves_keep_latest_and_flush_on_up() {
        let mut vp = zoomed(20_000, 40_000);

        vp.pointer_down(Some(30_000.0), None, false);
        vp.pointer_move(Some(29_000.0), None, None);
        vp.pointer_move(Some(28_000.0), None, None);
        vp.pointer_move(Some(27_000.0), None, None);
        assert_eq!(vp.zoom(), ZoomDomain::new(20_000, 40_000));

        vp.pointer_up();
        assert_eq!(vp.zoom(), ZoomDomain::new(23_000, 43_000));
        assert!(!vp.animation_frame());
    }

    #[test]
    fn test_modifier_selects_while_zoomed() {
        let mut vp = zoomed(20_000, 60_000);

        vp.pointer_down(Some(30_000.0), None, true);
        vp.pointer_move(Some(35_000.0), None, None);
        assert_eq!(vp.selection(), Some(SelectionArea { left: 30_000, right: 35_000 }));
        vp.pointer_up();

        assert_eq!(vp.zoom(), ZoomDomain::new(30_000, 35_000));
    }

    #[test]
    fn test_teardown_flushes_pending_pan() {
        let mut vp = zoomed(20_000, 40_000);
        vp.pointer_down(Some(30_000.0), None, false);
        vp.pointer_move(Some(31_000.0), None, None);
        vp.teardown();

        assert_eq!(vp.zoom(), ZoomDomain::new(19_000, 39_000));
        assert_eq!(vp.interaction(), Interaction::Idle);
    }

    #[test]
    fn test_shrinking_bounds_reset_zoom() {
        let mut vp = zoomed(20_000, 40_000);
        vp.set_bounds(Some(TimeBounds::new(0, 200_000)));
        assert!(vp.zoom().is_some());

        vp.set_bounds(Some(TimeBounds::new(30_000, 200_000)));
        assert_eq!(vp.zoom(), None);
    }

    #[test]
    fn test_pending_pan_follows_narrowed_bounds() {
        let mut vp = zoomed(20_000, 40_000);

        vp.pointer_down(Some(30_000.0), None, false);
        vp.pointer_move(Some(60_000.0), None, None);
        vp.set_bounds(Some(TimeBounds::new(10_000, 100_000)));
        vp.pointer_up();

        assert_eq!(vp.zoom(), ZoomDomain::new(10_000, 30_000));
        assert_eq!(vp.interaction(), Interaction::Idle);
    }

    #[test]
    fn test_shift_and_reset() {
        let mut vp = zoomed(40_000, 60_000);
        vp.shift(ShiftDirection::Right);
        assert_eq!(vp.zoom(), ZoomDomain::new(45_000, 65_000));

        vp.reset();
        assert_eq!(vp.zoom(), None);
        vp.shift(ShiftDirection::Left);
        assert_eq!(vp.zoom(), None);
    }

    #[test]
    fn test_non_finite_pointer_is_ignored() {
        let mut vp = ViewportController::new();
        vp.pointer_down(Some(f64::NAN), None, false);
        assert_eq!(vp.interaction(), Interaction::Idle);
    }
}
