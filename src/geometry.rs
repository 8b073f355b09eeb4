use crate::error::{FlipbookError, FlipbookResult};

/// Smallest edge the placement rectangle may shrink to, in canvas pixels.
pub const MIN_RECT_SIZE: f64 = 10.0;

/// Preview surface dimensions, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> FlipbookResult<Self> {
        if !(width > 0.0 && height > 0.0) {
            return Err(FlipbookError::state("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }
}

/// Placement rectangle on the preview canvas. Origin top-left, y-down.
///
/// A `Rect` produced by user edits may be out of bounds; [`Rect::clamped`]
/// re-establishes the invariants after every mutation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp into the canvas: edges at least [`MIN_RECT_SIZE`] (capped by the
    /// canvas itself), fully inside `[0, canvas]` on both axes. Idempotent.
    pub fn clamped(self, canvas: Canvas) -> Rect {
        let width = self.width.max(MIN_RECT_SIZE).min(canvas.width);
        let height = self.height.max(MIN_RECT_SIZE).min(canvas.height);
        let x = self.x.max(0.0).min(canvas.width - width);
        let y = self.y.max(0.0).min(canvas.height - height);
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(600.0, 800.0).unwrap()
    }

    #[test]
    fn canvas_rejects_non_positive_dims() {
        assert!(Canvas::new(0.0, 10.0).is_err());
        assert!(Canvas::new(10.0, -1.0).is_err());
    }

    #[test]
    fn clamp_keeps_in_bounds_rect_unchanged() {
        let r = Rect::new(250.0, 350.0, 100.0, 100.0);
        assert_eq!(r.clamped(canvas()), r);
    }

    #[test]
    fn clamp_enforces_min_size() {
        let r = Rect::new(10.0, 10.0, 2.0, 3.0).clamped(canvas());
        assert_eq!(r.width, MIN_RECT_SIZE);
        assert_eq!(r.height, MIN_RECT_SIZE);
    }

    #[test]
    fn clamp_pulls_rect_back_inside() {
        let r = Rect::new(590.0, 795.0, 100.0, 100.0).clamped(canvas());
        assert_eq!(r.x + r.width, 600.0);
        assert_eq!(r.y + r.height, 800.0);
        assert!(r.x >= 0.0 && r.y >= 0.0);
    }

    #[test]
    fn clamp_caps_oversized_rect_at_canvas() {
        let r = Rect::new(-50.0, -50.0, 10_000.0, 10_000.0).clamped(canvas());
        assert_eq!(r, Rect::new(0.0, 0.0, 600.0, 800.0));
    }

    #[test]
    fn clamp_is_idempotent() {
        let cases = [
            Rect::new(-5.0, -5.0, 4.0, 4.0),
            Rect::new(700.0, 900.0, 50.0, 50.0),
            Rect::new(0.0, 0.0, 600.0, 800.0),
            Rect::new(123.4, 567.8, 33.0, 44.0),
        ];
        for r in cases {
            let once = r.clamped(canvas());
            assert_eq!(once.clamped(canvas()), once);
        }
    }
}
