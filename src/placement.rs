use crate::geometry::{Canvas, Rect};

/// Native page size in PDF points (1/72 inch).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageSize {
    pub width_pts: f64,
    pub height_pts: f64,
}

/// Placement rectangle in page space. Origin bottom-left, y-up.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width_pts: f64,
    pub height_pts: f64,
}

/// Project a canvas-space rectangle onto the page.
///
/// Horizontal and vertical scales are independent (the preview need not
/// preserve the page aspect ratio). The y flip anchors the rectangle's
/// bottom edge: `y = pageHeight - (rect.y + rect.height) * scaleY`.
pub fn map_to_page(rect: Rect, canvas: Canvas, page: PageSize) -> Placement {
    let scale_x = page.width_pts / canvas.width;
    let scale_y = page.height_pts / canvas.height;
    Placement {
        x: rect.x * scale_x,
        y: page.height_pts - (rect.y + rect.height) * scale_y,
        width_pts: rect.width * scale_x,
        height_pts: rect.height * scale_y,
    }
}

/// Inverse of [`map_to_page`].
pub fn map_to_canvas(placement: Placement, canvas: Canvas, page: PageSize) -> Rect {
    let scale_x = page.width_pts / canvas.width;
    let scale_y = page.height_pts / canvas.height;
    let height = placement.height_pts / scale_y;
    Rect {
        x: placement.x / scale_x,
        y: (page.height_pts - placement.y) / scale_y - height,
        width: placement.width_pts / scale_x,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn letter() -> PageSize {
        PageSize {
            width_pts: 612.0,
            height_pts: 792.0,
        }
    }

    #[test]
    fn maps_canvas_rect_onto_letter_page() {
        // canvas 600x800, rect {250,350,100,100} -> scaleX 1.02, scaleY 0.99
        let canvas = Canvas::new(600.0, 800.0).unwrap();
        let rect = Rect::new(250.0, 350.0, 100.0, 100.0);

        let p = map_to_page(rect, canvas, letter());
        assert!((p.x - 255.0).abs() < TOL);
        assert!((p.width_pts - 102.0).abs() < TOL);
        assert!((p.height_pts - 99.0).abs() < TOL);
        assert!((p.y - (792.0 - 450.0 * 0.99)).abs() < TOL);
    }

    #[test]
    fn round_trip_reproduces_rect() {
        let canvas = Canvas::new(640.0, 480.0).unwrap();
        let rect = Rect::new(12.5, 300.25, 77.0, 41.5);

        let back = map_to_canvas(map_to_page(rect, canvas, letter()), canvas, letter());
        assert!((back.x - rect.x).abs() < TOL);
        assert!((back.y - rect.y).abs() < TOL);
        assert!((back.width - rect.width).abs() < TOL);
        assert!((back.height - rect.height).abs() < TOL);
    }

    #[test]
    fn mapping_is_stable_under_repeated_calls() {
        let canvas = Canvas::new(600.0, 800.0).unwrap();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let a = map_to_page(rect, canvas, letter());
        let b = map_to_page(rect, canvas, letter());
        assert_eq!(a, b);
    }

    #[test]
    fn rect_at_canvas_bottom_lands_at_page_origin() {
        let canvas = Canvas::new(600.0, 800.0).unwrap();
        let rect = Rect::new(0.0, 700.0, 100.0, 100.0);
        let p = map_to_page(rect, canvas, letter());
        assert!((p.y - 0.0).abs() < TOL);
    }
}
