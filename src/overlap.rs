// Overlap-region construction: case analysis on center offsets vs.
// half-extent differences, rather than a naive max/min intersection, so
// that the "inner" box of a containment pair is selected by the narrower
// box's own sides.

use crate::types::Box2D;

/// Builds the overlap region between `a` and `b`. Callers only invoke this
/// when `occluded(a, b)` (or the symmetric check) has already established
/// that the two boxes truly intersect.
pub fn overlap(a: &Box2D, b: &Box2D) -> Box2D {
    let (cx_a, cy_a) = a.center();
    let (cx_b, cy_b) = b.center();
    let dx = cx_a - cx_b;
    let dy = cy_a - cy_b;
    let half_dw = (a.width() - b.width()).abs() / 2.0;
    let half_dh = (a.height() - b.height()).abs() / 2.0;

    if dx.abs() < half_dw && dy.abs() < half_dh {
        let inner = if a.width() <= b.width() && a.height() <= b.height() {
            a
        } else {
            b
        };
        return Box2D::new(inner.xmin, inner.ymin, inner.xmax, inner.ymax);
    }

    if dy.abs() < half_dh {
        let inner_y = if a.height() <= b.height() { a } else { b };
        return Box2D::new(
            a.xmin.max(b.xmin),
            inner_y.ymin,
            a.xmax.min(b.xmax),
            inner_y.ymax,
        );
    }

    if dx.abs() < half_dw {
        let inner_x = if a.width() <= b.width() { a } else { b };
        return Box2D::new(
            inner_x.xmin,
            a.ymin.max(b.ymin),
            inner_x.xmax,
            a.ymax.min(b.ymax),
        );
    }

    // proper corner overlap: the sign of dx * dy fixes which diagonal
    // quadrant the boxes share, and the standard per-axis clip lands
    // exactly on that quadrant's rectangle.
    Box2D::new(
        a.xmin.max(b.xmin),
        a.ymin.max(b.ymin),
        a.xmax.min(b.xmax),
        a.ymax.min(b.ymax),
    )
}
