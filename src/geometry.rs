//! Area descriptors: point, circle, and axis-aligned square/rectangle.
//!
//! Square/square and point/square intersection tests use exact decimal
//! arithmetic (no approximate comparisons). Any test involving a circle may
//! fall back to `f64` — a disc's intersection with anything else is
//! inherently an approximate geometric test in this system.

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point {
        center_x: BigDecimal,
        center_y: BigDecimal,
    },
    Circle {
        center_x: BigDecimal,
        center_y: BigDecimal,
        /// Diameter.
        width: BigDecimal,
    },
    Square {
        center_x: BigDecimal,
        center_y: BigDecimal,
        width: BigDecimal,
    },
}

impl Geometry {
    pub fn center_x(&self) -> &BigDecimal {
        match self {
            Geometry::Point { center_x, .. }
            | Geometry::Circle { center_x, .. }
            | Geometry::Square { center_x, .. } => center_x,
        }
    }

    pub fn center_y(&self) -> &BigDecimal {
        match self {
            Geometry::Point { center_y, .. }
            | Geometry::Circle { center_y, .. }
            | Geometry::Square { center_y, .. } => center_y,
        }
    }

    /// `None` for a point (it has no extent).
    pub fn width(&self) -> Option<&BigDecimal> {
        match self {
            Geometry::Point { .. } => None,
            Geometry::Circle { width, .. } | Geometry::Square { width, .. } => Some(width),
        }
    }

    fn half_width(&self) -> Option<BigDecimal> {
        self.width().map(|w| w / BigDecimal::from(2))
    }

    fn to_f64_pair(&self) -> (f64, f64) {
        (
            self.center_x().to_f64().unwrap_or(0.0),
            self.center_y().to_f64().unwrap_or(0.0),
        )
    }

    /// Symmetric for all variant pairs.
    pub fn intersects(&self, other: &Geometry) -> bool {
        use Geometry::*;
        match (self, other) {
            (Point { .. }, Point { .. }) => {
                self.center_x() == other.center_x() && self.center_y() == other.center_y()
            }
            (Square { .. }, Square { .. }) => square_square(self, other),
            (Point { .. }, Square { .. }) => point_in_square(self, other),
            (Square { .. }, Point { .. }) => point_in_square(other, self),
            (Circle { .. }, Circle { .. }) => circle_circle(self, other),
            (Circle { .. }, Point { .. }) => circle_point(self, other),
            (Point { .. }, Circle { .. }) => circle_point(other, self),
            (Circle { .. }, Square { .. }) => circle_square(self, other),
            (Square { .. }, Circle { .. }) => circle_square(other, self),
        }
    }
}

fn square_square(a: &Geometry, b: &Geometry) -> bool {
    let a_half = a.half_width().expect("square has a width");
    let b_half = b.half_width().expect("square has a width");

    let a_min_x = a.center_x() - &a_half;
    let a_max_x = a.center_x() + &a_half;
    let a_min_y = a.center_y() - &a_half;
    let a_max_y = a.center_y() + &a_half;

    let b_min_x = b.center_x() - &b_half;
    let b_max_x = b.center_x() + &b_half;
    let b_min_y = b.center_y() - &b_half;
    let b_max_y = b.center_y() + &b_half;

    a_min_x <= b_max_x && a_max_x >= b_min_x && a_min_y <= b_max_y && a_max_y >= b_min_y
}

fn point_in_square(point: &Geometry, square: &Geometry) -> bool {
    let half = square.half_width().expect("square has a width");
    let min_x = square.center_x() - &half;
    let max_x = square.center_x() + &half;
    let min_y = square.center_y() - &half;
    let max_y = square.center_y() + &half;

    point.center_x() >= &min_x
        && point.center_x() <= &max_x
        && point.center_y() >= &min_y
        && point.center_y() <= &max_y
}

fn circle_point(circle: &Geometry, point: &Geometry) -> bool {
    let (cx, cy) = circle.to_f64_pair();
    let (px, py) = point.to_f64_pair();
    let radius = circle
        .width()
        .and_then(|w| w.to_f64())
        .unwrap_or(0.0)
        / 2.0;
    let dx = cx - px;
    let dy = cy - py;
    (dx * dx + dy * dy).sqrt() <= radius
}

fn circle_circle(a: &Geometry, b: &Geometry) -> bool {
    let (ax, ay) = a.to_f64_pair();
    let (bx, by) = b.to_f64_pair();
    let ra = a.width().and_then(|w| w.to_f64()).unwrap_or(0.0) / 2.0;
    let rb = b.width().and_then(|w| w.to_f64()).unwrap_or(0.0) / 2.0;
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt() <= ra + rb
}

fn circle_square(circle: &Geometry, square: &Geometry) -> bool {
    let (cx, cy) = circle.to_f64_pair();
    let radius = circle.width().and_then(|w| w.to_f64()).unwrap_or(0.0) / 2.0;
    let (sx, sy) = square.to_f64_pair();
    let half = square.width().and_then(|w| w.to_f64()).unwrap_or(0.0) / 2.0;

    let closest_x = cx.clamp(sx - half, sx + half);
    let closest_y = cy.clamp(sy - half, sy + half);
    let dx = cx - closest_x;
    let dy = cy - closest_y;
    (dx * dx + dy * dy).sqrt() <= radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn square(cx: &str, cy: &str, w: &str) -> Geometry {
        Geometry::Square {
            center_x: dec(cx),
            center_y: dec(cy),
            width: dec(w),
        }
    }

    fn point(cx: &str, cy: &str) -> Geometry {
        Geometry::Point {
            center_x: dec(cx),
            center_y: dec(cy),
        }
    }

    fn circle(cx: &str, cy: &str, diameter: &str) -> Geometry {
        Geometry::Circle {
            center_x: dec(cx),
            center_y: dec(cy),
            width: dec(diameter),
        }
    }

    #[test]
    fn squares_overlap_exactly_at_shared_edge() {
        let a = square("0", "0", "2"); // [-1, 1]
        let b = square("2", "0", "2"); // [1, 3]
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn squares_do_not_overlap_when_separated() {
        let a = square("0", "0", "2");
        let b = square("3", "0", "2");
        assert!(!a.intersects(&b));
    }

    #[test]
    fn point_on_square_boundary_intersects() {
        let p = point("1", "1");
        let s = square("0", "0", "2");
        assert!(p.intersects(&s));
        assert!(s.intersects(&p));
    }

    #[test]
    fn point_outside_square_does_not_intersect() {
        let p = point("5", "5");
        let s = square("0", "0", "2");
        assert!(!p.intersects(&s));
    }

    #[test]
    fn circle_point_distance_exactly_at_radius_intersects() {
        let c = circle("0", "0", "10"); // radius 5
        let p = point("5", "0");
        assert!(c.intersects(&p));
    }

    #[test]
    fn circle_circle_touching_intersects() {
        let a = circle("0", "0", "4"); // r=2
        let b = circle("4", "0", "4"); // r=2, centers 4 apart == r_a+r_b
        assert!(a.intersects(&b));
    }

    #[test]
    fn circle_square_corner_case() {
        let c = circle("3", "3", "2"); // r=1 centered at (3,3)
        let s = square("0", "0", "4"); // [-2,2]x[-2,2]
        // Closest point on square to (3,3) is (2,2): distance = sqrt(2) > 1
        assert!(!c.intersects(&s));

        let c2 = circle("2.5", "2.5", "2"); // r=1, closer
        assert!(c2.intersects(&s));
    }

    #[test]
    fn intersects_is_order_independent() {
        let a = circle("0", "0", "4");
        let b = square("1", "0", "2");
        assert_eq!(a.intersects(&b), b.intersects(&a));
    }
}
