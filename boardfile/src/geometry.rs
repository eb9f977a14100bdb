//! Points, sizes and the rotation helpers used for footprint placement.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

use crate::units::{clamp_biu, Biu};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: Biu,
    pub y: Biu,
}

impl Point {
    pub const fn new(x: Biu, y: Biu) -> Self {
        Self { x, y }
    }

    /// Rotate around the origin. Positive angles turn clockwise on screen
    /// (Y axis pointing down), which is counter-clockwise in board terms.
    pub fn rotated(self, degrees: f64) -> Point {
        let degrees = normalize_degrees(degrees);
        if degrees == 0.0 {
            return self;
        }
        if degrees == 90.0 {
            return Point::new(self.y, -self.x);
        }
        if degrees == 180.0 {
            return Point::new(-self.x, -self.y);
        }
        if degrees == 270.0 {
            return Point::new(-self.y, self.x);
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (x, y) = (self.x as f64, self.y as f64);
        Point::new(clamp_biu(y * sin + x * cos), clamp_biu(y * cos - x * sin))
    }

    pub fn rotated_about(self, center: Point, degrees: f64) -> Point {
        (self - center).rotated(degrees) + center
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: Biu,
    pub height: Biu,
}

impl Size {
    pub const fn new(width: Biu, height: Biu) -> Self {
        Self { width, height }
    }

    pub const fn square(side: Biu) -> Self {
        Self::new(side, side)
    }
}

/// Angles are kept at 1e-4 degree resolution so that converting between
/// absolute and footprint-relative orientation is exact.
pub fn round_angle(degrees: f64) -> f64 {
    let rounded = (degrees * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Fold into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let folded = round_angle(degrees.rem_euclid(360.0));
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// Convert an arc stored as center, start point and sweep angle into the
/// start/mid/end form.
pub fn arc_from_center(center: Point, start: Point, sweep_degrees: f64) -> (Point, Point, Point) {
    let mid = start.rotated_about(center, -sweep_degrees / 2.0);
    let end = start.rotated_about(center, -sweep_degrees);
    (start, mid, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quadrants_exact() {
        let p = Point::new(1000, 0);
        assert_eq!(p.rotated(90.0), Point::new(0, -1000));
        assert_eq!(p.rotated(180.0), Point::new(-1000, 0));
        assert_eq!(p.rotated(270.0), Point::new(0, 1000));
        assert_eq!(p.rotated(-90.0), Point::new(0, 1000));
        assert_eq!(p.rotated(360.0), p);
    }

    #[test]
    fn test_rotate_about_center() {
        let c = Point::new(100, 100);
        assert_eq!(Point::new(200, 100).rotated_about(c, 180.0), Point::new(0, 100));
    }

    #[test]
    fn test_round_angle_cancels_float_noise() {
        let local = 0.1;
        let footprint = 0.2;
        let absolute = round_angle(local + footprint);
        assert_eq!(round_angle(absolute - footprint), local);
    }

    #[test]
    fn test_arc_from_center_half_circle() {
        let (start, mid, end) = arc_from_center(Point::new(0, 0), Point::new(1000, 0), 180.0);
        assert_eq!(start, Point::new(1000, 0));
        assert_eq!(end, Point::new(-1000, 0));
        assert_eq!(mid.x, 0);
        assert_eq!(mid.y.abs(), 1000);
    }
}
