//! Planar geometry used to derive every target coordinate of a pattern.
//!
//! All functions are pure: the same rectangle and circle configuration always
//! produce bit-identical output, which keeps restarts reproducible.
//! Coordinates follow screen conventions, so `min_y` is the top edge.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Immutable 2D coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Axis aligned rectangle described by its edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Panics if the edges are inverted.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        assert!(
            min_x <= max_x && min_y <= max_y,
            "rect edges are inverted: ({min_x}, {min_y}) .. ({max_x}, {max_y})"
        );
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn mid_x(&self) -> f64 {
        self.min_x + self.width() * 0.5
    }

    pub fn mid_y(&self) -> f64 {
        self.min_y + self.height() * 0.5
    }

    pub fn center(&self) -> Point {
        Point::new(self.mid_x(), self.mid_y())
    }

    pub fn divided(&self, half: RectHalf) -> Rect {
        divide_rect(self, half)
    }
}

/// Ordered pair of points. Direction matters: renderers grow a line from
/// `start` towards `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointPair {
    pub start: Point,
    pub end: Point,
}

impl PointPair {
    pub const ZERO: PointPair = PointPair {
        start: Point::ZERO,
        end: Point::ZERO,
    };

    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// A zero-length pair anchored at `point`.
    pub const fn collapsed(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn flipped(self) -> Self {
        Self::new(self.end, self.start)
    }
}

/// Which half of a rectangle to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RectHalf {
    Top,
    Bottom,
    Left,
    Right,
}

/// Point `index` of `divisions` equally spaced points on the unit circle,
/// starting at angle zero.
pub fn unit_circle_point(divisions: usize, index: usize) -> Point {
    assert!(divisions > 0, "a circle needs at least one division");
    assert!(
        index < divisions,
        "circle index {index} out of range for {divisions} divisions"
    );

    let degrees = 360.0 / divisions as f64 * index as f64;
    let radians = degrees.to_radians();
    Point::new(radians.cos(), radians.sin())
}

/// All `divisions` circle points for the given radius and center, in
/// increasing-angle order.
pub fn circle_points(radius: f64, center: Point, divisions: usize) -> Vec<Point> {
    (0..divisions)
        .map(|index| {
            unit_circle_point(divisions, index)
                .scaled(radius)
                .offset(center.x, center.y)
        })
        .collect()
}

/// Infinite for vertical pairs; callers handle that case themselves.
pub fn slope(a: Point, b: Point) -> f64 {
    (b.y - a.y) / (b.x - a.x)
}

pub fn clamp(value: f64, range: RangeInclusive<f64>) -> f64 {
    if value <= *range.start() {
        *range.start()
    } else if value >= *range.end() {
        *range.end()
    } else {
        value
    }
}

/// Intersection of the infinite lines through `a` and `b`.
///
/// Panics if the lines are parallel, coincident or one of them is vertical.
pub fn intersect(a: PointPair, b: PointPair) -> Point {
    let m1 = slope(a.start, a.end);
    let m2 = slope(b.start, b.end);
    let dm = m2 - m1;

    assert!(
        dm.is_finite() && dm != 0.0,
        "lines {a:?} and {b:?} have no single intersection"
    );

    let b1 = a.start.y - m1 * a.start.x;
    let b2 = b.start.y - m2 * b.start.x;

    let x = (b1 - b2) / dm;
    let y = m1 * (b1 - b2) / dm + b1;
    Point::new(x, y)
}

/// Extends the line through `a` and `b` to where it leaves `rect`.
pub fn bounded_line(a: Point, b: Point, rect: &Rect) -> PointPair {
    if a.x == b.x {
        return PointPair::new(Point::new(a.x, rect.min_y), Point::new(b.x, rect.max_y));
    }

    if a.y == b.y {
        return PointPair::new(Point::new(rect.min_x, a.y), Point::new(rect.max_x, b.y));
    }

    let m = slope(a, b);
    let intercept = a.y - m * a.x;
    let xs = rect.min_x..=rect.max_x;
    let ys = rect.min_y..=rect.max_y;

    let y1 = clamp(m * rect.min_x + intercept, ys.clone());
    let y2 = clamp(m * rect.max_x + intercept, ys);

    // The x solved at each horizontal edge has to pair with the y solved at
    // the vertical edge on the same end of the line.
    let (x1, x2) = if m > 0.0 {
        (
            clamp((rect.min_y - intercept) / m, xs.clone()),
            clamp((rect.max_y - intercept) / m, xs),
        )
    } else {
        (
            clamp((rect.max_y - intercept) / m, xs.clone()),
            clamp((rect.min_y - intercept) / m, xs),
        )
    };

    PointPair::new(Point::new(x1, y1), Point::new(x2, y2))
}

pub fn divide_rect(rect: &Rect, half: RectHalf) -> Rect {
    match half {
        RectHalf::Top => Rect::new(rect.min_x, rect.min_y, rect.max_x, rect.mid_y()),
        RectHalf::Bottom => Rect::new(rect.min_x, rect.mid_y(), rect.max_x, rect.max_y),
        RectHalf::Left => Rect::new(rect.min_x, rect.min_y, rect.mid_x(), rect.max_y),
        RectHalf::Right => Rect::new(rect.mid_x(), rect.min_y, rect.max_x, rect.max_y),
    }
}
