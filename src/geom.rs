//! Geometric primitives: vectors, bounding boxes and predicates.
//!
//! Everything here works with [`ExactNumber`]s, so (apart from division and
//! square roots, which round) the results are exact.

use std::cmp::Ordering;

use crate::num::{ExactNumber, Precision};

/// A two-dimensional vector, also used as a point.
///
/// Points are ordered by `x` and then by `y`, which is the order in which
/// the sweep line visits them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Vector {
    /// Horizontal coordinate.
    pub x: ExactNumber,
    /// Vertical coordinate.
    pub y: ExactNumber,
}

impl Ord for Vector {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x.cmp(&other.x).then_with(|| self.y.cmp(&other.y))
    }
}

impl PartialOrd for Vector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Debug for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Vector {
    pub fn new(x: ExactNumber, y: ExactNumber) -> Self {
        Vector { x, y }
    }

    /// Converts a pair of floats, failing if either one isn't finite.
    pub fn from_f64(x: f64, y: f64) -> Result<Self, crate::num::NonFiniteError> {
        Ok(Vector {
            x: ExactNumber::try_from(x)?,
            y: ExactNumber::try_from(y)?,
        })
    }

    /// The coordinates, rounded to the nearest floats.
    pub fn to_f64(&self) -> [f64; 2] {
        [self.x.to_f64(), self.y.to_f64()]
    }
}

impl<'a> std::ops::Sub<&'a Vector> for &'a Vector {
    type Output = Vector;

    fn sub(self, rhs: &'a Vector) -> Vector {
        Vector {
            x: &self.x - &rhs.x,
            y: &self.y - &rhs.y,
        }
    }
}

/// The z-component of the cross product `a × b`.
pub fn cross_product(a: &Vector, b: &Vector) -> ExactNumber {
    &a.x * &b.y - &a.y * &b.x
}

pub fn dot_product(a: &Vector, b: &Vector) -> ExactNumber {
    &a.x * &b.x + &a.y * &b.y
}

pub fn length(v: &Vector) -> ExactNumber {
    dot_product(v, v).sqrt()
}

/// Rotates `v` by a quarter turn counter-clockwise.
#[cfg(test)]
pub fn perpendicular(v: &Vector) -> Vector {
    Vector {
        x: -&v.y,
        y: v.x.clone(),
    }
}

/// The sine of the angle from `angle - shared` to `base - shared`.
///
/// All three points must be distinct.
pub fn sine_of_angle(shared: &Vector, base: &Vector, angle: &Vector) -> ExactNumber {
    let v_base = base - shared;
    let v_angle = angle - shared;
    cross_product(&v_angle, &v_base) / length(&v_angle) / length(&v_base)
}

/// The cosine of the angle between `angle - shared` and `base - shared`.
///
/// All three points must be distinct.
pub fn cosine_of_angle(shared: &Vector, base: &Vector, angle: &Vector) -> ExactNumber {
    let v_base = base - shared;
    let v_angle = angle - shared;
    dot_product(&v_angle, &v_base) / length(&v_angle) / length(&v_base)
}

/// Compares the directions `a - shared` and `b - shared` by how far
/// clockwise they are from `base - shared`, going clockwise from `base`
/// through a full turn.
///
/// Directions closer (clockwise) to `base` compare smaller.
pub fn compare_vector_angles(
    shared: &Vector,
    base: &Vector,
    a: &Vector,
    b: &Vector,
) -> Ordering {
    let a_sine = sine_of_angle(shared, base, a);
    let b_sine = sine_of_angle(shared, base, b);
    let a_above = !a_sine.is_negative();
    let b_above = !b_sine.is_negative();
    match (a_above, b_above) {
        // Both in the first half-turn: the one whose cosine is bigger is closer.
        (true, true) => {
            cosine_of_angle(shared, base, b).cmp(&cosine_of_angle(shared, base, a))
        }
        // Both in the second half-turn: now a smaller cosine is closer.
        (false, false) => {
            cosine_of_angle(shared, base, a).cmp(&cosine_of_angle(shared, base, b))
        }
        _ => b_sine.cmp(&a_sine),
    }
}

/// Where the line through `pt` in direction `v` crosses the vertical line at `x`.
pub fn vertical_intersection(pt: &Vector, v: &Vector, x: &ExactNumber) -> Option<Vector> {
    if v.x.is_zero() {
        return None;
    }
    let y = &pt.y + &(&v.y / &v.x) * &(x - &pt.x);
    Some(Vector::new(x.clone(), y))
}

/// Where the line through `pt` in direction `v` crosses the horizontal line at `y`.
pub fn horizontal_intersection(pt: &Vector, v: &Vector, y: &ExactNumber) -> Option<Vector> {
    if v.y.is_zero() {
        return None;
    }
    let x = &pt.x + &(&v.x / &v.y) * &(y - &pt.y);
    Some(Vector::new(x, y.clone()))
}

/// Intersects two infinite lines, each given by a point and a direction.
///
/// Returns `None` if the lines are parallel.
pub fn intersection(pt1: &Vector, v1: &Vector, pt2: &Vector, v2: &Vector) -> Option<Vector> {
    // Axis-aligned lines get exact answers, which also guarantees that the
    // intersection doesn't fall off the end of a segment because of rounding.
    if v1.x.is_zero() {
        return vertical_intersection(pt2, v2, &pt1.x);
    }
    if v2.x.is_zero() {
        return vertical_intersection(pt1, v1, &pt2.x);
    }
    if v1.y.is_zero() {
        return horizontal_intersection(pt2, v2, &pt1.y);
    }
    if v2.y.is_zero() {
        return horizontal_intersection(pt1, v1, &pt2.y);
    }

    let kross = cross_product(v1, v2);
    if kross.is_zero() {
        return None;
    }

    let ve = pt2 - pt1;
    let d1 = cross_product(&ve, v1) / &kross;
    let d2 = cross_product(&ve, v2) / &kross;

    // Each line gives its own estimate of the crossing; average them.
    let two = ExactNumber::from(2);
    let x1 = &pt1.x + &(&d2 * &v1.x);
    let x2 = &pt2.x + &(&d1 * &v2.x);
    let y1 = &pt1.y + &(&d2 * &v1.y);
    let y2 = &pt2.y + &(&d1 * &v2.y);
    Some(Vector::new((x1 + x2) / &two, (y1 + y2) / &two))
}

/// The orientation of the triangle `a`, `b`, `c`.
///
/// Returns 1 if `b` is to the left of the directed line from `a` to `c`
/// (i.e. `a`, `b`, `c` turn clockwise), -1 if it's to the right, and 0 if the
/// three points are colinear. With an epsilon, points whose squared area is
/// at most `epsilon * |c - a|^2` count as colinear.
pub fn orient(a: &Vector, b: &Vector, c: &Vector, precision: &Precision) -> i32 {
    let area2 = &(&a.y - &c.y) * &(&b.x - &c.x) - &(&a.x - &c.x) * &(&b.y - &c.y);
    if let Some(eps) = precision.epsilon() {
        let l = &c.x - &a.x;
        let r = &c.y - &a.y;
        let len2 = &l * &l + &r * &r;
        if &area2 * &area2 <= &len2 * eps {
            return 0;
        }
    }
    area2.signum()
}

/// An axis-aligned bounding box, with inclusive boundaries.
#[derive(Clone, PartialEq, Eq)]
pub struct Bbox {
    /// Lower left corner.
    pub ll: Vector,
    /// Upper right corner.
    pub ur: Vector,
}

impl std::fmt::Debug for Bbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?} -- {:?}]", self.ll, self.ur)
    }
}

impl Bbox {
    /// The degenerate box containing a single point.
    pub fn from_point(p: &Vector) -> Self {
        Bbox {
            ll: p.clone(),
            ur: p.clone(),
        }
    }

    /// The smallest box containing two points.
    pub fn from_points(p: &Vector, q: &Vector) -> Self {
        Bbox {
            ll: Vector::new(
                std::cmp::min(&p.x, &q.x).clone(),
                std::cmp::min(&p.y, &q.y).clone(),
            ),
            ur: Vector::new(
                std::cmp::max(&p.x, &q.x).clone(),
                std::cmp::max(&p.y, &q.y).clone(),
            ),
        }
    }

    pub fn contains(&self, p: &Vector) -> bool {
        self.ll.x <= p.x && p.x <= self.ur.x && self.ll.y <= p.y && p.y <= self.ur.y
    }

    pub fn contains_bbox(&self, other: &Bbox) -> bool {
        self.contains(&other.ll) && self.contains(&other.ur)
    }

    /// Grows this box to contain `p`.
    pub fn expand(&mut self, p: &Vector) {
        if p.x < self.ll.x {
            self.ll.x = p.x.clone();
        }
        if p.y < self.ll.y {
            self.ll.y = p.y.clone();
        }
        if p.x > self.ur.x {
            self.ur.x = p.x.clone();
        }
        if p.y > self.ur.y {
            self.ur.y = p.y.clone();
        }
    }

    /// Grows this box to contain `other`.
    pub fn union(&mut self, other: &Bbox) {
        self.expand(&other.ll);
        self.expand(&other.ur);
    }

    /// The intersection of two boxes.
    ///
    /// Boxes that only touch have a degenerate (point or line) overlap; this
    /// returns `None` only if the boxes are disjoint.
    pub fn overlap(&self, other: &Bbox) -> Option<Bbox> {
        if other.ur.x < self.ll.x
            || self.ur.x < other.ll.x
            || other.ur.y < self.ll.y
            || self.ur.y < other.ll.y
        {
            return None;
        }

        Some(Bbox {
            ll: Vector::new(
                std::cmp::max(&self.ll.x, &other.ll.x).clone(),
                std::cmp::max(&self.ll.y, &other.ll.y).clone(),
            ),
            ur: Vector::new(
                std::cmp::min(&self.ur.x, &other.ur.x).clone(),
                std::cmp::min(&self.ur.y, &other.ur.y).clone(),
            ),
        })
    }
}
