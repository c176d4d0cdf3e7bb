//! Snap rounding of coordinates.
//!
//! When an epsilon is in effect, coordinates that are within epsilon of a
//! coordinate we've already seen get replaced by that earlier coordinate.
//! This makes sure that an intersection point that gets computed twice (say,
//! once from each pair of segments that meet there) ends up at exactly the
//! same place both times.

use std::cmp::Ordering;

use crate::geom::Vector;
use crate::num::{ExactNumber, Precision};
use crate::treevec::TreeVec;

/// Snap-rounds values along a single axis.
#[derive(Clone, Debug)]
pub struct CoordRounder {
    precision: Precision,
    seen: TreeVec<ExactNumber, 32>,
}

impl CoordRounder {
    /// Creates a rounder that already knows about zero, so that values that
    /// are nearly zero become exactly zero.
    pub fn new(precision: Precision) -> Self {
        let mut ret = CoordRounder {
            precision,
            seen: TreeVec::new(),
        };
        ret.round(ExactNumber::zero());
        ret
    }

    /// Returns the canonical representative of `v`.
    pub fn round(&mut self, v: ExactNumber) -> ExactNumber {
        let idx = self.seen.partition_point(|x| x < &v);
        if let Some(x) = self.seen.get(idx) {
            if x == &v {
                return v;
            }
        }

        // `idx` is the first element bigger than `v`, and `idx - 1` is the last
        // one smaller than it. Those are the only candidates for snapping.
        let neighbors = [idx.checked_sub(1), Some(idx)];
        for neighbor in neighbors.into_iter().flatten() {
            if let Some(x) = self.seen.get(neighbor) {
                if self.precision.compare(&v, x) == Ordering::Equal {
                    return x.clone();
                }
            }
        }

        self.seen.insert(idx, v.clone());
        v
    }
}

/// Snap-rounds points, one axis at a time.
#[derive(Clone, Debug)]
pub struct PointRounder {
    x: CoordRounder,
    y: CoordRounder,
}

impl PointRounder {
    pub fn new(precision: Precision) -> Self {
        PointRounder {
            x: CoordRounder::new(precision.clone()),
            y: CoordRounder::new(precision),
        }
    }

    pub fn round(&mut self, x: ExactNumber, y: ExactNumber) -> Vector {
        Vector::new(self.x.round(x), self.y.round(y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::tests::n;
    use proptest::prelude::*;

    fn eps_rounder() -> CoordRounder {
        CoordRounder::new(Precision::with_epsilon(n(f64::EPSILON)))
    }

    #[test]
    fn exact_rounder_is_identity() {
        let mut r = CoordRounder::new(Precision::exact());
        assert_eq!(r.round(n(3.0)), n(3.0));
        assert_eq!(r.round(n(1e-20)), n(1e-20));
        assert_eq!(r.round(n(3.0) + n(1e-20)), n(3.0) + n(1e-20));
    }

    #[test]
    fn snaps_to_existing_values() {
        let mut r = eps_rounder();
        let eps = n(f64::EPSILON);
        assert_eq!(r.round(n(1.0)), n(1.0));
        assert_eq!(r.round(n(1.0) + &eps), n(1.0));
        assert_eq!(r.round(n(1.0) - &eps), n(1.0));

        // Far enough away to be kept.
        let apart = n(1.0) + &eps * &n(3.0);
        assert_eq!(r.round(apart.clone()), apart);
        assert_eq!(r.round(apart.clone() + &eps), apart);
    }

    #[test]
    fn nearly_zero_becomes_zero() {
        let mut r = eps_rounder();
        assert_eq!(r.round(n(1e-17)), ExactNumber::zero());
        assert_eq!(r.round(n(-1e-17)), ExactNumber::zero());
        assert_eq!(r.round(n(1e-10)), n(1e-10));
    }

    #[test]
    fn point_rounder_axes_are_independent() {
        let mut r = PointRounder::new(Precision::with_epsilon(n(f64::EPSILON)));
        let eps = n(f64::EPSILON);
        let p = r.round(n(3.0), n(4.0));
        assert_eq!(p, Vector::new(n(3.0), n(4.0)));

        // The x axis has seen 3, so this snaps even though y never saw 3.
        let q = r.round(n(3.0) + &eps, n(5.0));
        assert_eq!(q, Vector::new(n(3.0), n(5.0)));
        let q = r.round(n(4.0) + &eps, n(5.0));
        assert_eq!(q, Vector::new(n(4.0) + &eps, n(5.0)));
    }

    proptest! {
        #[test]
        fn rounding_is_stable(
            xs in prop::collection::vec(-100i32..100, 1..40),
            jitter in prop::collection::vec(-2i32..=2, 1..40),
        ) {
            let mut r = eps_rounder();
            let eps = n(f64::EPSILON);
            let mut canon = Vec::new();
            for &x in &xs {
                canon.push(r.round(ExactNumber::from(x as i64)));
            }
            // Re-rounding something we've already seen, or something within
            // half an epsilon of it, always gives back the same value.
            for (i, &x) in xs.iter().enumerate() {
                let j = jitter[i % jitter.len()];
                let wiggle = &eps * &ExactNumber::from(j as i64) / &ExactNumber::from(4);
                let wiggled = ExactNumber::from(x as i64) + wiggle;
                prop_assert_eq!(r.round(canon[i].clone()), canon[i].clone());
                prop_assert_eq!(r.round(wiggled), canon[i].clone());
            }
        }
    }
}
