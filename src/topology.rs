//! Deciding which segments belong to the output.
//!
//! Every committed segment knows the segment just below it on the sweep line,
//! so the winding state just above a segment is the state above the segment
//! below it, plus the segment's own winding contributions. From the winding
//! state we work out which input multipolygons a point is inside, and then
//! the boolean operation tells us whether the segment separates an "inside
//! the result" region from an "outside the result" region.

use crate::input::{InputGeometry, MultiPolyIdx, PolyIdx, RingIdx};
use crate::segments::{SegIdx, SegVec, Segments};
use crate::{BinaryOp, Error};

/// The winding state on one side of a segment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    /// Net winding numbers, for every ring we've seen so far.
    pub windings: Vec<(RingIdx, i32)>,
    /// The multipolygons that this side is inside of.
    pub multi_polys: Vec<MultiPolyIdx>,
}

/// Is a point that's inside exactly `mps` inside the result of `op`?
pub fn is_inside(
    op: BinaryOp,
    mps: &[MultiPolyIdx],
    geom: &InputGeometry,
    num_multi_polys: usize,
) -> bool {
    match op {
        BinaryOp::Union => !mps.is_empty(),
        BinaryOp::Intersection => mps.len() == num_multi_polys,
        BinaryOp::Xor => mps.len() % 2 == 1,
        BinaryOp::Difference => matches!(mps, [mp] if geom.multi_poly(*mp).is_subject),
    }
}

/// The result membership of every segment.
#[derive(Clone, Debug)]
pub struct Topology {
    after: SegVec<Option<State>>,
    in_result: SegVec<bool>,
    interior_after: SegVec<bool>,
}

impl Topology {
    /// Classifies all the committed segments of a finished sweep.
    pub fn new(
        op: BinaryOp,
        segs: &Segments,
        geom: &InputGeometry,
        num_multi_polys: usize,
        processed: &[SegIdx],
    ) -> Result<Self, Error> {
        let n = segs.num_segments();
        let mut ret = Topology {
            after: SegVec::filled(None, n),
            in_result: SegVec::filled(false, n),
            interior_after: SegVec::filled(false, n),
        };

        let mut on_stack = SegVec::filled(false, n);
        for &s in processed {
            if segs.is_consumed(s) {
                continue;
            }
            ret.fill_after(segs, geom, s, &mut on_stack)?;

            let before = match segs.segment(s).prev {
                Some(p) => ret.after[segs.root(p)].as_ref(),
                None => None,
            };
            let before_mps = before.map(|b| &b.multi_polys[..]).unwrap_or(&[]);
            let after_mps = ret.after[s]
                .as_ref()
                .map(|a| &a.multi_polys[..])
                .unwrap_or(&[]);

            let inside_before = is_inside(op, before_mps, geom, num_multi_polys);
            let inside_after = is_inside(op, after_mps, geom, num_multi_polys);
            ret.in_result[s] = inside_before != inside_after;
            ret.interior_after[s] = inside_after;
        }

        Ok(ret)
    }

    /// Is this segment part of the output boundary?
    pub fn in_result(&self, s: SegIdx) -> bool {
        self.in_result[s]
    }

    /// Is the output's interior just above this segment (as opposed to just
    /// below it)?
    pub fn interior_after(&self, s: SegIdx) -> bool {
        self.interior_after[s]
    }

    pub fn after(&self, s: SegIdx) -> Option<&State> {
        self.after[s].as_ref()
    }

    /// The closest segment below `s` that's part of the output boundary.
    ///
    /// `new` rejects cycles in the `prev` chain, so this terminates.
    pub fn prev_in_result(&self, segs: &Segments, s: SegIdx) -> Option<SegIdx> {
        let mut below = segs.segment(s).prev.map(|p| segs.root(p));
        while let Some(b) = below {
            if self.in_result[b] {
                return Some(b);
            }
            below = segs.segment(b).prev.map(|p| segs.root(p));
        }
        None
    }

    /// Computes the state above `s`, and above everything below it.
    ///
    /// The chain of segments below `s` can be long, so we walk it with an
    /// explicit stack.
    fn fill_after(
        &mut self,
        segs: &Segments,
        geom: &InputGeometry,
        s: SegIdx,
        on_stack: &mut SegVec<bool>,
    ) -> Result<(), Error> {
        let mut stack = vec![s];
        on_stack[s] = true;

        while let Some(&top) = stack.last() {
            if self.after[top].is_some() {
                stack.pop();
                on_stack[top] = false;
                continue;
            }

            let below = segs.segment(top).prev.map(|p| segs.root(p));
            if let Some(below) = below {
                if self.after[below].is_none() {
                    if on_stack[below] {
                        let reason = format!("segment {top:?} is below itself");
                        tracing::error!("{reason}");
                        return Err(Error::InternalInvariantViolation { reason });
                    }
                    on_stack[below] = true;
                    stack.push(below);
                    continue;
                }
            }

            let empty = State::default();
            let before = below
                .and_then(|b| self.after[b].as_ref())
                .unwrap_or(&empty);
            let after = after_state(before, segs, geom, top);
            self.after[top] = Some(after);
            stack.pop();
            on_stack[top] = false;
        }
        Ok(())
    }
}

fn after_state(before: &State, segs: &Segments, geom: &InputGeometry, s: SegIdx) -> State {
    let mut windings = before.windings.clone();
    for &(ring, w) in &segs.segment(s).windings {
        match windings.iter_mut().find(|(r, _)| *r == ring) {
            Some((_, existing)) => *existing += w,
            None => windings.push((ring, w)),
        }
    }

    // Nonzero fill rule. A poly counts if we're inside its exterior ring and
    // not inside any of its holes.
    let mut polys: Vec<PolyIdx> = Vec::new();
    let mut excluded: Vec<PolyIdx> = Vec::new();
    for &(ring, w) in &windings {
        if w == 0 {
            continue;
        }
        let ring = geom.ring(ring);
        if excluded.contains(&ring.poly) {
            continue;
        }
        if ring.is_exterior {
            polys.push(ring.poly);
        } else {
            excluded.push(ring.poly);
            polys.retain(|&p| p != ring.poly);
        }
    }

    let mut multi_polys = Vec::new();
    for p in polys {
        let mp = geom.poly(p).multi_poly;
        if !multi_polys.contains(&mp) {
            multi_polys.push(mp);
        }
    }

    State {
        windings,
        multi_polys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Precision;
    use crate::sweep::SweepLine;
    use crate::{MultiPolygon, Options, Ring};

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
        vec![vec![x0, y0], vec![x1, y0], vec![x1, y1], vec![x0, y1]]
    }

    struct Setup {
        segs: Segments,
        geom: InputGeometry,
        processed: Vec<SegIdx>,
    }

    fn setup(inputs: &[MultiPolygon]) -> Setup {
        let mut segs = Segments::new(Precision::exact());
        let mut geom = InputGeometry::default();
        for (i, mp) in inputs.iter().enumerate() {
            geom.add_multi_poly(&mut segs, mp, i == 0).unwrap();
        }
        segs.consume_duplicates();
        let all: Vec<_> = segs.segment_indices().collect();
        let mut sweep = SweepLine::new(&mut segs);
        sweep.enqueue_segments(all);
        let processed = sweep.run(&Options::default()).unwrap();
        Setup {
            segs,
            geom,
            processed,
        }
    }

    fn result_count(setup: &Setup, op: BinaryOp) -> usize {
        let topo = Topology::new(
            op,
            &setup.segs,
            &setup.geom,
            setup.geom.num_multi_polys(),
            &setup.processed,
        )
        .unwrap();
        setup
            .processed
            .iter()
            .filter(|&&s| topo.in_result(s))
            .count()
    }

    #[test]
    fn inside_rules() {
        let mut segs = Segments::new(Precision::exact());
        let mut geom = InputGeometry::default();
        let subject = geom
            .add_multi_poly(&mut segs, &vec![vec![square(0.0, 0.0, 1.0, 1.0)]], true)
            .unwrap();
        let clip = geom
            .add_multi_poly(&mut segs, &vec![vec![square(2.0, 0.0, 3.0, 1.0)]], false)
            .unwrap();

        assert!(!is_inside(BinaryOp::Union, &[], &geom, 2));
        assert!(is_inside(BinaryOp::Union, &[clip], &geom, 2));
        assert!(is_inside(BinaryOp::Intersection, &[subject, clip], &geom, 2));
        assert!(!is_inside(BinaryOp::Intersection, &[clip], &geom, 2));
        assert!(is_inside(BinaryOp::Xor, &[clip], &geom, 2));
        assert!(!is_inside(BinaryOp::Xor, &[subject, clip], &geom, 2));
        assert!(is_inside(BinaryOp::Difference, &[subject], &geom, 2));
        assert!(!is_inside(BinaryOp::Difference, &[clip], &geom, 2));
        assert!(!is_inside(BinaryOp::Difference, &[subject, clip], &geom, 2));
    }

    #[test]
    fn single_square() {
        let setup = setup(&[vec![vec![square(0.0, 0.0, 1.0, 1.0)]]]);
        assert_eq!(result_count(&setup, BinaryOp::Union), 4);

        // The interior is above the bottom edge and below the top edge.
        let topo = Topology::new(BinaryOp::Union, &setup.segs, &setup.geom, 1, &setup.processed)
            .unwrap();
        for &s in &setup.processed {
            let horizontal = setup.segs.left_point(s).y == setup.segs.right_point(s).y;
            if horizontal {
                let bottom = setup.segs.left_point(s).y.is_zero();
                assert_eq!(topo.interior_after(s), bottom);
            }
        }
    }

    #[test]
    fn hole_is_excluded() {
        let setup = setup(&[vec![vec![
            square(0.0, 0.0, 4.0, 4.0),
            square(1.0, 1.0, 2.0, 2.0),
        ]]]);
        let topo = Topology::new(BinaryOp::Union, &setup.segs, &setup.geom, 1, &setup.processed)
            .unwrap();
        for &s in &setup.processed {
            assert!(topo.in_result(s));
            let state = topo.after(s).unwrap();
            let in_hole = setup.segs.left_point(s).y == crate::num::ExactNumber::from(1)
                && setup.segs.left_point(s).x >= crate::num::ExactNumber::from(1)
                && setup.segs.right_point(s).y == crate::num::ExactNumber::from(1);
            if in_hole {
                // Just above the bottom edge of the hole, we're inside the hole.
                assert!(state.multi_polys.is_empty());
            }
        }
    }

    #[test]
    fn overlapping_squares() {
        let subject = vec![vec![square(0.0, 0.0, 2.0, 2.0)]];
        let clip = vec![vec![square(1.0, 1.0, 3.0, 3.0)]];
        let setup = setup(&[subject, clip]);
        // Each square's boundary gets split into 6 pieces.
        assert_eq!(result_count(&setup, BinaryOp::Union), 8);
        assert_eq!(result_count(&setup, BinaryOp::Intersection), 4);
        assert_eq!(result_count(&setup, BinaryOp::Xor), 12);
        assert_eq!(result_count(&setup, BinaryOp::Difference), 6);
    }

    #[test]
    fn coincident_edges_cancel() {
        let left = vec![vec![square(0.0, 0.0, 1.0, 1.0)]];
        let right = vec![vec![square(1.0, 0.0, 2.0, 1.0)]];
        let setup = setup(&[left, right]);
        // The shared edge separates two inside regions, so it's not in the union.
        assert_eq!(result_count(&setup, BinaryOp::Union), 6);
        assert_eq!(result_count(&setup, BinaryOp::Intersection), 0);
    }
}
