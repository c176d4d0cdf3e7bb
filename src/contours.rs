//! Turning the result segments back into rings and polygons.

use kurbo::BezPath;

use crate::geom::{self, Bbox, Vector};
use crate::num::{ExactNumber, Precision};
use crate::segments::{EventIdx, PointIdx, SegIdx, SegVec, Segments};
use crate::topology::Topology;
use crate::{Error, MultiPolygon, Polygon, Ring};

fn internal(reason: String) -> Error {
    tracing::error!("{reason}");
    Error::InternalInvariantViolation { reason }
}

/// Walks the result segments, returning closed loops of events.
///
/// Each loop is walked with the result's interior on its left, so exterior
/// boundaries come out counter-clockwise and holes come out clockwise. The
/// first and last events of a loop are at the same point.
pub fn walk_rings(
    segs: &Segments,
    topo: &Topology,
    processed: &[SegIdx],
) -> Result<Vec<Vec<EventIdx>>, Error> {
    let mut assigned = SegVec::filled(false, segs.num_segments());
    let mut rings = Vec::new();

    // The events at the same point as `at` that we could continue along.
    let available = |at: EventIdx, assigned: &SegVec<bool>| -> Vec<EventIdx> {
        segs.events_at(segs.event(at).point)
            .iter()
            .copied()
            .filter(|&e| {
                let s = segs.event(e).segment;
                e != at && !assigned[s] && topo.in_result(s)
            })
            .collect()
    };

    for &s in processed {
        if !topo.in_result(s) || assigned[s] {
            continue;
        }

        let seg = segs.segment(s);
        let (start, mut next) = if topo.interior_after(s) {
            (seg.left, seg.right)
        } else {
            (seg.right, seg.left)
        };
        let start_point = segs.event(start).point;
        let mut events = vec![start];
        let mut event = start;
        let mut prev;
        // Points with more than one way out, and where in `events` we were
        // when we first left them.
        let mut junctions: Vec<(PointIdx, usize)> = Vec::new();

        loop {
            prev = event;
            event = next;
            events.push(event);

            let point = segs.event(event).point;
            if point == start_point {
                break;
            }

            loop {
                let options = available(event, &assigned);
                match options.as_slice() {
                    [] => {
                        return Err(internal(format!(
                            "ring starting at {:?} got stuck at {:?}",
                            segs.point(start_point),
                            segs.point(point),
                        )));
                    }
                    [only] => {
                        next = segs.other(*only);
                        break;
                    }
                    _ => {}
                }

                // Back at a junction: everything since we left it is a
                // closed loop of its own.
                if let Some(j) = junctions.iter().position(|(p, _)| *p == point) {
                    let (_, idx) = junctions[j];
                    junctions.truncate(j);
                    let mut ring = events.split_off(idx);
                    let first = *ring
                        .first()
                        .ok_or_else(|| internal("empty loop at a junction".to_owned()))?;
                    ring.insert(0, segs.other(first));
                    for &e in &ring {
                        assigned[segs.event(e).segment] = true;
                    }
                    rings.push(ring);

                    // Carry on from where we first arrived at the junction.
                    let &[.., p, e] = events.as_slice() else {
                        return Err(internal("loop was cut off too early".to_owned()));
                    };
                    prev = p;
                    event = e;
                    continue;
                }

                junctions.push((point, events.len()));
                let leftmost = options
                    .iter()
                    .copied()
                    .min_by(|&a, &b| segs.leftmost_compare(event, prev, a, b))
                    .ok_or_else(|| internal("no way out of a junction".to_owned()))?;
                next = segs.other(leftmost);
                break;
            }
        }

        for &e in &events {
            assigned[segs.event(e).segment] = true;
        }
        rings.push(events);
    }

    Ok(rings)
}

/// Removes points where the ring goes straight (or doubles back on itself).
fn simplify(mut points: Vec<Vector>, precision: &Precision) -> Vec<Vector> {
    let mut changed = true;
    while changed && points.len() >= 3 {
        changed = false;
        let n = points.len();
        let mut out: Vec<Vector> = Vec::with_capacity(n);
        for i in 0..n {
            let prev = out.last().unwrap_or(&points[n - 1]);
            let next = &points[(i + 1) % n];
            if geom::orient(prev, &points[i], next, precision) == 0 {
                changed = true;
                continue;
            }
            out.push(points[i].clone());
        }
        points = out;
    }
    points
}

/// Twice the signed area of a ring; positive for counter-clockwise rings.
fn signed_area(points: &[Vector]) -> ExactNumber {
    let n = points.len();
    let mut area = ExactNumber::zero();
    for i in 0..n {
        area = area + geom::cross_product(&points[i], &points[(i + 1) % n]);
    }
    area
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Location {
    Inside,
    Outside,
    Boundary,
}

fn locate(ring: &[Vector], p: &Vector) -> Location {
    let exact = Precision::exact();
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        if geom::orient(a, p, b, &exact) == 0 && Bbox::from_points(a, b).contains(p) {
            return Location::Boundary;
        }
        if (a.y > p.y) != (b.y > p.y) {
            // Does the edge cross the horizontal ray going right from `p`?
            let side = geom::cross_product(&(b - a), &(p - a)).signum();
            let upward = b.y > a.y;
            if (upward && side > 0) || (!upward && side < 0) {
                inside = !inside;
            }
        }
    }
    if inside {
        Location::Inside
    } else {
        Location::Outside
    }
}

#[derive(Debug)]
struct RingOut {
    points: Vec<Vector>,
    area: ExactNumber,
    bbox: Bbox,
}

impl RingOut {
    fn encloses(&self, hole: &RingOut) -> bool {
        if !self.bbox.contains_bbox(&hole.bbox) {
            return false;
        }
        let n = hole.points.len();
        let midpoints = (0..n).map(|i| {
            let a = &hole.points[i];
            let b = &hole.points[(i + 1) % n];
            let two = ExactNumber::from(2);
            Vector::new((&a.x + &b.x) / &two, (&a.y + &b.y) / &two)
        });
        for p in hole.points.iter().cloned().chain(midpoints) {
            match locate(&self.points, &p) {
                Location::Inside => return true,
                Location::Outside => return false,
                Location::Boundary => {}
            }
        }
        false
    }

    /// Converts to `f64` coordinates, closing the ring.
    ///
    /// Points that become equal after conversion are merged, and rings that
    /// collapse completely are dropped.
    fn to_ring(&self) -> Option<Ring> {
        let mut ring: Ring = Vec::with_capacity(self.points.len() + 1);
        for p in &self.points {
            let p = p.to_f64().to_vec();
            if ring.last() != Some(&p) {
                ring.push(p);
            }
        }
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return None;
        }
        ring.push(ring[0].clone());
        Some(ring)
    }
}

/// What became of a walked loop.
#[derive(Clone, Copy, Debug)]
enum LoopKind {
    Exterior(usize),
    Hole,
    Dropped,
}

/// The walked loops, sorted into exteriors and holes.
#[derive(Debug)]
struct Loops {
    loops: Vec<Vec<EventIdx>>,
    loop_of: SegVec<Option<usize>>,
    kinds: Vec<LoopKind>,
    exteriors: Vec<RingOut>,
    /// Each hole, and the loop it came from.
    holes: Vec<(usize, RingOut)>,
}

impl Loops {
    fn new(segs: &Segments, topo: &Topology, processed: &[SegIdx]) -> Result<Self, Error> {
        let loops = walk_rings(segs, topo, processed)?;
        let mut ret = Loops {
            loop_of: SegVec::filled(None, segs.num_segments()),
            kinds: Vec::with_capacity(loops.len()),
            exteriors: Vec::new(),
            holes: Vec::new(),
            loops: Vec::new(),
        };

        for (i, events) in loops.iter().enumerate() {
            for &e in events {
                ret.loop_of[segs.event(e).segment] = Some(i);
            }

            // Loops are closed, so skip the repeated last point.
            let points: Vec<Vector> = events
                .iter()
                .take(events.len().saturating_sub(1))
                .map(|&e| segs.event_point(e).clone())
                .collect();
            let points = simplify(points, segs.precision());
            let area = signed_area(&points);
            match bbox_of(&points) {
                Some(bbox) if points.len() >= 3 && !area.is_zero() => {
                    let ring = RingOut { points, area, bbox };
                    if ring.area.is_negative() {
                        ret.kinds.push(LoopKind::Hole);
                        ret.holes.push((i, ring));
                    } else {
                        ret.kinds.push(LoopKind::Exterior(ret.exteriors.len()));
                        ret.exteriors.push(ring);
                    }
                }
                _ => ret.kinds.push(LoopKind::Dropped),
            }
        }
        ret.loops = loops;
        Ok(ret)
    }

    /// Finds the exterior that a hole belongs to, by looking at the output
    /// boundary just below the hole.
    ///
    /// Just below the bottom of a hole is the inside of the output. The first
    /// output segment below that is either the bottom of the hole's exterior,
    /// or the top of another hole with the same exterior.
    fn owner_below(&self, segs: &Segments, topo: &Topology, hole: usize) -> Option<usize> {
        let mut current = hole;
        let mut seen = vec![hole];
        loop {
            let bottom = self.loops[current]
                .iter()
                .map(|&e| segs.event(e).segment)
                .find(|&s| {
                    !topo.interior_after(s) && segs.left_point(s).x != segs.right_point(s).x
                })?;

            let mut below = topo.prev_in_result(segs, bottom);
            let next = loop {
                let b = below?;
                match self.loop_of[b].map(|l| (l, self.kinds[l])) {
                    Some((_, LoopKind::Exterior(i))) => return Some(i),
                    Some((l, LoopKind::Hole)) if l != current => break l,
                    // Another part of the same hole, or a loop that
                    // simplified away: keep going down.
                    _ => below = topo.prev_in_result(segs, b),
                }
            };
            if seen.contains(&next) {
                return None;
            }
            seen.push(next);
            current = next;
        }
    }

    /// The exterior that a hole belongs to.
    ///
    /// If the segments below the hole don't lead anywhere, we fall back to
    /// testing points of the hole, and then to bounding boxes.
    fn owner(
        &self,
        segs: &Segments,
        topo: &Topology,
        hole: usize,
        ring: &RingOut,
    ) -> Option<usize> {
        self.owner_below(segs, topo, hole)
            .or_else(|| smallest_enclosing(&self.exteriors, |e| e.encloses(ring)))
            .or_else(|| smallest_enclosing(&self.exteriors, |e| e.bbox.contains_bbox(&ring.bbox)))
    }
}

/// Builds the output multipolygon.
pub fn assemble(
    segs: &Segments,
    topo: &Topology,
    processed: &[SegIdx],
) -> Result<MultiPolygon, Error> {
    let loops = Loops::new(segs, topo, processed)?;

    let mut polys: Vec<Option<Polygon>> = loops
        .exteriors
        .iter()
        .map(|e| e.to_ring().map(|r| vec![r]))
        .collect();
    for (loop_idx, hole) in &loops.holes {
        let Some(owner) = loops.owner(segs, topo, *loop_idx, hole) else {
            tracing::warn!(points = ?hole.points, "dropping a hole with no exterior");
            continue;
        };
        if let (Some(poly), Some(ring)) = (&mut polys[owner], hole.to_ring()) {
            poly.push(ring);
        }
    }
    let polys: MultiPolygon = polys.into_iter().flatten().collect();

    tracing::debug!(
        polygons = polys.len(),
        holes = loops.holes.len(),
        "assembled output"
    );
    Ok(polys)
}

/// The exterior with the smallest area among those accepted by `encloses`.
fn smallest_enclosing(
    exteriors: &[RingOut],
    encloses: impl Fn(&RingOut) -> bool,
) -> Option<usize> {
    exteriors
        .iter()
        .enumerate()
        .filter(|(_, e)| encloses(e))
        .min_by(|(_, a), (_, b)| a.area.cmp(&b.area))
        .map(|(i, _)| i)
}

fn bbox_of(points: &[Vector]) -> Option<Bbox> {
    let (first, rest) = points.split_first()?;
    let mut bbox = Bbox::from_point(first);
    for p in rest {
        bbox.expand(p);
    }
    Some(bbox)
}

/// Converts a multipolygon to a [`BezPath`], with one closed subpath per ring.
pub fn bez_path(mp: &MultiPolygon) -> BezPath {
    let mut path = BezPath::new();
    for ring in mp.iter().flatten() {
        let mut points = ring
            .iter()
            .filter_map(|p| match p.as_slice() {
                &[x, y, ..] => Some(kurbo::Point::new(x, y)),
                _ => None,
            });
        let Some(first) = points.next() else {
            continue;
        };
        path.move_to(first);
        for p in points {
            path.line_to(p);
        }
        path.close_path();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputGeometry;
    use crate::num::tests::n;
    use crate::sweep::SweepLine;
    use crate::{BinaryOp, Options};

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
        vec![vec![x0, y0], vec![x1, y0], vec![x1, y1], vec![x0, y1]]
    }

    fn loops_of(inputs: &[MultiPolygon], op: BinaryOp) -> (Segments, Topology, Loops) {
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
        let topo = Topology::new(op, &segs, &geom, inputs.len(), &processed).unwrap();
        let loops = Loops::new(&segs, &topo, &processed).unwrap();
        (segs, topo, loops)
    }

    fn biggest_exterior(loops: &Loops) -> usize {
        (0..loops.exteriors.len())
            .max_by(|&a, &b| loops.exteriors[a].area.cmp(&loops.exteriors[b].area))
            .unwrap()
    }

    fn v(x: f64, y: f64) -> Vector {
        Vector::new(n(x), n(y))
    }

    fn ring_out(points: Vec<Vector>) -> RingOut {
        let area = signed_area(&points);
        let bbox = bbox_of(&points).unwrap();
        RingOut { points, area, bbox }
    }

    #[test]
    fn simplify_drops_straight_points() {
        let pts = vec![v(0.0, 0.0), v(1.0, 0.0), v(2.0, 0.0), v(2.0, 2.0), v(0.0, 2.0)];
        let out = simplify(pts, &Precision::exact());
        assert_eq!(out, vec![v(0.0, 0.0), v(2.0, 0.0), v(2.0, 2.0), v(0.0, 2.0)]);

        // The first point can be the straight one, too.
        let pts = vec![v(1.0, 0.0), v(2.0, 0.0), v(2.0, 2.0), v(0.0, 2.0), v(0.0, 0.0)];
        let out = simplify(pts, &Precision::exact());
        assert_eq!(out.len(), 4);
        assert!(!out.contains(&v(1.0, 0.0)));
    }

    #[test]
    fn simplify_removes_spikes() {
        let pts = vec![v(0.0, 0.0), v(2.0, 0.0), v(3.0, 0.0), v(2.0, 0.0), v(2.0, 2.0)];
        let out = simplify(pts, &Precision::exact());
        assert_eq!(out, vec![v(0.0, 0.0), v(2.0, 0.0), v(2.0, 2.0)]);

        // A ring that's nothing but a spike disappears.
        let pts = vec![v(0.0, 0.0), v(1.0, 1.0), v(2.0, 2.0), v(1.0, 1.0)];
        assert!(simplify(pts, &Precision::exact()).len() < 3);
    }

    #[test]
    fn orientation() {
        let ccw = vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)];
        assert_eq!(signed_area(&ccw), n(2.0));
        let cw: Vec<_> = ccw.iter().rev().cloned().collect();
        assert_eq!(signed_area(&cw), n(-2.0));
    }

    #[test]
    fn locate_points() {
        let square = vec![v(0.0, 0.0), v(4.0, 0.0), v(4.0, 4.0), v(0.0, 4.0)];
        assert_eq!(locate(&square, &v(1.0, 1.0)), Location::Inside);
        assert_eq!(locate(&square, &v(5.0, 1.0)), Location::Outside);
        assert_eq!(locate(&square, &v(-1.0, 4.0)), Location::Outside);
        assert_eq!(locate(&square, &v(4.0, 2.0)), Location::Boundary);
        assert_eq!(locate(&square, &v(0.0, 0.0)), Location::Boundary);

        let diamond = vec![v(0.0, -2.0), v(2.0, 0.0), v(0.0, 2.0), v(-2.0, 0.0)];
        assert_eq!(locate(&diamond, &v(0.0, 0.0)), Location::Inside);
        assert_eq!(locate(&diamond, &v(1.5, 1.5)), Location::Outside);
        assert_eq!(locate(&diamond, &v(1.0, 1.0)), Location::Boundary);
    }

    #[test]
    fn hole_touching_its_exterior() {
        let exterior = ring_out(vec![v(0.0, 0.0), v(4.0, 0.0), v(4.0, 4.0), v(0.0, 4.0)]);
        // A clockwise triangle whose first vertex is on the exterior.
        let hole = ring_out(vec![v(0.0, 0.0), v(1.0, 2.0), v(2.0, 1.0)]);
        assert!(hole.area.is_negative());
        assert!(exterior.encloses(&hole));

        let far = ring_out(vec![v(10.0, 10.0), v(11.0, 10.0), v(11.0, 11.0)]);
        assert!(!far.encloses(&hole));
    }

    #[test]
    fn hole_owner_skips_islands() {
        let mp = vec![
            vec![square(0.0, 0.0, 10.0, 10.0), square(2.0, 2.0, 8.0, 8.0)],
            vec![square(4.0, 4.0, 6.0, 6.0)],
        ];
        let (segs, topo, loops) = loops_of(&[mp], BinaryOp::Union);
        assert_eq!(loops.exteriors.len(), 2);
        assert_eq!(loops.holes.len(), 1);
        let hole = loops.holes[0].0;
        assert_eq!(
            loops.owner_below(&segs, &topo, hole),
            Some(biggest_exterior(&loops))
        );
    }

    #[test]
    fn c_shaped_hole() {
        // A "C" opening to the right.
        let c = vec![
            vec![2.0, 2.0],
            vec![8.0, 2.0],
            vec![8.0, 4.0],
            vec![4.0, 4.0],
            vec![4.0, 6.0],
            vec![8.0, 6.0],
            vec![8.0, 8.0],
            vec![2.0, 8.0],
        ];
        let inputs = [vec![vec![square(0.0, 0.0, 10.0, 10.0)]], vec![vec![c]]];
        let (segs, topo, loops) = loops_of(&inputs, BinaryOp::Difference);
        assert_eq!(loops.exteriors.len(), 1);
        assert_eq!(loops.holes.len(), 1);
        let hole = loops.holes[0].0;
        assert_eq!(loops.owner_below(&segs, &topo, hole), Some(0));

        let out = crate::difference(&inputs[0], &inputs[1..]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 2);
        assert_eq!(out[0][1].len(), 9);
    }

    #[test]
    fn rings_that_collapse_in_f64_are_dropped() {
        let tiny = n(1e-30);
        let sliver = ring_out(vec![
            v(1.0, 1.0),
            v(2.0, 1.0),
            Vector::new(n(2.0) + tiny.clone(), n(1.0) + tiny),
        ]);
        assert!(!sliver.area.is_zero());
        assert_eq!(sliver.to_ring(), None);

        let triangle = ring_out(vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0)]);
        assert_eq!(
            triangle.to_ring(),
            Some(vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![1.0, 1.0],
                vec![0.0, 0.0]
            ])
        );
    }

    #[test]
    fn bez_path_has_one_subpath_per_ring() {
        let mp: MultiPolygon = vec![vec![
            vec![vec![0.0, 0.0], vec![4.0, 0.0], vec![4.0, 4.0], vec![0.0, 0.0]],
            vec![vec![1.0, 1.0], vec![2.0, 1.0], vec![2.0, 2.0], vec![1.0, 1.0]],
        ]];
        let path = bez_path(&mp);
        let closes = path
            .elements()
            .iter()
            .filter(|el| matches!(el, kurbo::PathEl::ClosePath))
            .count();
        assert_eq!(closes, 2);
    }
}
