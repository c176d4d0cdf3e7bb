//! Points, sweep events and segments, stored in arenas.
//!
//! A segment is stored with its endpoints in sweep-line order: the left
//! endpoint is the one that's smaller in the `(x, y)` lexicographic order.
//! Each endpoint is a [`SweepEvent`], and each event lives at an interned
//! point. Two events are at the same location if and only if they have the
//! same [`PointIdx`], which is how we find segments that meet at a point.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::geom::{self, Bbox, Vector};
use crate::input::RingIdx;
use crate::num::{ExactNumber, Precision};
use crate::rounder::PointRounder;
use crate::Error;

typed_vec!(
    /// An index into the point arena.
    PointVec,
    PointIdx,
    "p"
);
typed_vec!(
    /// An index into the sweep event arena.
    EventVec,
    EventIdx,
    "e"
);
typed_vec!(
    /// An index into the segment arena.
    ///
    /// Segment indices are handed out in creation order, and that order
    /// breaks ties between segments that are otherwise identical. The tie
    /// break is arbitrary (but stable within one operation); nothing else
    /// depends on it.
    SegVec,
    SegIdx,
    "s"
);

/// A location shared by one or more sweep events.
#[derive(Clone, Debug)]
pub struct PointRecord {
    /// The (already rounded) coordinates.
    pub coords: Vector,
    /// Every event that lives here.
    pub events: Vec<EventIdx>,
}

/// One endpoint of a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepEvent {
    /// Where the event is.
    pub point: PointIdx,
    /// Is this the left endpoint of its segment?
    pub is_left: bool,
    /// The segment this event belongs to.
    pub segment: SegIdx,
}

/// A line segment, possibly shared by several input rings.
#[derive(Clone, Debug)]
pub struct Segment {
    /// The left endpoint.
    pub left: EventIdx,
    /// The right endpoint.
    pub right: EventIdx,
    /// The rings this segment belongs to, with their winding contributions.
    ///
    /// The winding is +1 if the ring runs from left to right along this
    /// segment, and -1 if it runs from right to left. Coincident rings (or
    /// repeated edges of the same ring) are merged and their windings summed.
    pub windings: Vec<(RingIdx, i32)>,
    /// The segment immediately below this one on the sweep line when this
    /// segment was committed.
    pub prev: Option<SegIdx>,
    /// If this segment has been merged into another, the one it was merged into.
    pub consumed_by: Option<SegIdx>,
}

/// The arena holding all points, events and segments of one operation.
#[derive(Clone, Debug)]
pub struct Segments {
    points: PointVec<PointRecord>,
    point_ids: HashMap<Vector, PointIdx>,
    events: EventVec<SweepEvent>,
    segs: SegVec<Segment>,
    precision: Precision,
    rounder: PointRounder,
}

impl Segments {
    /// Creates an empty arena.
    pub fn new(precision: Precision) -> Self {
        Segments {
            points: PointVec::default(),
            point_ids: HashMap::new(),
            events: EventVec::default(),
            segs: SegVec::default(),
            rounder: PointRounder::new(precision.clone()),
            precision,
        }
    }

    /// The precision used for every comparison in this arena.
    pub fn precision(&self) -> &Precision {
        &self.precision
    }

    /// Rounds a point and returns its (possibly new) index.
    pub fn round_point(&mut self, x: ExactNumber, y: ExactNumber) -> PointIdx {
        let v = self.rounder.round(x, y);
        self.intern(v)
    }

    fn intern(&mut self, v: Vector) -> PointIdx {
        if let Some(&idx) = self.point_ids.get(&v) {
            return idx;
        }
        let idx = self.points.push(PointRecord {
            coords: v.clone(),
            events: Vec::new(),
        });
        self.point_ids.insert(v, idx);
        idx
    }

    /// The coordinates of a point.
    pub fn point(&self, p: PointIdx) -> &Vector {
        &self.points[p].coords
    }

    /// All the events located at `p`.
    pub fn events_at(&self, p: PointIdx) -> &[EventIdx] {
        &self.points[p].events
    }

    /// The number of segments (including consumed ones) ever created.
    pub fn num_segments(&self) -> usize {
        self.segs.len()
    }

    /// The number of distinct points.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn segment_indices(&self) -> impl Iterator<Item = SegIdx> {
        self.segs.indices()
    }

    pub fn point_indices(&self) -> impl Iterator<Item = PointIdx> {
        self.points.indices()
    }

    pub fn event(&self, e: EventIdx) -> &SweepEvent {
        &self.events[e]
    }

    pub fn segment(&self, s: SegIdx) -> &Segment {
        &self.segs[s]
    }

    /// The location of an event.
    pub fn event_point(&self, e: EventIdx) -> &Vector {
        self.point(self.events[e].point)
    }

    /// The other endpoint of the segment that `e` belongs to.
    pub fn other(&self, e: EventIdx) -> EventIdx {
        let seg = &self.segs[self.events[e].segment];
        if seg.left == e {
            seg.right
        } else {
            seg.left
        }
    }

    pub fn left_point(&self, s: SegIdx) -> &Vector {
        self.event_point(self.segs[s].left)
    }

    pub fn right_point(&self, s: SegIdx) -> &Vector {
        self.event_point(self.segs[s].right)
    }

    pub fn is_consumed(&self, s: SegIdx) -> bool {
        self.segs[s].consumed_by.is_some()
    }

    /// Follows the chain of consumptions to the segment that absorbed `s`.
    pub fn root(&self, mut s: SegIdx) -> SegIdx {
        while let Some(next) = self.segs[s].consumed_by {
            s = next;
        }
        s
    }

    pub fn set_prev(&mut self, s: SegIdx, prev: Option<SegIdx>) {
        self.segs[s].prev = prev;
    }

    fn push_event(&mut self, point: PointIdx, is_left: bool, segment: SegIdx) -> EventIdx {
        let idx = self.events.push(SweepEvent {
            point,
            is_left,
            segment,
        });
        self.points[point].events.push(idx);
        idx
    }

    fn push_segment(
        &mut self,
        left: EventIdx,
        right: EventIdx,
        windings: Vec<(RingIdx, i32)>,
    ) -> SegIdx {
        let idx = self.segs.push(Segment {
            left,
            right,
            windings,
            prev: None,
            consumed_by: None,
        });
        self.events[left].segment = idx;
        self.events[right].segment = idx;
        idx
    }

    /// Adds the segment between two consecutive points of a ring.
    pub fn add_ring_segment(
        &mut self,
        p1: PointIdx,
        p2: PointIdx,
        ring: RingIdx,
    ) -> Result<SegIdx, Error> {
        let (left, right, winding) = match self.point(p1).cmp(self.point(p2)) {
            Ordering::Less => (p1, p2, 1),
            Ordering::Greater => (p2, p1, -1),
            Ordering::Equal => {
                let [x, y] = self.point(p1).to_f64();
                return Err(Error::DegenerateSegment { x, y });
            }
        };
        let next = self.segs.next_idx();
        let left = self.push_event(left, true, next);
        let right = self.push_event(right, false, next);
        Ok(self.push_segment(left, right, vec![(ring, winding)]))
    }

    /// Removes a segment's events from their points, so that it will never be
    /// linked with (or consumed by) any other segment.
    pub fn detach(&mut self, s: SegIdx) {
        for e in [self.segs[s].left, self.segs[s].right] {
            let p = self.events[e].point;
            self.points[p].events.retain(|&x| x != e);
        }
    }

    pub fn bbox(&self, s: SegIdx) -> Bbox {
        Bbox::from_points(self.left_point(s), self.right_point(s))
    }

    /// The vector from the left endpoint to the right endpoint.
    pub fn vector(&self, s: SegIdx) -> Vector {
        self.right_point(s) - self.left_point(s)
    }

    pub fn is_an_endpoint(&self, s: SegIdx, p: PointIdx) -> bool {
        let seg = &self.segs[s];
        self.events[seg.left].point == p || self.events[seg.right].point == p
    }

    /// Is `p` above (1), below (-1) or on (0) the line through `s`?
    pub fn compare_point(&self, s: SegIdx, p: &Vector) -> i32 {
        geom::orient(
            self.left_point(s),
            p,
            self.right_point(s),
            &self.precision,
        )
    }

    /// The order of segments on the sweep line.
    ///
    /// Roughly, `a < b` if `a` is below `b` where they overlap horizontally.
    /// It is also used for segments that don't overlap horizontally at all,
    /// and for colinear segments, and it's a strict total order on distinct
    /// segments.
    pub fn segment_compare(&self, a: SegIdx, b: SegIdx) -> Ordering {
        use Ordering::*;

        if a == b {
            return Equal;
        }

        let al = self.left_point(a);
        let ar = self.right_point(a);
        let bl = self.left_point(b);
        let br = self.right_point(b);

        // Not even in the same vertical slab.
        if br.x < al.x {
            return Greater;
        }
        if ar.x < bl.x {
            return Less;
        }

        match al.x.cmp(&bl.x) {
            // b's left endpoint is further right, so we measure it against a.
            Less => {
                if bl.y < al.y && bl.y < ar.y {
                    return Greater;
                }
                if bl.y > al.y && bl.y > ar.y {
                    return Less;
                }
                match self.compare_point(a, bl) {
                    x if x < 0 => return Greater,
                    x if x > 0 => return Less,
                    _ => {}
                }
                match self.compare_point(b, ar) {
                    x if x < 0 => return Less,
                    x if x > 0 => return Greater,
                    _ => {}
                }
                // Colinear: the one that starts further left comes first.
                return Less;
            }
            // a's left endpoint is further right, so we measure it against b.
            Greater => {
                if al.y < bl.y && al.y < br.y {
                    return Less;
                }
                if al.y > bl.y && al.y > br.y {
                    return Greater;
                }
                match self.compare_point(b, al) {
                    x if x < 0 => return Less,
                    x if x > 0 => return Greater,
                    _ => {}
                }
                match self.compare_point(a, br) {
                    x if x < 0 => return Greater,
                    x if x > 0 => return Less,
                    _ => {}
                }
                return Greater;
            }
            Equal => {}
        }

        // The left endpoints are vertically aligned; the lower one comes first.
        match al.y.cmp(&bl.y) {
            Equal => {}
            ord => return ord,
        }

        // Identical left endpoints. Use whichever right endpoint is further
        // left to check for colinearity.
        match ar.x.cmp(&br.x) {
            Less => match self.compare_point(b, ar) {
                x if x < 0 => return Less,
                x if x > 0 => return Greater,
                _ => {}
            },
            Greater => match self.compare_point(a, br) {
                x if x < 0 => return Greater,
                x if x > 0 => return Less,
                _ => {}
            },
            Equal => {}
        }

        if ar.x != br.x {
            // Almost vertical segments going in opposite directions: the one
            // with the lower right endpoint comes first.
            let ay = &ar.y - &al.y;
            let ax = &ar.x - &al.x;
            let by = &br.y - &bl.y;
            let bx = &br.x - &bl.x;
            if ay > ax && by < bx {
                return Greater;
            }
            if ay < ax && by > bx {
                return Less;
            }
        }

        // Colinear with matching orientation: the shorter one comes first.
        match ar.x.cmp(&br.x) {
            Greater => return Greater,
            Less => return Less,
            Equal => {}
        }
        match ar.y.cmp(&br.y) {
            Equal => {}
            ord => return ord,
        }

        // Geometrically identical.
        a.cmp(&b)
    }

    /// The order of events in the sweep queue.
    ///
    /// Events are ordered by location; at the same location, right endpoints
    /// come before left endpoints, and then we fall back to the order of the
    /// segments.
    pub fn event_compare(&self, a: EventIdx, b: EventIdx) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let ea = &self.events[a];
        let eb = &self.events[b];
        if ea.point != eb.point {
            return self.point(ea.point).cmp(self.point(eb.point));
        }
        if ea.is_left != eb.is_left {
            return if ea.is_left {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        self.segment_compare(ea.segment, eb.segment)
    }

    /// Compares two events at the same point by the angle that their
    /// segments make with the direction back towards `base`.
    ///
    /// The event whose segment makes the sharpest left turn comes first.
    pub fn leftmost_compare(
        &self,
        at: EventIdx,
        base: EventIdx,
        a: EventIdx,
        b: EventIdx,
    ) -> Ordering {
        geom::compare_vector_angles(
            self.event_point(at),
            self.event_point(base),
            self.event_point(self.other(a)),
            self.event_point(self.other(b)),
        )
    }

    fn swap_events(&mut self, s: SegIdx) {
        let seg = &mut self.segs[s];
        std::mem::swap(&mut seg.left, &mut seg.right);
        for (_, w) in &mut seg.windings {
            *w = -*w;
        }
        let (left, right) = (seg.left, seg.right);
        self.events[left].is_left = true;
        self.events[right].is_left = false;
    }

    /// Finds where two segments intersect, if they do.
    ///
    /// Intersections at the segments' endpoints are preferred: if an endpoint
    /// of one segment lies on the other, that endpoint is the answer. This
    /// also handles colinear segments. Trivial intersections (the segments
    /// meeting only at a shared endpoint) aren't reported. Otherwise, the
    /// crossing point of the two lines is computed and rounded.
    pub fn get_intersection(&mut self, s: SegIdx, other: SegIdx) -> Option<PointIdx> {
        let s_bbox = self.bbox(s);
        let other_bbox = self.bbox(other);
        let overlap = s_bbox.overlap(&other_bbox)?;

        let tlp = self.events[self.segs[s].left].point;
        let trp = self.events[self.segs[s].right].point;
        let olp = self.events[self.segs[other].left].point;
        let orp = self.events[self.segs[other].right].point;

        let touches = |bbox: &Bbox, seg: SegIdx, p: PointIdx| {
            let coords = self.point(p);
            bbox.contains(coords) && self.compare_point(seg, coords) == 0
        };
        let touches_other_left = touches(&s_bbox, s, olp);
        let touches_this_left = touches(&other_bbox, other, tlp);
        let touches_other_right = touches(&s_bbox, s, orp);
        let touches_this_right = touches(&other_bbox, other, trp);

        if touches_this_left && touches_other_left {
            // Colinear with matching left endpoints, and one is longer than
            // the other.
            if touches_this_right && !touches_other_right {
                return Some(trp);
            }
            if !touches_this_right && touches_other_right {
                return Some(orp);
            }
            // Either identical, or only meeting at the left endpoint.
            return None;
        }

        if touches_this_left {
            // Meeting only at opposite endpoints.
            if touches_other_right && tlp == orp {
                return None;
            }
            return Some(tlp);
        }

        if touches_other_left {
            if touches_this_right && trp == olp {
                return None;
            }
            return Some(olp);
        }

        if touches_this_right && touches_other_right {
            return None;
        }
        if touches_this_right {
            return Some(trp);
        }
        if touches_other_right {
            return Some(orp);
        }

        // No endpoint touches, so look at the crossing point of the lines.
        // If the segments were colinear and overlapping, one of the cases
        // above would have caught it.
        let pt = geom::intersection(
            self.point(tlp),
            &self.vector(s),
            self.point(olp),
            &self.vector(other),
        )?;
        if !overlap.contains(&pt) {
            return None;
        }
        Some(self.round_point(pt.x, pt.y))
    }

    /// Splits `s` at `point`, which must lie strictly inside it.
    ///
    /// `s` keeps the piece to the left of `point`, and a new segment is
    /// created for the piece to the right. Returns the two new events (the
    /// new right endpoint of `s`, and the new left endpoint of the new
    /// segment).
    pub fn split(&mut self, s: SegIdx, point: PointIdx) -> [EventIdx; 2] {
        let already_linked = !self.points[point].events.is_empty();

        let new_right = self.push_event(point, false, s);
        let new_seg_idx = self.segs.next_idx();
        let new_left = self.push_event(point, true, new_seg_idx);

        let old_right = std::mem::replace(&mut self.segs[s].right, new_right);
        let windings = self.segs[s].windings.clone();
        let new_seg = self.push_segment(new_left, old_right, windings);
        tracing::trace!(?s, ?new_seg, at = ?self.point(point), "split");

        // When a nearly vertical segment gets split, rounding can put the
        // split point on the wrong side of one of the endpoints.
        for seg in [new_seg, s] {
            if self.left_point(seg) > self.right_point(seg) {
                self.swap_events(seg);
            }
        }

        if already_linked {
            self.check_for_consuming(point);
        }

        [new_right, new_left]
    }

    /// Merges two geometrically identical segments.
    ///
    /// The one that's earlier in sweep-line order survives, and the other one
    /// becomes a redirect to it.
    pub fn consume(&mut self, a: SegIdx, b: SegIdx) {
        let mut consumer = self.root(a);
        let mut consumee = self.root(b);
        if consumer == consumee {
            return;
        }

        if self.segment_compare(consumer, consumee) == Ordering::Greater {
            std::mem::swap(&mut consumer, &mut consumee);
        }
        // A segment can't absorb its own predecessor, or the predecessor
        // chain would loop.
        if self.segs[consumer].prev == Some(consumee) {
            std::mem::swap(&mut consumer, &mut consumee);
        }
        tracing::trace!(?consumer, ?consumee, "consume");

        let windings = std::mem::take(&mut self.segs[consumee].windings);
        let target = &mut self.segs[consumer].windings;
        for (ring, w) in windings {
            match target.iter_mut().find(|(r, _)| *r == ring) {
                Some((_, existing)) => *existing += w,
                None => target.push((ring, w)),
            }
        }
        self.segs[consumee].consumed_by = Some(consumer);
    }

    /// Merges every pair of segments that share both endpoints.
    pub fn consume_duplicates(&mut self) {
        for i in 0..self.points.len() {
            let p = PointIdx(i);
            if self.points[p].events.len() > 1 {
                self.check_for_consuming(p);
            }
        }
    }

    /// Looks for pairs of segments that share both endpoints, one of which is
    /// `p`, and merges them.
    pub fn check_for_consuming(&mut self, p: PointIdx) {
        let events = self.points[p].events.clone();
        for (i, &e1) in events.iter().enumerate() {
            if self.is_consumed(self.events[e1].segment) {
                continue;
            }
            for &e2 in &events[(i + 1)..] {
                if self.is_consumed(self.events[e2].segment) {
                    continue;
                }
                let o1 = self.events[self.other(e1)].point;
                let o2 = self.events[self.other(e2)].point;
                if o1 != o2 {
                    continue;
                }
                self.consume(self.events[e1].segment, self.events[e2].segment);
            }
        }
    }
}
