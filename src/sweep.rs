//! The sweep line.
//!
//! We sweep a vertical line from left to right, keeping track of the segments
//! that cross it (the "active" segments, in the order they cross the line) and
//! the events that haven't been handled yet. Whenever two segments become
//! neighbors on the sweep line, we check them for an intersection and split
//! them if they have one. By the time the sweep finishes, no two remaining
//! segments cross each other, and every segment knows which segment was
//! immediately below it.

use crate::segments::{EventIdx, PointIdx, SegIdx, Segments};
use crate::treevec::TreeVec;
use crate::{Error, Options};

const B: usize = 32;

/// The state of a sweep in progress.
#[derive(Debug)]
pub struct SweepLine<'a> {
    segs: &'a mut Segments,
    queue: TreeVec<EventIdx, B>,
    tree: TreeVec<SegIdx, B>,
    /// Segments in the order that their left events were committed.
    processed: Vec<SegIdx>,
}

impl<'a> SweepLine<'a> {
    pub fn new(segs: &'a mut Segments) -> Self {
        SweepLine {
            segs,
            queue: TreeVec::new(),
            tree: TreeVec::new(),
            processed: Vec::new(),
        }
    }

    /// Adds the events of some segments to the queue.
    ///
    /// Segments that have already been merged into another one are skipped.
    pub fn enqueue_segments(&mut self, segments: impl IntoIterator<Item = SegIdx>) {
        for s in segments {
            if self.segs.is_consumed(s) {
                continue;
            }
            let seg = self.segs.segment(s);
            let (left, right) = (seg.left, seg.right);
            self.enqueue(left);
            self.enqueue(right);
        }
    }

    fn enqueue(&mut self, e: EventIdx) {
        let segs = &*self.segs;
        let idx = self
            .queue
            .partition_point(|x| segs.event_compare(*x, e) == std::cmp::Ordering::Less);
        if self.queue.get(idx) != Some(&e) {
            self.queue.insert(idx, e);
        }
    }

    fn dequeue(&mut self, e: EventIdx) {
        let segs = &*self.segs;
        if let Some(idx) = self.queue.find_sorted(&e, |a, b| segs.event_compare(*a, *b)) {
            self.queue.remove(idx);
        }
    }

    fn insert_segment(&mut self, s: SegIdx) -> usize {
        let segs = &*self.segs;
        self.tree
            .insert_sorted(s, |a, b| segs.segment_compare(*a, *b))
    }

    fn find_segment(&self, s: SegIdx) -> Option<usize> {
        self.tree
            .find_sorted(&s, |a, b| self.segs.segment_compare(*a, *b))
    }

    fn remove_segment(&mut self, s: SegIdx) {
        if let Some(idx) = self.find_segment(s) {
            self.tree.remove(idx);
        }
    }

    /// Runs the sweep to completion, returning the committed segments in the
    /// order they were committed.
    pub fn run(mut self, options: &Options) -> Result<Vec<SegIdx>, Error> {
        // The event we just processed, and the number of segments that
        // existed when we popped it. Popping the same event again without
        // having created any new segments means we're going in circles.
        let mut last: Option<(EventIdx, usize)> = None;

        while let Some(event) = self.queue.pop_first() {
            let num_segments = self.segs.num_segments();
            if last == Some((event, num_segments)) {
                let seg = self.segs.event(event).segment;
                let reason = format!(
                    "event {event:?} of segment {seg:?} ({:?} -> {:?}) made no progress",
                    self.segs.left_point(seg),
                    self.segs.right_point(seg),
                );
                tracing::error!("{reason}");
                return Err(Error::InternalInvariantViolation { reason });
            }
            last = Some((event, num_segments));

            if self.queue.len() > options.max_queue_size {
                return Err(Error::ResourceLimit {
                    what: "sweep event queue size",
                    limit: options.max_queue_size,
                });
            }
            if self.processed.len() > options.max_sweep_line_segments {
                return Err(Error::ResourceLimit {
                    what: "sweep line segments",
                    limit: options.max_sweep_line_segments,
                });
            }

            for e in self.process(event)? {
                if !self.segs.is_consumed(self.segs.event(e).segment) {
                    self.enqueue(e);
                }
            }
        }

        tracing::debug!(
            committed = self.processed.len(),
            segments = self.segs.num_segments(),
            points = self.segs.num_points(),
            "sweep finished"
        );
        Ok(self.processed)
    }

    /// Finds the nearest segment below (or above) position `idx` in the
    /// sweep line that hasn't been consumed.
    fn neighbor(&self, idx: usize, below: bool) -> Option<SegIdx> {
        let live = |&&s: &&SegIdx| !self.segs.is_consumed(s);
        if below {
            (0..idx).rev().filter_map(|i| self.tree.get(i)).find(live).copied()
        } else {
            ((idx + 1)..self.tree.len())
                .filter_map(|i| self.tree.get(i))
                .find(live)
                .copied()
        }
    }

    /// Handles a single event, returning the events that need to be
    /// (re-)queued.
    pub fn process(&mut self, event: EventIdx) -> Result<Vec<EventIdx>, Error> {
        let ev = *self.segs.event(event);
        let seg = ev.segment;
        let mut new_events = Vec::new();

        // A consumed segment just needs to be cleaned up.
        if self.segs.is_consumed(seg) {
            if ev.is_left {
                let other = self.segs.other(event);
                self.dequeue(other);
            } else {
                self.remove_segment(seg);
            }
            return Ok(new_events);
        }

        let idx = if ev.is_left {
            self.insert_segment(seg)
        } else {
            match self.find_segment(seg) {
                Some(idx) => idx,
                None => {
                    let reason = format!(
                        "unable to find segment {seg:?} {:?} -> {:?} in the sweep line",
                        self.segs.left_point(seg),
                        self.segs.right_point(seg),
                    );
                    tracing::error!("{reason}");
                    return Err(Error::InternalInvariantViolation { reason });
                }
            }
        };

        let prev = self.neighbor(idx, true);
        let next = self.neighbor(idx, false);

        if ev.is_left {
            let prev_splitter = self.splitter_from_intersections(seg, prev, &mut new_events);
            let next_splitter = self.splitter_from_intersections(seg, next, &mut new_events);

            // Even if there are two intersections, we only split on the
            // earlier one. The other will be found when we come back here.
            let splitter = match (prev_splitter, next_splitter) {
                (Some(p), Some(n)) if self.segs.point(p) > self.segs.point(n) => Some(n),
                (Some(p), _) => Some(p),
                (None, n) => n,
            };

            if let Some(splitter) = splitter {
                let right = self.segs.segment(seg).right;
                self.dequeue(right);
                new_events.push(right);
                new_events.extend(self.segs.split(seg, splitter));
            }

            if new_events.is_empty() {
                self.processed.push(seg);
                self.segs.set_prev(seg, prev);
            } else {
                // Something changed, so redo this event to make sure that the
                // sweep line order (and hence `prev`) is consistent.
                self.remove_segment(seg);
                new_events.push(event);
            }
        } else {
            // We're leaving the sweep line, so our neighbors become adjacent.
            if let (Some(prev), Some(next)) = (prev, next) {
                if let Some(inter) = self.segs.get_intersection(prev, next) {
                    if !self.segs.is_an_endpoint(prev, inter) {
                        new_events.extend(self.split_safely(prev, inter));
                    }
                    if !self.segs.is_an_endpoint(next, inter) {
                        new_events.extend(self.split_safely(next, inter));
                    }
                }
            }
            self.remove_segment(seg);
        }

        Ok(new_events)
    }

    /// Splits a segment that's currently in the sweep line (i.e. not the one
    /// we're currently processing).
    ///
    /// The segment is taken out of the sweep line while it's being split,
    /// because rounding the split point can change its order.
    fn split_safely(&mut self, seg: SegIdx, point: PointIdx) -> Vec<EventIdx> {
        self.remove_segment(seg);
        let right = self.segs.segment(seg).right;
        self.dequeue(right);

        let mut new_events = self.segs.split(seg, point).to_vec();
        new_events.push(right);

        // Splitting can trigger consumption.
        if !self.segs.is_consumed(seg) {
            self.insert_segment(seg);
        }
        new_events
    }

    /// Checks `seg` against one of its neighbors.
    ///
    /// If the neighbor needs splitting, it gets split right away. If `seg`
    /// needs splitting, we return the point where it should be split.
    fn splitter_from_intersections(
        &mut self,
        seg: SegIdx,
        other: Option<SegIdx>,
        new_events: &mut Vec<EventIdx>,
    ) -> Option<PointIdx> {
        let other = other?;
        let inter = self.segs.get_intersection(other, seg)?;
        if !self.segs.is_an_endpoint(other, inter) {
            new_events.extend(self.split_safely(other, inter));
        }
        (!self.segs.is_an_endpoint(seg, inter)).then_some(inter)
    }
}
