//! Running a whole boolean operation, from input rings to output rings.

use crate::contours;
use crate::input::{InputGeometry, MultiPolyIdx};
use crate::num::{ExactNumber, Precision};
use crate::segments::Segments;
use crate::sweep::SweepLine;
use crate::topology::Topology;
use crate::{BinaryOp, Error, MultiPolygon, Options};

/// Everything that one boolean operation needs to keep track of.
///
/// Nothing here is shared between operations, so independent operations can
/// run on different threads.
#[derive(Debug)]
pub struct Operation {
    op: BinaryOp,
    options: Options,
    segs: Segments,
    geom: InputGeometry,
    subject: Option<MultiPolyIdx>,
}

impl Operation {
    pub fn new(op: BinaryOp, options: &Options) -> Result<Self, Error> {
        let precision = match options.epsilon {
            Some(eps) => Precision::with_epsilon(ExactNumber::try_from(eps).map_err(|_| {
                Error::InvalidGeometry {
                    reason: format!("epsilon must be finite, not {eps}"),
                }
            })?),
            None => Precision::exact(),
        };
        Ok(Operation {
            op,
            options: options.clone(),
            segs: Segments::new(precision),
            geom: InputGeometry::default(),
            subject: None,
        })
    }

    /// Adds an input. The first input added is the subject.
    pub fn add_input(&mut self, mp: &MultiPolygon) -> Result<(), Error> {
        let is_subject = self.subject.is_none();
        let idx = self.geom.add_multi_poly(&mut self.segs, mp, is_subject)?;
        if is_subject {
            self.subject = Some(idx);
        }
        Ok(())
    }

    /// The inputs that can affect the result.
    ///
    /// Returns `None` if the bounding boxes already tell us that the result
    /// is empty.
    fn relevant_inputs(&self) -> Option<Vec<MultiPolyIdx>> {
        let all: Vec<_> = self.geom.multi_poly_indices().collect();
        match self.op {
            BinaryOp::Intersection => {
                for (i, &a) in all.iter().enumerate() {
                    for &b in &all[(i + 1)..] {
                        if !self.geom.multi_poly(a).bbox_overlaps(self.geom.multi_poly(b)) {
                            return None;
                        }
                    }
                }
                Some(all)
            }
            BinaryOp::Difference => {
                let subject = self.subject?;
                let subject_in = self.geom.multi_poly(subject);
                Some(
                    all.into_iter()
                        .filter(|&mp| {
                            mp == subject || self.geom.multi_poly(mp).bbox_overlaps(subject_in)
                        })
                        .collect(),
                )
            }
            BinaryOp::Union | BinaryOp::Xor => Some(all),
        }
    }

    /// Runs the operation on all the inputs added so far.
    pub fn finish(mut self) -> Result<MultiPolygon, Error> {
        // This counts inputs that get skipped below, too.
        let num_multi_polys = self.geom.num_multi_polys();

        let Some(inputs) = self.relevant_inputs() else {
            tracing::debug!(op = %self.op, "disjoint bounding boxes, empty result");
            return Ok(Vec::new());
        };
        for mp in self.geom.multi_poly_indices() {
            if !inputs.contains(&mp) {
                for s in self.geom.segments_of(mp) {
                    self.segs.detach(s);
                }
            }
        }
        self.segs.consume_duplicates();

        let segments: Vec<_> = inputs
            .iter()
            .flat_map(|&mp| self.geom.segments_of(mp))
            .collect();
        tracing::debug!(
            op = %self.op,
            inputs = num_multi_polys,
            skipped = num_multi_polys - inputs.len(),
            segments = segments.len(),
            "starting sweep"
        );

        let mut sweep = SweepLine::new(&mut self.segs);
        sweep.enqueue_segments(segments);
        let processed = sweep.run(&self.options)?;

        let topo = Topology::new(self.op, &self.segs, &self.geom, num_multi_polys, &processed)?;
        contours::assemble(&self.segs, &topo, &processed)
    }
}
