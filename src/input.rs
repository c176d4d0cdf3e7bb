//! The input geometry: multipolygons, their polygons, and their rings.
//!
//! Rings are turned into segments as they're read; the records here only
//! remember who owns what, so that the winding state of a segment can be
//! translated back into "which input multipolygons is this point inside?".

use crate::geom::Bbox;
use crate::num::ExactNumber;
use crate::segments::{PointIdx, SegIdx, Segments};
use crate::{Error, MultiPolygon, Polygon, Ring};

typed_vec!(
    /// An index into the input ring arena.
    RingVec,
    RingIdx,
    "r"
);
typed_vec!(
    /// An index into the input polygon arena.
    PolyVec,
    PolyIdx,
    "poly"
);
typed_vec!(
    /// An index into the input multipolygon arena.
    MultiPolyVec,
    MultiPolyIdx,
    "mp"
);

/// One input ring.
#[derive(Clone, Debug)]
pub struct RingIn {
    pub poly: PolyIdx,
    pub is_exterior: bool,
    /// The segments created from this ring, in ring order.
    pub segments: Vec<SegIdx>,
    pub bbox: Bbox,
}

/// One input polygon: an exterior ring and zero or more holes.
#[derive(Clone, Debug)]
pub struct PolyIn {
    pub multi_poly: MultiPolyIdx,
    pub exterior: RingIdx,
    pub interiors: Vec<RingIdx>,
    pub bbox: Bbox,
}

/// One input multipolygon.
#[derive(Clone, Debug)]
pub struct MultiPolyIn {
    pub polys: Vec<PolyIdx>,
    pub is_subject: bool,
    /// `None` if there are no polygons at all.
    pub bbox: Option<Bbox>,
}

/// All the input geometry of one operation.
#[derive(Clone, Debug, Default)]
pub struct InputGeometry {
    rings: RingVec<RingIn>,
    polys: PolyVec<PolyIn>,
    multi_polys: MultiPolyVec<MultiPolyIn>,
}

fn invalid(reason: &str) -> Error {
    Error::InvalidGeometry {
        reason: reason.to_owned(),
    }
}

impl InputGeometry {
    pub fn ring(&self, r: RingIdx) -> &RingIn {
        &self.rings[r]
    }

    pub fn poly(&self, p: PolyIdx) -> &PolyIn {
        &self.polys[p]
    }

    pub fn multi_poly(&self, mp: MultiPolyIdx) -> &MultiPolyIn {
        &self.multi_polys[mp]
    }

    pub fn num_multi_polys(&self) -> usize {
        self.multi_polys.len()
    }

    pub fn multi_poly_indices(&self) -> impl Iterator<Item = MultiPolyIdx> {
        self.multi_polys.indices()
    }

    /// The multipolygon that a ring ultimately belongs to.
    pub fn ring_owner(&self, r: RingIdx) -> MultiPolyIdx {
        self.polys[self.rings[r].poly].multi_poly
    }

    /// Every segment created from a multipolygon's rings.
    pub fn segments_of(&self, mp: MultiPolyIdx) -> impl Iterator<Item = SegIdx> + '_ {
        self.multi_polys[mp].polys.iter().flat_map(move |&p| {
            let poly = &self.polys[p];
            std::iter::once(poly.exterior)
                .chain(poly.interiors.iter().copied())
                .flat_map(move |r| self.rings[r].segments.iter().copied())
        })
    }

    /// Reads a multipolygon, creating segments for all of its rings.
    pub fn add_multi_poly(
        &mut self,
        segs: &mut Segments,
        raw: &MultiPolygon,
        is_subject: bool,
    ) -> Result<MultiPolyIdx, Error> {
        let mp_idx = self.multi_polys.next_idx();
        let mut polys = Vec::with_capacity(raw.len());
        let mut bbox: Option<Bbox> = None;
        for raw_poly in raw {
            let p = self.add_poly(segs, raw_poly, mp_idx)?;
            let poly_bbox = &self.polys[p].bbox;
            match &mut bbox {
                Some(b) => b.union(poly_bbox),
                None => bbox = Some(poly_bbox.clone()),
            }
            polys.push(p);
        }
        Ok(self.multi_polys.push(MultiPolyIn {
            polys,
            is_subject,
            bbox,
        }))
    }

    fn add_poly(
        &mut self,
        segs: &mut Segments,
        raw: &Polygon,
        mp: MultiPolyIdx,
    ) -> Result<PolyIdx, Error> {
        let poly_idx = self.polys.next_idx();
        let (exterior, holes) = raw
            .split_first()
            .ok_or_else(|| invalid("polygon has no rings"))?;
        let exterior = self.add_ring(segs, exterior, poly_idx, true)?;
        let mut bbox = self.rings[exterior].bbox.clone();
        let mut interiors = Vec::with_capacity(holes.len());
        for hole in holes {
            let r = self.add_ring(segs, hole, poly_idx, false)?;
            bbox.union(&self.rings[r].bbox);
            interiors.push(r);
        }
        Ok(self.polys.push(PolyIn {
            multi_poly: mp,
            exterior,
            interiors,
            bbox,
        }))
    }

    fn add_ring(
        &mut self,
        segs: &mut Segments,
        raw: &Ring,
        poly: PolyIdx,
        is_exterior: bool,
    ) -> Result<RingIdx, Error> {
        let ring_idx = self.rings.next_idx();
        let (first, rest) = raw.split_first().ok_or_else(|| invalid("empty ring"))?;
        let first = read_point(segs, first)?;

        let mut bbox = Bbox::from_point(segs.point(first));
        let mut segments = Vec::with_capacity(raw.len());
        let mut prev = first;
        for p in rest {
            let p = read_point(segs, p)?;
            // Repeated points (possibly only after rounding) are skipped.
            if p == prev {
                continue;
            }
            segments.push(segs.add_ring_segment(prev, p, ring_idx)?);
            bbox.expand(segs.point(p));
            prev = p;
        }
        if prev != first {
            segments.push(segs.add_ring_segment(prev, first, ring_idx)?);
        }

        Ok(self.rings.push(RingIn {
            poly,
            is_exterior,
            segments,
            bbox,
        }))
    }
}

fn read_point(segs: &mut Segments, raw: &[f64]) -> Result<PointIdx, Error> {
    let [x, y, ..] = raw else {
        return Err(invalid("point has fewer than two coordinates"));
    };
    let x = ExactNumber::try_from(*x).map_err(|_| invalid("non-finite coordinate"))?;
    let y = ExactNumber::try_from(*y).map_err(|_| invalid("non-finite coordinate"))?;
    Ok(segs.round_point(x, y))
}

impl MultiPolyIn {
    /// Do this multipolygon's bounds intersect `other`'s?
    ///
    /// An empty multipolygon doesn't intersect anything.
    pub fn bbox_overlaps(&self, other: &MultiPolyIn) -> bool {
        match (&self.bbox, &other.bbox) {
            (Some(a), Some(b)) => a.overlap(b).is_some(),
            _ => false,
        }
    }
}
