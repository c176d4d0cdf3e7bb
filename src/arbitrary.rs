//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;

use crate::input::RingIdx;
use crate::num::{ExactNumber, Precision};
use crate::segments::{SegIdx, Segments};
use crate::{BinaryOp, Error, MultiPolygon, Options, Polygon, Ring};

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a float in some range, but give it a chance to be close to another float.
pub fn another_float_in_range(
    orig: f64,
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    match u.int_in_range(0..=2u8)? {
        0 => Ok(orig),
        1 => {
            let ulps: i32 = u.int_in_range(-32..=32)?;
            let scale = 1.0f64 + ulps as f64 * f64::EPSILON;
            Ok((orig * scale).clamp(start, end))
        }
        _ => float_in_range(start, end, u),
    }
}

/// Generate a point, with a chance of sharing a coordinate with (or being
/// very close to) some earlier point.
fn point(
    size: f64,
    earlier: &[(f64, f64)],
    u: &mut Unstructured<'_>,
) -> Result<(f64, f64), arbitrary::Error> {
    if earlier.is_empty() {
        return Ok((
            float_in_range(-size, size, u)?,
            float_in_range(-size, size, u)?,
        ));
    }
    let &(x, y) = u.choose(earlier)?;
    Ok((
        another_float_in_range(x, -size, size, u)?,
        another_float_in_range(y, -size, size, u)?,
    ))
}

/// Generate a ring with between 3 and 8 vertices.
///
/// The ring may self-intersect, and it may have repeated or colinear
/// vertices.
pub fn ring(size: f64, u: &mut Unstructured<'_>) -> Result<Ring, arbitrary::Error> {
    let len = u.int_in_range(3..=8)?;
    let mut points = Vec::with_capacity(len);
    for _ in 0..len {
        let p = point(size, &points, u)?;
        points.push(p);
    }
    Ok(points.into_iter().map(|(x, y)| vec![x, y]).collect())
}

/// Generate a multipolygon with a few polygons, each with at most one hole.
///
/// The polygons aren't necessarily valid, in the sense that holes can stick
/// out of their exteriors and polygons can overlap one another.
pub fn multi_polygon(
    size: f64,
    u: &mut Unstructured<'_>,
) -> Result<MultiPolygon, arbitrary::Error> {
    let len = u.int_in_range(0..=3)?;
    let mut ret = Vec::with_capacity(len);
    for _ in 0..len {
        let mut poly: Polygon = vec![ring(size, u)?];
        let with_hole: bool = u.arbitrary()?;
        if with_hole {
            poly.push(ring(size, u)?);
        }
        ret.push(poly);
    }
    Ok(ret)
}

/// Generate a collection of segments, with a bias towards segments that
/// share endpoints or are nearly parallel.
pub fn segments(u: &mut Unstructured<'_>) -> Result<(Segments, Vec<SegIdx>), arbitrary::Error> {
    let mut segs = Segments::new(Precision::exact());
    let mut endpoints = Vec::new();
    let mut ids = Vec::new();
    let len = u.int_in_range(1..=8)?;
    for _ in 0..len {
        let p = point(100.0, &endpoints, u)?;
        endpoints.push(p);
        let q = point(100.0, &endpoints, u)?;
        endpoints.push(q);

        let (Ok(px), Ok(py), Ok(qx), Ok(qy)) = (
            ExactNumber::try_from(p.0),
            ExactNumber::try_from(p.1),
            ExactNumber::try_from(q.0),
            ExactNumber::try_from(q.1),
        ) else {
            continue;
        };
        let p = segs.round_point(px, py);
        let q = segs.round_point(qx, qy);
        if let Ok(s) = segs.add_ring_segment(p, q, RingIdx(0)) {
            ids.push(s);
        }
    }
    Ok((segs, ids))
}

/// Checks that the sweep-line order of segments is antisymmetric.
pub fn check_segment_order(u: &mut Unstructured<'_>) -> Result<(), arbitrary::Error> {
    let (segs, ids) = segments(u)?;
    for &a in &ids {
        for &b in &ids {
            assert_eq!(
                segs.segment_compare(a, b),
                segs.segment_compare(b, a).reverse(),
                "{a:?} and {b:?} in {segs:?}"
            );
        }
    }
    Ok(())
}

/// Runs every boolean operation on some arbitrary inputs, and checks that
/// the outputs are well-formed.
pub fn check_boolean_ops(u: &mut Unstructured<'_>) -> Result<(), arbitrary::Error> {
    let subject = multi_polygon(100.0, u)?;
    let clip = multi_polygon(100.0, u)?;
    let snap: bool = u.arbitrary()?;
    let options = Options {
        epsilon: snap.then_some(1e-9),
        ..Options::default()
    };

    for op in [
        BinaryOp::Union,
        BinaryOp::Intersection,
        BinaryOp::Xor,
        BinaryOp::Difference,
    ] {
        match crate::run(op, &subject, &[clip.clone()], &options) {
            Ok(out) => {
                for ring in out.iter().flatten() {
                    assert!(ring.len() >= 4, "{op}: short ring {ring:?}");
                    assert_eq!(ring.first(), ring.last(), "{op}: open ring {ring:?}");
                }
            }
            // Snapping can collapse a segment.
            Err(Error::DegenerateSegment { .. }) => {}
            Err(e) => panic!("{op} failed on {subject:?} and {clip:?}: {e}"),
        }
    }
    Ok(())
}
