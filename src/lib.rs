#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(feature = "arbitrary")]
pub mod arbitrary;
mod contours;
mod geom;
mod num;
mod operation;
mod rounder;
mod sweep;
mod topology;

#[cfg(feature = "generators")]
pub mod generators;

// pub so that we can use them in fuzz tests, but they're really private
#[doc(hidden)]
pub mod input;
#[doc(hidden)]
pub mod segments;
#[doc(hidden)]
pub mod treevec;

pub use contours::bez_path;

/// A ring: a closed sequence of points, each given as `[x, y]`.
///
/// The last point may repeat the first one, but it doesn't have to. Points
/// can have extra coordinates, which are ignored.
pub type Ring = Vec<Vec<f64>>;

/// A polygon: an exterior ring followed by zero or more holes.
pub type Polygon = Vec<Ring>;

/// A collection of polygons.
pub type MultiPolygon = Vec<Polygon>;

/// Binary operations between sets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    /// A point is in the union of some sets if it is in any of them.
    Union,
    /// A point is in the intersection of some sets if it is in all of them.
    Intersection,
    /// A point is in the exclusive-or of some sets if it is in an odd number of them.
    Xor,
    /// A point is in the difference if it is in the first set but none of the others.
    Difference,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BinaryOp::Union => "union",
            BinaryOp::Intersection => "intersection",
            BinaryOp::Xor => "xor",
            BinaryOp::Difference => "difference",
        };
        f.write_str(name)
    }
}

/// The error returned when parsing an unknown [`BinaryOp`] name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation {0:?}, expected union, intersection, xor or difference")]
pub struct UnknownOp(pub String);

impl std::str::FromStr for BinaryOp {
    type Err = UnknownOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "union" => Ok(BinaryOp::Union),
            "intersection" => Ok(BinaryOp::Intersection),
            "xor" => Ok(BinaryOp::Xor),
            "difference" => Ok(BinaryOp::Difference),
            _ => Err(UnknownOp(s.to_owned())),
        }
    }
}

/// Configuration for a boolean operation.
///
/// All fields are optional when deserializing.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Options {
    /// If set, coordinates that are within this distance of one another are
    /// snapped together, and nearly-colinear points are treated as colinear.
    ///
    /// By default, all computations are exact.
    pub epsilon: Option<f64>,
    /// The maximum number of pending events before we give up.
    pub max_queue_size: usize,
    /// The maximum number of segments the sweep line may commit before we give up.
    pub max_sweep_line_segments: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            epsilon: None,
            max_queue_size: 1_000_000,
            max_sweep_line_segments: 1_000_000,
        }
    }
}

/// The ways a boolean operation can fail.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// The input wasn't a valid multipolygon.
    #[error("input geometry is not a valid polygon or multipolygon: {reason}")]
    InvalidGeometry {
        /// What was wrong with it.
        reason: String,
    },
    /// A ring had a segment whose endpoints coincide (possibly only after
    /// snapping to nearby coordinates).
    #[error("tried to create a degenerate segment at ({x}, {y})")]
    DegenerateSegment {
        /// The x coordinate of the segment.
        x: f64,
        /// The y coordinate of the segment.
        y: f64,
    },
    /// Something that should never happen, happened. This is a bug.
    #[error("internal error, please file a bug report: {reason}")]
    InternalInvariantViolation {
        /// A description of what went wrong.
        reason: String,
    },
    /// The operation got too big.
    #[error("{what} exceeded the limit of {limit}")]
    ResourceLimit {
        /// The quantity that got too big.
        what: &'static str,
        /// The configured limit.
        limit: usize,
    },
}

/// Computes a boolean operation between a subject and zero or more clips.
///
/// The inputs are interpreted with the nonzero fill rule: a point is inside a
/// polygon if the polygon's exterior ring winds around it and none of the
/// polygon's holes do. The orientation of the input rings doesn't matter.
///
/// Output exterior rings are counter-clockwise, holes are clockwise, and all
/// rings are closed (their last point repeats the first).
pub fn run(
    op: BinaryOp,
    subject: &MultiPolygon,
    clips: &[MultiPolygon],
    options: &Options,
) -> Result<MultiPolygon, Error> {
    let mut operation = operation::Operation::new(op, options)?;
    operation.add_input(subject)?;
    for clip in clips {
        operation.add_input(clip)?;
    }
    operation.finish()
}

/// The union of all the inputs, with default options.
pub fn union(subject: &MultiPolygon, clips: &[MultiPolygon]) -> Result<MultiPolygon, Error> {
    run(BinaryOp::Union, subject, clips, &Options::default())
}

/// The intersection of all the inputs, with default options.
pub fn intersection(
    subject: &MultiPolygon,
    clips: &[MultiPolygon],
) -> Result<MultiPolygon, Error> {
    run(BinaryOp::Intersection, subject, clips, &Options::default())
}

/// The exclusive-or of all the inputs, with default options.
pub fn xor(subject: &MultiPolygon, clips: &[MultiPolygon]) -> Result<MultiPolygon, Error> {
    run(BinaryOp::Xor, subject, clips, &Options::default())
}

/// The subject minus all the clips, with default options.
pub fn difference(
    subject: &MultiPolygon,
    clips: &[MultiPolygon],
) -> Result<MultiPolygon, Error> {
    run(BinaryOp::Difference, subject, clips, &Options::default())
}
