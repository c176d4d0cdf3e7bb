//! Utilities for generating examples, benchmarks, and test cases.

use crate::{MultiPolygon, Ring};

fn ring(points: &[(f64, f64)]) -> Ring {
    points.iter().map(|&(x, y)| vec![x, y]).collect()
}

/// Generate a bunch of squares, arranged in a grid.
///
/// The top-left of the first square is at (x0, y0). Each square has size `size
/// x size`, and the distance between squares (both horizontally and vertically)
/// is `offset`.
///
/// If `slant` is non-zero, generates parallelograms instead of squares: the
/// right-hand side of each square gets translated down by `slant`.
fn squares((x0, y0): (f64, f64), size: f64, offset: f64, slant: f64, count: usize) -> MultiPolygon {
    let mut ret = Vec::new();
    for i in 0..count {
        let x = x0 + i as f64 * offset;
        for j in 0..count {
            let y = y0 + j as f64 * offset;
            ret.push(vec![ring(&[
                (x, y),
                (x, y + size),
                (x + size, y + size + slant),
                (x + size, y + slant),
            ])]);
        }
    }

    ret
}

/// Generate an `n` by `n` checkerboard-like pattern with overlapping squares.
/// For `n = 3`, it looks like:
///
/// ```text
/// в”Ңв”Җв”Җв”Җв”Җв”җ в”Ңв”Җв”Җв”Җв”Җв”җ в”Ңв”Җв”Җв”Җв”Җв”җ
/// в”Ӯ    в”Ӯ в”Ӯ    в”Ӯ в”Ӯ    в”Ӯ
/// в”Ӯ  в”Ңв”Җв”јв”Җв”јв”Җв”җв”Ңв”Җв”јв”Җв”јв”Җв”җ  в”Ӯ
/// в””в”Җв”Җв”јв”Җв”ҳ в””в”Җв”јв”јв”Җв”ҳ в””в”Җв”јв”Җв”Җв”ҳ
/// в”Ңв”Җв”Җв”јв”Җв”җ в”Ңв”Җв”јв”јв”Җв”җ в”Ңв”Җв”јв”Җв”Җв”җ
/// в”Ӯ  в””в”Җв”јв”Җв”јв”Җв”ҳв””в”Җв”јв”Җв”јв”Җв”ҳ  в”Ӯ
/// в”Ӯ  в”Ңв”Җв”јв”Җв”јв”Җв”җв”Ңв”Җв”јв”Җв”јв”Җв”җ  в”Ӯ
/// в””в”Җв”Җв”јв”Җв”ҳ в””в”Җв”јв”јв”Җв”ҳ в””в”Җв”јв”Җв”Җв”ҳ
/// в”Ңв”Җв”Җв”јв”Җв”җ в”Ңв”Җв”јв”јв”Җв”җ в”Ңв”Җв”јв”Җв”Җв”җ
/// в”Ӯ  в””в”Җв”јв”Җв”јв”Җв”ҳв””в”Җв”јв”Җв”јв”Җв”ҳ  в”Ӯ
/// в”Ӯ    в”Ӯ в”Ӯ    в”Ӯ в”Ӯ    в”Ӯ
/// в””в”Җв”Җв”Җв”Җв”ҳ в””в”Җв”Җв”Җв”Җв”ҳ в””в”Җв”Җв”Җв”Җв”ҳ
/// ```
///
/// We return the pattern in two parts: the outer collection of `n x n`
/// non-overlapping squares, and the inner collection of `(n - 1) x (n - 1)`
/// non-overlapping squares.
pub fn checkerboard(n: usize) -> (MultiPolygon, MultiPolygon) {
    (
        squares((0.0, 0.0), 30.0, 40.0, 0.0, n),
        squares((20.0, 20.0), 30.0, 40.0, 0.0, n - 1),
    )
}

/// Like `checkerboard`, but with no exactly-horizontal lines.
///
/// Vertical and horizontal lines take special paths through the
/// intersection code, so their presence or absence can affect performance.
pub fn slanted_checkerboard(n: usize) -> (MultiPolygon, MultiPolygon) {
    (
        squares((0.0, 0.0), 30.0, 40.0, 1.0, n),
        squares((20.0, 20.0), 30.0, 40.0, 1.0, n - 1),
    )
}

/// The "evens" are a bunch of long, skinny parallelograms going from top-left
/// to bottom-right. The "odds" go from top-right to bottom-left.
pub fn slanties(n: usize) -> (MultiPolygon, MultiPolygon) {
    let h = 20.0 * n as f64;

    let mut even = Vec::new();
    let mut odd = Vec::new();
    for i in 0..n {
        let x_off = 20.0 * i as f64;
        even.push(vec![ring(&[
            (x_off, 0.0),
            (x_off + h, h),
            (x_off + h + 10.0, h),
            (x_off + 10.0, 0.0),
        ])]);

        odd.push(vec![ring(&[
            (x_off + h, 0.0),
            (x_off, h),
            (x_off + 10.0, h),
            (x_off + h + 10.0, 0.0),
        ])]);
    }

    (even, odd)
}

/// A regular-ish polygon with `n` vertices on a circle, with every other
/// vertex pulled in towards the center so that it looks like a star.
pub fn star(center: (f64, f64), radius: f64, n: usize) -> MultiPolygon {
    let points: Vec<_> = (0..n)
        .map(|i| {
            let theta = i as f64 * std::f64::consts::TAU / n as f64;
            let r = if i % 2 == 0 { radius } else { radius / 2.0 };
            (center.0 + r * theta.cos(), center.1 + r * theta.sin())
        })
        .collect();
    vec![vec![ring(&points)]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_sizes() {
        let (outer, inner) = checkerboard(3);
        assert_eq!(outer.len(), 9);
        assert_eq!(inner.len(), 4);

        let out = crate::xor(&outer, &[inner]).unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn slanties_cross() {
        let (even, odd) = slanties(3);
        let out = crate::intersection(&even, &[odd]).unwrap();
        assert!(!out.is_empty());
    }
}
