use assert_matches::assert_matches;
use proptest::prelude::*;
use sweepclip::{BinaryOp, Error, MultiPolygon, Options, Ring};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
    vec![
        vec![x0, y0],
        vec![x1, y0],
        vec![x1, y1],
        vec![x0, y1],
        vec![x0, y0],
    ]
}

/// A rectangular hole, oriented and started the way holes come out.
fn hole(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
    vec![
        vec![x1, y0],
        vec![x0, y0],
        vec![x0, y1],
        vec![x1, y1],
        vec![x1, y0],
    ]
}

fn mp(rings: Vec<Ring>) -> MultiPolygon {
    vec![rings]
}

fn area(mp: &MultiPolygon) -> f64 {
    mp.iter()
        .flatten()
        .map(|ring| {
            ring.windows(2)
                .map(|w| w[0][0] * w[1][1] - w[0][1] * w[1][0])
                .sum::<f64>()
                / 2.0
        })
        .sum()
}

const OPS: [BinaryOp; 4] = [
    BinaryOp::Union,
    BinaryOp::Intersection,
    BinaryOp::Xor,
    BinaryOp::Difference,
];

#[test]
fn with_itself() {
    let a = mp(vec![rect(0.0, 0.0, 3.0, 2.0), hole(1.0, 0.5, 2.0, 1.5)]);
    assert_eq!(sweepclip::union(&a, &[a.clone()]).unwrap(), a);
    assert_eq!(sweepclip::intersection(&a, &[a.clone()]).unwrap(), a);
    assert!(sweepclip::xor(&a, &[a.clone()]).unwrap().is_empty());
    assert!(sweepclip::difference(&a, &[a.clone()]).unwrap().is_empty());
}

#[test]
fn deterministic() {
    let a = mp(vec![rect(0.0, 0.0, 2.0, 2.0)]);
    let b = mp(vec![rect(1.0, 1.0, 3.0, 3.0)]);
    let c = mp(vec![rect(2.5, -1.0, 4.0, 1.5)]);
    let clips = [b, c];
    for op in OPS {
        let first = sweepclip::run(op, &a, &clips, &Options::default()).unwrap();
        let second = sweepclip::run(op, &a, &clips, &Options::default()).unwrap();
        assert_eq!(first, second, "{op}");
    }
}

#[test]
fn outputs_are_already_normalized() {
    let a = mp(vec![rect(0.0, 0.0, 2.0, 2.0)]);
    let b = mp(vec![rect(1.0, 1.0, 3.0, 3.0)]);
    let c = mp(vec![rect(2.5, -1.0, 4.0, 1.5)]);
    for op in OPS {
        let once = sweepclip::run(op, &a, &[b.clone(), c.clone()], &Options::default()).unwrap();
        let twice = sweepclip::union(&once, &[]).unwrap();
        assert_eq!(once, twice, "{op}");
    }
}

#[test]
fn clips_are_all_used() {
    let a = mp(vec![rect(0.0, 0.0, 4.0, 1.0)]);
    let b = mp(vec![rect(0.0, 0.0, 1.0, 1.0)]);
    let c = mp(vec![rect(3.0, 0.0, 4.0, 1.0)]);
    let out = sweepclip::difference(&a, &[b.clone(), c.clone()]).unwrap();
    assert_eq!(out, mp(vec![rect(1.0, 0.0, 3.0, 1.0)]));

    let out = sweepclip::union(&b, &[c]).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(area(&out), 2.0);
}

#[test]
fn intersection_of_many() {
    let a = mp(vec![rect(0.0, 0.0, 4.0, 4.0)]);
    let b = mp(vec![rect(1.0, 0.0, 5.0, 4.0)]);
    let c = mp(vec![rect(0.0, 1.0, 4.0, 5.0)]);
    let out = sweepclip::intersection(&a, &[b, c]).unwrap();
    assert_eq!(out, mp(vec![rect(1.0, 1.0, 4.0, 4.0)]));
}

#[test]
fn xor_of_three() {
    // Three overlapping strips. The middle third is covered by all of them,
    // so it's in the xor.
    let a = mp(vec![rect(0.0, 0.0, 3.0, 1.0)]);
    let b = mp(vec![rect(1.0, 0.0, 4.0, 1.0)]);
    let c = mp(vec![rect(2.0, 0.0, 5.0, 1.0)]);
    let out = sweepclip::xor(&a, &[b, c]).unwrap();
    // [0, 1] (once), [2, 3] (three times) and [4, 5] (once).
    assert_eq!(out.len(), 3);
    assert_eq!(area(&out), 3.0);
}

#[test]
fn touching_at_a_corner() {
    let a = mp(vec![rect(0.0, 0.0, 1.0, 1.0)]);
    let b = mp(vec![rect(1.0, 1.0, 2.0, 2.0)]);
    assert!(sweepclip::intersection(&a, &[b.clone()]).unwrap().is_empty());
    let out = sweepclip::union(&a, &[b]).unwrap();
    assert_eq!(area(&out), 2.0);
}

#[test]
fn extra_coordinates_are_ignored() {
    let a = mp(vec![vec![
        vec![0.0, 0.0, 7.0],
        vec![1.0, 0.0, 7.0],
        vec![1.0, 1.0, 7.0],
        vec![0.0, 1.0, 7.0],
    ]]);
    assert_eq!(sweepclip::union(&a, &[]).unwrap(), mp(vec![rect(0.0, 0.0, 1.0, 1.0)]));
}

#[test]
fn resource_limits() {
    let a = mp(vec![rect(0.0, 0.0, 2.0, 2.0)]);
    let b = mp(vec![rect(1.0, 1.0, 3.0, 3.0)]);
    let options = Options {
        max_sweep_line_segments: 2,
        ..Options::default()
    };
    assert_matches!(
        sweepclip::run(BinaryOp::Union, &a, &[b], &options),
        Err(Error::ResourceLimit { .. })
    );
}

fn small_rect() -> impl Strategy<Value = Ring> {
    (0i32..6, 0i32..6, 1i32..4, 1i32..4).prop_map(|(x, y, w, h)| {
        let (x, y, w, h) = (x as f64, y as f64, w as f64, h as f64);
        rect(x, y, x + w, y + h)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn inclusion_exclusion(a in small_rect(), b in small_rect()) {
        let a = mp(vec![a]);
        let b = mp(vec![b]);
        let clips = [b.clone()];
        let union = sweepclip::union(&a, &clips).unwrap();
        let intersection = sweepclip::intersection(&a, &clips).unwrap();
        let xor = sweepclip::xor(&a, &clips).unwrap();
        let difference = sweepclip::difference(&a, &clips).unwrap();

        prop_assert_eq!(area(&union) + area(&intersection), area(&a) + area(&b));
        prop_assert_eq!(area(&xor), area(&union) - area(&intersection));
        prop_assert_eq!(area(&difference), area(&a) - area(&intersection));
    }
}
