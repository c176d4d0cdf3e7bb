use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use sweepclip::{BinaryOp, MultiPolygon, Options};

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RegressionCaseDeclaration {
    op: BinaryOp,
    subject: MultiPolygon,
    #[serde(default)]
    clips: Vec<MultiPolygon>,
    #[serde(default)]
    options: Options,
    #[serde(default)]
    assert: Assertions,
}

/// What to check about the output. Without any of these, we only check that
/// the operation succeeds and that its output is well-formed.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct Assertions {
    /// The output must be exactly this.
    output: Option<MultiPolygon>,
    /// The output must cover this much area.
    area: Option<f64>,
    /// The output must have this many polygons.
    polygons: Option<usize>,
    /// The operation must fail.
    #[serde(default)]
    error: bool,
}

fn main() {
    let args = Arguments::from_args();
    let tests = regression_tests();

    libtest_mimic::run(&args, tests).exit();
}

fn regression_tests() -> Vec<Trial> {
    let ws = env!("CARGO_MANIFEST_DIR");
    let Ok(file_paths) = glob::glob(&format!("{ws}/tests/regression/**/*.yml")) else {
        return Vec::new();
    };

    file_paths
        .flatten()
        .map(|p| {
            let name = input_path_base(&p).display().to_string();
            Trial::test(name, || run_regression_test(p))
        })
        .collect()
}

fn input_path_base(input_path: &Path) -> &Path {
    let base = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/regression");
    input_path.strip_prefix(base).unwrap_or(input_path)
}

/// The area enclosed by a ring: positive if it's counter-clockwise.
fn signed_area(ring: &[Vec<f64>]) -> f64 {
    ring.windows(2)
        .map(|w| w[0][0] * w[1][1] - w[0][1] * w[1][0])
        .sum::<f64>()
        / 2.0
}

fn check_well_formed(output: &MultiPolygon) -> Result<(), Failed> {
    for poly in output {
        for (i, ring) in poly.iter().enumerate() {
            if ring.len() < 4 {
                return Err(format!("ring {ring:?} has too few points").into());
            }
            if ring.first() != ring.last() {
                return Err(format!("ring {ring:?} isn't closed").into());
            }
            let area = signed_area(ring);
            if (i == 0) != (area > 0.0) {
                return Err(format!("ring {ring:?} has the wrong orientation").into());
            }
        }
    }
    Ok(())
}

fn run_regression_test(path: PathBuf) -> Result<(), Failed> {
    let input = std::fs::read_to_string(&path)?;
    let case: RegressionCaseDeclaration = serde_yaml::from_str(&input)?;
    let result = sweepclip::run(case.op, &case.subject, &case.clips, &case.options);

    let output = match result {
        Ok(output) => output,
        Err(_) if case.assert.error => return Ok(()),
        Err(e) => return Err(format!("{} failed: {e}", case.op).into()),
    };
    if case.assert.error {
        return Err(format!("expected an error, got {output:?}").into());
    }
    check_well_formed(&output)?;

    if let Some(expected) = &case.assert.output {
        if &output != expected {
            return Err(format!("expected {expected:?}, got {output:?}").into());
        }
    }
    if let Some(expected) = case.assert.area {
        let area: f64 = output.iter().flatten().map(|r| signed_area(r)).sum();
        if (area - expected).abs() > 1e-9 * expected.abs().max(1.0) {
            return Err(format!("expected area {expected}, got {area}").into());
        }
    }
    if let Some(n) = case.assert.polygons {
        if output.len() != n {
            return Err(format!("expected {n} polygons, got {}", output.len()).into());
        }
    }

    Ok(())
}
