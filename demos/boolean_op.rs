use std::path::PathBuf;

use clap::{Args, Parser};
use serde::Deserialize;

use sweepclip::{generators, BinaryOp, MultiPolygon, Options};

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Example {
    Checkerboard,
    SlantedCheckerboard,
    Slanties,
    Stars,
}

/// Runs a boolean operation and prints the result as YAML.
#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    input: Input,

    /// The operation to run; overrides the one in the input file.
    #[arg(long)]
    op: Option<BinaryOp>,

    /// Snap coordinates that are closer than this.
    #[arg(long)]
    epsilon: Option<f64>,

    /// Print the result as SVG path data instead of YAML.
    #[arg(long)]
    svg: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// A YAML file with `op`, `subject`, `clips` and (optionally) `options`.
    input: Option<PathBuf>,

    #[arg(long)]
    example: Option<Example>,
}

#[derive(Deserialize)]
struct InputFile {
    op: Option<BinaryOp>,
    subject: MultiPolygon,
    #[serde(default)]
    clips: Vec<MultiPolygon>,
    #[serde(default)]
    options: Options,
}

fn read_input(input: &Input) -> anyhow::Result<InputFile> {
    match (&input.input, &input.example) {
        (Some(path), None) => {
            let input = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&input)?)
        }
        (None, Some(example)) => {
            let (subject, clip) = match example {
                Example::Checkerboard => generators::checkerboard(10),
                Example::SlantedCheckerboard => generators::slanted_checkerboard(10),
                Example::Slanties => generators::slanties(10),
                Example::Stars => (
                    generators::star((0.0, 0.0), 100.0, 64),
                    generators::star((30.0, 10.0), 100.0, 64),
                ),
            };
            Ok(InputFile {
                op: None,
                subject,
                clips: vec![clip],
                options: Options::default(),
            })
        }
        _ => anyhow::bail!("need exactly one of an input file or --example"),
    }
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Cli::parse();
    let mut input = read_input(&args.input)?;
    if args.epsilon.is_some() {
        input.options.epsilon = args.epsilon;
    }
    let op = args.op.or(input.op).unwrap_or(BinaryOp::Union);

    let start = std::time::Instant::now();
    let output = sweepclip::run(op, &input.subject, &input.clips, &input.options)?;
    tracing::info!(%op, elapsed = ?start.elapsed(), polygons = output.len(), "done");

    if args.svg {
        println!("{}", sweepclip::bez_path(&output).to_svg());
    } else {
        print!("{}", serde_yaml::to_string(&output)?);
    }

    Ok(())
}
