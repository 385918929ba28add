use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use ikebana_qubo::{
    ArrangementRequest, BaseArrangement, BaseReport, DEFAULT_NUM_READS, ExtensionCandidates,
    ExtensionReport, FlowerCatalog, FlowerSpec, Orientation, SimulatedAnnealer, Vessel,
    optimize_base, optimize_extension,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ikebana-solver")]
#[command(about = "Ikebana arrangement optimizer (QUBO + simulated annealing)", long_about = None)]
struct Args {
    /// Verbose output level (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Optional random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Input JSON path ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output JSON path ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Annealer reads per solve
    #[arg(long, default_value_t = DEFAULT_NUM_READS)]
    num_reads: usize,

    /// Annealer sweeps per read
    #[arg(long, default_value_t = SimulatedAnnealer::DEFAULT_SWEEPS)]
    sweeps: usize,

    /// Also place middle3 and middle4 around the solved base
    #[arg(long)]
    extend: bool,
}

/// Either a `flowers` list or a `weights` + `lengths` pair.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputRequest {
    width: f64,
    height: f64,
    #[serde(default)]
    flowers: Vec<FlowerSpec>,
    /// Key order is kept (`preserve_order`) and becomes the catalog order.
    #[serde(default)]
    weights: Map<String, Value>,
    #[serde(default)]
    lengths: HashMap<String, Vec<f64>>,
    #[serde(default)]
    forced_flower: Option<String>,
    #[serde(default)]
    front_azimuth: f64,
    #[serde(default)]
    front_elevation: f64,
}

impl InputRequest {
    fn into_request(self) -> Result<ArrangementRequest> {
        let catalog = if self.flowers.is_empty() {
            let weights = self
                .weights
                .into_iter()
                .map(|(name, value)| match value.as_f64() {
                    Some(weight) => Ok((name, weight)),
                    None => anyhow::bail!("weight of '{name}' is not a number: {value}"),
                })
                .collect::<Result<Vec<_>>>()?;
            FlowerCatalog::from_maps(weights, &self.lengths)
        } else {
            FlowerCatalog::new(self.flowers)
        }
        .context("invalid flower catalog")?;
        Ok(ArrangementRequest {
            vessel: Vessel::new(self.width, self.height)?,
            catalog,
            forced_flower: self.forced_flower,
            front: Orientation {
                azimuth: self.front_azimuth,
                elevation: self.front_elevation,
            },
        })
    }
}

#[derive(Debug, Serialize)]
struct Output {
    #[serde(flatten)]
    base: BaseReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    extension: Option<ExtensionReport>,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    info!(
        seed = ?args.seed,
        num_reads = args.num_reads,
        sweeps = args.sweeps,
        "ikebana-solver: starting up"
    );

    let mut input_json = String::new();
    if args.input == "-" {
        io::stdin().read_to_string(&mut input_json)?;
    } else {
        input_json = fs::read_to_string(&args.input)
            .with_context(|| format!("failed to read input file: {}", &args.input))?;
    }

    let input: InputRequest =
        serde_json::from_str(&input_json).context("failed to parse input JSON")?;
    let request = input.into_request()?;

    let (sampler, mut rng) = match args.seed {
        Some(seed) => (SimulatedAnnealer::new(seed), StdRng::seed_from_u64(seed)),
        None => (SimulatedAnnealer::from_entropy(), StdRng::from_entropy()),
    };
    let mut sampler = sampler.with_sweeps(args.sweeps);

    let solution = optimize_base(&request, &mut sampler, &mut rng, args.num_reads)
        .context("base pass failed")?;

    let extension = if args.extend {
        match BaseArrangement::try_from(&solution) {
            Ok(base) => {
                let ext = optimize_extension(
                    &base,
                    &ExtensionCandidates::default(),
                    &mut sampler,
                    &mut rng,
                    args.num_reads,
                )
                .context("extension pass failed")?;
                Some(ExtensionReport::from(&ext))
            }
            Err(e) => {
                warn!(error = %e, "skipping extension pass");
                None
            }
        }
    } else {
        None
    };

    let out = Output {
        base: BaseReport::from(&solution),
        extension,
    };
    let serialized = serde_json::to_string_pretty(&out)?;

    if args.output == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(serialized.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        fs::write(&args.output, serialized)
            .with_context(|| format!("failed to write output file: {}", &args.output))?;
    }

    Ok(())
}
