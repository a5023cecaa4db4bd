use std::{
    collections::BTreeMap,
    io::{stdin, BufRead},
    path::PathBuf,
    time::Instant,
};

use allocation_factor::{
    allocation::finalize,
    factors::nonlinear::NonlinearOptions,
    outlier::trim_problem,
    Allocator, DeltaNonLinearOptimizer, FactorConfig, LinearNdAllocation, Normalized,
    ObjectiveMatrix, Problem, Sense, Senses, SimpleLinearOptimizer,
};
use anyhow::{bail, Context as _};
use clap::{Parser, ValueEnum};
use rand::{rngs::SmallRng, SeedableRng as _};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Compute allocation factors for candidates read as CSV from stdin, then dispatch orders to them
/// in proportion to their share.
///
/// The first line is a header: `name,<objective>,...`. Every following line is one candidate.
#[derive(Debug, Parser)]
struct Args {
    /// TOML file with `senses` and a `[factor]` table. Flags override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// One sense per objective column (1 maximize, -1 minimize), or a single sense for all.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    senses: Vec<i64>,
    #[arg(long, value_enum, default_value_t = Model::Linear)]
    model: Model,
    /// Orders to dispatch.
    #[arg(long, default_value_t = 10_000)]
    orders: u32,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    no_appreciate: bool,
    #[arg(long)]
    appreciate_index: Option<usize>,
    #[arg(long)]
    round_to: Option<f64>,
    /// Tukey fence multiplier.
    #[arg(long)]
    trim_outliers: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Model {
    Linear,
    Simple,
    Nonlinear,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SimulatorConfig {
    senses: Vec<Sense>,
    factor: FactorConfig,
}

impl SimulatorConfig {
    fn load(args: &Args) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => Self::default(),
        };
        if !args.senses.is_empty() {
            config.senses = args
                .senses
                .iter()
                .map(|&s| Sense::try_from(s))
                .collect::<Result<_, _>>()?;
        }
        if args.no_appreciate {
            config.factor.appreciate = false;
        }
        if let Some(index) = args.appreciate_index {
            config.factor.appreciate_index = index;
        }
        if let Some(round_to) = args.round_to {
            config.factor.round_to = round_to;
        }
        if args.trim_outliers.is_some() {
            config.factor.trim_outliers = args.trim_outliers;
        }
        Ok(config)
    }

    fn senses(&self) -> anyhow::Result<Senses> {
        match self.senses.as_slice() {
            [] => bail!("no senses given, pass --senses or set them in --config"),
            [sense] => Ok(Senses::All(*sense)),
            senses => Ok(Senses::Each(senses.to_vec())),
        }
    }
}

#[derive(Debug)]
struct Table {
    names: Vec<String>,
    objectives: Vec<String>,
    xs: ObjectiveMatrix,
}

fn read_table(input: impl BufRead) -> anyhow::Result<Table> {
    let mut lines = input.lines();
    let header = lines.next().context("empty input")??;
    let objectives = header
        .split(',')
        .skip(1)
        .map(|s| s.trim().to_string())
        .collect();

    let mut names = Vec::new();
    let mut records = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split(',').map(str::to_string);
        names.push(fields.next().unwrap_or_default());
        records.push(fields.collect::<Vec<String>>());
    }
    // Candidates arrive as rows; the pipeline wants one row per objective.
    let by_candidate = ObjectiveMatrix::parse_rows(&records)?;
    let xs = ObjectiveMatrix::from_array(
        by_candidate
            .into_inner()
            .reversed_axes()
            .as_standard_layout()
            .into_owned(),
    )?;
    Ok(Table {
        names,
        objectives,
        xs,
    })
}

/// Config fields set away from their defaults that `model` does not read. Outlier trimming and
/// the rounding grid apply to every model.
fn ignored_fields(model: Model, factor: &FactorConfig) -> Vec<&'static str> {
    let defaults = FactorConfig::default();
    let delta = [
        ("delta_method", factor.delta_method != defaults.delta_method),
        ("delta_methods", factor.delta_methods != defaults.delta_methods),
        ("absolute", factor.absolute != defaults.absolute),
    ];
    let linear = [
        ("scale", factor.scale != defaults.scale),
        ("round_digits", factor.round_digits != defaults.round_digits),
        ("appreciate", factor.appreciate != defaults.appreciate),
        ("appreciate_index", factor.appreciate_index != defaults.appreciate_index),
        ("appreciate_method", factor.appreciate_method != defaults.appreciate_method),
    ];
    let mut unread = Vec::new();
    match model {
        Model::Linear => {}
        Model::Simple => {
            unread.extend(delta);
            unread.extend(linear);
        }
        Model::Nonlinear => unread.extend(linear),
    }
    unread
        .into_iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| name)
        .collect()
}

fn allocator(model: Model, factor: &FactorConfig) -> anyhow::Result<Box<dyn Allocator>> {
    let ignored = ignored_fields(model, factor);
    if !ignored.is_empty() {
        tracing::warn!(?model, ?ignored, "config fields do not apply to this model");
    }
    Ok(match model {
        Model::Linear => Box::new(LinearNdAllocation::new(factor.options()?)),
        Model::Simple => Box::new(SimpleLinearOptimizer::default()),
        Model::Nonlinear => Box::new(DeltaNonLinearOptimizer::new(NonlinearOptions {
            aggregation: factor.options()?.delta.aggregation,
            absolute: factor.absolute,
            ..Default::default()
        })),
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = SimulatorConfig::load(&args)?;
    let table = read_table(stdin().lock())?;
    tracing::info!(
        candidates = table.names.len(),
        objectives = ?table.objectives,
        "read candidates"
    );

    let mut problem = Problem::new(table.xs, config.senses()?)?;
    if let Some(fence) = config.factor.trim_outliers {
        problem = trim_problem(problem, fence)?;
    }
    let options = config.factor.options()?;
    let model = allocator(args.model, &config.factor)?;

    let t0 = Instant::now();
    let result = finalize(model.fit(&problem)?, options.round_to)?;
    tracing::info!(
        model = model.name(),
        elapsed_μs = Instant::now().duration_since(t0).as_micros() as u64,
        "computed allocation"
    );

    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let mut dispatched: BTreeMap<usize, u32> = BTreeMap::new();
    for _ in 0..args.orders {
        if let Some(candidate) = result.choose(&mut rng) {
            *dispatched.entry(candidate).or_default() += 1;
        }
    }

    println!("candidate,raw,share,share_rounded,dispatched");
    for candidate in result.ranking() {
        let realized = dispatched.get(&candidate).copied().unwrap_or(0) as f64
            / args.orders.max(1) as f64;
        println!(
            "{},{:.6},{:.4},{:.2},{:.4}",
            table.names[candidate],
            result.raw[candidate],
            result.share[candidate],
            result.share_rounded[candidate],
            realized,
        );
    }
    let top = result
        .ranking()
        .first()
        .and_then(|&c| result.allocation(c))
        .unwrap_or(Normalized::ZERO);
    tracing::info!(top_share = %top, "done");
    Ok(())
}
