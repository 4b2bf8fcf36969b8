//! Evaluation CLI: load ratings and negatives, build a popularity baseline and report HR, NDCG, Precision.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use topkeval::{
    data::{load_negatives, load_test_instances, load_train_matrix, InteractionCounts},
    eval::{LogSink, Protocol, ReportSink, WriterSink},
    model::ItemPopularity,
    Config, Evaluator, MetricSummary, Recommender,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Leave-one-out if there is one test instance per user, online otherwise.
    Auto,
    /// Leave-one-out evaluation, parallel over users.
    Offline,
    /// Replay the test file in order, updating the model after each instance.
    Online,
}

impl Mode {
    fn protocol(self, user_count: usize, test_len: usize) -> Protocol {
        match self {
            Mode::Auto => Protocol::detect(user_count, test_len),
            Mode::Offline => Protocol::Offline,
            Mode::Online => Protocol::Online,
        }
    }
}

/// Evaluate a top-K recommender on held-out data.
#[derive(Parser, Debug)]
#[command(name = "eval")]
struct Args {
    /// Config file (default: $TOPKEVAL_CONFIG or ./config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Evaluation protocol.
    #[arg(long, value_enum, default_value = "auto")]
    mode: Mode,

    /// Iteration label for the progress line.
    #[arg(long, default_value_t = 0)]
    iter: usize,

    /// Print the metric summary as JSON on stdout (progress goes to the log).
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonReport {
    mode: Protocol,
    instances: usize,
    #[serde(flatten)]
    summary: MetricSummary,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.harness.log_level.as_str()),
    )
    .init();

    let train = load_train_matrix(&config.data.train_path)?;
    let test = load_test_instances(&config.data.test_path)?;
    let negatives = load_negatives(&config.data.negatives_path)?;
    log::info!(
        "Loaded {} users, {} items, {} training interactions, {} test instances",
        train.user_count(),
        train.item_count(),
        train.nnz(),
        test.len()
    );

    let evaluator = Evaluator::new(config.evaluation.clone())?;
    log::debug!("Evaluation settings: {:?}", evaluator.config());

    let build_start = Instant::now();
    let mut model = ItemPopularity::new(train);
    model.train();

    let protocol = args.mode.protocol(model.user_count(), test.len());
    log::info!("Running {:?} evaluation", protocol);

    let mut stdout_sink = WriterSink::new(std::io::stdout());
    let mut log_sink = LogSink;
    let sink: &mut dyn ReportSink = if args.json {
        &mut log_sink
    } else {
        &mut stdout_sink
    };

    let results = evaluator.run_iteration(
        args.iter,
        build_start,
        protocol,
        &mut model,
        &negatives,
        &test,
        sink,
    )?;

    if args.json {
        let output = JsonReport {
            mode: protocol,
            instances: results.len(),
            summary: results.summary(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
