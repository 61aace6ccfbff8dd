use std::error::Error;
use std::path::{Path, PathBuf};

use backprop_ann::{
    Config, Dataset, LabelEncoding, NearestNeighbour, Network, TestReport, TracingSink, report,
};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::subscriber::SetGlobalDefaultError;
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "backprop-ann", version, about = "Backpropagation classifier with a kNN baseline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Train the network and test it on the held-out examples
    Ann {
        #[command(flatten)]
        data: DataArgs,
        /// Parameter file, or JSON with a .json extension
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Per-epoch network error output
        #[arg(short, long, value_name = "PATH", default_value = "error.dat")]
        error_file: PathBuf,
        /// Per-epoch training accuracy output (written with --plot)
        #[arg(short, long, value_name = "PATH", default_value = "accuracy.dat")]
        accuracy_file: PathBuf,
        /// Also write the accuracy plot data
        #[arg(short, long)]
        plot: bool,
        /// Repeat with consecutive seeds and report the mean test accuracy
        #[arg(long, value_name = "N", default_value_t = 1)]
        runs: u32,
        /// Log every N-th epoch
        #[arg(long, value_name = "N", default_value_t = 100)]
        log_every: usize,
    },
    /// Classify the held-out examples with k-nearest-neighbour
    Knn {
        #[command(flatten)]
        data: DataArgs,
        /// Parameter file supplying the attribute and class counts
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
        #[arg(short, long, value_name = "INT", default_value_t = 1)]
        k: usize,
    },
}

#[derive(Args)]
struct DataArgs {
    /// Whitespace-separated dataset, one example per line
    #[arg(short, long, value_name = "PATH")]
    data: PathBuf,
    #[arg(short, long, value_name = "INT")]
    seed: Option<u64>,
    /// Percentage of examples used for training
    #[arg(short = 't', long, value_name = "PERCENT")]
    training_ratio: Option<u32>,
    #[arg(long, value_name = "ENCODING")]
    label_encoding: Option<LabelEncoding>,
}

fn install_logger(verbose: u8, quiet: bool) -> Result<(), SetGlobalDefaultError> {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

/// Load the config and apply command-line overrides.
fn load_config(path: Option<&Path>, data: &DataArgs) -> Result<Config, Box<dyn Error>> {
    let mut cfg = match path {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };
    if let Some(ratio) = data.training_ratio {
        cfg.training_ratio = ratio;
    }
    if let Some(encoding) = data.label_encoding {
        cfg.label_encoding = encoding;
    }
    if data.seed.is_some() {
        cfg.seed = data.seed;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Load and normalize the dataset once for every run.
fn load_dataset(cfg: &Config, path: &Path) -> Result<Dataset, Box<dyn Error>> {
    let mut dataset = Dataset::load(path, cfg.num_inputs, cfg.num_outputs, cfg.label_encoding)?;
    info!(examples = dataset.len(), path = %path.display(), "dataset loaded");
    dataset.normalize();
    Ok(dataset)
}

/// Stratified split of a copy of `dataset` seeded with `seed`.
fn split(cfg: &Config, dataset: &Dataset, seed: u64) -> backprop_ann::Result<(Dataset, Dataset)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (training, testing) = dataset.clone().stratified_split(cfg.training_ratio, &mut rng)?;
    info!(
        training = training.len(),
        testing = testing.len(),
        ratio = cfg.training_ratio,
        "dataset split"
    );
    Ok((training, testing))
}

/// Outcome of one seeded run of the network.
struct Run {
    net: Network,
    test: TestReport,
}

/// Split, build, train and test one network with `seed`.
///
/// The error history is written to `error_file` (and the hit history to
/// `accuracy_file`, when given) before testing.
fn run_network(
    cfg: &Config,
    dataset: &Dataset,
    seed: u64,
    log_every: usize,
    error_file: &Path,
    accuracy_file: Option<&Path>,
) -> backprop_ann::Result<Run> {
    let (training, testing) = split(cfg, dataset, seed)?;
    let train_cfg = cfg.train_config();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut net = cfg.build_network(&mut rng)?;
    let mut examples = training.into_examples();
    let mut sink = TracingSink::new(log_every);
    let report = net.train_with_sink(&mut examples, &train_cfg, &mut rng, &mut sink)?;
    if let Some(last) = report.last() {
        info!(
            seed,
            epochs = last.epoch,
            error = last.network_error,
            hit_percentage = last.hit_percentage,
            stopped_early = report.stopped_early,
            "training finished"
        );
    }

    report::save_plot_data(error_file, net.error_history())?;
    if let Some(path) = accuracy_file {
        report::save_plot_data(path, net.hit_history())?;
    }

    let test = net.test(
        testing.examples(),
        train_cfg.hidden_activation,
        train_cfg.output_activation,
    )?;
    Ok(Run { net, test })
}

/// `error.dat` becomes `error-run2.dat` for the second of several runs.
fn run_path(path: &Path, run: u32, runs: u32) -> PathBuf {
    if runs <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-run{}.{}", run + 1, ext.to_string_lossy()),
        None => format!("{stem}-run{}", run + 1),
    };
    path.with_file_name(name)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    install_logger(cli.verbose, cli.quiet)?;

    match cli.command {
        Command::Ann {
            data,
            config,
            error_file,
            accuracy_file,
            plot,
            runs,
            log_every,
        } => {
            let cfg = load_config(config.as_deref(), &data)?;
            let base_seed = cfg.seed.unwrap_or_else(|| rand::thread_rng().r#gen());
            let runs = runs.max(1);
            info!(
                inputs = cfg.num_inputs,
                hiddens = cfg.num_hidden,
                outputs = cfg.num_outputs,
                hidden_activation = %cfg.hidden_activation,
                output_activation = %cfg.output_activation,
                epochs = cfg.num_epochs,
                seed = base_seed,
                "network configuration"
            );

            let dataset = load_dataset(&cfg, &data.data)?;
            let mut accuracies = Vec::with_capacity(runs as usize);
            for run in 0..runs {
                let seed = base_seed.wrapping_add(u64::from(run));
                let accuracy_path = plot.then(|| run_path(&accuracy_file, run, runs));
                let outcome = run_network(
                    &cfg,
                    &dataset,
                    seed,
                    log_every,
                    &run_path(&error_file, run, runs),
                    accuracy_path.as_deref(),
                )?;
                info!(
                    run = run + 1,
                    epochs = outcome.net.epochs_run(),
                    test_cases = outcome.test.total,
                    "run complete"
                );
                accuracies.push(outcome.test.hit_percentage);
            }

            if let Some(mean) = report::mean(&accuracies) {
                info!(runs, mean_hit_percentage = mean, "all runs complete");
            }
        }
        Command::Knn { data, config, k } => {
            let cfg = load_config(config.as_deref(), &data)?;
            let seed = cfg.seed.unwrap_or_else(|| rand::thread_rng().r#gen());
            info!(k, seed, "k-nearest-neighbour");

            let knn = NearestNeighbour::new(k)?;
            let dataset = load_dataset(&cfg, &data.data)?;
            let (training, testing) = split(&cfg, &dataset, seed)?;
            knn.evaluate(training.examples(), testing.examples())?;
        }
    }
    Ok(())
}
