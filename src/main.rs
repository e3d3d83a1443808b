use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use ferrite_train::monitor::JsonlSink;
use ferrite_train::run::{init_logging, seeded_rng, RunDir};
use ferrite_train::{plot, Config, Dataset, Optimizer, Scheduler, TrainingSession, TrainingState};

/// Train a classifier for a fixed number of epochs, keeping the best
/// checkpoint and optionally resuming from an earlier run.
#[derive(Parser, Debug)]
#[command(name = "ferrite-train", version, about)]
struct Cli {
    /// YAML run configuration.
    #[arg(long = "config-file", default_value = "config.example.yml")]
    config_file: PathBuf,
}

/// Loads the configuration and creates the run directory. Nothing is
/// logged yet, so failures here go straight to stderr.
fn prepare(cli: &Cli) -> anyhow::Result<(Config, RunDir)> {
    let config = Config::load(&cli.config_file)
        .with_context(|| format!("loading {}", cli.config_file.display()))?;
    let run_dir = RunDir::create(&config).context("creating run directory")?;
    run_dir.copy_config(&cli.config_file)?;
    Ok((config, run_dir))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (config, run_dir) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // Flushes log.txt when main returns, after any failure is logged.
    let _guard = init_logging(run_dir.path());
    info!("Run directory: {}", run_dir.path().display());

    match train(&config, &run_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn train(config: &Config, run_dir: &RunDir) -> anyhow::Result<()> {
    let mut rng = seeded_rng(config);
    info!("Device: cpu");

    let batch = &config.training.batch_size;
    let dataset = Dataset::load(
        config.dataset.name,
        config.dataset.root.as_deref(),
        batch.train,
        batch.val,
        &mut rng,
    )?;
    info!("Dataset: {}", dataset.name);
    info!("Classes: {}, input channels: {}", dataset.num_classes, dataset.in_channels);
    info!(
        "Train examples: {}, validation examples: {}",
        dataset.train.num_examples(),
        dataset.val.num_examples()
    );

    let network = config.model.name.build(dataset.num_classes, dataset.in_channels, &mut rng);
    info!("Model: {} ({} parameters)", config.model.name, network.parameter_count());

    let optimizer = Optimizer::from_config(&config.training.optimizer);
    let scheduler = Scheduler::from_config(
        &config.training.scheduler,
        config.training.optimizer.learning_rate(),
        config.training.num_epochs,
    );
    info!("Optimizer: {}, scheduler: {}", optimizer.kind(), scheduler.kind());

    let sink = JsonlSink::in_dir(run_dir.path())?;
    let fresh = TrainingState::fresh(network, optimizer, scheduler);
    let mut session = TrainingSession::bootstrap(config, fresh, dataset, &run_dir.checkpoint_path(), sink)?;
    let history = session.run()?;

    run_dir.write_history(&history)?;
    plot::save_plot(&history, &run_dir.plot_path(config))?;
    info!("Best validation accuracy: {}%", session.state().best_accuracy);
    Ok(())
}
