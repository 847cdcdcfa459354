use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{info, LevelFilter};
use spamguard::{artifact, preprocess, run_evaluation, run_training, PipelineConfig, PredictionService};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// More log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Base directory for relative data, model and metrics paths
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Model artifact path
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// Default log level: `warn`, raised by each `-v`, lowered to `error` by `-q`.
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::from_env_with_home(self.home.as_deref());
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        config
    }
}

#[derive(Subcommand)]
enum Command {
    /// Split the raw tab-separated dataset into train/test CSV files
    Preprocess(PreprocessArgs),
    /// Fit the classifier on the train split and save the model artifact
    Train(TrainArgs),
    /// Score the saved model on the test split and write metrics
    Evaluate(EvaluateArgs),
    /// Serve POST /predict over HTTP
    Serve(ServeArgs),
    /// Classify text from the command line with the saved model
    Predict(PredictArgs),
}

#[derive(ClapArgs)]
struct PreprocessArgs {
    /// Raw `<label>\t<text>` file
    #[arg(long)]
    raw: Option<PathBuf>,
    /// Output directory for train.csv and test.csv
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    test_ratio: Option<f64>,
}

#[derive(ClapArgs)]
struct TrainArgs {
    /// Additive smoothing constant
    #[arg(long)]
    alpha: Option<f64>,
    /// Fraction of the train split held out for validation
    #[arg(long)]
    validation_ratio: Option<f64>,
    /// Phrase to classify after training (repeatable; replaces the default probe)
    #[arg(long = "probe")]
    probes: Vec<String>,
    /// Write the training report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(ClapArgs)]
struct EvaluateArgs {
    /// Metrics output file
    #[arg(long)]
    metrics: Option<PathBuf>,
}

#[derive(ClapArgs)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[derive(ClapArgs)]
struct PredictArgs {
    /// Texts to classify
    #[arg(required = true)]
    texts: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    spamguard::init_logger(args.log_level());
    let mut config = args.config();
    let start_time = Instant::now();

    match args.command {
        Command::Preprocess(cmd) => {
            if let Some(raw) = cmd.raw {
                config.raw_data_path = raw;
            }
            if let Some(dir) = cmd.out_dir {
                config.processed_dir = dir;
            }
            config.seed = cmd.seed.unwrap_or(config.seed);
            config.test_ratio = cmd.test_ratio.unwrap_or(config.test_ratio);

            let summary = preprocess(&config)
                .with_context(|| format!("Failed to preprocess {:?}", config.raw_data_path))?;
            println!(
                "Done! {} messages split into {} train / {} test rows in {:?}",
                summary.total, summary.train_size, summary.test_size, config.processed_dir
            );
        }
        Command::Train(cmd) => {
            config.alpha = cmd.alpha.unwrap_or(config.alpha);
            config.validation_ratio = cmd.validation_ratio.unwrap_or(config.validation_ratio);
            if !cmd.probes.is_empty() {
                config.probe_phrases = cmd.probes;
            }
            if cmd.report.is_some() {
                config.report_path = cmd.report;
            }

            let report = run_training(&config).context("Training failed")?;
            println!("Accuracy:  {:.4}", report.accuracy);
            println!("Precision: {:.4}", report.precision);
            for probe in &report.probes {
                println!("Probe: {:?} => {}", probe.text, probe.label);
            }
            println!("Model saved to {:?}", report.artifact_path);
        }
        Command::Evaluate(cmd) => {
            if let Some(metrics) = cmd.metrics {
                config.metrics_path = metrics;
            }

            let metrics = run_evaluation(&config).context("Evaluation failed")?;
            println!("--------------------------------");
            println!("Accuracy:  {:.2}", metrics.accuracy);
            println!("Precision: {:.2}", metrics.precision);
            println!("Recall:    {:.2}", metrics.recall);
            println!("--------------------------------");
            println!("Metrics saved to {:?}", config.metrics_path);
        }
        Command::Serve(cmd) => {
            let addr = cmd.bind.unwrap_or(config.bind_addr);
            let service = PredictionService::load(&config.model_path)
                .with_context(|| format!("Failed to load model from {:?}", config.model_path))?;
            service
                .bind_and_serve(addr)
                .await
                .with_context(|| format!("Prediction service on {} failed", addr))?;
        }
        Command::Predict(cmd) => {
            let classifier = artifact::load(&config.model_path)
                .with_context(|| format!("Failed to load model from {:?}", config.model_path))?;
            for text in &cmd.texts {
                let (label, spam_probability) = classifier.predict_with_score(text);
                println!("{}\t{:.3}\t{}", label, spam_probability, text);
            }
        }
    }

    info!("Finished in {:.2?}", start_time.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn test_default_log_level_is_warn() {
        assert_eq!(parse(&["spamguard", "train"]).log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_verbose_flags_raise_log_level() {
        assert_eq!(parse(&["spamguard", "-v", "train"]).log_level(), LevelFilter::Info);
        assert_eq!(parse(&["spamguard", "train", "-vv"]).log_level(), LevelFilter::Debug);
        assert_eq!(parse(&["spamguard", "-vvv", "evaluate"]).log_level(), LevelFilter::Trace);
        assert_eq!(parse(&["spamguard", "-q", "serve"]).log_level(), LevelFilter::Error);
    }

    #[test]
    fn test_model_flag_overrides_artifact_path() {
        let args = parse(&["spamguard", "--model", "/tmp/other.bin", "predict", "hello"]);
        assert_eq!(args.config().model_path, PathBuf::from("/tmp/other.bin"));
    }
}
