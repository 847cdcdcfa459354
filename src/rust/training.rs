use std::path::PathBuf;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::artifact;
use crate::classifier::{Label, SpamClassifier};
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::evaluation::evaluate;
use crate::utils::write_atomic;

/// Hyperparameters recorded alongside a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub alpha: f64,
    pub seed: u64,
    pub validation_ratio: f64,
}

/// The outcome of a training run, in the shape an experiment tracker consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub params: TrainingParams,
    pub train_size: usize,
    pub validation_size: usize,
    pub vocabulary_size: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub artifact_path: PathBuf,
    /// Each configured probe phrase with the label it received.
    pub probes: Vec<ProbeResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub text: String,
    pub label: Label,
}

/// Fits a classifier on `train` after holding out `validation_ratio` of it.
///
/// Returns the fitted classifier with its validation report. With a zero
/// ratio the whole partition is used for fitting and the metrics are
/// computed on it.
pub fn fit_with_validation(
    train: &Dataset,
    config: &PipelineConfig,
) -> Result<(SpamClassifier, TrainingReport)> {
    let (fit_set, validation) = train.split(config.seed, config.validation_ratio)?;
    let scored = if validation.is_empty() { &fit_set } else { &validation };

    let classifier = SpamClassifier::builder()
        .with_alpha(config.alpha)
        .with_dataset(&fit_set)
        .build()?;

    let (metrics, _) = evaluate(&classifier, scored);
    let report = TrainingReport {
        params: TrainingParams {
            alpha: config.alpha,
            seed: config.seed,
            validation_ratio: config.validation_ratio,
        },
        train_size: fit_set.len(),
        validation_size: validation.len(),
        vocabulary_size: classifier.info().vocabulary_size,
        accuracy: metrics.accuracy,
        precision: metrics.precision,
        artifact_path: config.model_path.clone(),
        probes: Vec::new(),
    };
    Ok((classifier, report))
}

/// Runs the training job: check data, fit, validate, probe, then persist.
pub fn run_training(config: &PipelineConfig) -> Result<TrainingReport> {
    info!(">>> Checking training data");
    let train = Dataset::load_processed(config.train_path())?;
    info!("Total training examples: {}", train.len());
    for term in &config.check_terms {
        let count = train.count_containing(term);
        if count > 0 {
            info!("Found {} training examples containing {:?}", count, term);
        } else {
            warn!("No training examples contain {:?}; the model may miss that pattern", term);
        }
    }

    info!(">>> Training model");
    let (classifier, mut report) = fit_with_validation(&train, config)?;
    info!("Validation accuracy:  {:.4}", report.accuracy);
    info!("Validation precision: {:.4}", report.precision);

    info!(">>> Probing trained model");
    for phrase in &config.probe_phrases {
        let label = classifier.predict(phrase);
        info!("Probe {:?} => [{}]", phrase, label.to_string().to_uppercase());
        report.probes.push(ProbeResult {
            text: phrase.clone(),
            label,
        });
    }

    // A failed report write must leave the previous model in place.
    if let Some(path) = &config.report_path {
        write_atomic(path, &serde_json::to_vec_pretty(&report)?)?;
        info!("Training report saved to {:?}", path);
    }

    artifact::save(&classifier, &config.model_path)?;

    Ok(report)
}
