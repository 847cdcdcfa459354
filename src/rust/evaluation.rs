use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::artifact;
use crate::classifier::{Label, SpamClassifier};
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::utils::write_atomic;

/// Prediction outcome counts with spam as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(actual: &[Label], predicted: &[Label]) -> Self {
        let mut matrix = Self::default();
        for (&truth, &guess) in actual.iter().zip(predicted) {
            match (truth.is_spam(), guess.is_spam()) {
                (true, true) => matrix.true_positive += 1,
                (false, true) => matrix.false_positive += 1,
                (false, false) => matrix.true_negative += 1,
                (true, false) => matrix.false_negative += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    /// Fraction correct; 0 for an empty set.
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// `tp / (tp + fp)`; 0 when nothing was predicted spam.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// `tp / (tp + fn)`; 0 when there is no actual spam.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// The evaluation result written to the metrics file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

impl From<ConfusionMatrix> for MetricsRecord {
    fn from(matrix: ConfusionMatrix) -> Self {
        Self {
            accuracy: matrix.accuracy(),
            precision: matrix.precision(),
            recall: matrix.recall(),
        }
    }
}

impl MetricsRecord {
    /// Writes the record as pretty JSON (4-space indent), replacing the file atomically.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let path = path.as_ref();
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;

        write_atomic(path, &buf)?;
        Ok(())
    }

    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Scores `classifier` on `dataset` through the classifier's own frozen vocabulary.
pub fn evaluate(classifier: &SpamClassifier, dataset: &Dataset) -> (MetricsRecord, ConfusionMatrix) {
    let predictions = classifier.predict_batch(&dataset.texts());
    let matrix = ConfusionMatrix::from_predictions(&dataset.labels(), &predictions);
    (matrix.into(), matrix)
}

/// Loads the artifact and the test partition, evaluates, and writes the metrics file.
pub fn run_evaluation(config: &PipelineConfig) -> Result<MetricsRecord, PipelineError> {
    info!("Loading model and test data...");
    let classifier = artifact::load(&config.model_path)?;
    let test = Dataset::load_processed(config.test_path())?;

    info!("Making predictions on {} examples...", test.len());
    let (metrics, matrix) = evaluate(&classifier, &test);

    info!("--------------------------------");
    info!("Accuracy:  {:.2}", metrics.accuracy);
    info!("Precision: {:.2}", metrics.precision);
    info!("Recall:    {:.2}", metrics.recall);
    info!("--------------------------------");
    log::debug!("Confusion matrix: {:?}", matrix);

    metrics.write_json(&config.metrics_path)?;
    info!("Metrics saved to {:?}", config.metrics_path);
    Ok(metrics)
}
