use log::{debug, warn};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::label::Label;
use super::vectorizer::CountVector;

const N_CLASSES: usize = 2;

/// Multinomial naive Bayes over token-count vectors.
///
/// Parameters are stored per class in [`Label`] code order (row 0 is ham,
/// row 1 is spam). Additive smoothing with `alpha` keeps every token's
/// likelihood strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    alpha: f64,
    class_count: Array1<f64>,
    feature_count: Array2<f64>,
    class_log_prior: Array1<f64>,
    feature_log_prob: Array2<f64>,
}

impl MultinomialNb {
    /// Estimates class priors and per-class token log-likelihoods.
    ///
    /// # Errors
    /// - `ValidationError` if `alpha` is not a positive finite number
    /// - `ValidationError` if `vectors` and `labels` differ in length
    /// - `ValidationError` if a vector references a feature outside `n_features`
    /// - `BuildError` if there are no training examples
    pub fn fit(
        vectors: &[CountVector],
        labels: &[Label],
        n_features: usize,
        alpha: f64,
    ) -> Result<Self, ClassifierError> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ClassifierError::ValidationError(
                format!("Smoothing alpha must be positive, got {}", alpha)
            ));
        }
        if vectors.len() != labels.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} feature vectors but {} labels",
                vectors.len(),
                labels.len()
            )));
        }
        if vectors.is_empty() {
            return Err(ClassifierError::BuildError("At least one training example is required".into()));
        }

        let mut class_count = Array1::<f64>::zeros(N_CLASSES);
        let mut feature_count = Array2::<f64>::zeros((N_CLASSES, n_features));

        for (vector, label) in vectors.iter().zip(labels) {
            let row = label.index();
            class_count[row] += 1.0;
            for (index, count) in vector.iter() {
                if index >= n_features {
                    return Err(ClassifierError::ValidationError(format!(
                        "Feature index {} out of range for {} features",
                        index, n_features
                    )));
                }
                feature_count[[row, index]] += count as f64;
            }
        }

        for label in Label::ALL {
            if class_count[label.index()] == 0.0 {
                warn!("No '{}' examples in training data; that class will never be predicted", label);
            }
        }

        let total = class_count.sum();
        let class_log_prior = class_count.mapv(|c| c.ln() - total.ln());

        let smoothed = feature_count.mapv(|c| c + alpha);
        let smoothed_totals = smoothed.sum_axis(Axis(1));
        let mut feature_log_prob = smoothed.mapv(f64::ln);
        for (mut row, class_total) in feature_log_prob.outer_iter_mut().zip(smoothed_totals.iter()) {
            row -= class_total.ln();
        }

        debug!(
            "Fitted naive Bayes: {} ham / {} spam examples, {} features",
            class_count[0], class_count[1], n_features
        );

        Ok(Self {
            alpha,
            class_count,
            feature_count,
            class_log_prior,
            feature_log_prob,
        })
    }

    /// Unnormalized posterior log-probability per class.
    ///
    /// Features beyond the fitted vocabulary are ignored.
    pub fn joint_log_likelihood(&self, vector: &CountVector) -> [f64; N_CLASSES] {
        let n_features = self.n_features();
        let mut scores = [0.0; N_CLASSES];
        for label in Label::ALL {
            let row = label.index();
            let likelihood: f64 = vector
                .iter()
                .filter(|&(index, _)| index < n_features)
                .map(|(index, count)| count as f64 * self.feature_log_prob[[row, index]])
                .sum();
            scores[row] = self.class_log_prior[row] + likelihood;
        }
        scores
    }

    /// Returns the class with the highest posterior. Ties go to `Ham`.
    pub fn predict(&self, vector: &CountVector) -> Label {
        let scores = self.joint_log_likelihood(vector);
        if scores[Label::Spam.index()] > scores[Label::Ham.index()] {
            Label::Spam
        } else {
            Label::Ham
        }
    }

    pub fn predict_batch(&self, vectors: &[CountVector]) -> Vec<Label> {
        vectors.iter().map(|v| self.predict(v)).collect()
    }

    /// Posterior probabilities `[p(ham), p(spam)]`, summing to one.
    pub fn predict_proba(&self, vector: &CountVector) -> [f64; N_CLASSES] {
        let scores = self.joint_log_likelihood(vector);
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let norm: f64 = exp.iter().sum();
        [exp[0] / norm, exp[1] / norm]
    }

    /// The class an all-zero vector is assigned to.
    pub fn majority_class(&self) -> Label {
        self.predict(&CountVector::default())
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    pub fn class_count(&self, label: Label) -> usize {
        self.class_count[label.index()] as usize
    }

    pub fn class_log_prior(&self) -> &Array1<f64> {
        &self.class_log_prior
    }

    pub fn feature_log_prob(&self) -> &Array2<f64> {
        &self.feature_log_prob
    }
}
