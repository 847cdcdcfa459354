use log::info;

use super::classifier::SpamClassifier;
use super::error::ClassifierError;
use super::label::Label;
use super::naive_bayes::MultinomialNb;
use super::vectorizer::CountVectorizer;
use crate::dataset::{Dataset, LabeledExample};

/// Default additive smoothing constant (Laplace smoothing).
pub const DEFAULT_ALPHA: f64 = 1.0;

/// A builder for fitting a SpamClassifier with a fluent interface.
///
/// The vocabulary is fitted on exactly the examples added here, so test or
/// inference text can never leak into it.
#[derive(Debug, Clone)]
pub struct ClassifierBuilder {
    examples: Vec<LabeledExample>,
    alpha: f64,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder with Laplace smoothing
    ///
    /// # Example
    /// ```
    /// use spamguard::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            examples: Vec::new(),
            alpha: DEFAULT_ALPHA,
        }
    }

    /// Sets the additive smoothing constant. Validated in [`build`](Self::build).
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Adds a single training example.
    pub fn add_example(mut self, text: impl Into<String>, label: Label) -> Self {
        self.examples.push(LabeledExample::new(text, label));
        self
    }

    /// Adds every example of a dataset, in order.
    ///
    /// # Example
    /// ```
    /// use spamguard::{ClassifierBuilder, Dataset, Label, LabeledExample};
    ///
    /// let train = Dataset::new(vec![
    ///     LabeledExample::new("Free cash now", Label::Spam),
    ///     LabeledExample::new("See you tomorrow", Label::Ham),
    /// ]);
    /// let classifier = ClassifierBuilder::new().with_dataset(&train).build().unwrap();
    /// assert_eq!(classifier.info().vocabulary_size, 6);
    /// ```
    pub fn with_dataset(mut self, dataset: &Dataset) -> Self {
        self.examples.extend(dataset.examples().iter().cloned());
        self
    }

    /// Fits the vectorizer and the naive Bayes model and returns the classifier.
    ///
    /// # Returns
    /// * `Result<SpamClassifier, ClassifierError>` - The fitted classifier, or an error if:
    ///   - No examples have been added
    ///   - The smoothing constant is not positive
    pub fn build(self) -> Result<SpamClassifier, ClassifierError> {
        if self.examples.is_empty() {
            return Err(ClassifierError::BuildError("At least one training example must be added".to_string()));
        }

        let texts: Vec<&str> = self.examples.iter().map(|e| e.text.as_str()).collect();
        let labels: Vec<Label> = self.examples.iter().map(|e| e.label).collect();

        let vectorizer = CountVectorizer::fit(&texts);
        info!(
            "Vocabulary fitted on {} examples: {} tokens",
            texts.len(),
            vectorizer.vocabulary_size()
        );

        let vectors = vectorizer.transform_batch(&texts);
        let model = MultinomialNb::fit(&vectors, &labels, vectorizer.vocabulary_size(), self.alpha)?;

        Ok(SpamClassifier::from_parts(vectorizer, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_fails() {
        let result = ClassifierBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_invalid_alpha() {
        let result = ClassifierBuilder::new()
            .with_alpha(-1.0)
            .add_example("hello", Label::Ham)
            .build();
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_empty_text_examples_are_allowed() {
        let classifier = ClassifierBuilder::new()
            .add_example("", Label::Ham)
            .add_example("cash prize", Label::Spam)
            .build()
            .unwrap();
        assert_eq!(classifier.info().vocabulary_size, 2);
    }

    #[test]
    fn test_vocabulary_only_from_training() {
        let classifier = ClassifierBuilder::new()
            .add_example("hello friend", Label::Ham)
            .build()
            .unwrap();
        classifier.predict("brand new words");
        assert_eq!(classifier.vectorizer().index_of("brand"), None);
        assert_eq!(classifier.info().vocabulary_size, 2);
    }
}
