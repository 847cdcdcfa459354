use serde::{Deserialize, Serialize};

use super::label::Label;
use super::naive_bayes::MultinomialNb;
use super::vectorizer::{CountVector, CountVectorizer};

/// A fitted bag-of-words + naive Bayes spam classifier.
///
/// The vectorizer and the model are two explicit stages chained directly:
/// `transform` runs the frozen vocabulary, `predict` runs both stages. A
/// `SpamClassifier` is never mutated after it is built, so it can be shared
/// across threads behind an `Arc` without locking.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use spamguard::{Label, SpamClassifier};
///
/// let classifier = SpamClassifier::builder()
///     .add_example("Win money now", Label::Spam)
///     .add_example("Hello friend, see you at lunch", Label::Ham)
///     .build()?;
///
/// assert_eq!(classifier.predict("win money"), Label::Spam);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamClassifier {
    pub(crate) vectorizer: CountVectorizer,
    pub(crate) model: MultinomialNb,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<SpamClassifier>();
    }
};

impl SpamClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Assembles a classifier from already fitted stages.
    pub(crate) fn from_parts(vectorizer: CountVectorizer, model: MultinomialNb) -> Self {
        Self { vectorizer, model }
    }

    /// Returns information about the fitted classifier
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            vocabulary_size: self.vectorizer.vocabulary_size(),
            alpha: self.model.alpha(),
            ham_examples: self.model.class_count(Label::Ham),
            spam_examples: self.model.class_count(Label::Spam),
            default_label: self.model.majority_class(),
        }
    }

    /// Maps text onto the frozen training vocabulary.
    pub fn transform(&self, text: &str) -> CountVector {
        self.vectorizer.transform(text)
    }

    /// Classifies one text. Empty text is valid and yields the class with the higher prior.
    pub fn predict(&self, text: &str) -> Label {
        self.model.predict(&self.transform(text))
    }

    /// Classifies several texts, returning labels in input order.
    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Label> {
        self.model.predict_batch(&self.vectorizer.transform_batch(texts))
    }

    /// Classifies one text and returns `(label, spam probability)`.
    pub fn predict_with_score(&self, text: &str) -> (Label, f64) {
        let vector = self.transform(text);
        let proba = self.model.predict_proba(&vector);
        (self.model.predict(&vector), proba[Label::Spam.index()])
    }

    pub fn vectorizer(&self) -> &CountVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &MultinomialNb {
        &self.model
    }
}
