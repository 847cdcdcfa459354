mod builder;
mod classifier;
mod error;
mod label;
mod naive_bayes;
mod vectorizer;

pub use builder::{ClassifierBuilder, DEFAULT_ALPHA};
pub use classifier::SpamClassifier;
pub use error::ClassifierError;
pub use label::Label;
pub use naive_bayes::MultinomialNb;
pub use vectorizer::{tokenize, CountVector, CountVectorizer};

/// Summary of a fitted classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierInfo {
    pub vocabulary_size: usize,
    pub alpha: f64,
    pub ham_examples: usize,
    pub spam_examples: usize,
    /// Label assigned to text with no known tokens.
    pub default_label: Label,
}
