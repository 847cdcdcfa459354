//! A small spam/ham text classification pipeline: preprocess a labeled
//! dataset, fit a bag-of-words naive Bayes classifier, evaluate it, and
//! serve predictions over HTTP.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use spamguard::{Label, SpamClassifier};
//!
//! let classifier = SpamClassifier::builder()
//!     .add_example("Win money now", Label::Spam)
//!     .add_example("Free cash bitcoin", Label::Spam)
//!     .add_example("Hello friend", Label::Ham)
//!     .build()?;
//!
//! let label = classifier.predict("free bitcoin");
//! println!("Predicted class: {}", label);
//! # Ok(())
//! # }
//! ```
//!
//! # Persistence and Thread Safety
//!
//! A fitted classifier is immutable. It is written once with
//! [`artifact::save`] and every consumer loads its own copy with
//! [`artifact::load`]; the copy can be shared across threads using `Arc`:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use spamguard::{artifact, Label, SpamClassifier};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("model.bin");
//! let classifier = SpamClassifier::builder()
//!     .add_example("cash prize", Label::Spam)
//!     .add_example("see you soon", Label::Ham)
//!     .build()?;
//! artifact::save(&classifier, &path)?;
//!
//! let loaded = Arc::new(artifact::load(&path)?);
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let classifier = Arc::clone(&loaded);
//!     handles.push(thread::spawn(move || classifier.predict("cash")));
//! }
//!
//! for handle in handles {
//!     assert_eq!(handle.join().unwrap(), Label::Spam);
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod service;
pub mod training;
mod utils;

pub use artifact::ArtifactError;
pub use classifier::{
    ClassifierBuilder, ClassifierError, ClassifierInfo, CountVector, CountVectorizer, Label, MultinomialNb,
    SpamClassifier,
};
pub use config::PipelineConfig;
pub use dataset::{preprocess, Dataset, DatasetError, LabeledExample, PreprocessSummary};
pub use error::PipelineError;
pub use evaluation::{evaluate, run_evaluation, ConfusionMatrix, MetricsRecord};
pub use service::{PredictRequest, PredictResponse, PredictionService};
pub use training::{run_training, TrainingReport};

/// Initialises `env_logger`. `RUST_LOG` wins; otherwise `level` is the default filter.
pub fn init_logger(level: log::LevelFilter) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str())).init();
}
