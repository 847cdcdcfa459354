//! Labeled SMS datasets: loading the raw tab-separated file, the
//! deterministic train/test split, and the processed CSV partitions.

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::classifier::Label;
use crate::config::PipelineConfig;
use crate::utils::{write_atomic, write_pair_atomic};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Malformed data at line {line}: {reason}")]
    DataFormat { line: u64, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Split ratio must be within [0, 1], got {0}")]
    InvalidRatio(f64),
}

/// One message and its class. `text` is never absent: missing text is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub label: Label,
    #[serde(default)]
    pub text: String,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

/// An ordered collection of labeled examples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    examples: Vec<LabeledExample>,
}

impl Dataset {
    pub fn new(examples: Vec<LabeledExample>) -> Self {
        Self { examples }
    }

    /// Loads the raw `<label>\t<text>` file (no header row).
    ///
    /// Labels must be exactly `spam` or `ham`; anything else fails the whole
    /// load. A row with only a label loads with empty text. Quote characters
    /// are kept as literal message text.
    pub fn load_raw<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        info!("Loading raw dataset from {:?}", path);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(path)?;

        let mut examples = Vec::new();
        for record in reader.records() {
            let record = record.map_err(raw_row_error)?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.len() > 2 {
                error!("Row at line {} has {} columns", line, record.len());
                return Err(DatasetError::DataFormat {
                    line,
                    reason: format!("expected 2 tab-separated columns, found {}", record.len()),
                });
            }

            let raw_label = record.get(0).unwrap_or_default();
            let label = Label::from_raw(raw_label).ok_or_else(|| {
                error!("Unknown label {:?} at line {}", raw_label, line);
                DatasetError::DataFormat {
                    line,
                    reason: format!("unknown label {:?} (expected \"spam\" or \"ham\")", raw_label),
                }
            })?;
            let text = record.get(1).unwrap_or_default();
            examples.push(LabeledExample::new(text, label));
        }

        info!("Total messages found: {}", examples.len());
        Ok(Self { examples })
    }

    /// Loads a processed partition written by [`write_csv`](Self::write_csv).
    pub fn load_processed<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        debug!("Loading processed dataset from {:?}", path);
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

        let examples = reader
            .deserialize::<LabeledExample>()
            .map(|row| {
                row.map_err(|e| DatasetError::DataFormat {
                    line: e.position().map(|p| p.line()).unwrap_or(0),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { examples })
    }

    /// Writes the partition as CSV with a `label,text` header.
    ///
    /// The file is written to a temporary sibling and renamed into place.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        let path = path.as_ref();
        write_atomic(path, &self.to_csv()?)?;
        debug!("Wrote {} rows to {:?}", self.examples.len(), path);
        Ok(())
    }

    /// Serializes the partition in the processed CSV layout.
    pub fn to_csv(&self) -> Result<Vec<u8>, DatasetError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        writer.write_record(["label", "text"])?;
        for example in &self.examples {
            writer.serialize(example)?;
        }
        writer.into_inner().map_err(|e| DatasetError::Io(e.into_error()))
    }

    /// Shuffles with a seeded RNG and cuts off `ceil(test_ratio * n)` examples for testing.
    ///
    /// The same examples, seed and ratio always give the same partitions.
    pub fn split(&self, seed: u64, test_ratio: f64) -> Result<(Dataset, Dataset), DatasetError> {
        if !(0.0..=1.0).contains(&test_ratio) {
            return Err(DatasetError::InvalidRatio(test_ratio));
        }

        let n = self.examples.len();
        let n_test = ((test_ratio * n as f64).ceil() as usize).min(n);

        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let pick = |indices: &[usize]| Dataset {
            examples: indices.iter().map(|&i| self.examples[i].clone()).collect(),
        };
        let test = pick(&order[..n_test]);
        let train = pick(&order[n_test..]);

        debug!("Split {} examples: {} train, {} test", n, train.len(), test.len());
        Ok((train, test))
    }

    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    pub fn texts(&self) -> Vec<&str> {
        self.examples.iter().map(|e| e.text.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.examples.iter().map(|e| e.label).collect()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Returns `(ham, spam)` counts.
    pub fn label_counts(&self) -> (usize, usize) {
        let spam = self.examples.iter().filter(|e| e.label.is_spam()).count();
        (self.examples.len() - spam, spam)
    }

    /// Number of examples whose text contains `term`, ignoring case.
    pub fn count_containing(&self, term: &str) -> usize {
        let needle = term.to_lowercase();
        self.examples
            .iter()
            .filter(|e| e.text.to_lowercase().contains(&needle))
            .count()
    }
}

/// Undecodable text is a malformed row; other CSV failures pass through.
fn raw_row_error(e: csv::Error) -> DatasetError {
    match e.kind() {
        csv::ErrorKind::Utf8 { pos, err } => {
            let line = pos.as_ref().map(|p| p.line()).unwrap_or(0);
            error!("Invalid UTF-8 at line {}", line);
            DatasetError::DataFormat {
                line,
                reason: format!("invalid UTF-8 in field {}", err.field()),
            }
        }
        _ => DatasetError::Csv(e),
    }
}

impl FromIterator<LabeledExample> for Dataset {
    fn from_iter<I: IntoIterator<Item = LabeledExample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// What a preprocessing run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessSummary {
    pub total: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
}

/// Loads the raw file, splits it and writes `train.csv` and `test.csv`.
pub fn preprocess(config: &PipelineConfig) -> Result<PreprocessSummary, DatasetError> {
    let dataset = Dataset::load_raw(&config.raw_data_path)?;

    info!("Splitting data...");
    let (train, test) = dataset.split(config.seed, config.test_ratio)?;

    // Both partitions are replaced together or not at all.
    let train_path = config.train_path();
    let test_path = config.test_path();
    let train_csv = train.to_csv()?;
    let test_csv = test.to_csv()?;
    write_pair_atomic(
        (train_path.as_path(), train_csv.as_slice()),
        (test_path.as_path(), test_csv.as_slice()),
    )?;

    info!("Saved {} train / {} test rows to {:?}", train.len(), test.len(), config.processed_dir);
    Ok(PreprocessSummary {
        total: dataset.len(),
        train_size: train.len(),
        test_size: test.len(),
        train_path,
        test_path,
    })
}
