use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::classifier::SpamClassifier;
use crate::utils::write_atomic;

const MAGIC: &[u8; 8] = b"SPAMGRD1";
const HASH_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + HASH_LEN;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Model artifact not found: {0}")]
    NotFound(PathBuf),
    #[error("Model artifact is corrupt: {0}")]
    Corrupt(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to encode model: {0}")]
    Encode(#[from] bincode::Error),
}

/// Writes `classifier` (vocabulary + naive Bayes parameters) to `path`.
///
/// The file is `magic | sha256(payload) | payload` with a bincode payload.
/// It is written to a temporary file next to `path`, synced, and renamed
/// over the destination, so readers never observe a partial artifact.
pub fn save<P: AsRef<Path>>(classifier: &SpamClassifier, path: P) -> Result<(), ArtifactError> {
    let path = path.as_ref();
    let payload = bincode::serialize(classifier)?;
    let hash = Sha256::digest(&payload);

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&hash);
    bytes.extend_from_slice(&payload);
    write_atomic(path, &bytes)?;

    log::info!("Saved model artifact ({} bytes) to {:?}", HEADER_LEN + payload.len(), path);
    log::debug!("Artifact hash: {:x}", hash);
    Ok(())
}

/// Loads a classifier written by [`save`].
///
/// # Errors
/// - `NotFound` if nothing exists at `path`
/// - `Corrupt` if the header, checksum or payload does not check out
/// - `Io` for any other read failure
pub fn load<P: AsRef<Path>>(path: P) -> Result<SpamClassifier, ArtifactError> {
    let path = path.as_ref();
    let bytes = read_artifact(path)?;
    let payload = verified_payload(&bytes)?;

    let classifier: SpamClassifier = bincode::deserialize(payload)
        .map_err(|e| ArtifactError::Corrupt(format!("undecodable payload: {}", e)))?;

    let n_features = classifier.vectorizer().vocabulary_size();
    if classifier.model().n_features() != n_features {
        return Err(ArtifactError::Corrupt(format!(
            "model has {} features but the vocabulary has {}",
            classifier.model().n_features(),
            n_features
        )));
    }

    log::info!("Loaded model artifact from {:?} ({} features)", path, n_features);
    Ok(classifier)
}

/// Checks the header and checksum without decoding the model.
pub fn verify<P: AsRef<Path>>(path: P) -> Result<bool, ArtifactError> {
    let path = path.as_ref();
    log::info!("Verifying artifact: {:?}", path);
    let bytes = match read_artifact(path) {
        Ok(bytes) => bytes,
        Err(ArtifactError::NotFound(_)) => return Ok(false),
        Err(e) => return Err(e),
    };
    match verified_payload(&bytes) {
        Ok(_) => Ok(true),
        Err(ArtifactError::Corrupt(reason)) => {
            log::warn!("Artifact verification failed: {}", reason);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::error!("Model artifact not found at {:?}", path);
            Err(ArtifactError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(ArtifactError::Io(e)),
    }
}

fn verified_payload(bytes: &[u8]) -> Result<&[u8], ArtifactError> {
    if bytes.len() < HEADER_LEN {
        return Err(ArtifactError::Corrupt(format!(
            "file is {} bytes, shorter than the {}-byte header",
            bytes.len(),
            HEADER_LEN
        )));
    }
    let (magic, rest) = bytes.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(ArtifactError::Corrupt("not a spamguard model file".into()));
    }
    let (expected, payload) = rest.split_at(HASH_LEN);
    let actual = Sha256::digest(payload);
    if actual.as_slice() != expected {
        return Err(ArtifactError::Corrupt(format!(
            "hash mismatch: expected {}, got {:x}",
            hex(expected),
            actual
        )));
    }
    Ok(payload)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Label;
    use tempfile::tempdir;

    fn sample_classifier() -> SpamClassifier {
        SpamClassifier::builder()
            .add_example("Win money now", Label::Spam)
            .add_example("Hello friend", Label::Ham)
            .build()
            .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models").join("model.bin");
        let classifier = sample_classifier();

        save(&classifier, &path).unwrap();
        assert!(verify(&path).unwrap());
        assert_eq!(load(&path).unwrap(), classifier);
    }

    #[test]
    fn test_save_replaces_previous_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        save(&sample_classifier(), &path).unwrap();

        let replacement = SpamClassifier::builder()
            .add_example("totally different vocabulary", Label::Ham)
            .build()
            .unwrap();
        save(&replacement, &path).unwrap();
        assert_eq!(load(&path).unwrap(), replacement);
        // no temporary files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.bin");
        assert!(matches!(load(&path), Err(ArtifactError::NotFound(_))));
        assert!(!verify(&path).unwrap());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, "corrupted data").unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Corrupt(_))));
        assert!(!verify(&path).unwrap());

        fs::write(&path, b"SPAMGRD1").unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Corrupt(_))));
    }

    #[test]
    fn test_flipped_byte_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        save(&sample_classifier(), &path).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Corrupt(_))));
    }

    #[test]
    fn test_valid_hash_bad_payload_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let payload = b"not bincode";
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&Sha256::digest(payload));
        bytes.extend_from_slice(payload);
        fs::write(&path, bytes).unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Corrupt(_))));
    }
}
