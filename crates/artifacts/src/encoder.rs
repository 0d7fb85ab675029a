use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use uf_core::CategoryEncoder;

use crate::{read_json, ArtifactError};

#[derive(Debug, Serialize, Deserialize)]
struct EncoderFile {
    classes: Vec<String>,
}

/// Fitted label encoder: a value's code is its position in `classes`.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, u32>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::invalid("encoder", "empty vocabulary"));
        }
        let mut codes = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            let code = u32::try_from(i)
                .map_err(|_| ArtifactError::invalid("encoder", "vocabulary too large"))?;
            if codes.insert(class.clone(), code).is_some() {
                return Err(ArtifactError::invalid(
                    "encoder",
                    format!("duplicate class {class:?}"),
                ));
            }
        }
        Ok(Self { classes, codes })
    }

    /// Load `{"classes": [...]}`.
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let file: EncoderFile = read_json(path)?;
        let encoder = Self::new(file.classes)?;
        info!(path = %path.display(), classes = encoder.classes.len(), "loaded label encoder");
        Ok(encoder)
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl CategoryEncoder for LabelEncoder {
    fn encode(&self, value: &str) -> Option<u32> {
        self.codes.get(value).copied()
    }

    fn vocabulary_len(&self) -> usize {
        self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn codes_follow_class_positions() {
        let enc = LabelEncoder::new(classes(&["CAT", "KOMATSU", "VOLVO"])).unwrap();
        assert_eq!(enc.encode("KOMATSU"), Some(1));
        assert_eq!(enc.encode("VOLVO"), Some(2));
        assert_eq!(enc.decode(0), Some("CAT"));
        assert_eq!(enc.vocabulary_len(), 3);
    }

    #[test]
    fn lookup_is_exact() {
        let enc = LabelEncoder::new(classes(&["CAT"])).unwrap();
        assert_eq!(enc.encode("cat"), None);
        assert_eq!(enc.encode(" CAT"), None);
        assert_eq!(enc.encode("NOT_A_REAL_BRAND"), None);
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        assert!(LabelEncoder::new(classes(&["A", "A"])).is_err());
        assert!(LabelEncoder::new(Vec::new()).is_err());
    }
}
