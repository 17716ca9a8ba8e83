use crate::convention::{decode, NameDate, YearBounds};
use crate::proprietary::{detect, ProprietaryName};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameClassification {
    Canonical(NameDate),
    Proprietary(ProprietaryName),
    Unrecognized,
}

impl NameClassification {
    pub fn of(name: &str, bounds: &YearBounds) -> Self {
        if let Ok(date) = decode(name, bounds) {
            return Self::Canonical(date);
        }
        match detect(name, bounds) {
            Some(proprietary) => Self::Proprietary(proprietary),
            None => Self::Unrecognized,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Canonical(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub classification: NameClassification,
}

impl FileRecord {
    pub fn classify(path: PathBuf, bounds: &YearBounds) -> Self {
        let classification = match path.file_name().and_then(|v| v.to_str()) {
            Some(name) => NameClassification::of(name, bounds),
            None => NameClassification::Unrecognized,
        };
        Self {
            path,
            classification,
        }
    }

    pub fn file_name(&self) -> &str {
        file_name_lossy(&self.path)
    }
}

pub(crate) fn file_name_lossy(path: &Path) -> &str {
    path.file_name().and_then(|v| v.to_str()).unwrap_or_default()
}
