//! Core types shared by the training pipeline and the serving layer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary news label
///
/// The numeric encoding (`Fake = 0`, `Real = 1`) is part of the artifact
/// format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Fabricated or misleading article
    Fake,
    /// Genuine article
    Real,
}

impl Label {
    /// Both labels in class-index order
    pub const ALL: [Label; 2] = [Label::Fake, Label::Real];

    /// Class index used by the classifiers
    pub fn index(self) -> usize {
        match self {
            Self::Fake => 0,
            Self::Real => 1,
        }
    }

    /// Display form used in prediction responses
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fake => "Fake",
            Self::Real => "Real",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Title and body joined by a single space
    pub content: String,

    /// Ground truth label
    pub label: Label,
}

impl Document {
    /// Create a document from an already combined text
    pub fn new(content: impl Into<String>, label: Label) -> Self {
        Self {
            content: content.into(),
            label,
        }
    }

    /// Create a document from separate title and body fields
    pub fn from_parts(title: &str, text: &str, label: Label) -> Self {
        Self {
            content: format!("{title} {text}"),
            label,
        }
    }
}
