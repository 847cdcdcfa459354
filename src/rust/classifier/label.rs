use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// The binary class code. `Ham` is 0, `Spam` is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// Both classes in code order.
    pub const ALL: [Label; 2] = [Label::Ham, Label::Spam];

    pub fn code(self) -> u8 {
        match self {
            Label::Ham => 0,
            Label::Spam => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Label::Ham),
            1 => Some(Label::Spam),
            _ => None,
        }
    }

    /// Maps the raw dataset label. Only the exact strings `"spam"` and `"ham"` are accepted.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "spam" => Some(Label::Spam),
            "ham" => Some(Label::Ham),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        self.code() as usize
    }

    pub fn is_spam(self) -> bool {
        self == Label::Spam
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Ham => write!(f, "Ham"),
            Label::Spam => write!(f, "Spam"),
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.code()
    }
}

impl TryFrom<u8> for Label {
    type Error = ClassifierError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Label::from_code(code).ok_or_else(|| {
            ClassifierError::ValidationError(format!("Unknown label code {} (expected 0 or 1)", code))
        })
    }
}
