//! Closed status set for reminder instances and the delivery channel.
//!
//! The backend writes several synonyms (`failure`, `rejected`, `waiting`);
//! everything is folded into [`InstanceStatus`] at ingestion so the rest of
//! the crate never matches on raw strings.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl InstanceStatus {
    /// Map a raw backend status onto the closed set.
    ///
    /// Unknown and missing values fall back to `Pending`.
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Pending;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "failed" | "failure" | "rejected" => Self::Failed,
            "pending" | "waiting" => Self::Pending,
            other => {
                tracing::debug!(
                    status = other,
                    "unrecognized instance status, treating as pending"
                );
                Self::Pending
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Caregiver-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::Success => "Tomado",
            Self::Failed => "No tomado",
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the patient is contacted for a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Whatsapp,
    Call,
}

impl DeliveryMethod {
    /// Parse a raw method string; `None` for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "whatsapp" => Some(Self::Whatsapp),
            "call" => Some(Self::Call),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Call => "call",
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
