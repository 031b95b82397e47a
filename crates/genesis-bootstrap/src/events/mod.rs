//! Progress events
//!
//! The bootstrap pipeline reports its progress as an ordered sequence of
//! `(status, message)` pairs sent to an [`EventSink`](crate::ports::EventSink).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a progress event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Ongoing,
    Done,
}

/// A single progress update, immutable once created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    status: ProgressStatus,
    message: String,
}

impl ProgressEvent {
    pub fn new(status: ProgressStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn ongoing(message: impl Into<String>) -> Self {
        Self::new(ProgressStatus::Ongoing, message)
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self::new(ProgressStatus::Done, message)
    }

    pub fn status(&self) -> ProgressStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_done(&self) -> bool {
        self.status == ProgressStatus::Done
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ProgressStatus::Ongoing => write!(f, "... {}", self.message),
            ProgressStatus::Done => write!(f, "ok  {}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_status() {
        assert_eq!(
            ProgressEvent::ongoing("Computing the Genesis").status(),
            ProgressStatus::Ongoing
        );
        assert!(ProgressEvent::done("Genesis initialized").is_done());
    }

    #[test]
    fn test_serializes_snake_case_status() {
        let json = serde_json::to_string(&ProgressEvent::done("Blockchain initialized")).unwrap();
        assert_eq!(json, r#"{"status":"done","message":"Blockchain initialized"}"#);
    }

    #[test]
    fn test_display_marks_done_events() {
        assert_eq!(
            ProgressEvent::ongoing("Computing the Genesis").to_string(),
            "... Computing the Genesis"
        );
        assert_eq!(
            ProgressEvent::done("Genesis initialized").to_string(),
            "ok  Genesis initialized"
        );
    }
}
