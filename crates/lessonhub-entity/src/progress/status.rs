//! Progress status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A student's progress through a lesson's required activities.
///
/// Student-path events only ever move the status forward along
/// `Purchased → VideoWatched → ExamPassed → AssignmentDone`; only the
/// admin reset and the explicit field-override operation may move it
/// backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "progress_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    /// Initial state after purchase or redemption.
    Purchased,
    /// The student has watched the lesson video at least once.
    VideoWatched,
    /// The student passed the lesson exam.
    ExamPassed,
    /// The student's assignment submission was graded (terminal).
    AssignmentDone,
}

impl ProgressStatus {
    /// Position in the forward-only transition order.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Purchased => 0,
            Self::VideoWatched => 1,
            Self::ExamPassed => 2,
            Self::AssignmentDone => 3,
        }
    }

    /// Whether `target` is a forward move from this status.
    pub fn can_advance_to(&self, target: ProgressStatus) -> bool {
        target.rank() > self.rank()
    }

    /// Return the status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchased => "PURCHASED",
            Self::VideoWatched => "VIDEO_WATCHED",
            Self::ExamPassed => "EXAM_PASSED",
            Self::AssignmentDone => "ASSIGNMENT_DONE",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = lessonhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PURCHASED" => Ok(Self::Purchased),
            "VIDEO_WATCHED" => Ok(Self::VideoWatched),
            "EXAM_PASSED" => Ok(Self::ExamPassed),
            "ASSIGNMENT_DONE" => Ok(Self::AssignmentDone),
            _ => Err(lessonhub_core::AppError::validation(format!(
                "Invalid progress status: '{s}'. Expected one of: PURCHASED, VIDEO_WATCHED, EXAM_PASSED, ASSIGNMENT_DONE"
            ))),
        }
    }
}
