//! Access-control policy configuration.

use serde::{Deserialize, Serialize};

/// Policy knobs for grants, progress, and access codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Maximum recorded video views per lesson.
    #[serde(default = "default_video_view_cap")]
    pub video_view_cap: i32,
    /// Length of generated access codes.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Maximum number of codes per generation batch.
    #[serde(default = "default_max_code_batch")]
    pub max_code_batch: i64,
    /// Grant duration in days when a code is redeemed.
    #[serde(default = "default_code_grant_days")]
    pub code_grant_days: i64,
    /// Default window for "expiring soon" queries, in days.
    #[serde(default = "default_expiring_window")]
    pub default_expiring_window_days: i64,
    /// Upper bound for recorded exam scores.
    #[serde(default = "default_max_exam_score")]
    pub max_exam_score: f64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            video_view_cap: default_video_view_cap(),
            code_length: default_code_length(),
            max_code_batch: default_max_code_batch(),
            code_grant_days: default_code_grant_days(),
            default_expiring_window_days: default_expiring_window(),
            max_exam_score: default_max_exam_score(),
        }
    }
}

fn default_video_view_cap() -> i32 {
    4
}

fn default_code_length() -> usize {
    10
}

fn default_max_code_batch() -> i64 {
    100
}

fn default_code_grant_days() -> i64 {
    30
}

fn default_expiring_window() -> i64 {
    7
}

fn default_max_exam_score() -> f64 {
    100.0
}
