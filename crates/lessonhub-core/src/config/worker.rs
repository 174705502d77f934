//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Expiration sweeper worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the in-process sweeper is enabled. Disable when an
    /// external scheduler triggers the sweep endpoint instead.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron schedule for the expiration sweep (6-field format).
    #[serde(default = "default_sweep_schedule")]
    pub sweep_schedule: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sweep_schedule: default_sweep_schedule(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_schedule() -> String {
    // Every hour on the hour.
    "0 0 * * * *".to_string()
}
