use indexmap::IndexSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const RETRY_INTERVAL_MS: u64 = 200;
/// Attempts in total, the synchronous first attempt included.
pub const MAX_ATTEMPTS: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillConfig {
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: RETRY_INTERVAL_MS,
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

impl FillConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

fn default_retry_interval_ms() -> u64 { RETRY_INTERVAL_MS }
fn default_max_attempts() -> u32 { MAX_ATTEMPTS }

/// Progress of one fill operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillState {
    /// Keys still unwritten after `attempt` attempts.
    Pending { keys: IndexSet<String>, attempt: u32 },
    /// Every key was written.
    Done,
    /// Attempt budget spent with `keys` still unwritten. Not a failure.
    Exhausted { keys: IndexSet<String> },
}

impl FillState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FillState::Pending { .. })
    }

    pub fn pending_keys(&self) -> Vec<&str> {
        match self {
            FillState::Pending { keys, .. } | FillState::Exhausted { keys } => {
                keys.iter().map(String::as_str).collect()
            }
            FillState::Done => vec![],
        }
    }
}
