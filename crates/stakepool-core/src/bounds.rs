use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result};

/// Runtime bounds for the in-memory ledger.
///
/// These are **safety bounds**, not economic parameters: they cap the size of
/// the participant map (and with it worst-case memory and iteration cost),
/// independent of any reward policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeBounds {
    pub max_participants: usize,
}

impl RuntimeBounds {
    pub const HARD_MAX_PARTICIPANTS: usize = 10_000_000;

    /// Default: sized well above any expected pool membership (configurable).
    pub const DEFAULT_MAX_PARTICIPANTS: usize = 100_000;

    pub fn new(max_participants: usize) -> Result<Self> {
        let b = RuntimeBounds { max_participants };
        b.validate()?;
        Ok(b)
    }

    pub fn validate(self) -> Result<()> {
        if self.max_participants == 0 || self.max_participants > Self::HARD_MAX_PARTICIPANTS {
            return Err(LedgerError::ConfigError(format!(
                "max_participants out of bounds: {}",
                self.max_participants
            )));
        }
        Ok(())
    }
}

impl Default for RuntimeBounds {
    fn default() -> Self {
        Self {
            max_participants: Self::DEFAULT_MAX_PARTICIPANTS,
        }
    }
}
