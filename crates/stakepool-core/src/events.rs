//! Ledger event journal.
//!
//! Every successful mutation emits one [`LedgerEvent`] through an
//! [`EventSink`]. The default sink logs via `tracing`; tests use
//! [`MemorySink`] to assert on the emitted sequence.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Amount};

/// Observable outcome of a successful ledger mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Staked {
        participant: AccountId,
        amount: Amount,
        total_staked: Amount,
    },
    Withdrawn {
        participant: AccountId,
        principal: Amount,
        reward: Amount,
    },
    PauseSet {
        by: AccountId,
        paused: bool,
    },
}

/// Receives events after the corresponding state commit.
///
/// Contract: sinks must not call back into the ledger (they run inside the
/// per-call mutual-exclusion scope).
pub trait EventSink: Send + Sync {
    fn record(&self, event: LedgerEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn record(&self, event: LedgerEvent) {
        (**self).record(event)
    }
}

/// Default sink: structured log line per event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: LedgerEvent) {
        match event {
            LedgerEvent::Staked {
                participant,
                amount,
                total_staked,
            } => {
                tracing::info!(%participant, %amount, %total_staked, "stake recorded");
            }
            LedgerEvent::Withdrawn {
                participant,
                principal,
                reward,
            } => {
                tracing::info!(%participant, %principal, %reward, "withdrawal paid");
            }
            LedgerEvent::PauseSet { by, paused } => {
                tracing::info!(%by, paused, "pause flag set");
            }
        }
    }
}

/// Accumulating sink for tests and audit snapshots.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far, in order.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: LedgerEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
