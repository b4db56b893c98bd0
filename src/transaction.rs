//! Transaction identity and lifecycle tracking.
//!
//! The storage layer only needs to know whether a transaction may still read
//! pages; locking and recovery live elsewhere.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// A unique identifier for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn{}", self.0)
    }
}

/// The possible states of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    Aborted,
}

impl TransactionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Committed => write!(f, "Committed"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Transaction {0} not found")]
    NotFound(TransactionId),

    #[error("Transaction {0} is in invalid state: {1}")]
    InvalidState(TransactionId, TransactionState),
}

/// Hands out transaction ids and records their state.
pub struct TransactionManager {
    next_id: AtomicU64,
    states: RwLock<HashMap<TransactionId, TransactionState>>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            states: RwLock::new(HashMap::new()),
        }
    }

    pub fn begin(&self) -> TransactionId {
        let id = TransactionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.states.write().insert(id, TransactionState::Active);
        log::debug!("{} started", id);
        id
    }

    pub fn commit(&self, id: TransactionId) -> Result<(), TransactionError> {
        self.finish(id, TransactionState::Committed)
    }

    pub fn abort(&self, id: TransactionId) -> Result<(), TransactionError> {
        self.finish(id, TransactionState::Aborted)
    }

    pub fn state(&self, id: TransactionId) -> Result<TransactionState, TransactionError> {
        self.states
            .read()
            .get(&id)
            .copied()
            .ok_or(TransactionError::NotFound(id))
    }

    /// True if `id` exists and has neither committed nor aborted.
    pub fn is_active(&self, id: TransactionId) -> bool {
        self.state(id).is_ok_and(|state| state.is_active())
    }

    fn finish(&self, id: TransactionId, to: TransactionState) -> Result<(), TransactionError> {
        let mut states = self.states.write();
        let state = states.get_mut(&id).ok_or(TransactionError::NotFound(id))?;
        if !state.is_active() {
            return Err(TransactionError::InvalidState(id, *state));
        }
        *state = to;
        log::debug!("{} {}", id, to);
        Ok(())
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
