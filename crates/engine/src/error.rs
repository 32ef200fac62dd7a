//! The module contains the errors the till engine can return.
//!
//! Every variant is business-meaningful and reaches the caller unchanged: the
//! engine never retries or swallows an error. Any error returned from a write
//! operation implies its DB transaction was rolled back.
//!
//! - [`SessionNotFound`] the referenced cash session does not exist.
//! - [`SessionAlreadyClosed`] closing twice, or posting to a closed session.
//! - [`InvalidAmount`] non-positive movement amount, negative opening float,
//!   unparsable or overflowing figures.
//! - [`ConcurrentModification`] a concurrent writer won the race for the single
//!   open session.
//! - [`Persistence`] any storage-layer failure.
//!
//!  [`SessionNotFound`]: EngineError::SessionNotFound
//!  [`SessionAlreadyClosed`]: EngineError::SessionAlreadyClosed
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`ConcurrentModification`]: EngineError::ConcurrentModification
//!  [`Persistence`]: EngineError::Persistence
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("cash session \"{0}\" not found")]
    SessionNotFound(String),
    #[error("cash session \"{0}\" is already closed")]
    SessionAlreadyClosed(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),
    #[error("reconciliation \"{0}\" not found")]
    ReconciliationNotFound(String),
    #[error("movement \"{0}\" not found")]
    MovementNotFound(String),
    #[error("movement \"{0}\" has already been reversed")]
    AlreadyReversed(String),
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Persistence(#[from] DbErr),
}

impl EngineError {
    /// Maps a unique-constraint violation or a serialization failure to
    /// [`EngineError::ConcurrentModification`], leaving every other storage
    /// error as [`EngineError::Persistence`].
    pub(crate) fn from_write(err: DbErr, what: &str) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return Self::ConcurrentModification(format!("{what}: {detail}"));
        }
        if is_serialization_failure(&err) {
            return Self::ConcurrentModification(format!("{what}: {err}"));
        }
        Self::Persistence(err)
    }
}

/// SQLSTATE 40001 (serialization failure) and 40P01 (deadlock detected) are
/// what a SERIALIZABLE transaction that lost a race fails with.
fn is_serialization_failure(err: &DbErr) -> bool {
    let (DbErr::Conn(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx_err))) = err
    else {
        return false;
    };
    sqlx_err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == "40001" || code == "40P01")
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::SessionNotFound(a), Self::SessionNotFound(b)) => a == b,
            (Self::SessionAlreadyClosed(a), Self::SessionAlreadyClosed(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::ConcurrentModification(a), Self::ConcurrentModification(b)) => a == b,
            (Self::ReconciliationNotFound(a), Self::ReconciliationNotFound(b)) => a == b,
            (Self::MovementNotFound(a), Self::MovementNotFound(b)) => a == b,
            (Self::AlreadyReversed(a), Self::AlreadyReversed(b)) => a == b,
            (Self::InvalidData(a), Self::InvalidData(b)) => a == b,
            (Self::Persistence(a), Self::Persistence(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
