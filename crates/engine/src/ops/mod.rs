use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, IsolationLevel,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, cash_sessions};

mod movements;
mod reader;
mod reconciliations;
mod sessions;
mod summary;

pub use reader::LedgerReader;
pub use reconciliations::DISCREPANCY_TOLERANCE;
pub use summary::SessionSummary;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// Without an explicit level the block runs `SERIALIZABLE`. `commit_err`
/// maps a failed commit into an [`EngineError`] instead of `Persistence`.
macro_rules! with_tx {
    ($self:expr, $isolation:expr, commit_err = $map:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.begin_with($isolation).await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await.map_err($map)?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
    ($self:expr, $isolation:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.begin_with($isolation).await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
    ($self:expr, |$tx:ident| $body:expr) => {
        with_tx!($self, sea_orm::IsolationLevel::Serializable, |$tx| $body)
    };
}

pub(crate) use with_tx;

/// Till engine: session lifecycle, movement ledger, summaries and
/// reconciliations over one relational store.
///
/// Every public operation checks out its own transaction; nothing is held
/// between calls.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Starts a serializable transaction for callers that need to combine a
    /// ledger write with their own writes (e.g. a bill cancellation that also
    /// resets the bill status). Pass it to the `*_in` operations and commit it
    /// yourself; dropping it rolls everything back.
    pub async fn begin(&self) -> ResultEngine<DatabaseTransaction> {
        Ok(self.begin_with(IsolationLevel::Serializable).await?)
    }

    /// Read-only view for reporting and printing.
    #[must_use]
    pub fn reader(&self) -> LedgerReader<'_> {
        LedgerReader::new(self)
    }

    /// SQLite transactions are serializable snapshots already and reject an
    /// explicit isolation level, so it is only set on other backends.
    async fn begin_with(&self, isolation: IsolationLevel) -> Result<DatabaseTransaction, DbErr> {
        match self.database.get_database_backend() {
            DbBackend::Sqlite => self.database.begin().await,
            _ => {
                self.database
                    .begin_with_config(Some(isolation), None)
                    .await
            }
        }
    }

    /// Load a session row or fail with [`EngineError::SessionNotFound`].
    async fn require_session(
        &self,
        db: &impl ConnectionTrait,
        session_id: Uuid,
    ) -> ResultEngine<cash_sessions::Model> {
        cash_sessions::Entity::find_by_id(session_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))
    }

    /// Like [`Engine::require_session`], but the session must still be open.
    async fn require_open_session(
        &self,
        db: &impl ConnectionTrait,
        session_id: Uuid,
    ) -> ResultEngine<cash_sessions::Model> {
        let session = self.require_session(db, session_id).await?;
        if session.closed_at.is_some() {
            return Err(EngineError::SessionAlreadyClosed(session_id.to_string()));
        }
        Ok(session)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
