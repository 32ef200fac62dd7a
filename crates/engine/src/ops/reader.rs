use uuid::Uuid;

use crate::{CashSession, MovementRecord, ReconciliationRecord, ResultEngine};

use super::{Engine, SessionSummary};

/// Read-only handle for reporting and printing.
///
/// Exposes the ledger reads of [`Engine`] and nothing that writes, so a
/// receipt printer or a period report can be handed one without a path to
/// mutate movements.
#[derive(Clone, Copy, Debug)]
pub struct LedgerReader<'a> {
    engine: &'a Engine,
}

impl<'a> LedgerReader<'a> {
    pub(super) fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    pub async fn session(&self, session_id: Uuid) -> ResultEngine<CashSession> {
        self.engine.session(session_id).await
    }

    pub async fn current_session(&self) -> ResultEngine<Option<CashSession>> {
        self.engine.current_session().await
    }

    pub async fn list_movements(&self, session_id: Uuid) -> ResultEngine<Vec<MovementRecord>> {
        self.engine.list_movements(session_id).await
    }

    pub async fn compute_summary(&self, session_id: Uuid) -> ResultEngine<SessionSummary> {
        self.engine.compute_summary(session_id).await
    }

    pub async fn list_reconciliations(
        &self,
        session_id: Uuid,
    ) -> ResultEngine<Vec<ReconciliationRecord>> {
        self.engine.list_reconciliations(session_id).await
    }
}
