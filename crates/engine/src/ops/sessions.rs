use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{IsolationLevel, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};

use crate::{
    CashSession, EngineError, OpenSessionCmd, ResultEngine, cash_sessions,
    util::{normalize_optional_text, parse_uuid},
};

use super::{Engine, with_tx};

impl Engine {
    /// Opens the till and returns the session id.
    ///
    /// Opening is idempotent: if a session is already open its id is returned
    /// and nothing is written, even if `opening_float` differs.
    ///
    /// A concurrent opener that loses the race on the unique open slot gets
    /// [`EngineError::ConcurrentModification`].
    pub async fn open_session(&self, cmd: OpenSessionCmd) -> ResultEngine<Uuid> {
        let OpenSessionCmd {
            opening_float,
            operator,
            note,
            opened_at,
        } = cmd;
        if opening_float.is_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "opening float must be >= 0, got {opening_float}"
            )));
        }
        let operator = normalize_optional_text(operator.as_deref());
        let note = normalize_optional_text(note.as_deref());

        let lost_race =
            |err: DbErr| EngineError::from_write(err, "another cash session is already open");
        with_tx!(self, IsolationLevel::Serializable, commit_err = lost_race, |db_tx| {
            let existing = cash_sessions::Entity::find()
                .filter(cash_sessions::Column::ClosedAt.is_null())
                .one(&db_tx)
                .await?;

            let id = match existing {
                Some(model) => {
                    tracing::debug!(session_id = %model.id, "cash session already open");
                    parse_uuid(&model.id, "session")?
                }
                None => {
                    let session = CashSession::open(opening_float, opened_at, operator, note);
                    cash_sessions::ActiveModel::from(&session)
                        .insert(&db_tx)
                        .await
                        .map_err(|err| {
                            tracing::warn!("failed to insert cash session: {err}");
                            lost_race(err)
                        })?;
                    tracing::info!(
                        session_id = %session.id,
                        opening_float = %session.opening_float,
                        "cash session opened"
                    );
                    session.id
                }
            };
            Ok(id)
        })
    }

    /// Closes an open session. `Open -> Closed` is terminal.
    pub async fn close_session(
        &self,
        session_id: Uuid,
        operator: Option<&str>,
        closed_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let operator = normalize_optional_text(operator);
        with_tx!(self, |db_tx| {
            self.require_open_session(&db_tx, session_id).await?;

            let result = cash_sessions::Entity::update_many()
                .col_expr(cash_sessions::Column::ClosedAt, Expr::value(closed_at))
                .col_expr(cash_sessions::Column::ClosedBy, Expr::value(operator))
                .col_expr(cash_sessions::Column::OpenSlot, Expr::value(Option::<bool>::None))
                .filter(cash_sessions::Column::Id.eq(session_id.to_string()))
                .filter(cash_sessions::Column::ClosedAt.is_null())
                .exec(&db_tx)
                .await?;
            if result.rows_affected != 1 {
                return Err(EngineError::SessionAlreadyClosed(session_id.to_string()));
            }

            tracing::info!(session_id = %session_id, "cash session closed");
            Ok(())
        })
    }

    /// The session currently open, if any. Never creates one.
    pub async fn current_session(&self) -> ResultEngine<Option<CashSession>> {
        cash_sessions::Entity::find()
            .filter(cash_sessions::Column::ClosedAt.is_null())
            .one(&self.database)
            .await?
            .map(CashSession::try_from)
            .transpose()
    }

    pub async fn session(&self, session_id: Uuid) -> ResultEngine<CashSession> {
        let model = self.require_session(&self.database, session_id).await?;
        CashSession::try_from(model)
    }

    /// Every session, newest first.
    pub async fn list_sessions(&self) -> ResultEngine<Vec<CashSession>> {
        cash_sessions::Entity::find()
            .order_by_desc(cash_sessions::Column::OpenedAt)
            .order_by_desc(cash_sessions::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(CashSession::try_from)
            .collect()
    }
}
