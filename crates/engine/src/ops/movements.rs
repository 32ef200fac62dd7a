use uuid::Uuid;

use sea_orm::{
    DatabaseTransaction, IsolationLevel, QueryFilter, QueryOrder, SqlErr, prelude::*,
};

use crate::{
    EngineError, MovementRecord, RecordMovementCmd, ResultEngine, ReverseMovementCmd,
    movements::{self, NewMovement},
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Appends one movement to an open session and returns its id.
    ///
    /// Fails with [`EngineError::InvalidAmount`] for a non-positive amount,
    /// [`EngineError::SessionNotFound`] or [`EngineError::SessionAlreadyClosed`].
    pub async fn record_movement(&self, cmd: RecordMovementCmd) -> ResultEngine<i64> {
        with_tx!(self, |db_tx| self.record_movement_in(&db_tx, cmd).await)
    }

    /// [`Engine::record_movement`] inside a transaction owned by the caller
    /// (see [`Engine::begin`]). Nothing is visible until the caller commits.
    pub async fn record_movement_in(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: RecordMovementCmd,
    ) -> ResultEngine<i64> {
        if !cmd.amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "movement amount must be > 0, got {}",
                cmd.amount
            )));
        }
        self.require_open_session(db_tx, cmd.session_id).await?;

        let movement = NewMovement {
            session_id: cmd.session_id,
            direction: cmd.direction,
            amount: cmd.amount,
            payment_category: cmd.payment_category,
            recorded_at: cmd.recorded_at,
            recorded_by: normalize_optional_text(cmd.operator.as_deref()),
            note: normalize_optional_text(cmd.note.as_deref()),
            source_link: cmd.source_link,
            reverses: None,
        };
        let model = movements::ActiveModel::from(&movement)
            .insert(db_tx)
            .await?;

        tracing::debug!(
            session_id = %cmd.session_id,
            movement_id = model.id,
            direction = %cmd.direction,
            category = %cmd.payment_category,
            amount = %cmd.amount,
            "movement recorded"
        );
        Ok(model.id)
    }

    /// Cancels an earlier movement by posting the opposite direction with the
    /// same amount, category and source link. The original row is untouched.
    ///
    /// The reversal lands in `cmd.session_id`, which must be open; the
    /// original may belong to any session. A movement is reversed at most
    /// once; a second attempt fails with [`EngineError::AlreadyReversed`].
    pub async fn reverse_movement(&self, cmd: ReverseMovementCmd) -> ResultEngine<i64> {
        with_tx!(self, |db_tx| self.reverse_movement_in(&db_tx, cmd).await)
    }

    /// [`Engine::reverse_movement`] inside a transaction owned by the caller.
    ///
    /// This is how a bill cancellation stays atomic: post the reversal here,
    /// reset the bill status on the same transaction, then commit once.
    pub async fn reverse_movement_in(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: ReverseMovementCmd,
    ) -> ResultEngine<i64> {
        let original = movements::Entity::find_by_id(cmd.movement_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::MovementNotFound(cmd.movement_id.to_string()))?;
        let original = MovementRecord::try_from(original)?;

        self.require_open_session(db_tx, cmd.session_id).await?;

        let reversal = NewMovement {
            session_id: cmd.session_id,
            direction: original.direction.opposite(),
            amount: original.amount,
            payment_category: original.payment_category,
            recorded_at: cmd.recorded_at,
            recorded_by: normalize_optional_text(cmd.operator.as_deref()),
            note: normalize_optional_text(cmd.note.as_deref()),
            source_link: original.source_link.clone(),
            reverses: Some(original.id),
        };
        // At most one reversal per movement: unique `reverses_movement_id`.
        let model = movements::ActiveModel::from(&reversal)
            .insert(db_tx)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    EngineError::AlreadyReversed(original.id.to_string())
                }
                _ => EngineError::from_write(err, "movement reversal"),
            })?;

        tracing::info!(
            session_id = %cmd.session_id,
            movement_id = model.id,
            reverses = original.id,
            amount = %original.amount,
            "movement reversed"
        );
        Ok(model.id)
    }

    /// Movements of a session ordered by `recorded_at`, ties by insertion
    /// order. Each call is a fresh snapshot read.
    pub async fn list_movements(&self, session_id: Uuid) -> ResultEngine<Vec<MovementRecord>> {
        with_tx!(self, IsolationLevel::RepeatableRead, |db_tx| {
            self.require_session(&db_tx, session_id).await?;
            movements::Entity::find()
                .filter(movements::Column::SessionId.eq(session_id.to_string()))
                .order_by_asc(movements::Column::RecordedAt)
                .order_by_asc(movements::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(MovementRecord::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
