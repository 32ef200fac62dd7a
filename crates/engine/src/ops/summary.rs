use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{IsolationLevel, QueryFilter, QuerySelect, prelude::*};

use crate::{
    CategoryAmounts, Direction, DirectionalAmounts, EngineError, MoneyCents, PaymentCategory,
    ResultEngine, movements,
};

use super::{Engine, with_tx};

/// What the ledger says a session should contain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub opening_float: MoneyCents,
    pub inflow_by_category: CategoryAmounts,
    pub outflow_by_category: CategoryAmounts,
    pub total_inflow: MoneyCents,
    pub total_outflow: MoneyCents,
    /// `opening_float + total_inflow - total_outflow`.
    pub closing_balance: MoneyCents,
    pub movement_count: u64,
}

impl SessionSummary {
    /// Folds `(direction, category, amount)` rows into a summary.
    pub(crate) fn from_rows(
        session_id: Uuid,
        opening_float: MoneyCents,
        rows: impl IntoIterator<Item = (Direction, PaymentCategory, MoneyCents)>,
    ) -> ResultEngine<Self> {
        let overflow = || EngineError::InvalidAmount("session totals overflow".to_string());

        let mut inflow = CategoryAmounts::ZERO;
        let mut outflow = CategoryAmounts::ZERO;
        let mut movement_count = 0u64;
        for (direction, category, amount) in rows {
            let bucket = match direction {
                Direction::Inflow => &mut inflow,
                Direction::Outflow => &mut outflow,
            };
            *bucket = bucket.checked_add(category, amount).ok_or_else(overflow)?;
            movement_count += 1;
        }

        let total_inflow = inflow.checked_total().ok_or_else(overflow)?;
        let total_outflow = outflow.checked_total().ok_or_else(overflow)?;
        let closing_balance = opening_float
            .checked_add(total_inflow)
            .and_then(|v| v.checked_sub(total_outflow))
            .ok_or_else(overflow)?;

        Ok(Self {
            session_id,
            opening_float,
            inflow_by_category: inflow,
            outflow_by_category: outflow,
            total_inflow,
            total_outflow,
            closing_balance,
            movement_count,
        })
    }

    /// The per-category figures a blind count is reconciled against.
    #[must_use]
    pub fn expected(&self) -> DirectionalAmounts {
        DirectionalAmounts::new(self.inflow_by_category, self.outflow_by_category)
    }
}

impl Engine {
    /// Aggregates a session's ledger by direction and category.
    ///
    /// Works on open and closed sessions alike. Rows stored without a
    /// category count as [`PaymentCategory::Other`].
    pub async fn compute_summary(&self, session_id: Uuid) -> ResultEngine<SessionSummary> {
        with_tx!(self, IsolationLevel::RepeatableRead, |db_tx| {
            let session = self.require_session(&db_tx, session_id).await?;

            let rows: Vec<(String, Option<String>, i64)> = movements::Entity::find()
                .select_only()
                .column(movements::Column::Direction)
                .column(movements::Column::PaymentCategory)
                .column(movements::Column::AmountMinor)
                .filter(movements::Column::SessionId.eq(session_id.to_string()))
                .into_tuple()
                .all(&db_tx)
                .await?;

            let rows = rows
                .into_iter()
                .map(|(direction, category, amount_minor)| -> ResultEngine<_> {
                    Ok((
                        Direction::try_from(direction.as_str())?,
                        PaymentCategory::from_stored(category.as_deref())?,
                        MoneyCents::new(amount_minor),
                    ))
                })
                .collect::<ResultEngine<Vec<_>>>()?;

            SessionSummary::from_rows(
                session_id,
                MoneyCents::new(session.opening_float_minor),
                rows,
            )
        })
    }
}
