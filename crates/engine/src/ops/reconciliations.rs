use uuid::Uuid;

use sea_orm::{ActiveValue, IsolationLevel, QueryFilter, QueryOrder, prelude::*};

use crate::{
    CategoryAmounts, DirectionalAmounts, EngineError, MoneyCents, RecordReconciliationCmd,
    ReconciliationRecord, ResultEngine, reconciliation_lines, reconciliation_lines::Line,
    reconciliations, util::normalize_optional_text,
};

use super::{Engine, with_tx};

/// Any category off by at least this much is a discrepancy.
pub const DISCREPANCY_TOLERANCE: MoneyCents = MoneyCents::MINOR_UNIT;

fn ensure_counted_non_negative(label: &str, amounts: &CategoryAmounts) -> ResultEngine<()> {
    match amounts.iter().find(|(_, amount)| amount.is_negative()) {
        Some((category, amount)) => Err(EngineError::InvalidAmount(format!(
            "counted {label} for {category} must be >= 0, got {amount}"
        ))),
        None => Ok(()),
    }
}

/// `counted - expected`, per direction and category.
fn diff(
    counted: &DirectionalAmounts,
    expected: &DirectionalAmounts,
) -> ResultEngine<DirectionalAmounts> {
    let overflow = || EngineError::InvalidAmount("reconciliation difference overflows".to_string());
    Ok(DirectionalAmounts::new(
        counted
            .inflow
            .checked_sub(&expected.inflow)
            .ok_or_else(overflow)?,
        counted
            .outflow
            .checked_sub(&expected.outflow)
            .ok_or_else(overflow)?,
    ))
}

impl Engine {
    /// Persists a blind count next to the `expected` snapshot the operator
    /// was reconciled against, with the signed per-category differences.
    ///
    /// `expected` comes from the caller (usually [`Engine::compute_summary`]
    /// taken before the count) and is stored as given: the ledger is not
    /// re-read here, so movements posted in between do not shift the audit
    /// trail. The session may be open or closed.
    pub async fn record_reconciliation(&self, cmd: RecordReconciliationCmd) -> ResultEngine<Uuid> {
        let RecordReconciliationCmd {
            session_id,
            counted,
            expected,
            operator,
            note,
            recorded_at,
        } = cmd;
        ensure_counted_non_negative("inflow", &counted.inflow)?;
        ensure_counted_non_negative("outflow", &counted.outflow)?;
        let diffs = diff(&counted, &expected)?;
        let has_discrepancy = diffs.inflow.any_at_least(DISCREPANCY_TOLERANCE)
            || diffs.outflow.any_at_least(DISCREPANCY_TOLERANCE);

        let record = ReconciliationRecord {
            id: Uuid::new_v4(),
            session_id,
            recorded_at,
            recorded_by: normalize_optional_text(operator.as_deref()),
            counted_inflow: counted.inflow,
            counted_outflow: counted.outflow,
            expected_inflow: expected.inflow,
            expected_outflow: expected.outflow,
            diff_inflow: diffs.inflow,
            diff_outflow: diffs.outflow,
            has_discrepancy,
            note: normalize_optional_text(note.as_deref()),
        };

        with_tx!(self, |db_tx| {
            self.require_session(&db_tx, session_id).await?;

            reconciliations::ActiveModel::from(&record)
                .insert(&db_tx)
                .await?;
            let lines = Line::all_of(&record)
                .iter()
                .map(|line| line.active_model(record.id))
                .collect::<Vec<_>>();
            reconciliation_lines::Entity::insert_many(lines)
                .exec(&db_tx)
                .await?;

            if has_discrepancy {
                tracing::warn!(
                    session_id = %session_id,
                    reconciliation_id = %record.id,
                    inflow = ?record.diff_inflow,
                    outflow = ?record.diff_outflow,
                    "reconciliation recorded with discrepancy"
                );
            } else {
                tracing::info!(
                    session_id = %session_id,
                    reconciliation_id = %record.id,
                    "reconciliation recorded"
                );
            }
            Ok(record.id)
        })
    }

    /// Replaces the auditor note of a reconciliation. Figures are never touched.
    pub async fn amend_note(&self, reconciliation_id: Uuid, note: &str) -> ResultEngine<()> {
        let note = normalize_optional_text(Some(note));
        with_tx!(self, |db_tx| {
            let exists = reconciliations::Entity::find_by_id(reconciliation_id.to_string())
                .one(&db_tx)
                .await?
                .is_some();
            if !exists {
                return Err(EngineError::ReconciliationNotFound(
                    reconciliation_id.to_string(),
                ));
            }

            reconciliations::ActiveModel {
                id: ActiveValue::Set(reconciliation_id.to_string()),
                note: ActiveValue::Set(note),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            tracing::info!(reconciliation_id = %reconciliation_id, "reconciliation note amended");
            Ok(())
        })
    }

    pub async fn reconciliation(&self, reconciliation_id: Uuid) -> ResultEngine<ReconciliationRecord> {
        with_tx!(self, IsolationLevel::RepeatableRead, |db_tx| {
            let model = reconciliations::Entity::find_by_id(reconciliation_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::ReconciliationNotFound(reconciliation_id.to_string()))?;
            let lines = model
                .find_related(reconciliation_lines::Entity)
                .all(&db_tx)
                .await?;
            ReconciliationRecord::from_models(model, lines)
        })
    }

    /// Reconciliations of a session, oldest first.
    pub async fn list_reconciliations(
        &self,
        session_id: Uuid,
    ) -> ResultEngine<Vec<ReconciliationRecord>> {
        with_tx!(self, IsolationLevel::RepeatableRead, |db_tx| {
            self.require_session(&db_tx, session_id).await?;
            reconciliations::Entity::find()
                .filter(reconciliations::Column::SessionId.eq(session_id.to_string()))
                .order_by_asc(reconciliations::Column::RecordedAt)
                .order_by_asc(reconciliations::Column::Id)
                .find_with_related(reconciliation_lines::Entity)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|(model, lines)| ReconciliationRecord::from_models(model, lines))
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
