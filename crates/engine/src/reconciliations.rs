//! Blind-count reconciliation records.
//!
//! A [`ReconciliationRecord`] pins what the operator counted next to the
//! expected figures they were reconciled against, and the signed difference.
//! Figures live in the `reconciliation_lines` table, one
//! row per direction and category. Only `note` may change after insert.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CategoryAmounts, EngineError, util::parse_uuid};

/// Counted or expected figures for both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionalAmounts {
    pub inflow: CategoryAmounts,
    pub outflow: CategoryAmounts,
}

impl DirectionalAmounts {
    #[must_use]
    pub fn new(inflow: CategoryAmounts, outflow: CategoryAmounts) -> Self {
        Self { inflow, outflow }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<String>,
    pub counted_inflow: CategoryAmounts,
    pub counted_outflow: CategoryAmounts,
    pub expected_inflow: CategoryAmounts,
    pub expected_outflow: CategoryAmounts,
    pub diff_inflow: CategoryAmounts,
    pub diff_outflow: CategoryAmounts,
    pub has_discrepancy: bool,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_reconciliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub session_id: String,
    pub recorded_at: DateTimeUtc,
    pub recorded_by: Option<String>,
    pub has_discrepancy: bool,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cash_sessions::Entity",
        from = "Column::SessionId",
        to = "super::cash_sessions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    CashSessions,
    #[sea_orm(has_many = "super::reconciliation_lines::Entity")]
    Lines,
}

impl Related<super::cash_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashSessions.def()
    }
}

impl Related<super::reconciliation_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ReconciliationRecord> for ActiveModel {
    fn from(record: &ReconciliationRecord) -> Self {
        Self {
            id: ActiveValue::Set(record.id.to_string()),
            session_id: ActiveValue::Set(record.session_id.to_string()),
            recorded_at: ActiveValue::Set(record.recorded_at),
            recorded_by: ActiveValue::Set(record.recorded_by.clone()),
            has_discrepancy: ActiveValue::Set(record.has_discrepancy),
            note: ActiveValue::Set(record.note.clone()),
        }
    }
}

impl ReconciliationRecord {
    /// Rebuilds a record from its header row and its figure lines.
    pub(crate) fn from_models(
        model: Model,
        lines: Vec<super::reconciliation_lines::Model>,
    ) -> Result<Self, EngineError> {
        let mut record = Self {
            id: parse_uuid(&model.id, "reconciliation")?,
            session_id: parse_uuid(&model.session_id, "session")?,
            recorded_at: model.recorded_at,
            recorded_by: model.recorded_by,
            counted_inflow: CategoryAmounts::ZERO,
            counted_outflow: CategoryAmounts::ZERO,
            expected_inflow: CategoryAmounts::ZERO,
            expected_outflow: CategoryAmounts::ZERO,
            diff_inflow: CategoryAmounts::ZERO,
            diff_outflow: CategoryAmounts::ZERO,
            has_discrepancy: model.has_discrepancy,
            note: model.note,
        };
        for line in lines {
            let line = super::reconciliation_lines::Line::try_from(line)?;
            let (counted, expected, diff) = match line.direction {
                crate::Direction::Inflow => (
                    &mut record.counted_inflow,
                    &mut record.expected_inflow,
                    &mut record.diff_inflow,
                ),
                crate::Direction::Outflow => (
                    &mut record.counted_outflow,
                    &mut record.expected_outflow,
                    &mut record.diff_outflow,
                ),
            };
            counted.set(line.category, line.counted);
            expected.set(line.category, line.expected);
            diff.set(line.category, line.diff);
        }
        Ok(record)
    }
}
