//! One figure row of a reconciliation: a (direction, category) slot holding
//! counted, expected and diff minor units.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{Direction, EngineError, MoneyCents, PaymentCategory, ReconciliationRecord};

pub(crate) struct Line {
    pub direction: Direction,
    pub category: PaymentCategory,
    pub counted: MoneyCents,
    pub expected: MoneyCents,
    pub diff: MoneyCents,
}

impl Line {
    /// The ten lines (two directions, five categories) of a record.
    pub(crate) fn all_of(record: &ReconciliationRecord) -> Vec<Line> {
        let mut lines = Vec::with_capacity(Direction::ALL.len() * PaymentCategory::ALL.len());
        for direction in Direction::ALL {
            let (counted, expected, diff) = match direction {
                Direction::Inflow => (
                    &record.counted_inflow,
                    &record.expected_inflow,
                    &record.diff_inflow,
                ),
                Direction::Outflow => (
                    &record.counted_outflow,
                    &record.expected_outflow,
                    &record.diff_outflow,
                ),
            };
            for category in PaymentCategory::ALL {
                lines.push(Line {
                    direction,
                    category,
                    counted: counted.get(category),
                    expected: expected.get(category),
                    diff: diff.get(category),
                });
            }
        }
        lines
    }

    pub(crate) fn active_model(&self, reconciliation_id: Uuid) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            reconciliation_id: ActiveValue::Set(reconciliation_id.to_string()),
            direction: ActiveValue::Set(self.direction.as_str().to_string()),
            payment_category: ActiveValue::Set(self.category.as_str().to_string()),
            counted_minor: ActiveValue::Set(self.counted.cents()),
            expected_minor: ActiveValue::Set(self.expected.cents()),
            diff_minor: ActiveValue::Set(self.diff.cents()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reconciliation_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub reconciliation_id: String,
    pub direction: String,
    pub payment_category: String,
    pub counted_minor: i64,
    pub expected_minor: i64,
    pub diff_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reconciliations::Entity",
        from = "Column::ReconciliationId",
        to = "super::reconciliations::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Reconciliations,
}

impl Related<super::reconciliations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Line {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            direction: Direction::try_from(model.direction.as_str())?,
            category: PaymentCategory::try_from(model.payment_category.as_str())?,
            counted: MoneyCents::new(model.counted_minor),
            expected: MoneyCents::new(model.expected_minor),
            diff: MoneyCents::new(model.diff_minor),
        })
    }
}
