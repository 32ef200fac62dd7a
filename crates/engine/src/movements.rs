//! Movement ledger primitives.
//!
//! A [`MovementRecord`] is one immutable cash inflow or outflow posted to a
//! till session. Amounts are always strictly positive: the [`Direction`]
//! carries the sign. A correction is a new record in the opposite direction
//! (see [`MovementRecord::reverses`]), never an update.

use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inflow,
    Outflow,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Inflow, Direction::Outflow];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }

    /// The direction a reversal posting must use.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Inflow => Self::Outflow,
            Self::Outflow => Self::Inflow,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<&str> for Direction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "inflow" => Ok(Self::Inflow),
            "outflow" => Ok(Self::Outflow),
            other => Err(EngineError::InvalidData(format!(
                "invalid movement direction: {other}"
            ))),
        }
    }
}

/// How the money moved. The set is closed: summaries and reconciliations
/// always carry one figure per variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCategory {
    Cash,
    CreditCard,
    DebitCard,
    InstantTransfer,
    Other,
}

impl PaymentCategory {
    pub const ALL: [PaymentCategory; 5] = [
        PaymentCategory::Cash,
        PaymentCategory::CreditCard,
        PaymentCategory::DebitCard,
        PaymentCategory::InstantTransfer,
        PaymentCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::InstantTransfer => "instant_transfer",
            Self::Other => "other",
        }
    }

    /// Position in [`PaymentCategory::ALL`].
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Cash => 0,
            Self::CreditCard => 1,
            Self::DebitCard => 2,
            Self::InstantTransfer => 3,
            Self::Other => 4,
        }
    }

    /// Category of a stored row. Rows posted without a category are
    /// attributed to [`PaymentCategory::Other`].
    pub(crate) fn from_stored(value: Option<&str>) -> ResultEngine<Self> {
        value.map_or(Ok(Self::Other), Self::try_from)
    }
}

impl fmt::Display for PaymentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<&str> for PaymentCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "credit_card" => Ok(Self::CreditCard),
            "debit_card" => Ok(Self::DebitCard),
            "instant_transfer" => Ok(Self::InstantTransfer),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidData(format!(
                "invalid payment category: {other}"
            ))),
        }
    }
}

/// Reference to the record that caused a movement. The engine only stores it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SourceLink {
    Sale { sale_id: String },
    BillPayment { bill_id: String },
}

impl SourceLink {
    fn kind(&self) -> &'static str {
        match self {
            Self::Sale { .. } => "sale",
            Self::BillPayment { .. } => "bill_payment",
        }
    }

    fn id(&self) -> &str {
        match self {
            Self::Sale { sale_id } => sale_id,
            Self::BillPayment { bill_id } => bill_id,
        }
    }

    fn from_stored(kind: Option<String>, id: Option<String>) -> ResultEngine<Option<Self>> {
        match (kind.as_deref(), id) {
            (None, None) => Ok(None),
            (Some("sale"), Some(sale_id)) => Ok(Some(Self::Sale { sale_id })),
            (Some("bill_payment"), Some(bill_id)) => Ok(Some(Self::BillPayment { bill_id })),
            (kind, _) => Err(EngineError::InvalidData(format!(
                "invalid source link kind: {kind:?}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Assigned by storage; increases with insertion order.
    pub id: i64,
    pub session_id: Uuid,
    pub direction: Direction,
    pub amount: MoneyCents,
    pub payment_category: PaymentCategory,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<String>,
    pub note: Option<String>,
    pub source_link: Option<SourceLink>,
    /// Set on reversal postings: the movement whose effect this one cancels.
    pub reverses: Option<i64>,
}

impl MovementRecord {
    /// Signed effect on the till balance.
    #[must_use]
    pub fn signed_amount(&self) -> MoneyCents {
        match self.direction {
            Direction::Inflow => self.amount,
            Direction::Outflow => -self.amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_id: String,
    pub direction: String,
    pub amount_minor: i64,
    pub payment_category: Option<String>,
    pub recorded_at: DateTimeUtc,
    pub recorded_by: Option<String>,
    pub note: Option<String>,
    pub source_kind: Option<String>,
    pub source_id: Option<String>,
    pub reverses_movement_id: Option<i64>,
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
}

impl Related<super::cash_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Insert payload for a movement that already passed validation.
pub(crate) struct NewMovement {
    pub session_id: Uuid,
    pub direction: Direction,
    pub amount: MoneyCents,
    pub payment_category: PaymentCategory,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<String>,
    pub note: Option<String>,
    pub source_link: Option<SourceLink>,
    pub reverses: Option<i64>,
}

impl From<&NewMovement> for ActiveModel {
    fn from(movement: &NewMovement) -> Self {
        Self {
            id: ActiveValue::NotSet,
            session_id: ActiveValue::Set(movement.session_id.to_string()),
            direction: ActiveValue::Set(movement.direction.as_str().to_string()),
            amount_minor: ActiveValue::Set(movement.amount.cents()),
            payment_category: ActiveValue::Set(Some(
                movement.payment_category.as_str().to_string(),
            )),
            recorded_at: ActiveValue::Set(movement.recorded_at),
            recorded_by: ActiveValue::Set(movement.recorded_by.clone()),
            note: ActiveValue::Set(movement.note.clone()),
            source_kind: ActiveValue::Set(
                movement.source_link.as_ref().map(|s| s.kind().to_string()),
            ),
            source_id: ActiveValue::Set(movement.source_link.as_ref().map(|s| s.id().to_string())),
            reverses_movement_id: ActiveValue::Set(movement.reverses),
        }
    }
}

impl TryFrom<Model> for MovementRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            session_id: parse_uuid(&model.session_id, "session")?,
            direction: Direction::try_from(model.direction.as_str())?,
            amount: MoneyCents::new(model.amount_minor),
            payment_category: PaymentCategory::from_stored(model.payment_category.as_deref())?,
            recorded_at: model.recorded_at,
            recorded_by: model.recorded_by,
            note: model.note,
            source_link: SourceLink::from_stored(model.source_kind, model.source_id)?,
            reverses: model.reverses_movement_id,
        })
    }
}
