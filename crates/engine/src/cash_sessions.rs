//! Till sessions.
//!
//! A [`CashSession`] is the period between opening and closing the cash
//! drawer. It goes `Open -> Closed` exactly once and is never deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashSession {
    pub id: Uuid,
    pub opened_at: DateTime<Utc>,
    pub opening_float: MoneyCents,
    pub opened_by: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub note: Option<String>,
}

impl CashSession {
    pub(crate) fn open(
        opening_float: MoneyCents,
        opened_at: DateTime<Utc>,
        opened_by: Option<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            opened_at,
            opening_float,
            opened_by,
            closed_at: None,
            closed_by: None,
            note,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.closed_at.is_some() {
            SessionState::Closed
        } else {
            SessionState::Open
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub opened_at: DateTimeUtc,
    pub opening_float_minor: i64,
    pub opened_by: Option<String>,
    pub closed_at: Option<DateTimeUtc>,
    pub closed_by: Option<String>,
    pub note: Option<String>,
    /// `Some(true)` while open, `None` once closed. Unique in the schema.
    pub open_slot: Option<bool>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
    #[sea_orm(has_many = "super::reconciliations::Entity")]
    Reconciliations,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl Related<super::reconciliations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CashSession> for ActiveModel {
    fn from(session: &CashSession) -> Self {
        Self {
            id: ActiveValue::Set(session.id.to_string()),
            opened_at: ActiveValue::Set(session.opened_at),
            opening_float_minor: ActiveValue::Set(session.opening_float.cents()),
            opened_by: ActiveValue::Set(session.opened_by.clone()),
            closed_at: ActiveValue::Set(session.closed_at),
            closed_by: ActiveValue::Set(session.closed_by.clone()),
            note: ActiveValue::Set(session.note.clone()),
            open_slot: ActiveValue::Set(session.is_open().then_some(true)),
        }
    }
}

impl TryFrom<Model> for CashSession {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "session")?,
            opened_at: model.opened_at,
            opening_float: MoneyCents::new(model.opening_float_minor),
            opened_by: model.opened_by,
            closed_at: model.closed_at,
            closed_by: model.closed_by,
            note: model.note,
        })
    }
}
