//! Command structs for engine operations.
//!
//! These types group parameters for write operations (open, record, reverse,
//! reconcile), keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Direction, DirectionalAmounts, MoneyCents, PaymentCategory, SourceLink};

/// Open the till.
#[derive(Clone, Debug)]
pub struct OpenSessionCmd {
    pub opening_float: MoneyCents,
    pub operator: Option<String>,
    pub note: Option<String>,
    pub opened_at: DateTime<Utc>,
}

impl OpenSessionCmd {
    #[must_use]
    pub fn new(opening_float: MoneyCents, opened_at: DateTime<Utc>) -> Self {
        Self {
            opening_float,
            operator: None,
            note: None,
            opened_at,
        }
    }

    #[must_use]
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Post one movement to an open session.
#[derive(Clone, Debug)]
pub struct RecordMovementCmd {
    pub session_id: Uuid,
    pub direction: Direction,
    pub amount: MoneyCents,
    pub payment_category: PaymentCategory,
    pub operator: Option<String>,
    pub note: Option<String>,
    pub source_link: Option<SourceLink>,
    pub recorded_at: DateTime<Utc>,
}

impl RecordMovementCmd {
    #[must_use]
    pub fn new(
        session_id: Uuid,
        direction: Direction,
        amount: MoneyCents,
        payment_category: PaymentCategory,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            direction,
            amount,
            payment_category,
            operator: None,
            note: None,
            source_link: None,
            recorded_at,
        }
    }

    #[must_use]
    pub fn inflow(
        session_id: Uuid,
        amount: MoneyCents,
        payment_category: PaymentCategory,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            session_id,
            Direction::Inflow,
            amount,
            payment_category,
            recorded_at,
        )
    }

    #[must_use]
    pub fn outflow(
        session_id: Uuid,
        amount: MoneyCents,
        payment_category: PaymentCategory,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            session_id,
            Direction::Outflow,
            amount,
            payment_category,
            recorded_at,
        )
    }

    #[must_use]
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn sale(mut self, sale_id: impl Into<String>) -> Self {
        self.source_link = Some(SourceLink::Sale {
            sale_id: sale_id.into(),
        });
        self
    }

    #[must_use]
    pub fn bill_payment(mut self, bill_id: impl Into<String>) -> Self {
        self.source_link = Some(SourceLink::BillPayment {
            bill_id: bill_id.into(),
        });
        self
    }
}

/// Cancel the effect of an earlier movement by posting its mirror image into
/// `session_id`, which must be open.
#[derive(Clone, Debug)]
pub struct ReverseMovementCmd {
    pub session_id: Uuid,
    pub movement_id: i64,
    pub operator: Option<String>,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ReverseMovementCmd {
    #[must_use]
    pub fn new(session_id: Uuid, movement_id: i64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            movement_id,
            operator: None,
            note: None,
            recorded_at,
        }
    }

    #[must_use]
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Store a blind count against the expected snapshot the operator was
/// reconciled against.
#[derive(Clone, Debug)]
pub struct RecordReconciliationCmd {
    pub session_id: Uuid,
    pub counted: DirectionalAmounts,
    pub expected: DirectionalAmounts,
    pub operator: Option<String>,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl RecordReconciliationCmd {
    #[must_use]
    pub fn new(
        session_id: Uuid,
        counted: DirectionalAmounts,
        expected: DirectionalAmounts,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            counted,
            expected,
            operator: None,
            note: None,
            recorded_at,
        }
    }

    #[must_use]
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
