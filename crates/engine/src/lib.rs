//! Cash-register (till) engine.
//!
//! - [`Engine::open_session`] / [`Engine::close_session`]: till lifecycle,
//!   at most one open session system-wide.
//! - [`Engine::record_movement`] / [`Engine::reverse_movement`]: append-only
//!   ledger of categorized inflows and outflows.
//! - [`Engine::compute_summary`]: expected figures per category.
//! - [`Engine::record_reconciliation`]: blind count vs expected, with the
//!   discrepancy persisted for audit.
//!
//! All amounts are [`MoneyCents`].

pub use cash_sessions::{CashSession, SessionState};
pub use category_amounts::CategoryAmounts;
pub use commands::{OpenSessionCmd, RecordMovementCmd, RecordReconciliationCmd, ReverseMovementCmd};
pub use error::EngineError;
pub use money::MoneyCents;
pub use movements::{Direction, MovementRecord, PaymentCategory, SourceLink};
pub use ops::{DISCREPANCY_TOLERANCE, Engine, EngineBuilder, LedgerReader, SessionSummary};
pub use reconciliations::{DirectionalAmounts, ReconciliationRecord};

mod cash_sessions;
mod category_amounts;
mod commands;
mod error;
mod money;
mod movements;
mod ops;
mod reconciliation_lines;
mod reconciliations;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
