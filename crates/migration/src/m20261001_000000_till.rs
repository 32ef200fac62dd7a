//! Till schema: cash-register sessions and the movement ledger.
//!
//! - `cash_sessions`: one row per till session. `open_slot` is `TRUE` while the
//!   session is open and `NULL` once closed; its unique index is what keeps the
//!   system at one open session.
//! - `cash_movements`: append-only ledger. `id` is an integer sequence so rows
//!   keep insertion order.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
pub(crate) enum CashSessions {
    Table,
    Id,
    OpenedAt,
    OpeningFloatMinor,
    OpenedBy,
    ClosedAt,
    ClosedBy,
    Note,
    OpenSlot,
}

#[derive(Iden)]
enum CashMovements {
    Table,
    Id,
    SessionId,
    Direction,
    AmountMinor,
    PaymentCategory,
    RecordedAt,
    RecordedBy,
    Note,
    SourceKind,
    SourceId,
    ReversesMovementId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Sessions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CashSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashSessions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CashSessions::OpenedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashSessions::OpeningFloatMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashSessions::OpenedBy).string())
                    .col(ColumnDef::new(CashSessions::ClosedAt).timestamp())
                    .col(ColumnDef::new(CashSessions::ClosedBy).string())
                    .col(ColumnDef::new(CashSessions::Note).string())
                    .col(ColumnDef::new(CashSessions::OpenSlot).boolean())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_sessions-open_slot-unique")
                    .table(CashSessions::Table)
                    .col(CashSessions::OpenSlot)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_sessions-opened_at")
                    .table(CashSessions::Table)
                    .col(CashSessions::OpenedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CashMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashMovements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashMovements::SessionId).string().not_null())
                    .col(ColumnDef::new(CashMovements::Direction).string().not_null())
                    .col(
                        ColumnDef::new(CashMovements::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    // Nullable on purpose: rows imported without a category
                    // are summarized under `other`.
                    .col(ColumnDef::new(CashMovements::PaymentCategory).string())
                    .col(
                        ColumnDef::new(CashMovements::RecordedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashMovements::RecordedBy).string())
                    .col(ColumnDef::new(CashMovements::Note).string())
                    .col(ColumnDef::new(CashMovements::SourceKind).string())
                    .col(ColumnDef::new(CashMovements::SourceId).string())
                    .col(ColumnDef::new(CashMovements::ReversesMovementId).big_integer())
                    .check(Expr::col(CashMovements::AmountMinor).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_movements-session_id")
                            .from(CashMovements::Table, CashMovements::SessionId)
                            .to(CashSessions::Table, CashSessions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_movements-reverses_movement_id")
                            .from(CashMovements::Table, CashMovements::ReversesMovementId)
                            .to(CashMovements::Table, CashMovements::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_movements-session_id-recorded_at")
                    .table(CashMovements::Table)
                    .col(CashMovements::SessionId)
                    .col(CashMovements::RecordedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_movements-reverses_movement_id-unique")
                    .table(CashMovements::Table)
                    .col(CashMovements::ReversesMovementId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CashMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashSessions::Table).to_owned())
            .await?;
        Ok(())
    }
}
