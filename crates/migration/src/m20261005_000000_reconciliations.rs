use sea_orm_migration::prelude::*;

use crate::m20261001_000000_till::CashSessions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum CashReconciliations {
    Table,
    Id,
    SessionId,
    RecordedAt,
    RecordedBy,
    HasDiscrepancy,
    Note,
}

#[derive(Iden)]
enum ReconciliationLines {
    Table,
    Id,
    ReconciliationId,
    Direction,
    PaymentCategory,
    CountedMinor,
    ExpectedMinor,
    DiffMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CashReconciliations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashReconciliations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CashReconciliations::SessionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashReconciliations::RecordedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashReconciliations::RecordedBy).string())
                    .col(
                        ColumnDef::new(CashReconciliations::HasDiscrepancy)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashReconciliations::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_reconciliations-session_id")
                            .from(CashReconciliations::Table, CashReconciliations::SessionId)
                            .to(CashSessions::Table, CashSessions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_reconciliations-session_id")
                    .table(CashReconciliations::Table)
                    .col(CashReconciliations::SessionId)
                    .col(CashReconciliations::RecordedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReconciliationLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReconciliationLines::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationLines::ReconciliationId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationLines::Direction)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationLines::PaymentCategory)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationLines::CountedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationLines::ExpectedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationLines::DiffMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reconciliation_lines-reconciliation_id")
                            .from(
                                ReconciliationLines::Table,
                                ReconciliationLines::ReconciliationId,
                            )
                            .to(CashReconciliations::Table, CashReconciliations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reconciliation_lines-slot-unique")
                    .table(ReconciliationLines::Table)
                    .col(ReconciliationLines::ReconciliationId)
                    .col(ReconciliationLines::Direction)
                    .col(ReconciliationLines::PaymentCategory)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReconciliationLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashReconciliations::Table).to_owned())
            .await?;
        Ok(())
    }
}
