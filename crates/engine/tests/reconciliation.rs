use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    CategoryAmounts, DirectionalAmounts, Engine, EngineError, MoneyCents, OpenSessionCmd,
    PaymentCategory, RecordMovementCmd, RecordReconciliationCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, hour, minute, 0).unwrap()
}

/// Float 100.00, cash sale 50.00, instant-transfer payout 20.00.
async fn busy_session(engine: &Engine) -> Uuid {
    let session = engine
        .open_session(OpenSessionCmd::new(cents(10_000), at(8, 0)))
        .await
        .unwrap();
    engine
        .record_movement(RecordMovementCmd::inflow(
            session,
            cents(5_000),
            PaymentCategory::Cash,
            at(9, 0),
        ))
        .await
        .unwrap();
    engine
        .record_movement(RecordMovementCmd::outflow(
            session,
            cents(2_000),
            PaymentCategory::InstantTransfer,
            at(10, 0),
        ))
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn short_cash_count_is_flagged() {
    let (engine, _db) = engine_with_db().await;
    let session = busy_session(&engine).await;
    let expected = engine.compute_summary(session).await.unwrap().expected();

    let counted = DirectionalAmounts::new(
        CategoryAmounts::ZERO.with(PaymentCategory::Cash, cents(4_800)),
        CategoryAmounts::ZERO.with(PaymentCategory::InstantTransfer, cents(2_000)),
    );
    let id = engine
        .record_reconciliation(
            RecordReconciliationCmd::new(session, counted, expected, at(18, 0)).operator("anna"),
        )
        .await
        .unwrap();

    let record = engine.reconciliation(id).await.unwrap();
    assert!(record.has_discrepancy);
    assert_eq!(record.session_id, session);
    assert_eq!(record.recorded_by.as_deref(), Some("anna"));
    assert_eq!(record.diff_inflow.get(PaymentCategory::Cash), cents(-200));
    assert_eq!(record.diff_outflow, CategoryAmounts::ZERO);
    assert_eq!(record.counted_inflow, counted.inflow);
    assert_eq!(record.expected_inflow, expected.inflow);
    assert_eq!(record.expected_outflow, expected.outflow);

    // Reconciling never touches the ledger or the session.
    assert_eq!(engine.list_movements(session).await.unwrap().len(), 2);
    assert!(engine.session(session).await.unwrap().is_open());
}

#[tokio::test]
async fn exact_count_has_no_discrepancy_and_one_cent_does() {
    let (engine, _db) = engine_with_db().await;
    let session = busy_session(&engine).await;
    let expected = engine.compute_summary(session).await.unwrap().expected();

    let exact = engine
        .record_reconciliation(RecordReconciliationCmd::new(
            session,
            expected,
            expected,
            at(18, 0),
        ))
        .await
        .unwrap();
    let exact = engine.reconciliation(exact).await.unwrap();
    assert!(!exact.has_discrepancy);
    assert_eq!(exact.diff_inflow, CategoryAmounts::ZERO);
    assert_eq!(exact.diff_outflow, CategoryAmounts::ZERO);

    let mut over = expected;
    over.outflow.set(
        PaymentCategory::InstantTransfer,
        expected.outflow.get(PaymentCategory::InstantTransfer) + cents(1),
    );
    let over = engine
        .record_reconciliation(RecordReconciliationCmd::new(
            session,
            over,
            expected,
            at(18, 5),
        ))
        .await
        .unwrap();
    let over = engine.reconciliation(over).await.unwrap();
    assert!(over.has_discrepancy);
    assert_eq!(
        over.diff_outflow.get(PaymentCategory::InstantTransfer),
        cents(1)
    );

    let listed = engine.list_reconciliations(session).await.unwrap();
    assert_eq!(
        listed.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![exact.id, over.id]
    );
}

#[tokio::test]
async fn stored_expected_does_not_follow_later_postings() {
    let (engine, _db) = engine_with_db().await;
    let session = busy_session(&engine).await;
    let expected = engine.compute_summary(session).await.unwrap().expected();

    let id = engine
        .record_reconciliation(RecordReconciliationCmd::new(
            session,
            expected,
            expected,
            at(18, 0),
        ))
        .await
        .unwrap();
    engine
        .record_movement(RecordMovementCmd::inflow(
            session,
            cents(700),
            PaymentCategory::Cash,
            at(18, 30),
        ))
        .await
        .unwrap();
    engine.close_session(session, None, at(19, 0)).await.unwrap();

    let record = engine.reconciliation(id).await.unwrap();
    assert_eq!(record.expected_inflow.get(PaymentCategory::Cash), cents(5_000));
    assert!(!record.has_discrepancy);
    assert_eq!(
        engine
            .compute_summary(session)
            .await
            .unwrap()
            .inflow_by_category
            .get(PaymentCategory::Cash),
        cents(5_700)
    );
}

#[tokio::test]
async fn closed_sessions_can_be_reconciled() {
    let (engine, _db) = engine_with_db().await;
    let session = busy_session(&engine).await;
    engine.close_session(session, None, at(19, 0)).await.unwrap();
    let expected = engine.compute_summary(session).await.unwrap().expected();

    let id = engine
        .record_reconciliation(RecordReconciliationCmd::new(
            session,
            expected,
            expected,
            at(19, 30),
        ))
        .await
        .unwrap();
    assert_eq!(engine.list_reconciliations(session).await.unwrap()[0].id, id);
}

#[tokio::test]
async fn invalid_reconciliations_are_rejected() {
    let (engine, _db) = engine_with_db().await;

    let missing = Uuid::new_v4();
    let zero = DirectionalAmounts::default();
    assert_eq!(
        engine
            .record_reconciliation(RecordReconciliationCmd::new(missing, zero, zero, at(18, 0)))
            .await,
        Err(EngineError::SessionNotFound(missing.to_string()))
    );

    let session = busy_session(&engine).await;
    let negative = DirectionalAmounts::new(
        CategoryAmounts::ZERO.with(PaymentCategory::CreditCard, cents(-1)),
        CategoryAmounts::ZERO,
    );
    let err = engine
        .record_reconciliation(RecordReconciliationCmd::new(session, negative, zero, at(18, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert!(engine.list_reconciliations(session).await.unwrap().is_empty());
}

#[tokio::test]
async fn amend_note_only_changes_the_note() {
    let (engine, _db) = engine_with_db().await;
    let session = busy_session(&engine).await;
    let expected = engine.compute_summary(session).await.unwrap().expected();
    let counted = DirectionalAmounts::new(
        CategoryAmounts::ZERO.with(PaymentCategory::Cash, cents(4_800)),
        expected.outflow,
    );

    let id = engine
        .record_reconciliation(
            RecordReconciliationCmd::new(session, counted, expected, at(18, 0)).note("first pass"),
        )
        .await
        .unwrap();
    let before = engine.reconciliation(id).await.unwrap();
    assert_eq!(before.note.as_deref(), Some("first pass"));

    engine
        .amend_note(id, "two coins found under the drawer")
        .await
        .unwrap();
    let after = engine.reconciliation(id).await.unwrap();
    assert_eq!(
        after.note.as_deref(),
        Some("two coins found under the drawer")
    );
    assert_eq!(
        ReconciliationNoteless::from(&after),
        ReconciliationNoteless::from(&before)
    );

    let missing = Uuid::new_v4();
    assert_eq!(
        engine.amend_note(missing, "nope").await,
        Err(EngineError::ReconciliationNotFound(missing.to_string()))
    );
}

#[tokio::test]
async fn unknown_reconciliation_lookup_fails() {
    let (engine, _db) = engine_with_db().await;
    let missing = Uuid::new_v4();
    assert_eq!(
        engine.reconciliation(missing).await,
        Err(EngineError::ReconciliationNotFound(missing.to_string()))
    );
    assert_eq!(
        engine.list_reconciliations(missing).await,
        Err(EngineError::SessionNotFound(missing.to_string()))
    );
}

#[tokio::test]
async fn records_serialize_with_category_keys() {
    let (engine, _db) = engine_with_db().await;
    let session = busy_session(&engine).await;
    let expected = engine.compute_summary(session).await.unwrap().expected();
    let id = engine
        .record_reconciliation(RecordReconciliationCmd::new(
            session,
            expected,
            expected,
            at(18, 0),
        ))
        .await
        .unwrap();

    let record = engine.reconciliation(id).await.unwrap();
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["has_discrepancy"], serde_json::json!(false));
    assert_eq!(json["expected_inflow"].as_object().unwrap().len(), 5);
}

/// Everything but the note, for before/after comparisons.
#[derive(Debug, PartialEq)]
struct ReconciliationNoteless {
    id: Uuid,
    session_id: Uuid,
    recorded_at: DateTime<Utc>,
    recorded_by: Option<String>,
    counted: (CategoryAmounts, CategoryAmounts),
    expected: (CategoryAmounts, CategoryAmounts),
    diff: (CategoryAmounts, CategoryAmounts),
    has_discrepancy: bool,
}

impl From<&engine::ReconciliationRecord> for ReconciliationNoteless {
    fn from(record: &engine::ReconciliationRecord) -> Self {
        Self {
            id: record.id,
            session_id: record.session_id,
            recorded_at: record.recorded_at,
            recorded_by: record.recorded_by.clone(),
            counted: (record.counted_inflow, record.counted_outflow),
            expected: (record.expected_inflow, record.expected_outflow),
            diff: (record.diff_inflow, record.diff_outflow),
            has_discrepancy: record.has_discrepancy,
        }
    }
}
