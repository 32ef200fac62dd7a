use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, MoneyCents, OpenSessionCmd, PaymentCategory, RecordMovementCmd,
    SessionState,
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

async fn engine_with_file_db() -> (Engine, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("till_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    (engine, path)
}

fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, hour, minute, 0).unwrap()
}

#[tokio::test]
async fn open_is_idempotent_while_a_session_is_open() {
    let (engine, _db) = engine_with_db().await;

    let first = engine
        .open_session(OpenSessionCmd::new(cents(10_000), Utc::now()).operator("anna"))
        .await
        .unwrap();
    let second = engine
        .open_session(OpenSessionCmd::new(cents(99_999), Utc::now()).operator("bruno"))
        .await
        .unwrap();

    assert_eq!(first, second);
    let sessions = engine.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].opening_float, cents(10_000));
    assert_eq!(sessions[0].opened_by.as_deref(), Some("anna"));
}

#[tokio::test]
async fn open_accepts_zero_float_and_rejects_negative() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .open_session(OpenSessionCmd::new(cents(-1), Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert!(engine.current_session().await.unwrap().is_none());

    engine
        .open_session(OpenSessionCmd::new(MoneyCents::ZERO, Utc::now()))
        .await
        .unwrap();
    assert!(engine.current_session().await.unwrap().is_some());
}

#[tokio::test]
async fn close_is_terminal_and_next_open_starts_a_new_session() {
    let (engine, _db) = engine_with_db().await;
    let opened_at = at(8, 0);
    let id = engine
        .open_session(OpenSessionCmd::new(cents(5_000), opened_at).note("morning shift"))
        .await
        .unwrap();

    let closed_at = opened_at + Duration::hours(8);
    engine
        .close_session(id, Some("anna"), closed_at)
        .await
        .unwrap();

    let session = engine.session(id).await.unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.closed_at, Some(closed_at));
    assert_eq!(session.closed_by.as_deref(), Some("anna"));
    assert_eq!(session.note.as_deref(), Some("morning shift"));
    assert!(engine.current_session().await.unwrap().is_none());

    let next = engine
        .open_session(OpenSessionCmd::new(cents(5_000), closed_at))
        .await
        .unwrap();
    assert_ne!(next, id);
    assert_eq!(engine.current_session().await.unwrap().unwrap().id, next);
    assert_eq!(engine.list_sessions().await.unwrap().len(), 2);
}

#[tokio::test]
async fn close_unknown_or_closed_session_fails_without_changes() {
    let (engine, _db) = engine_with_db().await;

    let missing = Uuid::new_v4();
    assert_eq!(
        engine.close_session(missing, None, Utc::now()).await,
        Err(EngineError::SessionNotFound(missing.to_string()))
    );
    assert!(engine.list_sessions().await.unwrap().is_empty());

    let id = engine
        .open_session(OpenSessionCmd::new(cents(1_000), Utc::now()))
        .await
        .unwrap();
    engine
        .record_movement(RecordMovementCmd::inflow(
            id,
            cents(500),
            PaymentCategory::Cash,
            Utc::now(),
        ))
        .await
        .unwrap();
    let first_close = at(20, 0);
    engine.close_session(id, Some("anna"), first_close).await.unwrap();

    assert_eq!(
        engine
            .close_session(id, Some("bruno"), first_close + Duration::minutes(5))
            .await,
        Err(EngineError::SessionAlreadyClosed(id.to_string()))
    );

    let session = engine.session(id).await.unwrap();
    assert_eq!(session.closed_at, Some(first_close));
    assert_eq!(session.closed_by.as_deref(), Some("anna"));
    assert_eq!(engine.list_movements(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn session_lookup_of_unknown_id_fails() {
    let (engine, _db) = engine_with_db().await;
    let missing = Uuid::new_v4();
    assert_eq!(
        engine.session(missing).await,
        Err(EngineError::SessionNotFound(missing.to_string()))
    );
}

#[tokio::test]
async fn open_slot_index_rejects_a_second_open_session() {
    let (engine, db) = engine_with_db().await;

    // A row that still holds the open slot although `closed_at` is set: the
    // read-side check sees no open session, only the unique index can refuse.
    let stale = Uuid::new_v4();
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "INSERT INTO cash_sessions (id, opened_at, opening_float_minor, closed_at, open_slot) \
         VALUES (?, ?, ?, ?, 1)",
        vec![
            stale.to_string().into(),
            at(8, 0).into(),
            0i64.into(),
            at(9, 0).into(),
        ],
    ))
    .await
    .unwrap();

    let err = engine
        .open_session(OpenSessionCmd::new(cents(1_000), at(10, 0)))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, EngineError::ConcurrentModification(detail) if detail.contains("open_slot")),
        "{err}"
    );

    let sessions = engine.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, stale);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_opens_leave_exactly_one_open_session() {
    let (engine, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..4 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move {
            engine
                .open_session(OpenSessionCmd::new(MoneyCents::new(1_000 * i), Utc::now()))
                .await
        });
    }

    let mut opened = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(id) => opened.push(id),
            Err(EngineError::ConcurrentModification(_) | EngineError::Persistence(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert!(!opened.is_empty());
    assert!(opened.iter().all(|id| *id == opened[0]));
    let sessions = engine.list_sessions().await.unwrap();
    assert_eq!(sessions.iter().filter(|s| s.is_open()).count(), 1);
    assert_eq!(sessions.len(), 1);

    drop(engine);
    let _ = std::fs::remove_file(path);
}
