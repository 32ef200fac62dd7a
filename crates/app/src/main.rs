use std::{error::Error, io::Write, str::FromStr};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use engine::{
    CategoryAmounts, DirectionalAmounts, Direction, Engine, MoneyCents, OpenSessionCmd,
    PaymentCategory, RecordMovementCmd, RecordReconciliationCmd, ReconciliationRecord,
    ReverseMovementCmd,
};
use migration::{Migrator, MigratorTrait};
use settings::Database;
use uuid::Uuid;

mod settings;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "till")]
#[command(about = "Cash register sessions, movements and reconciliation")]
struct Cli {
    /// Database connection string; overrides the configured database.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the till, or show the session already open.
    Open(OpenArgs),
    /// Close a session.
    Close(CloseArgs),
    /// Show the open session, if any.
    Status,
    /// Post an inflow or outflow.
    Record(RecordArgs),
    /// Post the mirror image of an earlier movement into the open session.
    Reverse(ReverseArgs),
    /// List the movements of a session.
    Movements(SessionArg),
    /// Expected figures of a session.
    Summary(SummaryArgs),
    /// Blind count against the expected figures.
    Reconcile(ReconcileArgs),
    /// Replace the note of a reconciliation.
    AmendNote(AmendNoteArgs),
    /// List the reconciliations of a session.
    Reconciliations(SessionArg),
}

#[derive(Args, Debug)]
struct OpenArgs {
    #[arg(long, value_parser = parse_amount)]
    float: MoneyCents,
    #[arg(long)]
    operator: Option<String>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct SessionArg {
    /// Defaults to the open session.
    #[arg(long)]
    session: Option<Uuid>,
}

#[derive(Args, Debug)]
struct CloseArgs {
    #[command(flatten)]
    session: SessionArg,
    #[arg(long)]
    operator: Option<String>,
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// `in` or `out`.
    #[arg(value_parser = parse_direction)]
    direction: Direction,
    #[arg(value_parser = parse_amount)]
    amount: MoneyCents,
    #[arg(long, value_parser = parse_category)]
    category: PaymentCategory,
    #[arg(long, conflicts_with = "bill")]
    sale: Option<String>,
    #[arg(long)]
    bill: Option<String>,
    #[arg(long)]
    operator: Option<String>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct ReverseArgs {
    movement_id: i64,
    #[arg(long)]
    operator: Option<String>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    #[command(flatten)]
    session: SessionArg,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    #[command(flatten)]
    session: SessionArg,
    #[arg(long)]
    operator: Option<String>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct AmendNoteArgs {
    reconciliation_id: Uuid,
    note: String,
}

fn parse_amount(raw: &str) -> Result<MoneyCents, String> {
    MoneyCents::from_str(raw).map_err(|err| err.to_string())
}

fn parse_direction(raw: &str) -> Result<Direction, String> {
    match raw {
        "in" => Ok(Direction::Inflow),
        "out" => Ok(Direction::Outflow),
        other => Direction::try_from(other).map_err(|err| err.to_string()),
    }
}

fn parse_category(raw: &str) -> Result<PaymentCategory, String> {
    PaymentCategory::try_from(raw.replace('-', "_").as_str()).map_err(|err| err.to_string())
}

async fn parse_database(config: &Database) -> CliResult<sea_orm::DatabaseConnection> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };
    connect_db(&url).await
}

async fn connect_db(database_url: &str) -> CliResult<sea_orm::DatabaseConnection> {
    tracing::debug!(database_url, "connecting to database");
    let database = sea_orm::Database::connect(database_url).await?;
    Migrator::up(&database, None).await?;
    tracing::debug!("migrations applied");
    Ok(database)
}

/// The given session, or the open one.
async fn resolve_session(engine: &Engine, arg: &SessionArg) -> CliResult<Uuid> {
    if let Some(id) = arg.session {
        return Ok(id);
    }
    match engine.current_session().await? {
        Some(session) => Ok(session.id),
        None => Err("no open session; pass --session".into()),
    }
}

/// Reads one counted figure per category. Empty input counts as zero.
fn prompt_counts(direction: Direction) -> CliResult<CategoryAmounts> {
    let stdin = std::io::stdin();
    let mut out = std::io::stderr();
    let mut counted = CategoryAmounts::ZERO;
    for category in PaymentCategory::ALL {
        loop {
            write!(out, "counted {direction} {category}: ")?;
            out.flush()?;

            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                return Err("input closed before the count was complete".into());
            }
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            match MoneyCents::from_str(line) {
                Ok(amount) if !amount.is_negative() => {
                    counted.set(category, amount);
                    break;
                }
                Ok(_) => writeln!(out, "amount must not be negative")?,
                Err(err) => writeln!(out, "{err}")?,
            }
        }
    }
    Ok(counted)
}

fn print_reconciliation(record: &ReconciliationRecord) {
    println!(
        "reconciliation {} at {}{}",
        record.id,
        record.recorded_at.to_rfc3339(),
        if record.has_discrepancy {
            " (DISCREPANCY)"
        } else {
            ""
        }
    );
    let rows = [
        (Direction::Inflow, &record.counted_inflow, &record.expected_inflow, &record.diff_inflow),
        (Direction::Outflow, &record.counted_outflow, &record.expected_outflow, &record.diff_outflow),
    ];
    for (direction, counted, expected, diff) in rows {
        for category in PaymentCategory::ALL {
            println!(
                "  {direction:<8} {category:<17} counted {:>10} expected {:>10} diff {:>10}",
                counted.get(category),
                expected.get(category),
                diff.get(category),
            );
        }
    }
    if let Some(note) = &record.note {
        println!("  note: {note}");
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "till={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = match &cli.database_url {
        Some(url) => connect_db(url).await?,
        None => parse_database(&settings.database).await?,
    };
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Open(args) => {
            let mut cmd = OpenSessionCmd::new(args.float, Utc::now());
            if let Some(operator) = args.operator {
                cmd = cmd.operator(operator);
            }
            if let Some(note) = args.note {
                cmd = cmd.note(note);
            }
            let id = engine.open_session(cmd).await?;
            let session = engine.session(id).await?;
            println!(
                "session {id} open since {} with float {}",
                session.opened_at.to_rfc3339(),
                session.opening_float
            );
        }
        Command::Close(args) => {
            let id = resolve_session(&engine, &args.session).await?;
            engine
                .close_session(id, args.operator.as_deref(), Utc::now())
                .await?;
            println!("closed session {id}");
        }
        Command::Status => match engine.current_session().await? {
            Some(session) => {
                let summary = engine.compute_summary(session.id).await?;
                println!("session {} open since {}", session.id, session.opened_at.to_rfc3339());
                println!("  movements: {}", summary.movement_count);
                println!("  expected balance: {}", summary.closing_balance);
            }
            None => println!("no open session"),
        },
        Command::Record(args) => {
            let Some(session) = engine.current_session().await? else {
                return Err("no open session; open the till first".into());
            };
            let mut cmd = RecordMovementCmd::new(
                session.id,
                args.direction,
                args.amount,
                args.category,
                Utc::now(),
            );
            if let Some(sale) = args.sale {
                cmd = cmd.sale(sale);
            }
            if let Some(bill) = args.bill {
                cmd = cmd.bill_payment(bill);
            }
            if let Some(operator) = args.operator {
                cmd = cmd.operator(operator);
            }
            if let Some(note) = args.note {
                cmd = cmd.note(note);
            }
            let id = engine.record_movement(cmd).await?;
            println!("recorded movement {id}");
        }
        Command::Reverse(args) => {
            let Some(session) = engine.current_session().await? else {
                return Err("no open session; open the till first".into());
            };
            let mut cmd = ReverseMovementCmd::new(session.id, args.movement_id, Utc::now());
            if let Some(operator) = args.operator {
                cmd = cmd.operator(operator);
            }
            if let Some(note) = args.note {
                cmd = cmd.note(note);
            }
            let id = engine.reverse_movement(cmd).await?;
            println!("movement {} reversed by {id}", args.movement_id);
        }
        Command::Movements(arg) => {
            let id = resolve_session(&engine, &arg).await?;
            for movement in engine.list_movements(id).await? {
                let source = match &movement.source_link {
                    Some(engine::SourceLink::Sale { sale_id }) => format!(" sale:{sale_id}"),
                    Some(engine::SourceLink::BillPayment { bill_id }) => format!(" bill:{bill_id}"),
                    None => String::new(),
                };
                let reverses = movement
                    .reverses
                    .map(|original| format!(" reverses:{original}"))
                    .unwrap_or_default();
                println!(
                    "{:>6} {} {:>10} {:<17}{source}{reverses}",
                    movement.id,
                    movement.recorded_at.to_rfc3339(),
                    movement.signed_amount(),
                    movement.payment_category,
                );
            }
        }
        Command::Summary(args) => {
            let id = resolve_session(&engine, &args.session).await?;
            let summary = engine.compute_summary(id).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("session {id}");
                println!("  opening float: {}", summary.opening_float);
                for category in PaymentCategory::ALL {
                    println!(
                        "  {category:<17} in {:>10} out {:>10}",
                        summary.inflow_by_category.get(category),
                        summary.outflow_by_category.get(category),
                    );
                }
                println!("  total in: {}", summary.total_inflow);
                println!("  total out: {}", summary.total_outflow);
                println!("  expected balance: {}", summary.closing_balance);
                println!("  movements: {}", summary.movement_count);
            }
        }
        Command::Reconcile(args) => {
            let id = resolve_session(&engine, &args.session).await?;
            // Expected is pinned before counting starts.
            let expected = engine.compute_summary(id).await?.expected();
            let counted = DirectionalAmounts::new(
                prompt_counts(Direction::Inflow)?,
                prompt_counts(Direction::Outflow)?,
            );
            let mut cmd = RecordReconciliationCmd::new(id, counted, expected, Utc::now());
            if let Some(operator) = args.operator {
                cmd = cmd.operator(operator);
            }
            if let Some(note) = args.note {
                cmd = cmd.note(note);
            }
            let reconciliation_id = engine.record_reconciliation(cmd).await?;
            tracing::info!(%reconciliation_id, session_id = %id, "blind count stored");
            print_reconciliation(&engine.reconciliation(reconciliation_id).await?);
        }
        Command::AmendNote(args) => {
            engine
                .amend_note(args.reconciliation_id, &args.note)
                .await?;
            println!("note updated");
        }
        Command::Reconciliations(arg) => {
            let id = resolve_session(&engine, &arg).await?;
            for record in engine.list_reconciliations(id).await? {
                print_reconciliation(&record);
            }
        }
    }

    Ok(())
}
