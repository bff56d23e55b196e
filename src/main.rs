use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sprint_tracker::api::{self, middleware::SecurityConfig};
use sprint_tracker::board::{
    Clipboard, NoClipboard, PresetAnswer, Prompter, Severity, SystemClipboard, TerminalPrompter,
    TrelloClient,
};
use sprint_tracker::config::{self, Config};
use sprint_tracker::db::Database;
use sprint_tracker::models::{Transition, TransitionOutcome, UpdateCountersInput};
use sprint_tracker::SprintEngine;

#[derive(Parser)]
#[command(name = "sprint-tracker")]
#[command(about = "Sprint counters and card workflow automation for Trello boards")]
struct Cli {
    /// Plugin-data database (defaults to SPRINT_TRACKER_DB or the platform data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Plugin-data scope: shared or private (defaults to SPRINT_TRACKER_SCOPE)
    #[arg(long, global = true)]
    scope: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API for the power-up frontend
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Show the board badge
    Status {
        #[arg(long)]
        board: String,
    },
    /// Show the sprint summary
    Summary {
        #[arg(long)]
        board: String,
    },
    /// Show a card's story-point badges
    Badges(CardArgs),
    /// Join a card, move it to In Progress and claim a branch id
    Start(CardArgs),
    /// Move a card to Code Review
    Review(CardArgs),
    /// Credit the estimate and move a card to Dev Done
    Done(CardArgs),
    /// Credit the estimate and move a card to Awaiting Epic Completion
    Defer(CardArgs),
    /// Claim the next branch id for a card without moving it
    Branch(CardArgs),
    /// Add a card's estimate to the sprint points
    Estimate(CardArgs),
    /// Add points to the sprint total
    AddPoints {
        #[arg(long)]
        board: String,
        #[arg(long)]
        amount: f64,
    },
    /// Start the next sprint
    NewSprint {
        #[arg(long)]
        board: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or change the sprint counters
    Settings {
        #[arg(long)]
        board: String,
        #[arg(long)]
        sprint: Option<i64>,
        #[arg(long)]
        branch: Option<i64>,
        #[arg(long)]
        points: Option<f64>,
    },
}

#[derive(clap::Args)]
struct CardArgs {
    #[arg(long)]
    board: String,
    #[arg(long)]
    card: String,
}

/// Initialize tracing. Logs go to stderr so command output stays readable.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "sprint_tracker=info,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_engine(
    cli: &Cli,
    config: &Config,
    clipboard: Arc<dyn Clipboard>,
) -> anyhow::Result<SprintEngine> {
    let client = TrelloClient::new(config.trello()?).context("Failed to build Trello client")?;

    let db_path = match cli.db.clone().or_else(|| config.database_path.clone()) {
        Some(path) => path,
        None => Database::default_path()?,
    };
    let db = Database::open(db_path)?;
    db.migrate()?;

    let scope = match &cli.scope {
        Some(raw) => config::parse_scope(raw)?,
        None => config.scope,
    };

    Ok(
        SprintEngine::new(Arc::new(client), Arc::new(db), clipboard)
            .with_names(config.workflow.clone())
            .with_scope(scope),
    )
}

async fn report(prompter: &dyn Prompter, outcome: &TransitionOutcome) {
    prompter
        .alert(&outcome.message, Severity::for_outcome(outcome), Duration::from_secs(4))
        .await;
    for warning in &outcome.warnings {
        prompter
            .alert(warning, Severity::Warning, Duration::from_secs(4))
            .await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env()?;
    let prompter = TerminalPrompter;

    let outcome = match &cli.command {
        Commands::Serve { port } => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            let app = api::create_router(engine, SecurityConfig::from_env());

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("Sprint tracker listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await?;
            return Ok(());
        }
        Commands::Status { board } => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            let badge = engine.badge(board).await;
            println!("{}: {}", badge.title, badge.text);
            return Ok(());
        }
        Commands::Summary { board } => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            let summary = engine.summary(board).await;
            println!(
                "Sprint {} Summary:\n\nCurrent Points: {}\nNext Branch: {}\n\nNote: {}",
                summary.sprint_number, summary.points_done, summary.next_branch_id, summary.note
            );
            return Ok(());
        }
        Commands::Badges(args) => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            let badges = engine.card_badges(&args.card).await;
            if badges.detail.is_empty() {
                println!("Card {} has no estimate", args.card);
            }
            for badge in badges.detail {
                println!("{}: {}", badge.title.unwrap_or_default(), badge.text);
            }
            return Ok(());
        }
        Commands::Settings {
            board,
            sprint,
            branch,
            points,
        } => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            if sprint.is_none() && branch.is_none() && points.is_none() {
                engine.open_settings(board, &prompter).await;
                return Ok(());
            }
            let input = UpdateCountersInput {
                sprint_number: *sprint,
                next_branch_number: *branch,
                points_done: *points,
            };
            let counters = engine.update_counters(board, &input).await?;
            println!(
                "Sprint {} • next branch {} • {} points",
                counters.sprint_number,
                counters.branch_id(),
                counters.points_done
            );
            return Ok(());
        }
        Commands::NewSprint { board, yes } => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            if *yes {
                engine
                    .transition(board, None, Transition::AdvanceSprint, &PresetAnswer(true))
                    .await
            } else {
                engine
                    .transition(board, None, Transition::AdvanceSprint, &prompter)
                    .await
            }
        }
        Commands::AddPoints { board, amount } => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            engine.add_points(board, *amount).await
        }
        Commands::Start(args) => {
            let engine = build_engine(&cli, &config, Arc::new(SystemClipboard))?;
            engine.start(&args.board, &args.card).await
        }
        Commands::Review(args) => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            engine.review(&args.board, &args.card).await
        }
        Commands::Done(args) => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            engine.done(&args.board, &args.card).await
        }
        Commands::Defer(args) => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            engine.defer(&args.board, &args.card).await
        }
        Commands::Branch(args) => {
            let engine = build_engine(&cli, &config, Arc::new(SystemClipboard))?;
            engine.claim_branch(&args.board, &args.card).await
        }
        Commands::Estimate(args) => {
            let engine = build_engine(&cli, &config, Arc::new(NoClipboard))?;
            engine.add_card_estimate(&args.board, &args.card).await
        }
    };

    report(&prompter, &outcome).await;
    if !outcome.succeeded {
        std::process::exit(1);
    }
    Ok(())
}
