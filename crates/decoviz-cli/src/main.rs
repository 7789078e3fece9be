mod chat;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use decoviz_contracts::events::{EventDetails, SessionLog};
use decoviz_contracts::session::{Event, Session};
use decoviz_engine::codec;
use decoviz_engine::export::export_batch;
use decoviz_engine::{ConfigOverrides, EngineConfig, RedesignEngine};
use serde_json::{json, Map, Value};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::chat::ChatSession;

const DEFAULT_LOG_FILTER: &str = "decoviz=info";

#[derive(Debug, Parser)]
#[command(name = "decoviz", version, about = "Interior redesign proposals from a room photo")]
struct Cli {
    /// Use the offline gateway; no credential or network needed.
    #[arg(long, global = true)]
    dryrun: bool,
    #[arg(long, global = true)]
    edit_model: Option<String>,
    #[arg(long, global = true)]
    image_model: Option<String>,
    #[arg(long, global = true)]
    text_model: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat(ChatArgs),
    Run(RunArgs),
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value = "")]
    instructions: String,
    #[arg(long)]
    events: Option<PathBuf>,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("decoviz error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        dryrun: cli.dryrun,
        edit_model: cli.edit_model,
        image_model: cli.image_model,
        text_model: cli.text_model,
    };
    let config = EngineConfig::from_env(&overrides);
    let engine = RedesignEngine::from_config(config)?;
    let config = engine.config();
    info!(
        gateway = engine.gateway_name(),
        edit_model = %config.edit_model,
        image_model = %config.image_model,
        text_model = %config.text_model,
        "engine ready"
    );

    match cli.command {
        Command::Chat(args) => {
            let log = session_log(&args.out, args.events.as_ref());
            let mut session = ChatSession::new(engine, log, args.out);
            session.run_stdin()?;
            Ok(0)
        }
        Command::Run(args) => run_batch(&engine, args),
    }
}

fn session_log(out: &std::path::Path, events: Option<&PathBuf>) -> SessionLog {
    let path = events
        .cloned()
        .unwrap_or_else(|| out.join("events.jsonl"));
    SessionLog::new(path, uuid::Uuid::new_v4().to_string())
}

fn advance(
    session: &mut Session,
    log: &mut SessionLog,
    event: Event,
    details: EventDetails,
) -> Result<()> {
    let name = event.name();
    let from = session.screen();
    session.apply(event)?;
    log.transition(name, from, session.screen(), details)?;
    Ok(())
}

pub(crate) fn json_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn run_batch(engine: &RedesignEngine, args: RunArgs) -> Result<i32> {
    let mut log = session_log(&args.out, args.events.as_ref());
    let mut session = Session::new();
    let upload = match codec::load_upload(&args.image, &args.instructions) {
        Ok(upload) => upload,
        Err(err) => {
            eprintln!("{}", err.user_message());
            return Ok(1);
        }
    };
    let image = upload.image.clone();
    let instructions = upload.instructions.clone();
    let details = json_object(json!({
        "file_name": upload.file_name,
        "instructions": upload.instructions,
    }));
    advance(&mut session, &mut log, Event::AnalysisStarted(upload), details)?;

    let batch = match engine.generate_initial_proposals(&image, &instructions) {
        Ok(batch) => batch,
        Err(err) => {
            error!(error = %err, "initial batch failed");
            let message = err.user_message();
            let details = json_object(json!({
                "operation": err.operation().map(|op| op.as_str()),
                "message": message,
                "requires_new_upload": err.requires_new_upload(),
            }));
            advance(
                &mut session,
                &mut log,
                Event::AnalysisFailed {
                    message: message.clone(),
                },
                details,
            )?;
            eprintln!("{message}");
            return Ok(1);
        }
    };
    let details = json_object(json!({
        "room_type": batch.room_type,
        "styles": batch.proposals.iter().map(|p| p.style.as_str()).collect::<Vec<&str>>(),
    }));
    advance(
        &mut session,
        &mut log,
        Event::AnalysisCompleted {
            proposals: batch.proposals,
            room_type: batch.room_type,
        },
        details,
    )?;
    let Some(room_type) = session.room_type() else {
        anyhow::bail!("analysis completed without a workspace");
    };
    let proposals = session.proposals();

    let exported = match export_batch(&args.out, room_type, proposals) {
        Ok(exported) => exported,
        Err(err) => {
            eprintln!("{}", err.user_message());
            return Ok(1);
        }
    };
    let files: Vec<String> = exported
        .iter()
        .flat_map(|entry| entry.paths())
        .map(|path| path.display().to_string())
        .collect();
    log.note(
        "exported",
        session.screen(),
        json_object(json!({ "dir": args.out.display().to_string(), "files": files })),
    )?;

    println!("Room type: {room_type}");
    for (index, proposal) in proposals.iter().enumerate() {
        println!(
            "{}. {} [{}]",
            index + 1,
            proposal.style,
            proposal.color_palette.join(" ")
        );
    }
    println!("Exported to {}", args.out.display());
    Ok(0)
}
