use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use mnemo_core::model::{QuestionId, SessionId};
use serde::Serialize;
use services::{Clock, SessionError, SessionManager};
use storage::SqliteStore;
use tracing_subscriber::EnvFilter;

mod render;

const DB_FILE_NAME: &str = "mnemo.sqlite3";

#[derive(Parser)]
#[command(name = "mnemo", version, about = "Elaborative interrogation sessions for vocabulary")]
struct Cli {
    /// SQLite file holding the sessions
    #[arg(long, env = "MNEMO_DB", global = true)]
    db: Option<PathBuf>,

    /// Storage key the session list lives under
    #[arg(long, env = "MNEMO_STORAGE_KEY", global = true)]
    key: Option<String>,

    /// Print results as pretty JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session with five questions about a word
    Start { word: String, explanation: String },

    /// Answer one question of a session
    Answer {
        session: String,
        question: String,
        text: String,
    },

    /// Complete a session and compute its overall score
    Complete { session: String },

    /// Show a session with its answers and evaluations
    Show { session: String },

    /// List sessions, optionally for one word
    List {
        #[arg(long)]
        word: Option<String>,
    },

    /// Show the next unanswered question of a session
    Next { session: String },

    /// Show how far a session has progressed
    Progress { session: String },

    /// Delete a session
    Delete { session: String },

    /// Statistics over completed sessions
    Stats,
}

/// Default database location: the platform data dir, else the working directory.
fn default_db_path() -> PathBuf {
    ProjectDirs::from("", "", "mnemo").map_or_else(
        || PathBuf::from(DB_FILE_NAME),
        |dirs| dirs.data_dir().join(DB_FILE_NAME),
    )
}

fn open_manager(cli: &Cli) -> Result<SessionManager, Box<dyn std::error::Error>> {
    let path = cli.db.clone().unwrap_or_else(default_db_path);
    tracing::debug!(path = %path.display(), "opening session database");
    let store = SqliteStore::open(&path)?;

    let manager = SessionManager::new(Arc::new(store), Clock::default_clock());
    Ok(match &cli.key {
        Some(key) => manager.with_storage_key(key.clone()),
        None => manager,
    })
}

fn emit<T: Serialize>(
    out: &mut impl Write,
    json: bool,
    value: &T,
    human: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
    } else {
        human(out)?;
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let manager = open_manager(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let json = cli.json;

    match cli.command {
        Commands::Start { word, explanation } => {
            let session = manager.start_session(&word, &explanation)?;
            emit(&mut out, json, &session, |w| render::session_started(w, &session))
        }
        Commands::Answer {
            session,
            question,
            text,
        } => {
            let evaluation = manager.submit_response(
                &SessionId::new(session),
                &QuestionId::new(question),
                &text,
            )?;
            emit(&mut out, json, &evaluation, |w| render::evaluation(w, &evaluation))
        }
        Commands::Complete { session } => {
            let session = manager.complete_session(&SessionId::new(session))?;
            emit(&mut out, json, &session, |w| render::session_completed(w, &session))
        }
        Commands::Show { session } => {
            let id = SessionId::new(session);
            let session = manager
                .get_session(&id)
                .ok_or(SessionError::SessionNotFound(id))?;
            emit(&mut out, json, &session, |w| render::session_detail(w, &session))
        }
        Commands::List { word } => {
            let sessions = match word.as_deref() {
                Some(word) => manager.get_sessions_for_word(word),
                None => manager.get_all_sessions(),
            };
            emit(&mut out, json, &sessions, |w| render::session_list(w, &sessions))
        }
        Commands::Next { session } => {
            let id = SessionId::new(session);
            if manager.get_session(&id).is_none() {
                return Err(SessionError::SessionNotFound(id).into());
            }
            let question = manager.get_next_unanswered_question(&id);
            emit(&mut out, json, &question, |w| {
                render::next_question(w, question.as_ref())
            })
        }
        Commands::Progress { session } => {
            let id = SessionId::new(session);
            let progress = manager
                .progress(&id)
                .ok_or(SessionError::SessionNotFound(id))?;
            emit(&mut out, json, &progress, |w| render::progress(w, &progress))
        }
        Commands::Delete { session } => {
            let id = SessionId::new(session);
            manager.delete_session(&id)?;
            let payload = serde_json::json!({ "deleted": id.as_str() });
            emit(&mut out, json, &payload, |w| writeln!(w, "deleted {id}"))
        }
        Commands::Stats => {
            let stats = manager.get_statistics();
            emit(&mut out, json, &stats, |w| render::statistics(w, &stats))
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}
