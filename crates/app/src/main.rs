use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use rush_core::model::LanguageCode;
use rush_core::scoring::{PASS_PENALTY_SECS, WRONG_ANSWER_PENALTY_SECS};
use rush_core::session::RushConfig;
use services::{
    ApiClient, ApiConfig, CredentialProvider, EnvCredentials, HttpQuestionSupply, HttpScoreSink,
    QuestionSupply, RushController, ScoreSink, UnseenQuestionSupply,
};
use storage::repository::Storage;

mod frontend;
mod telemetry;
mod widgets;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLanguage { raw: String },
    InvalidDuration { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLanguage { raw } => write!(f, "invalid --lang value: {raw}"),
            ArgsError::InvalidDuration { raw } => write!(f, "invalid --duration value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--lang <code>] [--db <sqlite_url>] [--base-url <url>] [--duration <secs>] [--no-pass]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --lang en          (or RUSH_TARGET_LANG)");
    eprintln!("  --db <none>        seen-question ledger stays in memory (or RUSH_DB_URL)");
    eprintln!("  --base-url http://127.0.0.1:5000   (or RUSH_API_BASE_URL)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUSH_API_TOKEN     bearer token attached to API requests");
    eprintln!("  LOG_LEVEL, LOG_FORMAT");
}

struct Args {
    language: LanguageCode,
    db_url: Option<String>,
    base_url: Option<String>,
    duration_secs: Option<u32>,
    no_pass: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut language = std::env::var("RUSH_TARGET_LANG")
            .ok()
            .and_then(|raw| raw.parse::<LanguageCode>().ok())
            .unwrap_or_default();
        let mut db_url = std::env::var("RUSH_DB_URL").ok().filter(|s| !s.is_empty());
        let mut base_url = None;
        let mut duration_secs = None;
        let mut no_pass = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--lang" => {
                    let value = require_value(args, "--lang")?;
                    language = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLanguage { raw: value.clone() })?;
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(normalize_sqlite_url(value));
                }
                "--base-url" => {
                    base_url = Some(require_value(args, "--base-url")?);
                }
                "--duration" => {
                    let value = require_value(args, "--duration")?;
                    let parsed: u32 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDuration { raw: value.clone() })?;
                    duration_secs = Some(parsed);
                }
                "--no-pass" => no_pass = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            language,
            db_url,
            base_url,
            duration_secs,
            no_pass,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    info!(
        target: "rush_app",
        language = %args.language,
        persistent_ledger = args.db_url.is_some(),
        "starting mixed rush"
    );

    // Seen-question ledger: SQLite when a db was asked for, in-memory otherwise.
    let storage = match &args.db_url {
        Some(db_url) => {
            prepare_sqlite_file(db_url)?;
            Storage::sqlite(db_url).await?
        }
        None => Storage::in_memory(),
    };

    let mut api_config = ApiConfig::from_env();
    if let Some(base_url) = args.base_url {
        api_config.base_url = base_url;
    }
    let credentials: Arc<dyn CredentialProvider> = Arc::new(EnvCredentials::new());
    let client = Arc::new(ApiClient::new(api_config, credentials)?);

    let supply: Arc<dyn QuestionSupply> = Arc::new(UnseenQuestionSupply::new(
        HttpQuestionSupply::new(Arc::clone(&client)),
        Arc::clone(&storage.seen),
    ));
    let sink: Arc<dyn ScoreSink> = Arc::new(HttpScoreSink::new(client));

    let rush_config = match args.duration_secs {
        Some(duration) => {
            RushConfig::new(duration, WRONG_ANSWER_PENALTY_SECS, PASS_PENALTY_SECS)?
        }
        None => RushConfig::default(),
    }
    .with_allow_pass(!args.no_pass);

    let controller = RushController::new(
        rush_config,
        args.language,
        supply,
        sink,
        Arc::clone(&storage.seen),
    );

    let (event_tx, event_rx) = mpsc::channel(16);
    let (update_tx, update_rx) = mpsc::channel(64);
    let controller_task = tokio::spawn(controller.run(event_rx, update_tx));

    frontend::play(event_tx, update_rx).await?;
    controller_task.await??;
    Ok(())
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
