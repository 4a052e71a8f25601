use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use courier::backend::{ChatBackend, HttpBackend, MergePolicy, StagedFile};
use courier::client::SessionClient;
use courier::core::config::{self, CliOverrides, CourierConfig};
use courier::core::state::{App, LogKind};
use courier::repl;
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "courier", about = "Chat with a document-aware backend")]
struct Args {
    /// Backend base URL, e.g. http://localhost:7071/api
    #[arg(long)]
    base_url: Option<String>,

    /// How ids in a response replace the ones already held
    #[arg(long, value_enum)]
    merge_policy: Option<MergePolicy>,

    /// Sent to the backend as X-User-Id
    #[arg(long)]
    user_id: Option<String>,

    /// File to upload with the first message
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Send a single message, print the reply and exit
    #[arg(short, long)]
    message: Option<String>,

    /// Level written to courier.log
    #[arg(long, default_value_t, value_enum)]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to courier.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("courier.log") {
        let _ = WriteLogger::init(args.log_level.into(), log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        warn!("{e}; falling back to defaults");
        CourierConfig::default()
    });
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            base_url: args.base_url.clone(),
            user_id: args.user_id.clone(),
            merge_policy: args.merge_policy,
        },
    );

    info!(
        "Courier starting up: base_url={}, merge_policy={:?}, fields={:?}",
        resolved.base_url, resolved.merge_policy, resolved.fields
    );

    let backend: Arc<dyn ChatBackend> = Arc::new(
        HttpBackend::new(resolved.base_url.clone(), resolved.fields.clone())
            .with_user_id(resolved.user_id.clone()),
    );

    let staged = match &args.file {
        Some(path) => Some(
            StagedFile::from_path(path)
                .await
                .map_err(|e| io::Error::other(e.to_string()))?,
        ),
        None => None,
    };

    if let Some(message) = args.message {
        return one_shot(backend, resolved.merge_policy, &message, staged).await;
    }

    let mut app = App::new(resolved.merge_policy);
    if let Some(file) = staged {
        app.push_log(
            LogKind::Notice,
            format!("Attached {} ({} bytes)", file.name, file.bytes.len()),
        );
        app.staged_file = Some(file);
    }
    repl::run(backend, app).await
}

/// `--message` mode: one turn, reply on stdout, anything else on stderr.
async fn one_shot(
    backend: Arc<dyn ChatBackend>,
    merge_policy: MergePolicy,
    message: &str,
    staged: Option<StagedFile>,
) -> io::Result<()> {
    let mut client = SessionClient::new(backend, merge_policy);
    match client.send_turn(message, staged).await {
        Ok(outcome) => {
            if let Some(upload) = outcome.uploaded {
                eprintln!(
                    "uploaded; vector store {}",
                    upload.ids.vector_store_id.as_deref().unwrap_or("(none)")
                );
            }
            if let Some(reply) = outcome.reply {
                println!("{}", reply.reply);
            }
            info!("One-shot finished, ids {:?}", client.ids());
            Ok(())
        }
        Err(e) => {
            warn!("One-shot failed: {e}");
            Err(io::Error::other(e.to_string()))
        }
    }
}
