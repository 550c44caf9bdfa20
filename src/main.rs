use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

use mailsession::config::Config;
use mailsession::export;
use mailsession::{ComposeRequest, DateBound, MailSession, SnapshotStore};

#[derive(Parser)]
#[command(name = "mailsession")]
#[command(about = "Read, filter and send mail through a desktop mail client session")]
#[command(version = "0.1.0")]
struct Args {
    /// Mailbox snapshot to use instead of MAIL_SNAPSHOT_PATH
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List configured accounts
    Accounts,

    /// Print the items of a folder, optionally filtered by received date
    Read {
        /// Account owning the folder (default: first account)
        #[arg(short, long)]
        account: Option<String>,

        /// Folder path like "Inbox > Planning"
        #[arg(short, long)]
        folder: Option<String>,

        /// Received on or after this date (DD/MM/YYYY or DD-MM-YYYY)
        #[arg(long)]
        start: Option<String>,

        /// Received on or before this date (DD/MM/YYYY or DD-MM-YYYY)
        #[arg(long)]
        end: Option<String>,

        /// Stop after this many items
        #[arg(short = 'l', long)]
        limit: Option<usize>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Compose a message from a JSON request file
    Send {
        #[arg(short, long)]
        request: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    // --snapshot stands in for MAIL_SNAPSHOT_PATH
    let config = match &args.snapshot {
        Some(path) => Config::from_lookup(|name: &str| match name {
            "MAIL_SNAPSHOT_PATH" => Some(path.display().to_string()),
            other => std::env::var(other).ok(),
        })?,
        None => Config::new()?,
    };

    let store = SnapshotStore::load(Path::new(&config.snapshot_path))
        .with_context(|| format!("Unable to load snapshot {}", config.snapshot_path))?;
    let session = MailSession::with_config(&store, config.session.clone());

    let result = match args.command {
        Command::Accounts => list_accounts(&session),
        Command::Read {
            account,
            folder,
            start,
            end,
            limit,
            format,
        } => read_items(
            &session,
            account.as_deref(),
            folder.as_deref(),
            start,
            end,
            limit,
            format,
        ),
        Command::Send { request } => send_message(&session, &store, &request, &config.outbox_dir),
    };

    if let Err(e) = &result {
        error!("❌ {:#}", e);
    }

    result
}

fn list_accounts(session: &MailSession<SnapshotStore>) -> Result<()> {
    let accounts = session.list_accounts()?;

    println!("{:<30} {:<40}", "Name", "Email");
    println!("{}", "=".repeat(70));
    for account in accounts {
        println!("{:<30} {:<40}", account.name, account.email);
    }

    Ok(())
}

fn read_items(
    session: &MailSession<SnapshotStore>,
    account: Option<&str>,
    folder: Option<&str>,
    start: Option<String>,
    end: Option<String>,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let mut items = session.resolve_items(account, folder)?;

    if start.is_some() || end.is_some() {
        items = session.filter_by_date(
            &items,
            start.map(DateBound::from),
            end.map(DateBound::from),
        )?;
    }

    let records = session
        .project_items(items)
        .take(limit.unwrap_or(usize::MAX))
        .collect::<mailsession::Result<Vec<_>>>()?;

    info!("✅ {} item(s) read", records.len());

    let stdout = io::stdout();
    match format {
        OutputFormat::Json => export::write_json(&records, stdout.lock()),
        OutputFormat::Csv => export::write_csv(&records, stdout.lock()),
    }
}

fn send_message(
    session: &MailSession<SnapshotStore>,
    store: &SnapshotStore,
    request_path: &Path,
    outbox_dir: &str,
) -> Result<()> {
    let json = fs::read_to_string(request_path)
        .with_context(|| format!("Unable to read {}", request_path.display()))?;
    let request: ComposeRequest =
        serde_json::from_str(&json).context("Invalid compose request")?;

    let message = request.into_message()?;
    session.compose(&message)?;

    let written = store.write_outbox(Path::new(outbox_dir))?;
    for path in &written {
        println!("📤 {}", path.display());
    }

    Ok(())
}
