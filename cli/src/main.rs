//! zvote — command line client for the election session workflows.

mod dialog;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use zvote_gateway::HttpBackend;
use zvote_session::{
    init_logging, validate_key, validate_url, ElectionSession, Screen, ScreenGate, SessionConfig,
    SessionEvent, SyncOutcome,
};
use zvote_types::{KeyMaterial, SubmissionKind, SubmissionResult, SyncHeight, VoteRequest};

use crate::dialog::PresetDialog;

#[derive(Parser)]
#[command(name = "zvote", about = "Coin-weighted voting client")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ZVOTE_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the wallet backend.
    #[arg(long, env = "ZVOTE_BACKEND_URL")]
    backend_url: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ZVOTE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ZVOTE_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Load an election from its URL and register it with your key.
    New {
        #[arg(long)]
        url: String,
        /// Seed phrase or unified viewing key.
        #[arg(long, env = "ZVOTE_KEY", hide_env_values = true)]
        key: String,
        /// Save the election database here. Omit to skip saving.
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Open a saved election database.
    Open {
        #[arg(long)]
        db: PathBuf,
    },
    /// Sync and show the election overview.
    Overview,
    /// Download the election's reference data. Ctrl-C stops waiting.
    Download,
    /// Vote for a candidate.
    Vote {
        #[arg(long)]
        address: String,
        #[arg(long)]
        amount: String,
    },
    /// Delegate voting power to another address.
    Delegate {
        #[arg(long)]
        address: String,
        #[arg(long)]
        amount: String,
    },
    /// Show this wallet's own vote address.
    Address,
    /// List past votes and delegations.
    History,
    /// Check a seed phrase or viewing key.
    ValidateKey {
        #[arg(long, env = "ZVOTE_KEY", hide_env_values = true)]
        key: String,
    },
    /// Check that an election URL can be fetched.
    ValidateUrl {
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (file_config, config_error) = match cli.config {
        Some(ref path) => match SessionConfig::from_toml_file(path) {
            Ok(cfg) => (Some(cfg), None),
            Err(e) => (None, Some(e)),
        },
        None => (None, None),
    };
    let base = file_config.clone().unwrap_or_default();
    let config = SessionConfig {
        backend_url: cli.backend_url.clone().unwrap_or(base.backend_url.clone()),
        log_level: cli.log_level.clone().unwrap_or(base.log_level.clone()),
        log_format: cli.log_format.clone().unwrap_or(base.log_format.clone()),
        ..base
    };

    init_logging(config.log_format()?, &config.log_level)?;
    if let (Some(path), Some(_)) = (&cli.config, &file_config) {
        tracing::info!("Loaded config from {}", path.display());
    }
    if let Some(e) = config_error {
        tracing::warn!("Failed to load config file: {e}, using defaults");
    }

    let backend = Arc::new(
        HttpBackend::new(
            config.backend_url.clone(),
            config.request_timeout(),
            config.connect_timeout(),
        )
        .context("failed to create backend client")?,
    );
    tracing::debug!(backend = %config.backend_url, "using wallet backend");

    let db = match &cli.command {
        Command::New { db, .. } => db.clone(),
        Command::Open { db } => Some(db.clone()),
        _ => None,
    };
    let session = ElectionSession::new(backend.clone(), Arc::new(PresetDialog::new(db)), &config);

    match cli.command {
        Command::New { url, key, .. } => {
            let key = KeyMaterial::new(key);
            validate_key(backend.as_ref(), &key).await?;
            let outcome = session.setup().load_election_from_url(&url, &key).await?;
            println!("Registered election {} ({})", outcome.election.name, outcome.election.id);
            match outcome.file {
                Some(path) => println!("Saved to {}", path.display()),
                None => println!("Not saved"),
            }
        }
        Command::Open { .. } => {
            let Some(outcome) = session.setup().open_election().await? else {
                anyhow::bail!("no election database selected");
            };
            println!("Opened election {} ({})", outcome.election.name, outcome.election.id);
        }
        Command::Overview => {
            session.setup().restore().await?;
            require_election(session.mount_overview().await)?;
            print_overview(&session);
        }
        Command::Download => {
            session.setup().restore().await?;
            require_election(session.gate(Screen::Overview))?;
            download(&session).await?;
            print_overview(&session);
        }
        Command::Vote { address, amount } => {
            submit(&session, SubmissionKind::Vote, &address, &amount).await?;
        }
        Command::Delegate { address, amount } => {
            submit(&session, SubmissionKind::Delegate, &address, &amount).await?;
        }
        Command::Address => {
            session.setup().restore().await?;
            require_election(session.gate(Screen::Delegate))?;
            match session.mount_delegate().await {
                Some(address) => println!("{address}"),
                None => anyhow::bail!("wallet address unavailable"),
            }
        }
        Command::History => {
            session.setup().restore().await?;
            let rows = session.history().load().await?;
            if rows.is_empty() {
                println!("No votes yet");
            }
            for row in rows {
                println!(
                    "{:>4}  {}  {}  {}  {}",
                    row.id,
                    row.hash,
                    row.address,
                    row.choice.as_deref().unwrap_or("-"),
                    row.display_amount()
                );
            }
        }
        Command::ValidateKey { key } => {
            validate_key(backend.as_ref(), &KeyMaterial::new(key)).await?;
            println!("Key OK");
        }
        Command::ValidateUrl { url } => {
            validate_url(backend.as_ref(), &url).await?;
            println!("URL OK");
        }
    }

    Ok(())
}

fn require_election(gate: ScreenGate) -> anyhow::Result<()> {
    match gate {
        ScreenGate::Ready(_) => Ok(()),
        ScreenGate::NoElection => anyhow::bail!("no election set, run `zvote new` or `zvote open` first"),
    }
}

fn print_overview(session: &ElectionSession) {
    let overview = session.overview();
    println!("Election: {} ({})", overview.election.name, overview.election.id);
    if !overview.election.question.is_empty() {
        println!("Question: {}", overview.election.question);
    }
    println!(
        "Window:   {} - {}",
        overview.election.start_height, overview.election.end_height
    );
    match overview.progress {
        Some(progress) => println!("Height:   {} ({:.1}%)", overview.height, progress.pct),
        None => println!("Height:   {}", overview.height),
    }
    match overview.balance {
        Some(balance) => println!("Balance:  {balance}"),
        None => println!("Balance:  unknown"),
    }
    if let Some(root) = overview.roots.nf_root {
        println!("nf root:  {}", root.to_hex());
    }
    if let Some(root) = overview.roots.cmx_root {
        println!("cmx root: {}", root.to_hex());
    }
    if overview.needs_download {
        println!("Reference data not downloaded, run `zvote download`");
    }
}

async fn download(session: &ElectionSession) -> anyhow::Result<()> {
    let election = session.store().election();
    session.store().events().subscribe(Box::new(move |event| {
        if let SessionEvent::HeightChanged(height @ SyncHeight::At(h)) = event {
            match election.progress_pct(*height) {
                Some(pct) => tracing::info!(height = *h, "downloaded to height {h} ({pct:.1}%)"),
                None => tracing::info!(height = *h, "downloaded to height {h}"),
            }
        }
    }));

    let mut running = tokio::spawn({
        let sync = session.sync().clone();
        async move { sync.download().await }
    });
    let outcome = tokio::select! {
        joined = &mut running => joined?,
        _ = tokio::signal::ctrl_c() => {
            session.sync().cancel();
            running.await?
        }
    }?;

    match outcome {
        SyncOutcome::Completed => println!("Download complete"),
        SyncOutcome::Cancelled => println!("Stopped waiting; the backend may still be downloading"),
        SyncOutcome::AlreadyRunning => println!("A sync is already running"),
        SyncOutcome::Synced | SyncOutcome::Unsynced => {}
    }
    Ok(())
}

async fn submit(
    session: &ElectionSession,
    kind: SubmissionKind,
    address: &str,
    amount: &str,
) -> anyhow::Result<()> {
    session.setup().restore().await?;
    require_election(session.gate(Screen::Vote))?;
    let request = VoteRequest::parse(address, amount)?;
    let prepared = session.submissions().prepare(kind, &request)?;
    tracing::debug!(amount = prepared.amount().subunits(), "amount in subunits");

    // The process exits right after, so the balance refresh runs in the foreground.
    match session.submissions().submit_and_refresh(&prepared).await? {
        SubmissionResult::Success { receipt } => {
            println!("{kind} submitted: {receipt}");
            if let Some(balance) = session.store().balance() {
                println!("Balance:  {balance}");
            }
            Ok(())
        }
        SubmissionResult::Failure { reason } => anyhow::bail!("{kind} failed: {reason}"),
    }
}
