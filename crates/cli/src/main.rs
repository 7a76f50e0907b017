//! Terminal front end for the Verae screening client.
//!
//! Drives every client operation end to end: account registration and
//! login, panel validation and submission, polling a running analysis,
//! and fetching the final risk assessment. The bearer token and the
//! last-submitted analysis id persist in a session file between
//! invocations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use verae_client::api::VeraeApi;
use verae_client::config::ClientConfig;
use verae_client::models::Credentials;
use verae_client::poll::{watch_analysis, WatchOutcome};
use verae_client::session::SessionStore;
use verae_core::panel::{self, LabValues};
use verae_core::status::AnalysisStatus;

mod render;
mod session_file;

#[derive(Parser, Debug)]
#[command(
    name = "verae",
    version,
    about = "Client for the Verae health-risk screening service"
)]
struct Cli {
    /// Base URL of the analysis service (overrides VERAE_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account and start a session
    Register(AuthArgs),
    /// Log in to an existing account
    Login(AuthArgs),
    /// Drop the stored session
    Logout,
    /// List the panel fields and their requirement class
    Fields,
    /// Validate a panel file without submitting it
    Check(PanelArgs),
    /// Submit a lab panel for analysis
    Submit(SubmitArgs),
    /// Show the current status of an analysis
    Status(IdArg),
    /// Poll an analysis until it finishes, then print the result
    Watch(IdArg),
    /// Fetch the result of a completed analysis
    Result(IdArg),
    /// List submitted analyses
    List,
}

#[derive(Args, Debug)]
struct AuthArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(Args, Debug)]
struct PanelArgs {
    /// Path to a JSON file of {"FIELD": number} pairs
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[command(flatten)]
    panel: PanelArgs,

    /// Follow the analysis after submitting
    #[arg(long)]
    watch: bool,
}

#[derive(Args, Debug)]
struct IdArg {
    /// Analysis id (defaults to the last submitted analysis)
    id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verae=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let session_path = session_file::default_path();
    let session = SessionStore::with_state(session_file::load(&session_path)?);
    let config = cli
        .api_url
        .map(ClientConfig::new)
        .unwrap_or_else(ClientConfig::from_env);
    let api = VeraeApi::new(&config, session);

    let outcome = run(cli.command, &api, &config).await;

    // Persist even on failure: a cleared token after a 401 must stick.
    if let Err(e) = session_file::save(&session_path, &api.session().snapshot()) {
        tracing::warn!(error = %e, "Failed to persist session");
    }
    outcome
}

async fn run(command: Commands, api: &VeraeApi, config: &ClientConfig) -> Result<()> {
    match command {
        Commands::Register(args) => {
            let auth = api
                .register(&Credentials::new(&args.email, &args.password))
                .await?;
            let email = auth.user.map(|user| user.email).unwrap_or(args.email);
            println!("Registered and logged in as {email}");
        }

        Commands::Login(args) => {
            let auth = api
                .login(&Credentials::new(&args.email, &args.password))
                .await?;
            let email = auth.user.map(|user| user.email).unwrap_or(args.email);
            println!("Logged in as {email}");
        }

        Commands::Logout => {
            api.session().clear();
            println!("Logged out.");
        }

        Commands::Fields => {
            for name in panel::REQUIRED_BASE {
                println!("{name:<10} required");
            }
            println!(
                "{:<10} alternative (or {})",
                panel::BMI_COMPOSITE,
                panel::BMI_COMPONENTS.join("+")
            );
            for name in panel::BMI_COMPONENTS {
                println!("{name:<10} alternative");
            }
            for name in panel::RECOMMENDED {
                println!("{name:<10} recommended");
            }
        }

        Commands::Check(args) => {
            let values = load_panel(&args.file)?;
            let missing = panel::missing_required(&values);
            println!(
                "Progress: {}/{}",
                panel::progress(&values),
                panel::PROGRESS_TARGET
            );
            if missing.is_empty() {
                println!("Panel is complete.");
            } else {
                println!("Missing: {}", missing.join(", "));
            }
        }

        Commands::Submit(args) => {
            let values = load_panel(&args.panel.file)?;
            let snapshot = api.submit_panel(&values).await?;
            println!("Submitted analysis {}", snapshot.analysis_id);
            render::print_snapshot(&snapshot);
            if args.watch {
                watch_and_report(api, config, &snapshot.analysis_id).await?;
            } else {
                println!("Run `verae watch` to follow it.");
            }
        }

        Commands::Status(args) => {
            let (id, from_session) = resolve_id(args.id, api)?;
            match api.analysis_status(&id).await? {
                Some(snapshot) => render::print_snapshot(&snapshot),
                None => {
                    if from_session {
                        api.session().clear_last_analysis_id();
                    }
                    bail!("Analysis {id} not found.");
                }
            }
        }

        Commands::Watch(args) => {
            let (id, _) = resolve_id(args.id, api)?;
            watch_and_report(api, config, &id).await?;
        }

        Commands::Result(args) => {
            let (id, from_session) = resolve_id(args.id, api)?;
            match api.analysis_status(&id).await? {
                None => {
                    if from_session {
                        api.session().clear_last_analysis_id();
                    }
                    bail!("Analysis {id} not found.");
                }
                Some(snapshot) => match snapshot.status {
                    AnalysisStatus::Completed => {}
                    AnalysisStatus::Failed => {
                        bail!("Processing ended in failure. Submit a new analysis.")
                    }
                    AnalysisStatus::Pending | AnalysisStatus::Processing => {
                        bail!("Result not ready yet. Try `verae watch {id}`.")
                    }
                },
            }
            match api.analysis_result(&id).await? {
                Some(result) => render::print_result(&result),
                None => bail!("Could not load the result. Try again shortly."),
            }
        }

        Commands::List => {
            let items = api.list_analyses().await?;
            render::print_list(&items);
        }
    }
    Ok(())
}

/// Poll an analysis until it reaches a terminal outcome, printing each
/// accepted status line. Ctrl-C cancels the watch cleanly.
async fn watch_and_report(api: &VeraeApi, config: &ClientConfig, analysis_id: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let outcome = watch_analysis(
        api,
        analysis_id,
        &config.poll,
        &cancel,
        render::print_snapshot,
    )
    .await;

    match outcome {
        WatchOutcome::Completed {
            result: Some(result),
        } => {
            println!("Analysis completed.");
            render::print_result(&result);
        }
        WatchOutcome::Completed { result: None } => {
            println!("Analysis completed, but the result is not available yet.");
            println!("Run `verae result {analysis_id}` to fetch it.");
        }
        WatchOutcome::Failed => bail!("Processing ended in failure. Submit a new analysis."),
        WatchOutcome::NotFound => bail!("Analysis {analysis_id} not found."),
        WatchOutcome::TimedOut => {
            bail!("Still processing after {}s. Try `verae watch {analysis_id}` again later.",
                config.poll.deadline.as_secs())
        }
        WatchOutcome::Unauthorized => bail!("Session expired. Log in again."),
        WatchOutcome::Cancelled => println!("Watch cancelled."),
    }
    Ok(())
}

/// Use the explicit id when given, otherwise fall back to the session's
/// last submitted analysis. The flag reports which one happened so
/// callers can clear a stale session id on 404.
fn resolve_id(arg: Option<String>, api: &VeraeApi) -> Result<(String, bool)> {
    if let Some(id) = arg {
        return Ok((id, false));
    }
    match api.session().last_analysis_id() {
        Some(id) => Ok((id, true)),
        None => bail!("No analysis id given and no previous submission in this session."),
    }
}

/// Read a panel file: a flat JSON object of field code to number.
fn load_panel(path: &Path) -> Result<LabValues> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read panel file {}", path.display()))?;
    let values: LabValues = serde_json::from_str(&content)
        .with_context(|| format!("parse panel file {}", path.display()))?;
    Ok(values)
}
