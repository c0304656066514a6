//! `vaultmount` CLI — manage one Vault secret-backend mount declaratively.
//!
//! Reads a `vault_secret_backend` resource from a JSON file, compares it
//! with the recorded state, and mounts, tunes, replaces, or unmounts the
//! backend to match. State is kept in a local JSON file.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod state_file;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vaultmount_core::client::VaultClient;
use vaultmount_core::config::ClientConfig;
use vaultmount_core::plan::{Action, Plan, plan};
use vaultmount_core::resource::SecretBackend;
use vaultmount_core::schema::SecretBackendConfig;
use vaultmount_core::state::ResourceData;

use crate::state_file::StateFile;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// vaultmount — declarative Vault secret-backend mounts.
#[derive(Parser)]
#[command(
    name = "vaultmount",
    version,
    about = "vaultmount CLI — plan, apply, import and destroy a Vault secret-backend mount",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         VAULT_ADDR             Server address (default: http://127.0.0.1:8200)\n  \
         VAULT_TOKEN            Authentication token\n  \
         VAULT_NAMESPACE        Enterprise namespace\n  \
         VAULT_CLIENT_TIMEOUT   Request timeout in seconds (default: 60)\n  \
         VAULTMOUNT_LOG_LEVEL   Log filter when RUST_LOG is unset (default: warn)\n\n\
         {DIM}Examples:{RESET}\n  \
         vaultmount plan --config ssh.json\n  \
         vaultmount apply --config ssh.json\n  \
         vaultmount import ssh-test\n  \
         vaultmount destroy"
    ),
)]
struct Cli {
    /// Vault server address.
    #[arg(long, env = "VAULT_ADDR", default_value = "http://127.0.0.1:8200")]
    addr: String,

    /// Authentication token.
    #[arg(long, env = "VAULT_TOKEN")]
    token: Option<String>,

    /// Enterprise namespace.
    #[arg(long, env = "VAULT_NAMESPACE")]
    namespace: Option<String>,

    /// State file path.
    #[arg(long, default_value = "vaultmount.state.json")]
    state: PathBuf,

    /// Emit logs as JSON.
    #[arg(long, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what apply would do.
    Plan {
        /// Resource configuration (JSON).
        #[arg(long)]
        config: PathBuf,
    },
    /// Refresh, plan, and make Vault match the configuration.
    Apply {
        /// Resource configuration (JSON).
        #[arg(long)]
        config: PathBuf,
    },
    /// Re-read the recorded mount from Vault.
    Refresh,
    /// Unmount the recorded backend and forget it.
    Destroy,
    /// Start managing an existing mount.
    Import {
        /// Mount path (e.g., "ssh-test").
        path: String,
    },
    /// Print the recorded state as JSON.
    Show,
    /// Exit 0 if the recorded mount exists, 1 if not, 2 on error.
    Exists,
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<28}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn print_resource(data: &ResourceData) {
    header("🔐", "vault_secret_backend");
    kv_line("id", &data.id);
    kv_line("path", &data.path);
    kv_line("type", &data.engine_type);
    kv_line("description", &data.description);
    kv_line(
        "default_lease_ttl_seconds",
        &data.default_lease_ttl_seconds.to_string(),
    );
    kv_line("max_lease_ttl_seconds", &data.max_lease_ttl_seconds.to_string());
    println!();
}

fn print_plan(p: &Plan) {
    header("📋", &format!("Plan: {}", p.action));
    for c in &p.changes {
        let marker = if c.forces_replacement {
            format!(" {RED}(forces replacement){RESET}")
        } else {
            String::new()
        };
        kv_line(c.attribute, &format!("{:?} → {:?}{marker}", c.old, c.new));
    }
    if p.changes.is_empty() {
        println!("  {DIM}no changes{RESET}");
    }
    println!();
}

// ── Setup ────────────────────────────────────────────────────────────

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(std::env::var("VAULTMOUNT_LOG_LEVEL").unwrap_or_else(|_| "warn".to_owned()))
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

struct App {
    client_config: ClientConfig,
    state_path: PathBuf,
}

impl App {
    fn backend(&self) -> Result<SecretBackend<VaultClient>> {
        let client = VaultClient::new(&self.client_config).context("failed to build Vault client")?;
        Ok(SecretBackend::new(client))
    }
}

async fn load_config(path: &Path) -> Result<SecretBackendConfig> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: SecretBackendConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Re-read the recorded resource. Returns `None` if nothing is recorded or
/// the mount is gone.
async fn refreshed(
    backend: &SecretBackend<VaultClient>,
    state: &StateFile,
) -> Result<Option<ResourceData>> {
    let Some(recorded) = state.current() else {
        return Ok(None);
    };
    let mut data = recorded.clone();
    backend.read(&mut data).await?;
    if !data.is_present() {
        warning(&format!(
            "mount {:?} no longer exists in Vault, it will be recreated",
            recorded.id
        ));
        return Ok(None);
    }
    Ok(Some(data))
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut client_config = ClientConfig::from_env();
    client_config.addr = cli.addr;
    client_config.token = cli.token.unwrap_or_default();
    client_config.namespace = cli.namespace.filter(|ns| !ns.is_empty());

    let app = App {
        client_config,
        state_path: cli.state,
    };

    match run(&app, cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(app: &App, cmd: Commands) -> Result<ExitCode> {
    match cmd {
        Commands::Plan { config } => cmd_plan(app, &config).await?,
        Commands::Apply { config } => cmd_apply(app, &config).await?,
        Commands::Refresh => cmd_refresh(app).await?,
        Commands::Destroy => cmd_destroy(app).await?,
        Commands::Import { path } => cmd_import(app, &path).await?,
        Commands::Show => cmd_show(app).await?,
        Commands::Exists => return Ok(cmd_exists(app).await),
    }
    Ok(ExitCode::SUCCESS)
}

// ── Commands ─────────────────────────────────────────────────────────

async fn cmd_plan(app: &App, config_path: &Path) -> Result<()> {
    let config = load_config(config_path).await?;
    let backend = app.backend()?;
    let state = state_file::load(&app.state_path).await?;

    let current = refreshed(&backend, &state).await?;
    print_plan(&plan(current.as_ref(), &config));
    Ok(())
}

async fn cmd_apply(app: &App, config_path: &Path) -> Result<()> {
    let config = load_config(config_path).await?;
    let backend = app.backend()?;
    let state = state_file::load(&app.state_path).await?;

    let current = refreshed(&backend, &state).await?;
    let p = plan(current.as_ref(), &config);
    print_plan(&p);

    let result = match (p.action, current) {
        (Action::NoOp, current) => current,
        (Action::Update, Some(mut data)) => {
            backend.update(&mut data, &config).await?;
            Some(data)
        }
        (Action::Replace, Some(data)) => {
            info!(
                path = %data.id,
                reasons = ?p.replacement_reasons().collect::<Vec<_>>(),
                "replacing secret backend"
            );
            backend.delete(&data).await?;
            state_file::save(&app.state_path, &StateFile::new(None)).await?;
            Some(backend.create(&config).await?)
        }
        (Action::Create | Action::Update | Action::Replace, _) => {
            Some(backend.create(&config).await?)
        }
    };

    state_file::save(&app.state_path, &StateFile::new(result.clone())).await?;
    match result.filter(ResourceData::is_present) {
        Some(data) => {
            success(&format!("{} complete", p.action));
            print_resource(&data);
        }
        None => warning("mount disappeared right after apply; state cleared"),
    }
    Ok(())
}

async fn cmd_refresh(app: &App) -> Result<()> {
    let backend = app.backend()?;
    let state = state_file::load(&app.state_path).await?;
    if state.current().is_none() {
        warning("nothing recorded in state");
        return Ok(());
    }

    let current = refreshed(&backend, &state).await?;
    state_file::save(&app.state_path, &StateFile::new(current.clone())).await?;
    if let Some(data) = current {
        success("state refreshed");
        print_resource(&data);
    }
    Ok(())
}

async fn cmd_destroy(app: &App) -> Result<()> {
    let state = state_file::load(&app.state_path).await?;
    let Some(data) = state.current() else {
        warning("nothing recorded in state");
        return Ok(());
    };

    let backend = app.backend()?;
    backend.delete(data).await?;
    state_file::remove(&app.state_path).await?;
    success(&format!("unmounted {:?}", data.id));
    Ok(())
}

async fn cmd_import(app: &App, path: &str) -> Result<()> {
    let state = state_file::load(&app.state_path).await?;
    if let Some(existing) = state.current() {
        bail!(
            "state already manages mount {:?}; destroy it or use another --state file",
            existing.id
        );
    }

    let backend = app.backend()?;
    let data = backend.import(path).await?;
    state_file::save(&app.state_path, &StateFile::new(Some(data.clone()))).await?;
    success(&format!("imported {:?}", data.id));
    print_resource(&data);
    Ok(())
}

async fn cmd_show(app: &App) -> Result<()> {
    let state = state_file::load(&app.state_path).await?;
    let rendered = serde_json::to_string_pretty(&state).context("failed to render state")?;
    println!("{rendered}");
    Ok(())
}

async fn cmd_exists(app: &App) -> ExitCode {
    let outcome = async {
        let state = state_file::load(&app.state_path).await?;
        let Some(data) = state.current() else {
            return Ok(None);
        };
        let backend = app.backend()?;
        Ok::<_, anyhow::Error>(Some(backend.exists(data).await))
    }
    .await;

    match outcome {
        Ok(Some(o)) => match o.error {
            Some(e) => {
                eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e}");
                ExitCode::from(2)
            }
            None if o.exists => {
                success("mount exists");
                ExitCode::SUCCESS
            }
            None => {
                warning("mount does not exist");
                ExitCode::from(1)
            }
        },
        Ok(None) => {
            warning("nothing recorded in state");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            ExitCode::from(2)
        }
    }
}
