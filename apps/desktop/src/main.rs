use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use client_core::{RestBackend, Workspace};
use shared::domain::{Role, ViewName};
use storage::LocalStore;

#[derive(Parser)]
#[command(name = "idyll-desktop", about = "Production workspace client")]
struct Args {
    /// Base URL of the workspace backend
    #[arg(long, env = "WORKSPACE_URL")]
    base_url: String,

    /// Public API key for the workspace backend
    #[arg(long, env = "WORKSPACE_API_KEY")]
    api_key: String,

    /// Email or username to sign in with
    #[arg(long)]
    identifier: Option<String>,

    /// Password for the account
    #[arg(long, env = "WORKSPACE_PASSWORD")]
    password: Option<String>,

    /// Browse as a guest editor instead of signing in
    #[arg(long)]
    guest: bool,

    /// Sign in through the manager portal
    #[arg(long)]
    manager: bool,

    /// Where device-local preferences are stored
    #[arg(long, default_value = "idyll-prefs.json")]
    prefs_file: PathBuf,

    /// Seconds between notification polls
    #[arg(long, default_value_t = 30)]
    poll_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let backend = Arc::new(RestBackend::new(args.base_url, args.api_key));
    let store = Arc::new(LocalStore::open(&args.prefs_file)?);
    let workspace = Workspace::new(backend, store);

    if args.guest {
        workspace.sign_in_as_guest(Role::Editor).await;
    } else {
        let (Some(identifier), Some(password)) = (&args.identifier, &args.password) else {
            bail!("pass --identifier and --password, or --guest");
        };
        if args.manager {
            workspace
                .sign_in_for(identifier, password, Role::Manager)
                .await?;
        } else {
            workspace.sign_in(identifier, password).await?;
        }
    }

    workspace.enter_view(ViewName::Home).await;
    workspace.start_notification_refresh(Duration::from_secs(args.poll_secs));

    let identity = workspace.session.identity().await;
    let tokens = workspace.style_tokens();
    println!("signed in as: {identity:?}");
    println!(
        "view: {:?} ({})",
        workspace.router.current(),
        workspace.router.current().title()
    );
    println!(
        "theme: {} / accent {} on {}",
        tokens.theme.as_str(),
        tokens.accent,
        tokens.base
    );
    println!("unread notifications: {}", workspace.notifications.unread_count());

    match workspace.fetch_dashboard().await {
        Ok(dashboard) => {
            let tasks = dashboard.task_summary();
            let payouts = dashboard.payout_summary();
            println!(
                "tasks: {} total ({} done, {} in edit)",
                tasks.total, tasks.done, tasks.editing
            );
            println!("meetings scheduled: {}", dashboard.meetings.len());
            println!(
                "payouts: {} pending (${:.2})",
                payouts.pending,
                payouts.pending_cents as f64 / 100.0
            );
        }
        Err(err) => tracing::warn!(error = %err, "dashboard fetch failed"),
    }

    workspace.stop_notification_refresh();
    Ok(())
}
