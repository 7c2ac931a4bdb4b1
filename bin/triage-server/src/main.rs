//! triage-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables and CLI flags.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Open the SQLite database and run pending migrations.
//! 4. Seed the admin account and the demo analysis-case library.
//! 5. Build shared application state.
//! 6. Build the Axum router and start the HTTP server with graceful shutdown.

mod auth;
mod config;
mod entities;
mod error;
mod middleware;
mod relay;
mod routes;
mod schemas;
mod state;
#[cfg(test)]
mod test_support;
mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{TokenKeys, hash_password};
use crate::config::{Cli, Config};
use crate::entities::{CaseRecord, CaseStore, SqliteStore, UserRecord, UserStore};
use crate::state::{AppState, CollectSessions};
use crate::upstream::GraphClient;
use triage_collect::Dataset;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::load(Cli::parse());

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: TRIAGE_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "triage-server starting");

    // ── 3. Database ────────────────────────────────────────────────────────────
    let store = SqliteStore::connect(&cfg.database_url).await?;
    info!(database_url = %cfg.database_url, "database ready");

    // ── 4. Seed data ───────────────────────────────────────────────────────────
    ensure_admin_account(&store, &cfg).await?;
    seed_demo_cases(&store).await?;

    // ── 5. Shared application state ────────────────────────────────────────────
    let state = Arc::new(AppState {
        keys: TokenKeys::new(&cfg.auth_secret, cfg.token_ttl_hours),
        graph: GraphClient::new(&cfg.backend_url),
        store: Arc::new(store),
        collect: Arc::new(CollectSessions::new()),
        dataset: Arc::new(Dataset::builtin()),
        config: Arc::new(cfg),
    });

    // ── 6. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = state.config.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("triage-server stopped");
    Ok(())
}

/// Creates the configured admin account on first startup.  An existing row
/// under the same email is left untouched, so password rotation happens
/// through the admin API rather than restarts.
async fn ensure_admin_account(store: &SqliteStore, cfg: &Config) -> anyhow::Result<()> {
    if store.get_user_by_email(&cfg.admin_email).await?.is_some() {
        return Ok(());
    }
    let now = Utc::now();
    store
        .create_user(UserRecord {
            id: Uuid::new_v4().to_string(),
            email: cfg.admin_email.clone(),
            name: Some("Administrator".to_owned()),
            password_hash: hash_password(&cfg.admin_password)?,
            role: "ADMIN".to_owned(),
            is_active: true,
            group_id: None,
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(email = %cfg.admin_email, "admin account created");
    Ok(())
}

/// Loads a small library of closed analysis cases into an empty database so
/// the similar-case lookup has something to return out of the box.
async fn seed_demo_cases(store: &SqliteStore) -> anyhow::Result<()> {
    if store.count_cases().await? > 0 {
        return Ok(());
    }

    let now = Utc::now();
    let cases = [
        CaseRecord {
            id: Uuid::new_v4().to_string(),
            customer: "Apple".to_owned(),
            product_model: "OLED_67_FHD".to_owned(),
            lot_id: Some("LOT20241118002".to_owned()),
            cell_id: Some("CELL-1118-0330".to_owned()),
            defect_type: "Mura".to_owned(),
            defect_description: "Faint horizontal band mura across the center of the panel, \
                                 visible at 20% gray."
                .to_owned(),
            root_cause: Some("TFE thickness drift on coater 02".to_owned()),
            analysis_result: Some(
                "Interference fringes in the encapsulation layer correlate with a 4% \
                 thickness deviation logged on coater 02 during the affected shift."
                    .to_owned(),
            ),
            corrective_action: Some("Coater 02 nozzle replaced, CpK re-qualified".to_owned()),
            tags: r#"["mura","encapsulation","coater"]"#.to_owned(),
            reported_at: now - Duration::days(45),
            created_at: now,
        },
        CaseRecord {
            id: Uuid::new_v4().to_string(),
            customer: "Dell".to_owned(),
            product_model: "AMOLED_55_4K".to_owned(),
            lot_id: Some("LOT20241030005".to_owned()),
            cell_id: None,
            defect_type: "Bright Dot".to_owned(),
            defect_description: "Single always-on sub-pixel found at customer incoming \
                                 inspection; escaped final lighting test."
                .to_owned(),
            root_cause: Some("Particle contamination during OLED deposition".to_owned()),
            analysis_result: Some(
                "SEM cross-section shows a 3um particle under the emission layer shorting \
                 the sub-pixel. Chamber particle counts exceeded control limits two days \
                 before the lot started."
                    .to_owned(),
            ),
            corrective_action: Some("Chamber cleaned and filters replaced; lighting test \
                                     sensitivity tightened one grade"
                .to_owned()),
            tags: r#"["bright-dot","particle","deposition"]"#.to_owned(),
            reported_at: now - Duration::days(80),
            created_at: now,
        },
        CaseRecord {
            id: Uuid::new_v4().to_string(),
            customer: "Sony".to_owned(),
            product_model: "OLED_77_8K".to_owned(),
            lot_id: None,
            cell_id: None,
            defect_type: "Line Defect".to_owned(),
            defect_description: "Intermittent vertical line at the left edge appearing after \
                                 thermal cycling."
                .to_owned(),
            root_cause: Some("Driver IC bonding degradation".to_owned()),
            analysis_result: Some(
                "Failure reproduced at 60C; resistance across the COF bond rises out of \
                 spec. Supplier lot of the driver IC shows the same signature."
                    .to_owned(),
            ),
            corrective_action: Some("Driver IC supplier quality clamp-down; bonding \
                                     pressure profile updated"
                .to_owned()),
            tags: r#"["line-defect","driver-ic","bonding"]"#.to_owned(),
            reported_at: now - Duration::days(120),
            created_at: now,
        },
    ];

    let count = cases.len();
    for case in cases {
        store.insert_case(case).await?;
    }
    info!(count, "demo analysis cases seeded");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
