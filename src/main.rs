use campus_desk::config::Config;
use campus_desk::db::StudentStorage;
use campus_desk::heap::CountingMiMalloc;
use campus_desk::router::{DeskState, cookie_key, desk_router};
use campus_desk::service::credential_checker::CredentialChecker;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: CountingMiMalloc = CountingMiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        db_host = %cfg.db_host_name,
        db_port = cfg.db_port,
        db_name = %cfg.db_name,
        db_owner = %cfg.db_owner_name,
        users_file = %cfg.users_file.display(),
        loglevel = %cfg.loglevel,
        admin_configured = !cfg.admin_login.is_empty()
    );

    let students = StudentStorage::connect_lazy(cfg.pg_connect_options(), cfg.acquire_timeout());
    match students.create_schema().await {
        Ok(()) => info!("student schema ready"),
        Err(e) => warn!(error = %e, "could not prepare student schema; continuing"),
    }

    let vault = campus_desk::service::vault_actor::spawn().await?;
    let checker = CredentialChecker::new(
        cfg.admin_login.clone(),
        cfg.admin_password.clone(),
        cfg.users_file.clone(),
    );

    let state = DeskState::new(students, checker, vault, cookie_key(&cfg));
    let app = desk_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
