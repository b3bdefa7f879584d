use std::net::SocketAddr;
use std::sync::Arc;

use mongodb::{options::ClientOptions, Client as MongoClient};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::{fmt, EnvFilter};

use daily_jobs_service::clients::{build_http_client, RemoteConfigClient, RetryPolicy};
use daily_jobs_service::config::{log_filter, Config};
use daily_jobs_service::handlers::AppState;
use daily_jobs_service::jobs::DailyJobs;
use daily_jobs_service::routes::router;
use daily_jobs_service::storage::{MongoCatalogReader, MongoKpiStore, MongoTrendingWriter};
use daily_jobs_service::sync::build_backend;
use daily_jobs_service::tuner::{ConfigTuner, TemplateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load this crate's .env regardless of current working directory, and override any pre-set envs
    let _ = dotenvy::from_filename_override(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(true)
        .init();

    let cfg = Config::from_env();
    tracing::info!(
        database = %cfg.database_name,
        search_engine = %cfg.search_engine,
        token_configured = cfg.daily_jobs_token.is_some(),
        remote_config_configured = cfg.remote_config_project_id.is_some() && cfg.remote_config_access_token.is_some(),
        scheduler_enabled = cfg.enable_scheduler,
        "Loaded configuration"
    );

    // Clients are created once here and handed to every component
    let client_options = ClientOptions::parse(&cfg.mongodb_uri).await?;
    let mongo_client = MongoClient::with_options(client_options)?;
    let db = mongo_client.database(&cfg.database_name);
    let http = build_http_client(&cfg)?;

    let catalog = Arc::new(MongoCatalogReader::new(&db, &cfg.catalog_collection));
    let kpis = Arc::new(MongoKpiStore::new(&db, &cfg.kpi_collection));
    let trending = Arc::new(MongoTrendingWriter::new(&db, &cfg.public_collection));
    let backend = build_backend(&cfg, http.clone());

    let templates: Option<Arc<dyn TemplateStore>> =
        match (&cfg.remote_config_project_id, &cfg.remote_config_access_token) {
            (Some(project), Some(token)) => Some(Arc::new(RemoteConfigClient::new(
                http.clone(),
                &cfg.remote_config_endpoint,
                project,
                token.clone(),
                RetryPolicy::from_config(&cfg),
            ))),
            _ => None,
        };
    let tuner = ConfigTuner::new(kpis, templates);
    let jobs = Arc::new(DailyJobs::new(catalog, backend, trending, tuner));

    let mut scheduler = JobScheduler::new().await?;
    if cfg.enable_scheduler {
        start_daily_jobs_scheduler(&scheduler, &cfg.daily_jobs_cron, jobs.clone()).await?;
        scheduler.start().await?;
        tracing::info!(cron = %cfg.daily_jobs_cron, "Daily jobs scheduler started");
    }

    let app = router(AppState { expected_token: cfg.daily_jobs_token.clone(), jobs });

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.port).parse()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(port = cfg.port, "Port is already in use. Try changing PORT env var or stop the other process.");
            }
            return Err(e.into());
        }
    };
    tracing::info!(port = cfg.port, "daily-jobs-service listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    if cfg.enable_scheduler {
        scheduler.shutdown().await?;
    }
    mongo_client.shutdown().await;
    tracing::info!("daily-jobs-service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn start_daily_jobs_scheduler(
    scheduler: &JobScheduler,
    cron: &str,
    jobs: Arc<DailyJobs>,
) -> anyhow::Result<()> {
    let job = Job::new_async(cron, move |_uuid, _l| {
        let jobs = jobs.clone();
        Box::pin(async move {
            match jobs.run().await {
                Ok(report) => tracing::info!(run_id = %report.run_id, "Scheduled daily jobs completed"),
                Err(failure) => tracing::error!(step = %failure.step, error = %failure.error, "Scheduled daily jobs failed"),
            }
        })
    })?;
    scheduler.add(job).await?;
    Ok(())
}
