use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::persistence::PostgresPersistence,
    application::use_cases::subscription::{
        CustomerRepo, PlanRepo, SubscriptionRepo, SubscriptionUseCases,
    },
    infra::{
        app::{AppRuntime, AppState},
        config::AppConfig,
        db::{init_db, run_migrations},
        error::InfraError,
        job_queue::{JobQueue, RetryPolicy, run_job_dispatch_loop},
        redis_sink::RedisJobSink,
    },
};

pub async fn init_app_state(config: AppConfig) -> Result<AppRuntime, InfraError> {
    let pool = init_db(&config.database_url, config.database_max_connections).await?;
    if config.run_migrations {
        run_migrations(&pool).await?;
    }
    let postgres_arc = Arc::new(PostgresPersistence::new(pool));

    let sink = Arc::new(
        RedisJobSink::new(
            &config.redis_url,
            config.billing_queue_key.clone(),
            config.tracking_queue_key.clone(),
        )
        .await?,
    );
    let (job_queue, receiver) = JobQueue::new();
    let worker = tokio::spawn(run_job_dispatch_loop(
        receiver,
        sink,
        RetryPolicy::default(),
    ));
    let job_queue = Arc::new(job_queue);

    let subscription_use_cases = SubscriptionUseCases::new(
        postgres_arc.clone() as Arc<dyn CustomerRepo>,
        postgres_arc.clone() as Arc<dyn PlanRepo>,
        postgres_arc as Arc<dyn SubscriptionRepo>,
        job_queue.clone(),
        job_queue,
    );

    let state = AppState {
        config: Arc::new(config),
        subscription_use_cases: Arc::new(subscription_use_cases),
    };

    Ok(AppRuntime::new(state, worker))
}

pub fn init_tracing(log_file: Option<&str>) -> Result<(), InfraError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "planshift=info".into());

    // Console goes to stderr so command output on stdout stays machine-readable
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .pretty();

    let json_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(InfraError::LogFile)?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    Ok(())
}
