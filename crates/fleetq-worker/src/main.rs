//! Worker pool binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fleetq_fleet::{resolve_instance_id, AutoScalingController, FleetConfig, FleetMonitor};
use fleetq_media::TransformRunner;
use fleetq_notify::SnsNotifier;
use fleetq_queue::{QueueConfig, SqsQueue};
use fleetq_storage::{S3Client, S3Config};
use fleetq_worker::{
    install_shutdown_handler, metrics, JobProcessor, ResultReporter, WorkerConfig, WorkerContext,
    WorkerPool,
};

/// Log and exit with status 1.
macro_rules! fatal {
    ($($arg:tt)*) => {{
        error!($($arg)*);
        std::process::exit(1);
    }};
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting fleetq-worker");

    let queue_config = QueueConfig::from_env().unwrap_or_else(|e| fatal!("{}", e));
    let fleet_config = FleetConfig::from_env().unwrap_or_else(|e| fatal!("{}", e));
    let config = WorkerConfig::from_env().unwrap_or_else(|e| fatal!("{}", e));
    info!("Worker config: {:?}", config);

    if let Err(e) = metrics::init_metrics(config.metrics_port) {
        fatal!("Failed to start metrics exporter: {}", e);
    }
    if let Err(e) = tokio::fs::create_dir_all(&config.work_dir).await {
        fatal!("Failed to create work dir {}: {}", config.work_dir.display(), e);
    }

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(queue_config.region.clone()))
        .load()
        .await;

    let instance_id = resolve_instance_id(&fleet_config)
        .await
        .unwrap_or_else(|e| fatal!("Failed to resolve instance id: {}", e));
    let controller = AutoScalingController::new(&aws_config, &fleet_config, instance_id);
    let fleet = FleetMonitor::detect(Arc::new(controller))
        .await
        .unwrap_or_else(|e| fatal!("Failed to detect fleet membership: {}", e));

    let runner = TransformRunner::new()
        .with_timeout(config.command_timeout_or(queue_config.visibility_timeout));
    let processor = JobProcessor::new(config.transforms.clone(), runner);
    let reporter = ResultReporter::new(
        Arc::new(SnsNotifier::new(&aws_config)),
        Arc::new(S3Client::new(&aws_config, &S3Config::from_env())),
        config.work_dir.clone(),
    );

    let context = WorkerContext {
        visibility_timeout: queue_config.visibility_timeout,
        wait_time: queue_config.wait_time,
        queue: Arc::new(SqsQueue::new(&aws_config, queue_config)),
        processor: Arc::new(processor),
        reporter: Arc::new(reporter),
    };

    let shutdown = install_shutdown_handler()
        .unwrap_or_else(|e| fatal!("Failed to install signal handlers: {}", e));

    let report = WorkerPool::new(config.concurrency, context, fleet)
        .run(shutdown)
        .await;

    if report.all_failed() {
        fatal!("All {} workers failed", report.workers);
    }

    info!(jobs = report.jobs_processed(), "Worker shutdown complete");
}

/// Colored output for dev, JSON for production.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["fleetq=info", "aws_config=warn", "aws_smithy_runtime=warn"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
