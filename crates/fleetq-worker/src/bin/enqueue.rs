//! Enqueue jobs for the worker pool.
//!
//! Either a single input object (output derived by swapping the first
//! `input` in the key for `output`, or given explicitly) or every record of
//! an object-created event document.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{ArgGroup, Parser};

use fleetq_models::{Job, ObjectUrl, S3Event};
use fleetq_queue::{QueueClient, QueueConfig, SqsQueue};
use fleetq_storage::{content_type_for, ObjectStore, S3Client, S3Config};

#[derive(Parser, Debug)]
#[command(name = "fleetq-enqueue", about = "Enqueue transformation jobs", long_about = None)]
#[clap(
    group(
        ArgGroup::new("source")
            .args(&["input", "event"])
            .required(true)
            .multiple(false)
    )
)]
struct Args {
    /// Input object, `s3://bucket/key`
    #[arg(long)]
    input: Option<String>,

    /// Output object; derived from the input when omitted
    #[arg(long, requires = "input")]
    output: Option<String>,

    /// Object-created event document (JSON); one job per record
    #[arg(long, value_name = "FILE")]
    event: Option<PathBuf>,

    /// Topic notified when each job finishes
    #[arg(long, value_name = "ARN", env = "FLEETQ_NOTIFY_ARN")]
    notify: Option<String>,

    /// Upload this local file to the input location first
    #[arg(long, value_name = "FILE", requires = "input")]
    upload: Option<PathBuf>,

    /// Enqueue each job this many times
    #[arg(long, default_value_t = 1)]
    count: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if args.count == 0 {
        bail!("--count must be at least 1");
    }

    let queue_config = QueueConfig::from_env()?;
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(queue_config.region.clone()))
        .load()
        .await;

    let jobs = build_jobs(&args).await?;

    if let (Some(path), Some(input)) = (&args.upload, &args.input) {
        let object = ObjectUrl::parse(input)?;
        let store = S3Client::new(&aws_config, &S3Config::from_env());
        store
            .upload_file(path, &object, content_type_for(&object))
            .await
            .with_context(|| format!("uploading {} to {}", path.display(), object))?;
        println!("fleetq-enqueue: uploaded {} to {}", path.display(), object);
    }

    let queue = SqsQueue::new(&aws_config, queue_config);
    for job in &jobs {
        for _ in 0..args.count {
            let message_id = queue.send(job).await?;
            println!(
                "fleetq-enqueue: {} -> {} ({})",
                job.input_url(),
                job.output_url(),
                message_id
            );
        }
    }

    println!(
        "fleetq-enqueue: enqueued {} message(s)",
        jobs.len() as u64 * u64::from(args.count)
    );
    Ok(())
}

async fn build_jobs(args: &Args) -> anyhow::Result<Vec<Job>> {
    let notify = args.notify.as_deref();

    if let Some(path) = &args.event {
        let document = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        return Ok(S3Event::from_json(&document)?.jobs(notify)?);
    }

    let Some(input) = &args.input else {
        bail!("either --input or --event is required");
    };

    let job = match &args.output {
        Some(output) => {
            ObjectUrl::parse(output)?;
            let job = Job::new(input.clone(), output.clone());
            match notify {
                Some(target) => job.with_notification_target(target),
                None => job,
            }
        }
        None => {
            let object = ObjectUrl::parse(input)?;
            Job::from_object_created(object.bucket(), object.key(), notify)
        }
    };

    Ok(vec![job])
}
