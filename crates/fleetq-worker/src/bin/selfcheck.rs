use std::path::Path;

use fleetq_media::check_program;
use fleetq_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env()?;

    println!(
        "fleetq-selfcheck: starting with work_dir={} workers={}",
        config.work_dir.display(),
        config.concurrency
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_transforms(&config)?;
    ensure_env_present(&["SQS_URL", "AWS_REGION", "ASG_NAME"])?;

    println!("fleetq-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;

    let probe = path.join(".fleetq-selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("work dir {} not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_transforms(config: &WorkerConfig) -> anyhow::Result<()> {
    for (extension, command) in config.transforms.commands() {
        let resolved = check_program(command.program())
            .map_err(|e| anyhow::anyhow!("transform for .{}: {}", extension, e))?;
        println!(
            "fleetq-selfcheck: .{} -> {} ({})",
            extension,
            command,
            resolved.display()
        );
    }
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}
