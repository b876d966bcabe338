use crate::*;
use std::fmt::Display;

const SWAP_FILE: &str = "/swapfile";
const WORKER_PORT_MAPPING: &str = "3000:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    MemoryProbe,
    SwapAllocation,
    ContainerLaunch,
}

impl Display for BootstrapStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BootstrapStep::MemoryProbe => "memory probe",
            BootstrapStep::SwapAllocation => "swap allocation",
            BootstrapStep::ContainerLaunch => "container launch",
        })
    }
}

/// Turns a reachable machine into a worker: optional swap, then the worker
/// container wired to object storage and the scheduler's webhook.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub docker_image: String,
    pub storage: BucketCredentials,
    pub swap_ratio: Option<f64>,
}

impl Bootstrap {
    #[instrument(skip_all, name = "bootstrap")]
    pub async fn run(
        &self,
        node: &dyn NodeHandle,
        webhook: &str,
        node_token: &str,
    ) -> Result<()> {
        if let Some(ratio) = self.swap_ratio.filter(|ratio| *ratio > 0.0) {
            let memory_kb = probe_memory_kb(node).await?;
            let swap_bytes = swap_size_bytes(memory_kb, ratio);
            info!(memory_kb, swap_bytes, "Allocating swap");
            execute(node, BootstrapStep::SwapAllocation, &swap_script(swap_bytes)).await?;
            telemetry::send_bootstrap_status(BootstrapStep::SwapAllocation, true);
        }

        info!(image = %self.docker_image, "Launching worker container");
        let command = RemoteScript::from(self.container_command(webhook, node_token));
        execute(node, BootstrapStep::ContainerLaunch, &command).await?;
        telemetry::send_bootstrap_status(BootstrapStep::ContainerLaunch, true);
        Ok(())
    }

    pub fn container_command(&self, webhook: &str, node_token: &str) -> RemoteCommand {
        RemoteCommand::sudo("docker")
            .args(["run", "-d", "-p", WORKER_PORT_MAPPING])
            .arg(&self.docker_image)
            .args(["-q", "1"])
            .args(["--s3_access_key", self.storage.access_key.as_str()])
            .args(["--s3_secret_key", self.storage.secret_key.as_str()])
            .args(["--s3_endpoint", self.storage.endpoint.as_str()])
            .args(["--s3_bucket", self.storage.bucket.as_str()])
            .args(["--webhook", webhook])
            .args(["--token", node_token])
    }
}

pub fn memory_probe_command() -> RemoteCommand {
    RemoteCommand::new("awk").args(["/MemTotal/ { printf \"%d\\n\", $2 }", "/proc/meminfo"])
}

pub fn swap_script(swap_bytes: u64) -> RemoteScript {
    RemoteScript::new()
        .then(
            RemoteCommand::sudo("fallocate")
                .args(["-l".to_string(), swap_bytes.to_string()])
                .arg(SWAP_FILE),
        )
        .then(RemoteCommand::sudo("chmod").args(["600", SWAP_FILE]))
        .then(RemoteCommand::sudo("mkswap").arg(SWAP_FILE))
        .then(RemoteCommand::sudo("swapon").arg(SWAP_FILE))
        .then(RemoteCommand::new("free").arg("-h"))
}

/// `memory_kb` is `MemTotal` from `/proc/meminfo`.
pub fn swap_size_bytes(memory_kb: f64, ratio: f64) -> u64 {
    (memory_kb * ratio * 1024.0).ceil() as u64
}

async fn probe_memory_kb(node: &dyn NodeHandle) -> Result<f64> {
    let probe = RemoteScript::from(memory_probe_command());
    let output = execute(node, BootstrapStep::MemoryProbe, &probe).await?;
    match output.trim().parse::<f64>() {
        Ok(memory) if memory.is_finite() && memory > 0.0 => {
            telemetry::send_bootstrap_status(BootstrapStep::MemoryProbe, true);
            Ok(memory)
        }
        _ => {
            telemetry::send_bootstrap_status(BootstrapStep::MemoryProbe, false);
            Err(Error::Bootstrap {
                step: BootstrapStep::MemoryProbe,
                output,
            })
        }
    }
}

async fn execute(
    node: &dyn NodeHandle,
    step: BootstrapStep,
    script: &RemoteScript,
) -> Result<String> {
    let command = script.to_shell_string();
    match node.execute(&command).await {
        Ok(output) => Ok(output),
        Err(err) => {
            error!(%step, %err, "Remote command failed");
            telemetry::send_bootstrap_status(step, false);
            Err(Error::Bootstrap {
                step,
                output: format!("{err:#}"),
            })
        }
    }
}
