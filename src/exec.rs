use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use tracing::warn;

use crate::error::{Error, Result};
use crate::runtime::{ContainerRuntime, ExecSpec, OutputChunk};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs a command inside a running container and waits for it to finish.
///
/// Output forwarding (when attached) and status polling run concurrently;
/// the poll reschedules itself on a 100ms timer rather than spinning. An
/// absent or zero exit code resolves; any other code fails with an error
/// naming the command and the code.
pub async fn run(
    runtime: &dyn ContainerRuntime,
    container_id: &str,
    spec: &ExecSpec,
) -> Result<()> {
    let exec_id = runtime.create_exec(container_id, spec).await?;
    let mut output = runtime.start_exec(&exec_id).await?;

    let forward = spec.attach_output.then(|| {
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            let mut stderr = tokio::io::stderr();
            while let Some(chunk) = output.next().await {
                let write = match chunk {
                    Ok(OutputChunk::Stdout(bytes)) => stdout.write_all(&bytes).await,
                    Ok(OutputChunk::Stderr(bytes)) => stderr.write_all(&bytes).await,
                    Err(err) => {
                        warn!(error = %err, "exec output stream ended early");
                        break;
                    }
                };
                if let Err(err) = write {
                    warn!(error = %err, "failed to forward exec output");
                    break;
                }
            }
            let _ = stdout.flush().await;
            let _ = stderr.flush().await;
        })
    });

    let outcome = wait_until_stopped(runtime, &exec_id, &spec.cmd).await;

    // The stream ends once the exec stops, so this only drains the tail.
    if let Some(handle) = forward {
        let _ = handle.await;
    }

    outcome
}

async fn wait_until_stopped(
    runtime: &dyn ContainerRuntime,
    exec_id: &str,
    cmd: &[String],
) -> Result<()> {
    loop {
        sleep(POLL_INTERVAL).await;
        let status = runtime.inspect_exec(exec_id).await?;
        if status.running {
            continue;
        }
        return match status.exit_code {
            None | Some(0) => Ok(()),
            Some(code) => Err(Error::ExecFailed {
                command: cmd.join(" "),
                code,
            }),
        };
    }
}
