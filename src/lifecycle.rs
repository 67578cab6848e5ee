use tracing::info;

use crate::error::Result;
use crate::runtime::{ContainerRuntime, ContainerSpec, RunningContainer};

/// Pulls the image, creates the container, and starts it.
///
/// Creation always sets the auto-remove flag (see
/// [`crate::docker::DockerRuntime`]), so stopping the container later also
/// reclaims it.
pub async fn start_container(
    runtime: &dyn ContainerRuntime,
    spec: &ContainerSpec,
) -> Result<RunningContainer> {
    runtime.pull_image(&spec.image).await?;
    let id = runtime.create_container(spec).await?;
    runtime.start_container(&id).await?;
    info!(container = %spec.name, image = %spec.image, "container started");
    Ok(RunningContainer {
        id,
        name: spec.name.clone(),
    })
}
