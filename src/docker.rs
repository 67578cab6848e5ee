use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, LogOutput, NetworkingConfig,
    StartContainerOptions, StopContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::models::{EndpointSettings, HostConfig};
use bollard::network::{CreateNetworkOptions, ListNetworksOptions};
use bollard::Docker;
use futures_util::StreamExt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::runtime::{
    BindMount, ContainerRuntime, ContainerSpec, ExecSpec, ExecStatus, OutputChunk, OutputStream,
    ResourceSummary,
};

/// [`ContainerRuntime`] backed by the Docker Engine API via bollard.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects to the local daemon (unix socket or platform default).
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }
}

fn render_bind(bind: &BindMount) -> String {
    if bind.read_only {
        format!("{}:{}:ro", bind.host, bind.container)
    } else {
        format!("{}:{}", bind.host, bind.container)
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn pull_image(&self, image: &str) -> Result<()> {
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };
        let mut progress = self.docker.create_image(Some(options), None, None);
        while let Some(event) = progress.next().await {
            match event {
                Ok(info) => {
                    // The daemon reports some pull failures in-band rather
                    // than as a transport error.
                    if let Some(message) = info.error {
                        return Err(Error::Pull {
                            image: image.to_string(),
                            source: Box::new(Error::Other(message)),
                        });
                    }
                    if let Some(status) = info.status {
                        debug!(image, %status, "pull progress");
                    }
                }
                Err(source) => {
                    return Err(Error::Pull {
                        image: image.to_string(),
                        source: Box::new(Error::Api(source)),
                    })
                }
            }
        }
        Ok(())
    }

    async fn create_network(&self, name: &str, labels: &BTreeMap<String, String>) -> Result<()> {
        self.docker
            .create_network(CreateNetworkOptions {
                name: name.to_string(),
                labels: labels.clone().into_iter().collect(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let mut endpoints = HashMap::new();
        if let Some(alias) = &spec.network_alias {
            endpoints.insert(
                spec.network.clone(),
                EndpointSettings {
                    aliases: Some(vec![alias.clone()]),
                    ..Default::default()
                },
            );
        }

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env.clone()),
            cmd: spec.cmd.clone(),
            working_dir: spec.working_dir.clone(),
            tty: Some(spec.tty),
            labels: Some(spec.labels.clone().into_iter().collect()),
            host_config: Some(HostConfig {
                auto_remove: Some(true),
                network_mode: Some(spec.network.clone()),
                binds: if spec.binds.is_empty() {
                    None
                } else {
                    Some(spec.binds.iter().map(render_bind).collect())
                },
                ..Default::default()
            }),
            networking_config: if endpoints.is_empty() {
                None
            } else {
                Some(NetworkingConfig {
                    endpoints_config: endpoints,
                })
            },
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(
                Some(CreateContainerOptions {
                    name: spec.name.clone(),
                    platform: None,
                }),
                config,
            )
            .await
            .map_err(|source| Error::ContainerCreate {
                name: spec.name.clone(),
                source: Box::new(Error::Api(source)),
            })?;

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn create_exec(&self, container_id: &str, spec: &ExecSpec) -> Result<String> {
        let created = self
            .docker
            .create_exec(
                container_id,
                CreateExecOptions {
                    cmd: Some(spec.cmd.clone()),
                    env: if spec.env.is_empty() {
                        None
                    } else {
                        Some(spec.env.clone())
                    },
                    attach_stdout: Some(spec.attach_output),
                    attach_stderr: Some(spec.attach_output),
                    tty: Some(spec.tty),
                    ..Default::default()
                },
            )
            .await?;
        Ok(created.id)
    }

    async fn start_exec(&self, exec_id: &str) -> Result<OutputStream> {
        match self.docker.start_exec(exec_id, None).await? {
            StartExecResults::Attached { output, .. } => Ok(output
                .map(|item| match item {
                    Ok(LogOutput::StdErr { message }) => Ok(OutputChunk::Stderr(message.to_vec())),
                    Ok(chunk) => Ok(OutputChunk::Stdout(chunk.into_bytes().to_vec())),
                    Err(source) => Err(Error::Api(source)),
                })
                .boxed()),
            StartExecResults::Detached => Ok(futures_util::stream::empty().boxed()),
        }
    }

    async fn inspect_exec(&self, exec_id: &str) -> Result<ExecStatus> {
        let inspect = self.docker.inspect_exec(exec_id).await?;
        Ok(ExecStatus {
            running: inspect.running.unwrap_or(false),
            exit_code: inspect.exit_code,
        })
    }

    async fn list_containers(&self) -> Result<Vec<ResourceSummary>> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String>::default()))
            .await?;
        Ok(containers
            .into_iter()
            .filter_map(|container| {
                let id = container.id?;
                let name = container
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                Some(ResourceSummary {
                    id,
                    name: name.trim_start_matches('/').to_string(),
                })
            })
            .collect())
    }

    async fn list_networks(&self) -> Result<Vec<ResourceSummary>> {
        let networks = self
            .docker
            .list_networks(None::<ListNetworksOptions<String>>)
            .await?;
        Ok(networks
            .into_iter()
            .filter_map(|network| {
                Some(ResourceSummary {
                    id: network.id?,
                    name: network.name.unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn stop_container(&self, id: &str) -> Result<()> {
        self.docker
            .stop_container(id, None::<StopContainerOptions>)
            .await?;
        Ok(())
    }

    async fn remove_network(&self, id: &str) -> Result<()> {
        self.docker.remove_network(id).await?;
        Ok(())
    }
}
