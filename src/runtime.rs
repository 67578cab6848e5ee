use std::collections::BTreeMap;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::Result;

/// A host path bound into a container.
#[derive(Debug, Clone)]
pub struct BindMount {
    pub host: String,
    pub container: String,
    pub read_only: bool,
}

/// Declarative container configuration; immutable once passed to creation.
///
/// Containers are always created with auto-removal so that a later stop also
/// reclaims them.
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub env: Vec<String>,
    pub binds: Vec<BindMount>,
    pub network: String,
    /// DNS alias the container answers to on the per-run network.
    pub network_alias: Option<String>,
    pub cmd: Option<Vec<String>>,
    pub working_dir: Option<String>,
    pub tty: bool,
    pub labels: BTreeMap<String, String>,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env.push(var.into());
        self
    }

    pub fn bind(
        mut self,
        host: impl Into<String>,
        container: impl Into<String>,
        read_only: bool,
    ) -> Self {
        self.binds.push(BindMount {
            host: host.into(),
            container: container.into(),
            read_only,
        });
        self
    }

    pub fn network(mut self, network: impl Into<String>, alias: Option<&str>) -> Self {
        self.network = network.into();
        self.network_alias = alias.map(str::to_string);
        self
    }

    pub fn cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = Some(cmd.into_iter().map(Into::into).collect());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    pub fn labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }
}

/// Command to run inside an already-running container.
#[derive(Debug, Clone, Default)]
pub struct ExecSpec {
    pub cmd: Vec<String>,
    pub env: Vec<String>,
    /// When set, combined output is demultiplexed and forwarded to the
    /// process stdout/stderr while the command runs.
    pub attach_output: bool,
    /// Allocate a pseudo-terminal for the exec. Long interactive-style
    /// commands (dependency installs, test runners) want one.
    pub tty: bool,
}

impl ExecSpec {
    pub fn new<I, S>(cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env.push(var.into());
        self
    }

    pub fn attach_output(mut self, attach: bool) -> Self {
        self.attach_output = attach;
        self
    }

    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }
}

/// Point-in-time state of an exec: `Running` until the runtime reports
/// otherwise, then terminal with an optional exit code.
#[derive(Debug, Clone, Copy)]
pub struct ExecStatus {
    pub running: bool,
    pub exit_code: Option<i64>,
}

/// One demultiplexed chunk of exec output.
#[derive(Debug, Clone)]
pub enum OutputChunk {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
}

/// A container or network as reported by the runtime's list endpoints.
#[derive(Debug, Clone)]
pub struct ResourceSummary {
    pub id: String,
    pub name: String,
}

/// Handle to a created-and-started container. Teardown does not depend on
/// it; resources are rediscovered by name at cleanup time.
#[derive(Debug, Clone)]
pub struct RunningContainer {
    pub id: String,
    pub name: String,
}

pub type OutputStream = BoxStream<'static, Result<OutputChunk>>;

/// The slice of the container runtime API this tool consumes.
///
/// Injected into every component so tests can substitute an in-memory fake
/// for the Docker daemon.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Ensures `image` is present locally, draining the runtime's progress
    /// stream to completion. Not retried here; wrap with
    /// [`crate::retry::until`] if resilience to transient pull failures is
    /// needed.
    async fn pull_image(&self, image: &str) -> Result<()>;

    async fn create_network(&self, name: &str, labels: &BTreeMap<String, String>) -> Result<()>;

    /// Creates a container from `spec` and returns its id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    /// Creates an execution context inside a running container; returns the
    /// exec id.
    async fn create_exec(&self, container_id: &str, spec: &ExecSpec) -> Result<String>;

    /// Starts the exec and yields its demultiplexed output stream (empty
    /// when output was not attached).
    async fn start_exec(&self, exec_id: &str) -> Result<OutputStream>;

    async fn inspect_exec(&self, exec_id: &str) -> Result<ExecStatus>;

    async fn list_containers(&self) -> Result<Vec<ResourceSummary>>;

    async fn list_networks(&self) -> Result<Vec<ResourceSummary>>;

    async fn stop_container(&self, id: &str) -> Result<()>;

    async fn remove_network(&self, id: &str) -> Result<()>;
}
