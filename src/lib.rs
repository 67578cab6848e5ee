//! Ephemeral postgres + hasura + app test environments on Docker.
//!
//! The crate provisions a fixed three-container topology on a per-run
//! network, waits for each component with readiness probes, runs a workload
//! command inside the application container, and unconditionally tears down
//! every resource namespaced by the run identifier.
//!
//! - [`runtime`]: the narrow Docker Engine API surface the orchestrator
//!   consumes, as an injectable trait
//! - [`docker`]: the bollard-backed implementation of that trait
//! - [`exec`]: run a command inside a container and wait for its exit code
//! - [`retry`]: bounded retry with fixed delay, used for readiness polling
//! - [`lifecycle`]: pull + create + start for a single container
//! - [`teardown`]: rediscover and remove everything tagged with the run id
//! - [`orchestrator`]: the fixed postgres → hasura → app sequence

pub mod config;
pub mod docker;
pub mod error;
pub mod exec;
pub mod id;
pub mod lifecycle;
pub mod orchestrator;
pub mod retry;
pub mod runtime;
pub mod teardown;

pub use config::EnvConfig;
pub use docker::DockerRuntime;
pub use error::{Error, Result};
pub use id::RunId;
pub use orchestrator::Orchestrator;
pub use retry::until;
pub use runtime::{
    BindMount, ContainerRuntime, ContainerSpec, ExecSpec, ExecStatus, OutputChunk, OutputStream,
    ResourceSummary, RunningContainer,
};
