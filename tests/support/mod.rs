#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use hasura_testbed::{
    ContainerRuntime, ContainerSpec, Error, ExecSpec, ExecStatus, OutputStream, ResourceSummary,
    Result,
};

/// In-memory stand-in for the Docker daemon.
///
/// Execs complete immediately; their terminal exit codes are scripted per
/// command binary (`cmd[0]`) and default to zero, with `None` expressible
/// for runtimes that report no code at all. Everything else succeeds and is
/// recorded so tests can assert on ordering and cleanup.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    pulled: Vec<String>,
    created: Vec<String>,
    containers: Vec<ResourceSummary>,
    networks: Vec<ResourceSummary>,
    exit_codes: BTreeMap<String, Option<i64>>,
    execs: BTreeMap<String, Option<i64>>,
    exec_specs: Vec<ExecSpec>,
    exec_seq: usize,
    stopped: Vec<String>,
    removed_networks: Vec<String>,
}

fn summary(name: &str) -> ResourceSummary {
    ResourceSummary {
        id: format!("{name}-id"),
        name: name.to_string(),
    }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the container listing, as if other runs left these
    /// behind.
    pub fn with_containers(self, names: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for name in names {
                state.containers.push(summary(name));
            }
        }
        self
    }

    pub fn with_networks(self, names: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for name in names {
                state.networks.push(summary(name));
            }
        }
        self
    }

    /// Makes every exec whose first argument is `bin` terminate with
    /// `exit_code`.
    pub fn fail_command(self, bin: &str, exit_code: i64) -> Self {
        self.state
            .lock()
            .unwrap()
            .exit_codes
            .insert(bin.to_string(), Some(exit_code));
        self
    }

    /// Makes every exec whose first argument is `bin` terminate without
    /// reporting an exit code.
    pub fn without_exit_code(self, bin: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .exit_codes
            .insert(bin.to_string(), None);
        self
    }

    pub fn pulled(&self) -> Vec<String> {
        self.state.lock().unwrap().pulled.clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    /// Names of stopped containers, in stop order.
    pub fn stopped(&self) -> Vec<String> {
        self.state.lock().unwrap().stopped.clone()
    }

    pub fn removed_networks(&self) -> Vec<String> {
        self.state.lock().unwrap().removed_networks.clone()
    }

    /// Every exec spec created so far, in creation order.
    pub fn exec_history(&self) -> Vec<ExecSpec> {
        self.state.lock().unwrap().exec_specs.clone()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn pull_image(&self, image: &str) -> Result<()> {
        self.state.lock().unwrap().pulled.push(image.to_string());
        Ok(())
    }

    async fn create_network(&self, name: &str, _labels: &BTreeMap<String, String>) -> Result<()> {
        self.state.lock().unwrap().networks.push(summary(name));
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.created.push(spec.name.clone());
        let entry = summary(&spec.name);
        let id = entry.id.clone();
        state.containers.push(entry);
        Ok(id)
    }

    async fn start_container(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn create_exec(&self, _container_id: &str, spec: &ExecSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.exec_seq += 1;
        let exec_id = format!("exec-{}", state.exec_seq);
        let code = spec
            .cmd
            .first()
            .and_then(|bin| state.exit_codes.get(bin))
            .copied()
            .unwrap_or(Some(0));
        state.execs.insert(exec_id.clone(), code);
        state.exec_specs.push(spec.clone());
        Ok(exec_id)
    }

    async fn start_exec(&self, _exec_id: &str) -> Result<OutputStream> {
        Ok(stream::empty().boxed())
    }

    async fn inspect_exec(&self, exec_id: &str) -> Result<ExecStatus> {
        let state = self.state.lock().unwrap();
        let exit_code = state
            .execs
            .get(exec_id)
            .copied()
            .ok_or_else(|| Error::Other(format!("unknown exec '{exec_id}'")))?;
        Ok(ExecStatus {
            running: false,
            exit_code,
        })
    }

    async fn list_containers(&self) -> Result<Vec<ResourceSummary>> {
        Ok(self.state.lock().unwrap().containers.clone())
    }

    async fn list_networks(&self) -> Result<Vec<ResourceSummary>> {
        Ok(self.state.lock().unwrap().networks.clone())
    }

    async fn stop_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(pos) = state.containers.iter().position(|c| c.id == id) {
            // Auto-remove: a stopped container disappears from listings.
            let container = state.containers.remove(pos);
            state.stopped.push(container.name);
        }
        Ok(())
    }

    async fn remove_network(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(pos) = state.networks.iter().position(|n| n.id == id) {
            let network = state.networks.remove(pos);
            state.removed_networks.push(network.name);
        }
        Ok(())
    }
}
