use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::EnvConfig;
use crate::error::{Error, Result};
use crate::exec;
use crate::id::RunId;
use crate::lifecycle;
use crate::retry::until;
use crate::runtime::{ContainerRuntime, ContainerSpec, ExecSpec, RunningContainer};
use crate::teardown;

/// Label attached to every container and network created by a run, so the
/// run's resources carry structured metadata in addition to their
/// role-prefixed names.
pub const RUN_ID_LABEL: &str = "testbed.run-id";

const MIGRATIONS_MOUNT: &str = "/tmp/hasura-test/migrations";
const APP_MOUNT: &str = "/app";

/// Drives the fixed postgres → hasura → app sequence, runs the workload,
/// and tears down every run-tagged resource on both the success and the
/// failure path.
pub struct Orchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    config: EnvConfig,
    run_id: RunId,
}

impl Orchestrator {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: EnvConfig) -> Self {
        Self {
            runtime,
            config,
            run_id: RunId::generate(),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Provisions the environment and runs the workload; teardown runs
    /// unconditionally before the result is returned.
    pub async fn run(&self) -> Result<()> {
        let outcome = self.provision_and_run().await;
        if let Err(err) = &outcome {
            error!(error = %err, "test environment run failed");
        }
        teardown::remove_run_resources(self.runtime.as_ref(), self.run_id.as_str()).await;
        outcome
    }

    async fn provision_and_run(&self) -> Result<()> {
        self.runtime
            .create_network(&self.run_id.network_name(), &self.labels())
            .await?;

        self.start_postgres().await?;
        self.start_hasura().await?;
        let app = self.start_app().await?;

        info!(container = %app.name, command = ?self.config.workload_cmd, "running workload");
        let workload = ExecSpec::new(self.config.workload_cmd.clone())
            .attach_output(true)
            .tty(true);
        exec::run(self.runtime.as_ref(), &app.id, &workload).await
    }

    /// Stage 1: data store. Ready once `psql` can open a session; then the
    /// run-specific database is created.
    async fn start_postgres(&self) -> Result<RunningContainer> {
        let spec = ContainerSpec::new(
            &self.config.postgres_image,
            self.run_id.resource_name("postgres"),
        )
        .env(format!(
            "POSTGRES_PASSWORD={}",
            self.config.postgres_password
        ))
        .network(self.run_id.network_name(), Some("postgres"))
        .tty(true)
        .labels(self.labels());
        let container = lifecycle::start_container(self.runtime.as_ref(), &spec).await?;

        info!("waiting for postgres to accept connections");
        let probe = ExecSpec::new(["psql", "-U", "postgres", "-c", "\\q"])
            .env(format!("PGPASSWORD={}", self.config.postgres_password));
        self.wait_ready("postgres", &container, &probe, self.config.postgres_attempts)
            .await?;

        let create_db = format!("create database {}", self.run_id.database_name());
        let create_db = ExecSpec::new(["psql", "-U", "postgres", "-c", create_db.as_str()])
            .env(format!("PGPASSWORD={}", self.config.postgres_password));
        exec::run(self.runtime.as_ref(), &container.id, &create_db).await?;

        Ok(container)
    }

    /// Stage 2: graphql engine. Ready once its port answers; then
    /// migrations (and metadata, when present) are applied.
    async fn start_hasura(&self) -> Result<RunningContainer> {
        let migrations_dir = std::fs::canonicalize(&self.config.migrations_dir)?;
        let database_url = format!(
            "postgres://postgres:{}@postgres:5432/{}",
            self.config.postgres_password,
            self.run_id.database_name()
        );

        let spec = ContainerSpec::new(
            &self.config.hasura_image,
            self.run_id.resource_name("hasura"),
        )
        .env(format!("HASURA_GRAPHQL_DATABASE_URL={database_url}"))
        .bind(migrations_dir.display().to_string(), MIGRATIONS_MOUNT, true)
        .network(self.run_id.network_name(), Some("hasura"))
        .labels(self.labels());
        let container = lifecycle::start_container(self.runtime.as_ref(), &spec).await?;

        let port = self.config.hasura_port.to_string();
        info!(port = %port, "waiting for hasura to listen");
        let probe = ExecSpec::new(["nc", "-z", "localhost", port.as_str()]);
        self.wait_ready("hasura", &container, &probe, self.config.hasura_attempts)
            .await?;

        info!("applying migrations");
        let script = [
            "cd /tmp/hasura-test".to_string(),
            format!("echo \"endpoint: http://localhost:{port}\" > config.yaml"),
            "echo \"show_update_notification: false\" >> config.yaml".to_string(),
            "hasura-cli migrate apply".to_string(),
            "if [ -f metadata.json ] || [ -f metadata.yaml ] ; then hasura-cli metadata apply; fi"
                .to_string(),
        ]
        .join(" && ");
        let migrate = ExecSpec::new(["sh", "-c", script.as_str()]).attach_output(true);
        exec::run(self.runtime.as_ref(), &container.id, &migrate).await?;

        Ok(container)
    }

    /// Stage 3: application container. Kept alive with a no-op command so
    /// the workload can be exec'd into it after dependencies install.
    async fn start_app(&self) -> Result<RunningContainer> {
        let app_dir = std::fs::canonicalize(&self.config.app_dir)?;

        let spec = ContainerSpec::new(&self.config.app_image, self.run_id.resource_name("app"))
            .bind(app_dir.display().to_string(), APP_MOUNT, false)
            .network(self.run_id.network_name(), Some("app"))
            .working_dir(APP_MOUNT)
            .cmd(["tail", "-f", "/dev/null"])
            .tty(true)
            .labels(self.labels());
        let container = lifecycle::start_container(self.runtime.as_ref(), &spec).await?;

        info!(command = ?self.config.install_cmd, "installing workload dependencies");
        let install = ExecSpec::new(self.config.install_cmd.clone())
            .attach_output(true)
            .tty(true);
        exec::run(self.runtime.as_ref(), &container.id, &install).await?;

        Ok(container)
    }

    async fn wait_ready(
        &self,
        stage: &str,
        container: &RunningContainer,
        probe: &ExecSpec,
        attempts: usize,
    ) -> Result<()> {
        until(
            || exec::run(self.runtime.as_ref(), &container.id, probe),
            attempts,
            self.config.probe_delay,
        )
        .await
        .map_err(|err| Error::ReadinessTimeout {
            stage: stage.to_string(),
            attempts,
            source: Box::new(err),
        })
    }

    fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(RUN_ID_LABEL.to_string(), self.run_id.as_str().to_string())])
    }
}
