use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use hasura_testbed::{DockerRuntime, EnvConfig, Orchestrator};

#[derive(Parser)]
#[command(
    name = "hasura-testbed",
    version,
    about = "Provisions an ephemeral postgres + hasura + app environment on Docker, runs a workload inside it, and tears everything down"
)]
struct Cli {
    /// Postgres image
    #[arg(long, env = "TESTBED_POSTGRES_IMAGE", default_value = "postgres:12-alpine")]
    postgres_image: String,

    /// Hasura graphql-engine image (cli-migrations variant)
    #[arg(
        long,
        env = "TESTBED_HASURA_IMAGE",
        default_value = "hasura/graphql-engine:v1.0.0.cli-migrations"
    )]
    hasura_image: String,

    /// Application runtime image
    #[arg(long, env = "TESTBED_APP_IMAGE", default_value = "node:current-alpine")]
    app_image: String,

    /// Directory with hasura migrations (and optional metadata), mounted read-only
    #[arg(long, env = "TESTBED_MIGRATIONS_DIR", default_value = "./migrations")]
    migrations_dir: PathBuf,

    /// Directory with the workload source tree, mounted at /app
    #[arg(long, env = "TESTBED_APP_DIR", default_value = "./tests")]
    app_dir: PathBuf,

    /// Postgres superuser password
    #[arg(long, env = "TESTBED_POSTGRES_PASSWORD", default_value = "postgres")]
    postgres_password: String,

    /// Port probed for hasura readiness
    #[arg(long, env = "TESTBED_HASURA_PORT", default_value_t = 8080)]
    hasura_port: u16,

    /// Dependency installation command run in the app container
    #[arg(
        long,
        env = "TESTBED_INSTALL_CMD",
        default_value = "yarn install",
        value_delimiter = ' '
    )]
    install_cmd: Vec<String>,

    /// Attempt budget for the postgres readiness probe
    #[arg(long, env = "TESTBED_POSTGRES_ATTEMPTS", default_value_t = 20)]
    postgres_attempts: usize,

    /// Attempt budget for the hasura readiness probe
    #[arg(long, env = "TESTBED_HASURA_ATTEMPTS", default_value_t = 100)]
    hasura_attempts: usize,

    /// Delay between readiness probe attempts, in milliseconds
    #[arg(long, env = "TESTBED_PROBE_DELAY_MS", default_value_t = 1000)]
    probe_delay_ms: u64,

    /// Workload command run in the app container
    #[arg(
        value_name = "COMMAND",
        default_values_t = ["yarn".to_string(), "test".to_string()]
    )]
    workload: Vec<String>,
}

impl Cli {
    fn into_config(self) -> EnvConfig {
        EnvConfig {
            postgres_image: self.postgres_image,
            hasura_image: self.hasura_image,
            app_image: self.app_image,
            migrations_dir: self.migrations_dir,
            app_dir: self.app_dir,
            postgres_password: self.postgres_password,
            hasura_port: self.hasura_port,
            install_cmd: self.install_cmd,
            workload_cmd: self.workload,
            postgres_attempts: self.postgres_attempts,
            hasura_attempts: self.hasura_attempts,
            probe_delay: Duration::from_millis(self.probe_delay_ms),
        }
    }
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let runtime = DockerRuntime::connect()?;
    let orchestrator = Orchestrator::new(Arc::new(runtime), cli.into_config());

    if let Err(e) = orchestrator.run().await {
        eprintln!("Error running test environment: {:?}", anyhow::Error::from(e));
        std::process::exit(1);
    }
    Ok(())
}
