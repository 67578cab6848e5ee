use std::path::PathBuf;
use std::time::Duration;

/// Images, directories, credentials, and retry budgets for one run.
///
/// Defaults mirror the environment this tool was built for: a postgres
/// data store, the cli-migrations build of hasura, and a node container
/// that runs a yarn test suite. Every field is overridable from the CLI.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub postgres_image: String,
    pub hasura_image: String,
    pub app_image: String,
    /// Host directory with hasura migrations (and optional metadata files),
    /// mounted read-only into the hasura container.
    pub migrations_dir: PathBuf,
    /// Host directory with the workload source tree, mounted at `/app`.
    pub app_dir: PathBuf,
    pub postgres_password: String,
    pub hasura_port: u16,
    /// Dependency installation command run in the app container.
    pub install_cmd: Vec<String>,
    /// Workload command run in the app container with output attached.
    pub workload_cmd: Vec<String>,
    pub postgres_attempts: usize,
    /// Hasura gets the largest budget; engine startup is the slowest step.
    pub hasura_attempts: usize,
    pub probe_delay: Duration,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            postgres_image: "postgres:12-alpine".to_string(),
            hasura_image: "hasura/graphql-engine:v1.0.0.cli-migrations".to_string(),
            app_image: "node:current-alpine".to_string(),
            migrations_dir: PathBuf::from("./migrations"),
            app_dir: PathBuf::from("./tests"),
            postgres_password: "postgres".to_string(),
            hasura_port: 8080,
            install_cmd: vec!["yarn".to_string(), "install".to_string()],
            workload_cmd: vec!["yarn".to_string(), "test".to_string()],
            postgres_attempts: 20,
            hasura_attempts: 100,
            probe_delay: Duration::from_secs(1),
        }
    }
}
