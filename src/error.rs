use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by the orchestration engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The image pull stream reported an error before completing.
    #[error("failed to pull image '{image}': {source}")]
    Pull {
        image: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to create container '{name}': {source}")]
    ContainerCreate {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// A command run inside a container terminated with a non-zero code.
    #[error("'{command}' exited with code {code}")]
    ExecFailed { command: String, code: i64 },

    /// A readiness probe exhausted its retry budget; carries the last probe
    /// error, not an aggregate.
    #[error("{stage} readiness probe did not succeed within {attempts} attempts")]
    ReadinessTimeout {
        stage: String,
        attempts: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("container API error: {0}")]
    Api(#[from] bollard::errors::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
