//! CLI error types with exit code handling
//!
//! Library errors are mapped onto a small set of diagnostics, each with its
//! own exit code and, where there is an obvious next step, a help line.

use helmkit::HelmError;
use helmkit_core::CoreError;
use helmkit_kube::KubeError;
use helmkit_repo::RepoError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Release or object absent
    #[error("{message}")]
    #[diagnostic(code(helmkit::cli::not_found))]
    NotFound { message: String },

    /// Invalid command line input
    #[error("Invalid input: {message}")]
    #[diagnostic(code(helmkit::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Chart location, loading or dependencies
    #[error("Chart error: {message}")]
    #[diagnostic(code(helmkit::cli::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Repository management
    #[error("Repository error: {message}")]
    #[diagnostic(code(helmkit::cli::repo))]
    Repository {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Cluster access
    #[error("Kubernetes error: {message}")]
    #[diagnostic(code(helmkit::cli::kubernetes))]
    Kubernetes { message: String },

    /// The Helm engine failed an operation
    #[error("Release error: {message}")]
    #[diagnostic(code(helmkit::cli::release))]
    Release { message: String },

    /// The Helm binary could not be run
    #[error("{message}")]
    #[diagnostic(
        code(helmkit::cli::engine),
        help("install helm or point HELM_BIN at it")
    )]
    EngineUnavailable { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(helmkit::cli::io))]
    Io { message: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(helmkit::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::Input { .. } => exit_codes::USAGE_ERROR,
            CliError::Chart { .. } => exit_codes::CHART_ERROR,
            CliError::Repository { .. } => exit_codes::REPO_ERROR,
            CliError::Kubernetes { .. } => exit_codes::KUBE_ERROR,
            CliError::Release { .. } => exit_codes::ERROR,
            CliError::EngineUnavailable { .. } => exit_codes::ENGINE_UNAVAILABLE,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<HelmError> for CliError {
    fn from(err: HelmError) -> Self {
        let message = err.to_string();
        match err {
            HelmError::ReleaseNotFound { .. } => CliError::NotFound { message },
            HelmError::AmbiguousRelease { .. } | HelmError::Engine { .. } => {
                CliError::Release { message }
            }
            HelmError::ChartNotFound { .. } => CliError::Chart {
                message,
                help: Some("check the chart path, or pass --repo for a remote chart".to_string()),
            },
            HelmError::DependencyUnsatisfied { .. } => CliError::Chart {
                message,
                help: Some("run with --dependency-update to fetch them".to_string()),
            },
            HelmError::EngineUnavailable { .. } => CliError::EngineUnavailable { message },
            HelmError::Core(e) => e.into(),
            HelmError::Kube(e) => e.into(),
            HelmError::Repo(e) => e.into(),
            HelmError::Io(_) => CliError::Io { message },
            _ => CliError::Internal { message },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::InvalidPath { .. } | CoreError::Values { .. } => CliError::Input {
                message,
                help: Some("values are set as --set path=value, e.g. image.tag=1.25".to_string()),
            },
            CoreError::Io(_) => CliError::Io { message },
            _ => CliError::Chart {
                message,
                help: None,
            },
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        if err.is_not_found() {
            return CliError::NotFound {
                message: err.to_string(),
            };
        }
        CliError::Kubernetes {
            message: err.to_string(),
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let message = err.to_string();
        let help = match &err {
            RepoError::RepositoryAlreadyExists { .. } => {
                Some("remove it first with 'helmkit repo remove'".to_string())
            }
            RepoError::RepositoryNotFound { .. } | RepoError::RepositoryFileMissing { .. } => {
                Some("list configured repositories with 'helmkit repo list'".to_string())
            }
            _ => None,
        };
        CliError::Repository { message, help }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_not_found_exit_code() {
        let err: CliError = HelmError::ReleaseNotFound {
            name: "web".to_string(),
            namespace: "apps".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::NOT_FOUND);
    }

    #[test]
    fn test_repo_errors() {
        let err: CliError = RepoError::RepositoryAlreadyExists {
            name: "stable".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::REPO_ERROR);
        assert!(err.to_string().contains("already exists"));

        let err: CliError = HelmError::Repo(RepoError::RepositoryNotFound {
            name: "stable".to_string(),
        })
        .into();
        assert_eq!(err.exit_code(), exit_codes::REPO_ERROR);
    }

    #[test]
    fn test_values_path_is_input_error() {
        let err: CliError = CoreError::InvalidPath {
            path: "a\"b".to_string(),
            message: "bare quote in unquoted key".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
    }
}
