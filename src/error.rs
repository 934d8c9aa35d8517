//! Error types for the container

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by fallible builders and called functions
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Wiring defects detected at registration time
///
/// These signal a bug in start-up code; the caller decides whether to abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Instance registered with an empty name
    #[error("empty instance name")]
    EmptyName,

    /// Name already bound to another builder
    #[error("duplicate instance name: {0}")]
    DuplicateName(String),

    /// Output type already provided by another instance
    #[error("duplicate instance type: {type_name} is already provided by `{existing}`")]
    DuplicateType {
        type_name: &'static str,
        existing: String,
    },
}

/// Failures while resolving or building an instance
///
/// Build results are memoized, so this type is cheap to clone.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No instance registered under the name
    #[error("not registered instance: {0}")]
    NotRegistered(String),

    /// No instance provides a required parameter type
    #[error("{}", missing_dependency_message(.dependent.as_deref(), .type_name))]
    MissingDependency {
        dependent: Option<String>,
        type_name: &'static str,
    },

    /// A dependency of the instance failed to build
    #[error("cannot build instance `{name}`: {source}")]
    Dependency {
        name: String,
        #[source]
        source: Box<ResolveError>,
    },

    /// The builder itself returned an error
    #[error("builder of instance `{name}` failed: {source}")]
    Build {
        name: String,
        #[source]
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },

    /// The instance depends on itself, directly or transitively
    #[error("dependency cycle: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    /// Typed lookup asked for a type the instance does not produce
    #[error("instance `{name}` provides {actual}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

fn missing_dependency_message(dependent: Option<&str>, type_name: &str) -> String {
    match dependent {
        Some(name) => format!("cannot get service {type_name} required by `{name}`"),
        None => format!("cannot get service: {type_name}"),
    }
}

impl ResolveError {
    /// Innermost error, following `Dependency` links
    pub fn root_cause(&self) -> &ResolveError {
        let mut current = self;
        while let ResolveError::Dependency { source, .. } = current {
            current = source;
        }
        current
    }

    /// Attribute a dependency-resolution failure to the instance being built
    pub(crate) fn required_by(self, name: &str) -> Self {
        match self {
            ResolveError::MissingDependency {
                dependent: None,
                type_name,
            } => ResolveError::MissingDependency {
                dependent: Some(name.to_string()),
                type_name,
            },
            ResolveError::Cycle { path } => ResolveError::Cycle { path },
            other => ResolveError::Dependency {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// Failures of `Container::call`
#[derive(Debug, Error)]
pub enum CallError {
    /// An argument could not be resolved; the function was not invoked
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The function ran and returned an error
    #[error("call failed: {0}")]
    Failed(#[source] BoxError),
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
