//! Lazy, type-indexed dependency-resolution container
//!
//! Builders are plain functions whose parameters are resolved by type from the
//! container. Each registered instance is built on first use, exactly once,
//! and shared by every caller afterwards.
//!
//! ```
//! use std::sync::Arc;
//! use lazyioc::Container;
//!
//! struct Db;
//! struct Repo {
//!     db: Arc<Db>,
//! }
//!
//! let mut container = Container::new();
//! container.put(|| Arc::new(Db), "db").unwrap();
//! container.put(|db: Arc<Db>| Arc::new(Repo { db }), "repo").unwrap();
//!
//! let repo: Arc<Repo> = container.try_find("repo").unwrap();
//! let db: Arc<Db> = container.try_find("db").unwrap();
//! assert!(Arc::ptr_eq(&repo.db, &db));
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod lazy;
pub mod logging;

pub use config::{ConfigLoader, ContainerSettings, Settings};
pub use container::{CallOutput, Container, ContainerStats, Injectable, Shared, Signature, TypeKey};
pub use error::{BoxError, CallError, ConfigError, RegistrationError, ResolveError};
pub use lazy::{Lazy, LazyState};
pub use logging::{init_logging, LogFormat, LoggingConfig};
