//! arestor Core Library
//!
//! This is the core library of arestor, the tool that prepares machines to run
//! the Argus-CI test suites. It provides the task lifecycle, the retrying
//! command executor and the fail-fast task runner the install actions are
//! built from.
//!
//! ## Architecture
//!
//! The core library is organized into several modules:
//!
//! - [`provisioner`] - High-level interface running the named install actions
//! - [`execution`] - Process spawning, command retries, task ordering and the task runner
//! - [`lifecycle`] - The prologue/work/epilogue contract and platform routing
//! - [`tasks`] - The concrete provisioning tasks
//! - [`template`] - `key = value` configuration templating
//! - [`cloud`] - OpenStack lookups for the Tempest configuration
//! - [`configs`] - Settings file and provisioning arguments
//! - [`platform`] - Coarse platform detection
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! The primary entry point is the [`Provisioner`]:
//!
//! ```rust,no_run
//! use arestor_core::provisioner::{InstallAction, Provisioner, ProvisionerConfig};
//!
//! # fn example() -> arestor_core::types::ArestorResult<()> {
//! let provisioner = Provisioner::new(ProvisionerConfig { settings_path: None })?;
//! let args = provisioner.default_args(InstallAction::Dependences);
//! let succeeded = provisioner.run(InstallAction::Dependences, args)?;
//! # Ok(())
//! # }
//! ```

pub mod cloud;
pub mod configs;
pub mod execution;
pub mod lifecycle;
pub mod platform;
pub mod provisioner;
pub mod tasks;
pub mod template;
pub mod types;

// Re-export the main types for easier usage
pub use provisioner::{InstallAction, Provisioner, ProvisionerConfig};
pub use types::{ArestorError, ArestorResult};
