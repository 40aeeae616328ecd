//! Settings file and provisioning arguments

pub mod args;
pub mod settings;

pub use args::ProvisionArgs;
pub use settings::{load_settings, parse_settings, Settings};
