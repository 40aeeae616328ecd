//! Coarse platform detection used to route task phases

use std::env;
use std::fmt;

/// The platform families a task can provide phase implementations for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux and every other non-Windows system
    Posix,
    Windows,
}

impl Platform {
    /// Detect the current platform
    pub fn current() -> Self {
        Self::from_os(env::consts::OS)
    }

    /// Map an OS identifier (as in `std::env::consts::OS`) to a platform family.
    /// Unknown identifiers fall back to [`Platform::Posix`].
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            _ => Self::Posix,
        }
    }

    /// Directory holding the interpreter and pip inside a virtual environment
    pub fn venv_bin_dir(&self) -> &'static str {
        match self {
            Self::Posix => "bin",
            Self::Windows => "Scripts",
        }
    }

    /// Suffix of executables on this platform
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Self::Posix => "",
            Self::Windows => ".exe",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix => write!(f, "posix"),
            Self::Windows => write!(f, "windows"),
        }
    }
}
