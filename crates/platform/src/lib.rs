//! Platform detection and host facts for jrebuild
//!
//! This crate answers the questions the build pipeline asks about the
//! machine it runs on:
//! - OS and architecture identifiers (as used in artifact names)
//! - OS version string for the release metadata file
//! - Hostname, username, CPU count, total memory

mod error;
mod host;
mod platform;

pub use error::PlatformError;
pub use host::HostInfo;
pub use platform::{Arch, Os, Platform};
