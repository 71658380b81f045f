mod build;
mod descriptor;
mod fetch;
mod info;
mod prepare;
mod verify;

pub use build::cmd_build;
pub use descriptor::cmd_descriptor;
pub use fetch::cmd_fetch;
pub use info::cmd_info;
pub use prepare::cmd_prepare;
pub use verify::cmd_verify;
