//! jrebuild-lib: the static-JRE build pipeline
//!
//! This crate drives the production of a statically-linked OpenJDK JRE
//! tarball on a FreeBSD host, as a strict linear pipeline:
//!
//! 1. `prepare` - package repositories, bootstrap toolchain, build tools
//! 2. `fetch` - shallow clone of the OpenJDK source tree
//! 3. `configure` - bootstrap selection and the upstream configure step
//! 4. `build` - the upstream parallel `gmake images` build
//! 5. `assemble` - locate the built image and prune it to a JRE
//! 6. `package` - strip, write release metadata, create the tarball
//! 7. `verify` - run the produced binary, inspect its linkage
//!
//! Every substantive operation is delegated to external systems (`pkg`,
//! the OpenJDK build, `strip`, `ldd`); this crate sequences them,
//! retries the network-facing ones, and inspects exit codes and the
//! filesystem to decide pass/fail.

pub mod assemble;
pub mod build;
pub mod config;
pub mod configure;
pub mod consts;
pub mod descriptor;
pub mod exec;
pub mod fetch;
pub mod package;
pub mod pipeline;
pub mod prepare;
pub mod verify;
pub mod versions;
