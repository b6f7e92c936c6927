//! Entity services.
//!
//! Each service wraps one entity kind of the remote platform. Lookups list
//! every entity of the kind and scan for the key, so each `get_*` costs one
//! full list round-trip. Nothing is cached between calls.
//!
//! Creates pre-check by key and report `AlreadyExists` on a hit. The check
//! and the mutation are two separate requests, so a concurrent writer can
//! slip in between them; the remote API is the final arbiter in that case.

pub mod code_location;
pub mod deployment;
pub mod instance;
pub mod team;
pub mod user;

use regex::Regex;

use crate::error::{Error, Result};

pub use code_location::CodeLocationService;
pub use deployment::DeploymentService;
pub use instance::InstanceService;
pub use team::TeamService;
pub use user::UserService;

/// Compile a caller-supplied lookup pattern.
fn compile_pattern(what: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::invalid(what, format!("bad pattern {pattern:?}: {e}")))
}

/// Fold a create pre-check into "free to create" or an error.
///
/// A hit is a conflict, `NotFound` means go ahead, anything else propagates.
fn ensure_absent<T>(lookup: Result<T>, what: &str, key: &str, value: &str) -> Result<()> {
    match lookup {
        Ok(_) => Err(Error::already_exists(what, key, value)),
        Err(err) if err.is_not_found() => {
            tracing::trace!(what, key, value, "create pre-check: absent");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
