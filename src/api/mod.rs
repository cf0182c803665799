//! Purpose: Define the stable public Rust API boundary for waitforservice.
//! Exports: Types and operations needed by the CLI and embedders.
//! Role: Public, additive-only surface over `core`.
//! Invariants: New backends plug in through `PropertyBackend` only.

pub use crate::core::backend::PropertyBackend;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::glob::GlobPattern;
pub use crate::core::matcher::{DEFAULT_TARGET, Matcher, evaluate};
pub use crate::core::memory::MemoryBackend;
pub use crate::core::native::{
    DEFAULT_BIONIC_LIBC, DEFAULT_HYBRIS_LIB, DEFAULT_PROPERTIES_LIB, NativeBackend, NativeLibraries,
};
pub use crate::core::property::{Property, PropertySnapshot};
pub use crate::core::ready::{DEFAULT_READY_MARKER, ReadinessGate};
pub use crate::core::wait::{PropertyMatch, WaitState, Waiter, wait_for_match};

/// Environment variable selecting the target value when `--value` is absent.
pub const VALUE_ENV: &str = "WAITFORSERVICE_VALUE";

/// Resolves the target value: explicit flag, then `WAITFORSERVICE_VALUE`, then `running`.
///
/// The environment value is taken verbatim, including an empty string.
pub fn resolve_target(flag: Option<String>) -> String {
    flag.or_else(|| {
        std::env::var_os(VALUE_ENV).map(|value| value.to_string_lossy().into_owned())
    })
    .unwrap_or_else(|| DEFAULT_TARGET.to_string())
}
