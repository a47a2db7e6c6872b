//! Secret storage primitives
//!
//! Backends implementing [`SecretBackend`], from volatile memory to a JSON
//! file, plus [`FallbackBackend`] for composing a secure primary with a
//! general-purpose fallback. The platform keychain backend lives in
//! `security::keychain`.

pub mod error;
#[cfg(feature = "observability")]
pub mod fallback;
pub mod file;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
#[cfg(feature = "observability")]
pub use fallback::FallbackBackend;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use traits::SecretBackend;
