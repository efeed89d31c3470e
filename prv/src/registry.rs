use async_trait::async_trait;
use req_verify_core::RegistryError;

/// Source of published version identifiers for a package name.
///
/// Implementations must be safe to call concurrently; the batch verifier
/// issues one lookup per declaration from many tasks at once.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// All version identifiers published for `package`, in registry order
    async fn get_available_versions(&self, package: &str) -> Result<Vec<String>, RegistryError>;
}
