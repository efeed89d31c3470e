pub mod error;
pub mod output;
pub mod types;
pub mod verifier;
pub mod version;

// Re-export commonly used types at crate root
pub use error::{ConstraintError, ParseError, RegistryError};
pub use output::ReportRenderer;
pub use types::{DeclarationKind, PackageDeclaration, Report, VerificationOutcome};
pub use verifier::{parse_version_specifier, verify};
pub use version::{Operator, Specifier, Version};
