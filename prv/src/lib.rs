pub mod batch;
pub mod cli;
pub mod config;
pub mod logging;
pub mod parsers;
pub mod pypi;
pub mod registry;

pub use batch::{BatchOptions, BatchOutcome, verify_batch};
pub use cli::{Args, OutputFormat};
pub use config::{ConfigError, VerifyConfig};
pub use parsers::{RequirementsParser, parse_file, parse_line};
pub use pypi::PyPiClient;
pub use registry::RegistryLookup;

// Re-export core types for convenience
pub use req_verify_core::{
    ConstraintError, DeclarationKind, PackageDeclaration, ParseError, RegistryError, Report,
    ReportRenderer, VerificationOutcome, Version, parse_version_specifier, verify,
};
