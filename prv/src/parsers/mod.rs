pub mod requirements;

pub use requirements::{parse_file, parse_line, ParsedRequirements, RequirementsParser};
