use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Constraint sentinel: any published version satisfies the declaration
pub const LATEST: &str = "latest";
/// Constraint sentinel: the declaration points at a local file or directive
pub const LOCAL: &str = "local";
/// Constraint sentinel: the declaration points at an arbitrary URL
pub const URL: &str = "url";

/// How a requirements line was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// `name[extras] op version ; marker`
    Named,
    /// `-r file`, `-c file`, `-e path` and other pip directives
    FileReference,
    /// A line containing an http(s) URL
    UrlReference,
    /// A relative/absolute path or a wheel file
    LocalPathReference,
}

/// One classified line from a requirements file
///
/// Immutable once built; the constructors uphold the per-kind invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDeclaration {
    name: String,
    kind: DeclarationKind,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    extras: BTreeSet<String>,
    version_specs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env_marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_number: Option<usize>,
}

impl PackageDeclaration {
    /// A registry package. An empty constraint list defaults to `latest`.
    pub fn named(
        name: impl Into<String>,
        extras: BTreeSet<String>,
        version_specs: Vec<String>,
        env_marker: Option<String>,
    ) -> Self {
        let version_specs = if version_specs.is_empty() {
            vec![LATEST.to_string()]
        } else {
            version_specs
        };

        Self {
            name: name.into(),
            kind: DeclarationKind::Named,
            extras,
            version_specs,
            env_marker: env_marker.filter(|m| !m.is_empty()),
            line_number: None,
        }
    }

    /// A pip directive such as `-r other.txt`; `line` is kept verbatim
    pub fn file_reference(line: impl Into<String>) -> Self {
        Self::unversioned(line.into(), DeclarationKind::FileReference, &[LOCAL])
    }

    /// A URL requirement; `url` starts at the scheme
    pub fn url_reference(url: impl Into<String>) -> Self {
        Self::unversioned(url.into(), DeclarationKind::UrlReference, &[URL, LATEST])
    }

    /// A local path or wheel file; `line` is kept verbatim
    pub fn local_path(line: impl Into<String>) -> Self {
        Self::unversioned(line.into(), DeclarationKind::LocalPathReference, &[LOCAL])
    }

    fn unversioned(name: String, kind: DeclarationKind, specs: &[&str]) -> Self {
        Self {
            name,
            kind,
            extras: BTreeSet::new(),
            version_specs: specs.iter().map(|s| (*s).to_string()).collect(),
            env_marker: None,
            line_number: None,
        }
    }

    /// Record the 1-based line this declaration came from
    pub fn with_line_number(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    pub fn extras(&self) -> &BTreeSet<String> {
        &self.extras
    }

    pub fn version_specs(&self) -> &[String] {
        &self.version_specs
    }

    pub fn env_marker(&self) -> Option<&str> {
        self.env_marker.as_deref()
    }

    pub fn line_number(&self) -> Option<usize> {
        self.line_number
    }

    /// Only named packages are looked up on the registry
    pub fn requires_registry(&self) -> bool {
        self.kind == DeclarationKind::Named
    }

    /// True when no constraint beyond "some version exists" was declared
    pub fn is_latest_only(&self) -> bool {
        self.version_specs.len() == 1 && self.version_specs[0] == LATEST
    }

    /// Path argument of a `-r`/`-c` style directive.
    ///
    /// Accepts `-r path`, `-rpath`, `--requirement path` and
    /// `--requirement=path` (same for `-c`/`--constraint`). Editable installs
    /// and other options return `None`.
    pub fn referenced_file(&self) -> Option<&str> {
        if self.kind != DeclarationKind::FileReference {
            return None;
        }

        let line = self.name.as_str();
        let rest = ["--requirement", "--constraint"]
            .iter()
            .find_map(|flag| {
                let rest = line.strip_prefix(flag)?;
                if rest.starts_with('=') || rest.starts_with(char::is_whitespace) {
                    Some(rest.strip_prefix('=').unwrap_or(rest))
                } else {
                    None
                }
            })
            .or_else(|| {
                ["-r", "-c"]
                    .iter()
                    .find_map(|flag| line.strip_prefix(flag))
            })?
            .trim();

        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

impl fmt::Display for PackageDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind != DeclarationKind::Named {
            return write!(f, "{}", self.name);
        }

        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        if !self.is_latest_only() {
            write!(f, "{}", self.version_specs.join(","))?;
        }
        if let Some(marker) = &self.env_marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

/// Result of verifying one declaration against the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    #[serde(flatten)]
    pub declaration: PackageDeclaration,
    pub verified: bool,
    /// Human-readable reasons for the outcome
    pub diagnostics: Vec<String>,
}

impl VerificationOutcome {
    pub fn new(declaration: PackageDeclaration, verified: bool, diagnostics: Vec<String>) -> Self {
        Self {
            declaration,
            verified,
            diagnostics,
        }
    }

    /// Diagnostics prefixed with the declaration name
    pub fn labelled_diagnostics(&self) -> impl Iterator<Item = String> + '_ {
        self.diagnostics
            .iter()
            .map(|d| format!("{}: {d}", self.declaration.name()))
    }
}

/// Everything a caller needs to render the result of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub verified: Vec<VerificationOutcome>,
    pub unverified: Vec<VerificationOutcome>,
    /// Parse and processing errors
    pub errors: Vec<String>,
    /// All diagnostics, labelled with the declaration they belong to
    pub details: Vec<String>,
}

impl Report {
    pub fn new(
        verified: Vec<VerificationOutcome>,
        unverified: Vec<VerificationOutcome>,
        errors: Vec<String>,
    ) -> Self {
        let details = verified
            .iter()
            .chain(unverified.iter())
            .flat_map(VerificationOutcome::labelled_diagnostics)
            .collect();

        Self {
            verified,
            unverified,
            errors,
            details,
        }
    }

    /// Nothing failed verification and no line was rejected
    pub fn is_clean(&self) -> bool {
        self.unverified.is_empty() && self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_named_defaults_to_latest() {
        let decl = PackageDeclaration::named("requests", BTreeSet::new(), Vec::new(), None);
        assert_eq!(decl.version_specs(), ["latest"]);
        assert!(decl.is_latest_only());
        assert!(decl.requires_registry());
    }

    #[test]
    fn test_unversioned_kinds() {
        let file = PackageDeclaration::file_reference("-r more.txt");
        assert_eq!(file.kind(), DeclarationKind::FileReference);
        assert_eq!(file.version_specs(), ["local"]);
        assert!(file.extras().is_empty());
        assert!(file.env_marker().is_none());

        let url = PackageDeclaration::url_reference("https://example.com/pkg.zip");
        assert_eq!(url.version_specs(), ["url", "latest"]);
        assert!(!url.requires_registry());

        let local = PackageDeclaration::local_path("./dist/x.whl");
        assert_eq!(local.version_specs(), ["local"]);
    }

    #[test]
    fn test_referenced_file() {
        let cases = [
            ("-r more.txt", Some("more.txt")),
            ("-rmore.txt", Some("more.txt")),
            ("-c constraints.txt", Some("constraints.txt")),
            ("--requirement base.txt", Some("base.txt")),
            ("--constraint=pins.txt", Some("pins.txt")),
            ("-e .", None),
            ("--index-url https://example.com", None),
            ("-r", None),
        ];

        for (line, expected) in cases {
            let decl = PackageDeclaration::file_reference(line);
            assert_eq!(decl.referenced_file(), expected, "line: {line}");
        }

        let named = PackageDeclaration::named("r", BTreeSet::new(), Vec::new(), None);
        assert_eq!(named.referenced_file(), None);
    }

    #[test]
    fn test_display_named() {
        let extras: BTreeSet<String> = ["security".to_string(), "socks".to_string()].into();
        let decl = PackageDeclaration::named(
            "requests",
            extras,
            specs(&[">=2.8.1", "<3"]),
            Some("python_version < \"3.8\"".to_string()),
        );
        assert_eq!(
            decl.to_string(),
            "requests[security,socks]>=2.8.1,<3; python_version < \"3.8\""
        );

        let bare = PackageDeclaration::named("flask", BTreeSet::new(), Vec::new(), None);
        assert_eq!(bare.to_string(), "flask");
    }

    #[test]
    fn test_report_details_and_clean() {
        let ok = VerificationOutcome::new(
            PackageDeclaration::named("flask", BTreeSet::new(), Vec::new(), None),
            true,
            vec!["found 3 published versions".to_string()],
        );
        let report = Report::new(vec![ok], Vec::new(), Vec::new());

        assert!(report.is_clean());
        assert_eq!(report.verified.len(), 1);
        assert_eq!(report.details, ["flask: found 3 published versions"]);

        let with_error = Report::new(Vec::new(), Vec::new(), vec!["bad line".to_string()]);
        assert!(!with_error.is_clean());
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = VerificationOutcome::new(
            PackageDeclaration::named("flask", BTreeSet::new(), specs(&[">=2.0"]), None)
                .with_line_number(2),
            true,
            Vec::new(),
        );
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["name"], "flask");
        assert_eq!(json["kind"], "named");
        assert_eq!(json["version_specs"][0], ">=2.0");
        assert_eq!(json["line_number"], 2);
        assert_eq!(json["verified"], true);
        assert!(json.get("extras").is_none());
    }
}
