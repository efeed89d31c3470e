use crate::error::ConstraintError;
use crate::types::{DeclarationKind, PackageDeclaration, VerificationOutcome, URL};
use crate::version::{Operator, Specifier, Version};
use std::str::FromStr;

/// Split a raw constraint such as `>= 2.0` into operator and target.
///
/// The target is not parsed here; only the operator must be recognized.
pub fn parse_version_specifier(spec: &str) -> Result<(Operator, String), ConstraintError> {
    let spec = spec.trim();

    Operator::ALL
        .iter()
        .find_map(|op| {
            spec.strip_prefix(op.as_str())
                .map(|target| (*op, target.trim().to_string()))
        })
        .ok_or_else(|| ConstraintError::UnknownOperator(spec.to_string()))
}

/// Decide whether a declaration is satisfiable by the published versions.
///
/// `registry_versions` is taken in registry order; nothing is sorted.
/// Never fails: every problem becomes a diagnostic on an unverified outcome.
pub fn verify(declaration: PackageDeclaration, registry_versions: &[String]) -> VerificationOutcome {
    match declaration.kind() {
        DeclarationKind::Named => verify_named(declaration, registry_versions),
        DeclarationKind::UrlReference => {
            debug_assert!(declaration.version_specs().iter().any(|s| s == URL));
            VerificationOutcome::new(
                declaration,
                true,
                vec!["URL reference accepted without a version check".to_string()],
            )
        }
        DeclarationKind::FileReference | DeclarationKind::LocalPathReference => {
            VerificationOutcome::new(
                declaration,
                true,
                vec!["local reference cannot be version-checked; accepted as present".to_string()],
            )
        }
    }
}

fn verify_named(declaration: PackageDeclaration, registry_versions: &[String]) -> VerificationOutcome {
    if declaration.is_latest_only() {
        let (verified, diagnostic) = if registry_versions.is_empty() {
            (false, "no published versions found".to_string())
        } else {
            (true, format!("{} published versions found", registry_versions.len()))
        };
        return VerificationOutcome::new(declaration, verified, vec![diagnostic]);
    }

    // The first equality spec alone decides the outcome
    let pinned = declaration
        .version_specs()
        .iter()
        .find_map(|spec| spec.strip_prefix("=="))
        .map(|target| target.trim().to_string());
    if let Some(target) = pinned {
        let found = registry_versions.iter().any(|v| *v == target);
        let diagnostic = if found {
            format!("version '{target}' is published")
        } else {
            format!(
                "specified version '{target}' not found for package '{}'",
                declaration.name()
            )
        };
        return VerificationOutcome::new(declaration, found, vec![diagnostic]);
    }

    let mut diagnostics = Vec::new();
    let mut specifiers = Vec::with_capacity(declaration.version_specs().len());
    for spec in declaration.version_specs() {
        match parse_version_specifier(spec).and_then(|(op, target)| Specifier::new(op, &target)) {
            Ok(specifier) => specifiers.push(specifier),
            Err(e) => diagnostics.push(format!("error parsing version specifier '{spec}': {e}")),
        }
    }
    if !diagnostics.is_empty() {
        // A malformed constraint fails every candidate
        return VerificationOutcome::new(declaration, false, diagnostics);
    }

    let mut skipped = Vec::new();
    let mut satisfying = None;
    for candidate in registry_versions {
        let Ok(version) = Version::from_str(candidate) else {
            skipped.push(candidate.as_str());
            continue;
        };
        if specifiers.iter().all(|s| s.matches(&version)) {
            satisfying = Some(candidate);
            break;
        }
    }

    if !skipped.is_empty() {
        diagnostics.push(format!(
            "skipped {} registry versions that are not valid semantic versions: {}",
            skipped.len(),
            skipped.join(", ")
        ));
    }

    let constraint = declaration.version_specs().join(",");
    let verified = match satisfying {
        Some(version) => {
            diagnostics.push(format!("version '{version}' satisfies '{constraint}'"));
            true
        }
        None => {
            diagnostics.push(format!("no published version satisfies '{constraint}'"));
            false
        }
    };

    VerificationOutcome::new(declaration, verified, diagnostics)
}
