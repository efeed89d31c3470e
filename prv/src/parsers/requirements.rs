use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use req_verify_core::{PackageDeclaration, ParseError};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// `name` followed by an optional `[extras]` block
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9_\-]+)\s*(\[[^\]]*\])?").expect("name pattern is a valid regex")
});

/// Classify a single requirements line.
///
/// Blank and comment-only lines yield `Ok(None)`. Only a line that looks like
/// a named requirement but does not start with a valid name is an error.
pub fn parse_line(raw_line: &str) -> Result<Option<PackageDeclaration>, ParseError> {
    let line = raw_line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let line = strip_inline_comment(line).trim_end();
    if line.is_empty() {
        return Ok(None);
    }

    // -r, -c, -e and any other pip option
    if line.starts_with('-') {
        debug!(line, "requirements line references another file or option");
        return Ok(Some(PackageDeclaration::file_reference(line)));
    }

    if let Some(idx) = line.find("http") {
        return Ok(Some(PackageDeclaration::url_reference(&line[idx..])));
    }

    if line.starts_with('.') || line.starts_with('/') || line.ends_with(".whl") {
        debug!(line, "local path cannot be checked against the registry");
        return Ok(Some(PackageDeclaration::local_path(line)));
    }

    let captures = NAME_PATTERN
        .captures(line)
        .ok_or_else(|| ParseError::InvalidFormat {
            line: line.to_string(),
        })?;

    // Group 0 always exists on a successful match
    let prefix_len = captures.get(0).map_or(0, |m| m.end());
    let name = captures.get(1).map_or("", |m| m.as_str());
    let extras = captures
        .get(2)
        .map(|m| parse_extras(m.as_str()))
        .unwrap_or_default();

    let mut rest = line[prefix_len..].trim();
    let mut env_marker = None;
    if let Some((specs, marker)) = rest.split_once(';') {
        rest = specs.trim();
        env_marker = Some(marker.trim().to_string());
    }

    let version_specs = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(|s| s.trim().to_string()).collect()
    };

    Ok(Some(PackageDeclaration::named(
        name,
        extras,
        version_specs,
        env_marker,
    )))
}

/// Classify every line of a requirements file.
///
/// Lines are classified in parallel; the call returns once all of them are
/// done, with declarations and errors in file order. A failing line never
/// stops the others.
pub fn parse_file(content: &[u8]) -> (Vec<PackageDeclaration>, Vec<ParseError>) {
    let text = String::from_utf8_lossy(content);
    let lines: Vec<&str> = text.lines().collect();

    let results: Vec<Result<Option<PackageDeclaration>, ParseError>> = lines
        .par_iter()
        .enumerate()
        .map(|(idx, line)| {
            let line_number = idx + 1;
            parse_line(line)
                .map(|decl| decl.map(|d| d.with_line_number(line_number)))
                .map_err(|e| e.at_line(line_number))
        })
        .collect();

    let mut declarations = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(Some(declaration)) => declarations.push(declaration),
            Ok(None) => {}
            Err(e) => {
                warn!("skipping unparsable requirements line: {e}");
                errors.push(e);
            }
        }
    }

    (declarations, errors)
}

/// Truncate at the first `#` that is not escaped with a backslash
fn strip_inline_comment(line: &str) -> &str {
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '#' if !escaped => return &line[..idx],
            '\\' => escaped = !escaped,
            _ => escaped = false,
        }
    }
    line
}

fn parse_extras(bracketed: &str) -> BTreeSet<String> {
    bracketed
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// Declarations and errors gathered from one or more requirements files
#[derive(Debug, Clone, Default)]
pub struct ParsedRequirements {
    pub declarations: Vec<PackageDeclaration>,
    /// Parse errors, labelled with the file they came from
    pub errors: Vec<String>,
}

/// Parser for requirements.txt files
#[derive(Debug, Default)]
pub struct RequirementsParser;

impl RequirementsParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a single requirements file
    pub fn parse_path(&self, path: &Path) -> Result<ParsedRequirements> {
        self.collect(path, false)
    }

    /// Parse a requirements file, optionally following `-r`/`-c` references.
    ///
    /// Referenced paths resolve against the directory of the file that
    /// names them and each file is read at most once. Failing to read the
    /// top-level file is an error; failing to read a referenced file is
    /// reported in `errors`.
    pub fn collect(&self, path: &Path, follow_refs: bool) -> Result<ParsedRequirements> {
        let content = fs::read(path)
            .with_context(|| format!("Failed to read requirements file: {}", path.display()))?;

        let mut parsed = ParsedRequirements::default();
        let mut visited = HashSet::new();
        let mut pending = VecDeque::new();

        visited.insert(canonical(path));
        Self::absorb(path, &content, follow_refs, &mut parsed, &mut pending);

        while let Some(next) = pending.pop_front() {
            if !visited.insert(canonical(&next)) {
                continue;
            }

            match fs::read(&next) {
                Ok(content) => {
                    Self::absorb(&next, &content, follow_refs, &mut parsed, &mut pending);
                }
                Err(e) => {
                    warn!(path = %next.display(), "failed to read referenced requirements file");
                    parsed.errors.push(format!(
                        "{}: failed to read referenced file: {e}",
                        next.display()
                    ));
                }
            }
        }

        Ok(parsed)
    }

    fn absorb(
        path: &Path,
        content: &[u8],
        follow_refs: bool,
        parsed: &mut ParsedRequirements,
        pending: &mut VecDeque<PathBuf>,
    ) {
        let (declarations, errors) = parse_file(content);
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        if follow_refs {
            let references = declarations
                .iter()
                .filter_map(PackageDeclaration::referenced_file);
            for reference in references {
                debug!(reference, from = %path.display(), "following requirements reference");
                pending.push_back(base_dir.join(reference));
            }
        }

        parsed.declarations.extend(declarations);
        parsed
            .errors
            .extend(errors.iter().map(|e| format!("{}: {e}", path.display())));
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
