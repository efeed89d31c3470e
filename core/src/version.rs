use crate::error::ConstraintError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A loosely written semantic version
///
/// Accepts `1`, `1.2`, `1.2.3`, an optional leading `v`, a `-prerelease`
/// and a `+build` suffix. Missing components default to zero; the number
/// of components actually written is kept as `precision`.
#[derive(Debug, Clone)]
pub struct Version {
    inner: semver::Version,
    precision: usize,
    original: String,
}

impl Version {
    /// Number of release components written in the source string (1-3)
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Release components padded to three
    fn release_full(&self) -> [u64; 3] {
        [self.inner.major, self.inner.minor, self.inner.patch]
    }
}

impl FromStr for Version {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let original = s.trim();
        let invalid = || ConstraintError::InvalidVersion(original.to_string());

        let s = original.strip_prefix('v').unwrap_or(original);

        // Build metadata, then pre-release
        let (rest, build) = match s.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (s, None),
        };
        let (base, pre) = match rest.split_once('-') {
            Some((base, pre)) => (base, Some(pre)),
            None => (rest, None),
        };

        let parts: Vec<&str> = base.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(invalid());
        }

        let mut release = [0u64; 3];
        for (slot, part) in release.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        let mut normalized = format!("{}.{}.{}", release[0], release[1], release[2]);
        if let Some(pre) = pre {
            normalized.push('-');
            normalized.push_str(pre);
        }
        if let Some(build) = build {
            normalized.push('+');
            normalized.push_str(build);
        }

        let inner = semver::Version::parse(&normalized).map_err(|_| invalid())?;

        Ok(Version {
            inner,
            precision: parts.len(),
            original: original.to_string(),
        })
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Ord for Version {
    // SemVer precedence: build metadata does not participate
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp_precedence(&other.inner)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Comparison operator of a single version constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// ==
    Equal,
    /// >=
    GreaterOrEqual,
    /// <=
    LessOrEqual,
    /// >
    Greater,
    /// <
    Less,
    /// ~=
    Compatible,
    /// !=
    NotEqual,
}

impl Operator {
    /// Recognition order: two-character operators before their prefixes
    pub const ALL: [Operator; 7] = [
        Operator::Equal,
        Operator::GreaterOrEqual,
        Operator::LessOrEqual,
        Operator::Greater,
        Operator::Less,
        Operator::Compatible,
        Operator::NotEqual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::Compatible => "~=",
            Operator::NotEqual => "!=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Exact(Version),
    /// `1.2.*`: release components that must match
    Prefix(Vec<u64>),
}

/// A single parsed constraint such as `>=2.0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub operator: Operator,
    pub target: Target,
    raw_target: String,
}

impl Specifier {
    /// Build a specifier from an operator and the (trimmed) target text
    pub fn new(operator: Operator, target: &str) -> Result<Self, ConstraintError> {
        let parsed = if let Some(prefix) = target.strip_suffix(".*") {
            if !matches!(operator, Operator::Equal | Operator::NotEqual) {
                return Err(ConstraintError::UnsupportedWildcard {
                    operator: operator.to_string(),
                    target: target.to_string(),
                });
            }
            let components = prefix
                .split('.')
                .map(str::parse::<u64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ConstraintError::InvalidVersion(target.to_string()))?;
            Target::Prefix(components)
        } else {
            let version = Version::from_str(target)?;
            if operator == Operator::Compatible && version.precision() < 2 {
                return Err(ConstraintError::InvalidCompatibleRelease(target.to_string()));
            }
            Target::Exact(version)
        };

        Ok(Self {
            operator,
            target: parsed,
            raw_target: target.to_string(),
        })
    }

    /// Check if a version satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        match &self.target {
            Target::Prefix(prefix) => {
                let full = version.release_full();
                let same = prefix.len() <= 3 && full.iter().zip(prefix).all(|(a, b)| a == b);
                match self.operator {
                    Operator::NotEqual => !same,
                    _ => same,
                }
            }
            Target::Exact(target) => match self.operator {
                Operator::Equal => version == target,
                Operator::NotEqual => version != target,
                Operator::GreaterOrEqual => version >= target,
                Operator::LessOrEqual => version <= target,
                Operator::Greater => version > target,
                Operator::Less => version < target,
                Operator::Compatible => {
                    // ~=X.Y   -> >=X.Y, ==X.*
                    // ~=X.Y.Z -> >=X.Y.Z, ==X.Y.*
                    let fixed = target.precision() - 1;
                    version >= target
                        && version.release_full()[..fixed] == target.release_full()[..fixed]
                }
            },
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.raw_target)
    }
}
