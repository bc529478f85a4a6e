use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::GitError;

/// Up to four dot-separated numbers; the first run of digits wins
static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)(?:\.([0-9]+)(?:\.([0-9]+)(?:\.([0-9]+))?)?)?")
        .expect("Invalid version regex")
});

/// Represents a git version
///
/// Field order gives the derived ordering: major, minor, patch, build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
}

impl GitVersion {
    pub const fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }

    /// Extract a version from free-form text like "git version 2.39.2.windows.1"
    ///
    /// Missing components default to 0. Returns `None` when the text holds no
    /// number at all, or a component does not fit in a `u32`.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION_REGEX.captures(text)?;
        let component = |i: usize| -> Option<u32> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };

        Some(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
            build: component(4)?,
        })
    }

    /// Check if this version meets a minimum requirement (equal counts)
    pub fn is_at_least(&self, required: &GitVersion) -> bool {
        self >= required
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

impl FromStr for GitVersion {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| GitError::VersionUndetermined(s.to_string()))
    }
}
