//! Module versions and version ranges
//!
//! Provides [`Version`] (`major.minor.micro[.qualifier]`) and
//! [`VersionRange`] in interval notation, as used by module descriptors
//! and artifact identities.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Module version
///
/// Missing numeric parts default to zero, so `1.2` equals `1.2.0`.
/// Ordering is numeric on the three components, then lexicographic on the
/// qualifier (an empty qualifier sorts first).
///
/// # Examples
/// - `1` → `1.0.0`
/// - `2.1.0.RELEASE` → major 2, minor 1, micro 0, qualifier `RELEASE`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u32,
    minor: u32,
    micro: u32,
    qualifier: String,
}

impl Version {
    /// Create version without qualifier
    #[inline]
    #[must_use]
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// The `0.0.0` version
    #[inline]
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Attach a qualifier, returning new version
    #[inline]
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// Parse a version string
    ///
    /// # Errors
    /// Returns error if the string is empty or a numeric part is malformed
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        s.parse()
    }

    /// Major component
    #[inline]
    #[must_use]
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor component
    #[inline]
    #[must_use]
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Micro component
    #[inline]
    #[must_use]
    pub fn micro(&self) -> u32 {
        self.micro
    }

    /// Qualifier (empty when absent)
    #[inline]
    #[must_use]
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// `major.minor` rendering used when naming scopes
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let mut parts = trimmed.splitn(4, '.');
        let mut numeric = [0u32; 3];
        for slot in &mut numeric {
            match parts.next() {
                Some(part) => {
                    *slot = part
                        .parse()
                        .map_err(|_| VersionError::InvalidVersion(trimmed.to_string()))?;
                }
                None => break,
            }
        }

        let qualifier = parts.next().unwrap_or_default();
        if qualifier
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && c != '_' && c != '-')
        {
            return Err(VersionError::InvalidVersion(trimmed.to_string()));
        }

        Ok(Self {
            major: numeric[0],
            minor: numeric[1],
            micro: numeric[2],
            qualifier: qualifier.to_string(),
        })
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

/// Range of acceptable versions
///
/// Interval notation: `[1.0,2.0)` includes `1.0` and excludes `2.0`.
/// A bare version such as `1.0` means "at least 1.0" with no ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    floor: Version,
    floor_inclusive: bool,
    ceiling: Option<Version>,
    ceiling_inclusive: bool,
}

impl VersionRange {
    /// Range `[floor, ∞)`
    #[inline]
    #[must_use]
    pub fn at_least(floor: Version) -> Self {
        Self {
            floor,
            floor_inclusive: true,
            ceiling: None,
            ceiling_inclusive: false,
        }
    }

    /// Range matching every version
    #[inline]
    #[must_use]
    pub fn unbounded() -> Self {
        Self::at_least(Version::zero())
    }

    /// Range `[version, version]`
    #[inline]
    #[must_use]
    pub fn exactly(version: Version) -> Self {
        Self {
            floor: version.clone(),
            floor_inclusive: true,
            ceiling: Some(version),
            ceiling_inclusive: true,
        }
    }

    /// Bounded range with explicit inclusivity
    #[must_use]
    pub fn between(
        floor: Version,
        floor_inclusive: bool,
        ceiling: Version,
        ceiling_inclusive: bool,
    ) -> Self {
        Self {
            floor,
            floor_inclusive,
            ceiling: Some(ceiling),
            ceiling_inclusive,
        }
    }

    /// Parse a range string
    ///
    /// # Errors
    /// Returns error on malformed brackets or versions
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        s.parse()
    }

    /// Lower bound
    #[inline]
    #[must_use]
    pub fn floor(&self) -> &Version {
        &self.floor
    }

    /// Upper bound, if any
    #[inline]
    #[must_use]
    pub fn ceiling(&self) -> Option<&Version> {
        self.ceiling.as_ref()
    }

    /// Whether `version` lies inside this range
    #[must_use]
    pub fn includes(&self, version: &Version) -> bool {
        let above_floor = if self.floor_inclusive {
            version >= &self.floor
        } else {
            version > &self.floor
        };
        let below_ceiling = match &self.ceiling {
            None => true,
            Some(ceiling) if self.ceiling_inclusive => version <= ceiling,
            Some(ceiling) => version < ceiling,
        };
        above_floor && below_ceiling
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.ceiling {
            None if self.floor_inclusive => write!(f, "{}", self.floor),
            None => write!(f, "({},)", self.floor),
            Some(ceiling) => write!(
                f,
                "{}{},{}{}",
                if self.floor_inclusive { '[' } else { '(' },
                self.floor,
                ceiling,
                if self.ceiling_inclusive { ']' } else { ')' }
            ),
        }
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let floor_inclusive = match trimmed.chars().next() {
            Some('[') => true,
            Some('(') => false,
            Some(_) => return Ok(Self::at_least(trimmed.parse()?)),
            None => return Err(VersionError::Empty),
        };

        let ceiling_inclusive = match trimmed.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(VersionError::InvalidRange(trimmed.to_string())),
        };

        let inner = &trimmed[1..trimmed.len() - 1];
        let (floor, ceiling) = inner
            .split_once(',')
            .ok_or_else(|| VersionError::InvalidRange(trimmed.to_string()))?;

        let floor: Version = floor.parse()?;
        if ceiling.trim().is_empty() {
            return Ok(Self {
                floor,
                floor_inclusive,
                ceiling: None,
                ceiling_inclusive: false,
            });
        }

        Ok(Self::between(
            floor,
            floor_inclusive,
            ceiling.parse()?,
            ceiling_inclusive,
        ))
    }
}

impl TryFrom<String> for VersionRange {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRange> for String {
    fn from(value: VersionRange) -> Self {
        value.to_string()
    }
}

/// Errors related to versions and ranges
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Empty input
    #[error("version is empty")]
    Empty,

    /// Malformed version
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    /// Malformed range
    #[error("invalid version range: {0}")]
    InvalidRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_version_defaults_missing_parts() {
        assert_eq!(v("1"), Version::new(1, 0, 0));
        assert_eq!(v("1.2"), Version::new(1, 2, 0));
        assert_eq!(v(" 1.2.3 "), Version::new(1, 2, 3));
    }

    #[test]
    fn test_version_qualifier() {
        let version = v("2.1.0.RELEASE");
        assert_eq!(version.qualifier(), "RELEASE");
        assert_eq!(version.to_string(), "2.1.0.RELEASE");
        assert!(version > Version::new(2, 1, 0));
    }

    #[test]
    fn test_version_rejects_garbage() {
        assert!(matches!("".parse::<Version>(), Err(VersionError::Empty)));
        assert!(matches!(
            "1.x".parse::<Version>(),
            Err(VersionError::InvalidVersion(_))
        ));
        assert!("1.0.0.bad qualifier".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_short() {
        assert_eq!(v("3.6.2").short(), "3.6");
    }

    #[test]
    fn test_range_half_open() {
        let range: VersionRange = "[1.0,2.0)".parse().unwrap();
        assert!(range.includes(&v("1.0")));
        assert!(range.includes(&v("1.9.9")));
        assert!(!range.includes(&v("2.0")));
        assert!(!range.includes(&v("0.9")));
    }

    #[test]
    fn test_range_exclusive_floor() {
        let range: VersionRange = "(1.0,2.0]".parse().unwrap();
        assert!(!range.includes(&v("1.0")));
        assert!(range.includes(&v("2.0")));
    }

    #[test]
    fn test_range_bare_version_is_minimum() {
        let range: VersionRange = "1.5".parse().unwrap();
        assert!(range.includes(&v("1.5")));
        assert!(range.includes(&v("99")));
        assert!(!range.includes(&v("1.4")));
        assert_eq!(range.to_string(), "1.5.0");
    }

    #[test]
    fn test_range_exactly() {
        let range = VersionRange::exactly(v("1.2.3"));
        assert!(range.includes(&v("1.2.3")));
        assert!(!range.includes(&v("1.2.4")));
        assert_eq!(range.to_string(), "[1.2.3,1.2.3]");
    }

    #[test]
    fn test_range_rejects_malformed() {
        assert!(matches!(
            "[1.0,2.0".parse::<VersionRange>(),
            Err(VersionError::InvalidRange(_))
        ));
        assert!(matches!(
            "[1.0]".parse::<VersionRange>(),
            Err(VersionError::InvalidRange(_))
        ));
        assert!(matches!("".parse::<VersionRange>(), Err(VersionError::Empty)));
    }

    #[test]
    fn test_range_display_parses_back() {
        let range: VersionRange = "(1.0,2.0]".parse().unwrap();
        let reparsed: VersionRange = range.to_string().parse().unwrap();
        assert_eq!(range, reparsed);
    }
}
