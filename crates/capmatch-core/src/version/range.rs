//! Version ranges in interval notation.

use std::fmt;
use std::str::FromStr;

use super::{Version, parse_version};
use crate::error::VersionError;
use crate::filter::FilterExpr;

/// A range of versions.
///
/// Written either in interval notation (`[1.0,2.0)`, `(1.0,2.0]`) or as a
/// bare version, which means "this version or later".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    floor: Version,
    floor_inclusive: bool,
    ceiling: Option<Version>,
    ceiling_inclusive: bool,
}

impl VersionRange {
    /// All versions at or above `floor`.
    pub fn at_least(floor: Version) -> Self {
        Self {
            floor,
            floor_inclusive: true,
            ceiling: None,
            ceiling_inclusive: false,
        }
    }

    /// Exactly one version.
    pub fn exact(version: Version) -> Self {
        Self {
            floor: version.clone(),
            floor_inclusive: true,
            ceiling: Some(version),
            ceiling_inclusive: true,
        }
    }

    /// Interval between two versions.
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

    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let trimmed = text.trim();
        let malformed = |reason: &str| VersionError::MalformedRange {
            text: trimmed.to_string(),
            reason: reason.to_string(),
        };

        let floor_inclusive = match trimmed.chars().next() {
            Some('[') => true,
            Some('(') => false,
            Some(_) => return Ok(Self::at_least(parse_version(trimmed)?)),
            None => return Err(VersionError::Empty),
        };

        let ceiling_inclusive = match trimmed.chars().last() {
            Some(']') if trimmed.len() > 1 => true,
            Some(')') if trimmed.len() > 1 => false,
            _ => return Err(malformed("missing closing ']' or ')'")),
        };

        let inner = &trimmed[1..trimmed.len() - 1];
        let (floor, ceiling) = inner
            .split_once(',')
            .ok_or_else(|| malformed("expected 'floor,ceiling'"))?;
        let floor = parse_version(floor)?;
        let ceiling = parse_version(ceiling)?;
        if ceiling < floor {
            return Err(malformed("ceiling is below floor"));
        }

        Ok(Self::between(floor, floor_inclusive, ceiling, ceiling_inclusive))
    }

    pub fn floor(&self) -> &Version {
        &self.floor
    }

    pub fn ceiling(&self) -> Option<&Version> {
        self.ceiling.as_ref()
    }

    /// Check whether `version` falls inside this range.
    pub fn includes(&self, version: &Version) -> bool {
        let above_floor = if self.floor_inclusive {
            version >= &self.floor
        } else {
            version > &self.floor
        };
        if !above_floor {
            return false;
        }

        match &self.ceiling {
            None => true,
            Some(ceiling) if self.ceiling_inclusive => version <= ceiling,
            Some(ceiling) => version < ceiling,
        }
    }

    /// Render this range as a filter over `attr`.
    ///
    /// `[1.0,2.0)` on `version` becomes `(&(version>=1.0.0)(!(version>=2.0.0)))`.
    pub fn to_filter(&self, attr: &str) -> FilterExpr {
        let floor = if self.floor_inclusive {
            FilterExpr::gte(attr, self.floor.to_string())
        } else {
            FilterExpr::negate(FilterExpr::lte(attr, self.floor.to_string()))
        };

        let Some(ceiling) = &self.ceiling else {
            return floor;
        };

        let ceiling = if self.ceiling_inclusive {
            FilterExpr::lte(attr, ceiling.to_string())
        } else {
            FilterExpr::negate(FilterExpr::gte(attr, ceiling.to_string()))
        };
        FilterExpr::And(vec![floor, ceiling])
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ceiling {
            None if self.floor_inclusive => write!(f, "{}", self.floor),
            None => write!(f, "({},)", self.floor),
            Some(ceiling) => write!(
                f,
                "{}{},{}{}",
                if self.floor_inclusive { '[' } else { '(' },
                self.floor,
                ceiling,
                if self.ceiling_inclusive { ']' } else { ')' },
            ),
        }
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        parse_version(text).unwrap()
    }

    #[test]
    fn test_bare_version_is_open_ended() {
        let range = VersionRange::parse("1.2").unwrap();
        assert!(range.includes(&v("1.2.0")));
        assert!(range.includes(&v("99.0.0")));
        assert!(!range.includes(&v("1.1.9")));
        assert_eq!(range.ceiling(), None);
    }

    #[test]
    fn test_half_open_interval() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(range.includes(&v("1.0.0")));
        assert!(range.includes(&v("1.9.9")));
        assert!(!range.includes(&v("2.0.0")));
        assert!(!range.includes(&v("0.9.0")));
    }

    #[test]
    fn test_exclusive_floor_inclusive_ceiling() {
        let range = VersionRange::parse("(1.0,2.0]").unwrap();
        assert!(!range.includes(&v("1.0.0")));
        assert!(range.includes(&v("2.0.0")));
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["[1.0.0,2.0.0)", "(1.0.0,1.5.0]", "3.1.0"] {
            let range = VersionRange::parse(text).unwrap();
            assert_eq!(range.to_string(), text);
        }
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(VersionRange::parse("[1.0,2.0").is_err());
        assert!(VersionRange::parse("[1.0)").is_err());
        assert!(VersionRange::parse("[2.0,1.0)").is_err());
        assert!(VersionRange::parse("").is_err());
        assert!(VersionRange::parse("[").is_err());
    }

    #[test]
    fn test_to_filter_text() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        assert_eq!(
            range.to_filter("version").to_string(),
            "(&(version>=1.0.0)(!(version>=2.0.0)))"
        );

        let open = VersionRange::parse("1.5").unwrap();
        assert_eq!(open.to_filter("bundle-version").to_string(), "(bundle-version>=1.5.0)");
    }
}
