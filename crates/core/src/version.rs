//! Version range resolution.
//!
//! A range is `<sign><major>.<minor>.<patch>[-prerelease]` with sign one of
//! `=`, `~` or `^`. Resolution walks the known versions newest first and
//! returns the first one the range accepts.
//!
//! Versions are compared with a natural ordering: each string is split into
//! alternating runs of digits and non-digits, digit runs compare as integers
//! and everything else compares lexically. This is not semver. Under it
//! `1.0.0` sorts *before* `1.0.0-beta.1` (a shorter run sequence that is a
//! prefix of a longer one is smaller), which is why prereleases get the
//! explicit acceptance rules in [`VersionRange::accepts`].

#![allow(clippy::expect_used)] // the range pattern is a literal

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::{Error, Result};

static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([=~^])(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z][0-9A-Za-z.-]*))?$")
        .expect("range pattern is valid")
});

/// The leading operator of a range expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// `=`: exactly this version string.
    Exact,
    /// `~`: same major and minor.
    Tilde,
    /// `^`: same major (same minor while major is 0).
    Caret,
}

/// A parsed version range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    sign: Sign,
    major: u64,
    minor: u64,
    patch: u64,
    prerelease: Option<String>,
}

impl VersionRange {
    /// Parse a range expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRange`] if `range` does not match
    /// `<sign><major>.<minor>.<patch>[-prerelease]`.
    pub fn parse(range: &str) -> Result<Self> {
        let caps = RANGE_PATTERN
            .captures(range)
            .ok_or_else(|| Error::malformed_range(range))?;

        let sign = match &caps[1] {
            "=" => Sign::Exact,
            "~" => Sign::Tilde,
            _ => Sign::Caret,
        };
        let number = |index: usize| {
            caps[index]
                .parse::<u64>()
                .map_err(|_| Error::malformed_range(range))
        };

        Ok(Self {
            raw: range.to_string(),
            sign,
            major: number(2)?,
            minor: number(3)?,
            patch: number(4)?,
            prerelease: caps.get(5).map(|m| m.as_str().to_string()),
        })
    }

    /// The range operator.
    #[must_use]
    pub const fn sign(&self) -> Sign {
        self.sign
    }

    /// The inclusive lower bound: the range with its sign stripped.
    #[must_use]
    pub fn lower(&self) -> &str {
        &self.raw[1..]
    }

    /// The exclusive upper bound, or `None` for exact ranges.
    #[must_use]
    pub fn upper(&self) -> Option<String> {
        match self.sign {
            Sign::Exact => None,
            Sign::Caret if self.major > 0 => Some(format!("{}.0.0", self.major.saturating_add(1))),
            Sign::Caret | Sign::Tilde => Some(format!(
                "{}.{}.0",
                self.major,
                self.minor.saturating_add(1)
            )),
        }
    }

    /// Whether `version` satisfies this range.
    #[must_use]
    pub fn accepts(&self, version: &str) -> bool {
        let Some(upper) = self.upper() else {
            return version == self.lower();
        };

        let (base, prerelease) = split_prerelease(version);
        let (lower_base, lower_prerelease) = split_prerelease(self.lower());

        match (prerelease, lower_prerelease) {
            // Prereleases only match an explicit prerelease request for the same base.
            (Some(_), None) => return false,
            (Some(_), Some(_)) if base != lower_base => return false,
            // A stable release satisfies a request for one of its own prereleases.
            (None, Some(_)) if base == lower_base => return true,
            _ => {}
        }

        natural_cmp(self.lower(), version) != Ordering::Greater
            && natural_cmp(version, &upper) == Ordering::Less
    }

    /// Pick the newest version in `known` that this range accepts.
    ///
    /// `known` may be in any order; it is sorted newest first (see
    /// [`release_cmp`]) before scanning.
    #[must_use]
    pub fn resolve<'a>(&self, known: &[&'a str]) -> Option<&'a str> {
        let mut candidates = known.to_vec();
        sort_newest_first(&mut candidates);
        candidates.into_iter().find(|v| self.accepts(v))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Resolve `range` against `known`, returning `Ok(None)` when nothing matches.
///
/// # Errors
///
/// Returns [`Error::MalformedRange`] if the range cannot be parsed.
pub fn resolve<'a>(range: &str, known: &[&'a str]) -> Result<Option<&'a str>> {
    Ok(VersionRange::parse(range)?.resolve(known))
}

/// Split `1.2.3-beta.1` into `("1.2.3", Some("beta.1"))`.
#[must_use]
pub fn split_prerelease(version: &str) -> (&str, Option<&str>) {
    match version.split_once('-') {
        Some((base, prerelease)) => (base, Some(prerelease)),
        None => (version, None),
    }
}

/// Natural string ordering over alternating digit and non-digit runs.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Runs::new(a);
    let mut right = Runs::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = if is_digits(x) && is_digits(y) {
                    numeric_cmp(x, y)
                } else {
                    x.cmp(y)
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Release ordering used to sort catalog versions.
///
/// Bases compare naturally; a stable release sorts above every prerelease of
/// the same base, and prereleases of one base compare naturally.
#[must_use]
pub fn release_cmp(a: &str, b: &str) -> Ordering {
    let (a_base, a_pre) = split_prerelease(a);
    let (b_base, b_pre) = split_prerelease(b);
    natural_cmp(a_base, b_base).then_with(|| match (a_pre, b_pre) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => natural_cmp(x, y),
    })
}

/// Sort versions newest first by [`release_cmp`].
pub fn sort_newest_first<S: AsRef<str>>(versions: &mut [S]) {
    versions.sort_by(|a, b| release_cmp(b.as_ref(), a.as_ref()));
}

fn is_digits(run: &str) -> bool {
    run.bytes().all(|b| b.is_ascii_digit())
}

fn numeric_cmp(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Runs<'a> {
    const fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(run)
    }
}
