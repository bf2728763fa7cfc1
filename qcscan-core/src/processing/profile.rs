//! Threshold profiles and comparison resolution.
//!
//! A profile arrives in one of three shapes (named profile with implicit
//! directions, ad hoc tag list with explicit operators, or the envelope
//! measured from color bars). Each shape is resolved once into a flat list of
//! `ThresholdCheck`s before any frame is evaluated.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Direction of a threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// Violation when the value is below the threshold.
    #[serde(rename = "lt")]
    Below,
    /// Violation when the value is above the threshold.
    #[serde(rename = "gt")]
    Above,
}

impl Comparison {
    /// Direction implied by a tag name: `MIN`/`LOW` tags fail below, all others above.
    #[must_use]
    pub fn implicit_for(tag: &str) -> Self {
        if tag.contains("MIN") || tag.contains("LOW") {
            Comparison::Below
        } else {
            Comparison::Above
        }
    }

    #[must_use]
    pub fn violates(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Below => value < threshold,
            Comparison::Above => value > threshold,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Comparison::Below => "lt",
            Comparison::Above => "gt",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Comparison::Below => "<",
            Comparison::Above => ">",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparison {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lt" | "<" | "under" => Ok(Comparison::Below),
            "gt" | ">" | "over" => Ok(Comparison::Above),
            other => Err(CoreError::Config(format!(
                "Unknown comparison '{other}'. Valid options: lt, gt"
            ))),
        }
    }
}

/// One tag with its threshold and resolved comparison direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCheck {
    pub tag: String,
    pub threshold: f64,
    pub comparison: Comparison,
}

impl ThresholdCheck {
    pub fn new(tag: impl Into<String>, threshold: f64, comparison: Comparison) -> Self {
        Self {
            tag: tag.into(),
            threshold,
            comparison,
        }
    }

    /// Builds a check whose direction follows the tag name.
    pub fn implicit(tag: impl Into<String>, threshold: f64) -> Self {
        let tag = tag.into();
        let comparison = Comparison::implicit_for(&tag);
        Self::new(tag, threshold, comparison)
    }

    #[must_use]
    pub fn is_violated_by(&self, value: f64) -> bool {
        self.comparison.violates(value, self.threshold)
    }
}

/// Parses ad hoc checks written as `TAG:OP:VALUE`, e.g. `YMAX:gt:940`.
impl FromStr for ThresholdCheck {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [tag, op, value] = parts.as_slice() else {
            return Err(CoreError::Config(format!(
                "Invalid tag check '{s}', expected TAG:OP:VALUE (e.g. YMAX:gt:940)"
            )));
        };
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(CoreError::Config(format!("Invalid tag check '{s}': empty tag")));
        }
        let threshold = value.trim().parse::<f64>().map_err(|_| {
            CoreError::Config(format!("Invalid tag check '{s}': '{value}' is not a number"))
        })?;
        Ok(Self::new(tag, threshold, op.parse()?))
    }
}

/// Peak envelope measured from a color bars segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarsProfile {
    pub peaks: Vec<(String, f64)>,
}

/// A threshold profile in one of its three shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    /// Named profile; direction follows the tag name.
    Implicit {
        name: String,
        thresholds: Vec<(String, f64)>,
    },
    /// Ad hoc checks; every entry carries its own operator.
    Explicit {
        name: String,
        entries: Vec<ThresholdCheck>,
    },
    /// Peaks observed in the color bars; direction follows the tag name.
    BarsDerived(BarsProfile),
}

/// What kind of check a resolved profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    Profile,
    TagCheck,
    BarsEvaluation,
}

impl ProfileKind {
    /// Human readable label used in summary tables.
    pub const fn label(self) -> &'static str {
        match self {
            ProfileKind::Profile => "Profile",
            ProfileKind::TagCheck => "Tag check",
            ProfileKind::BarsEvaluation => "Color bars evaluation",
        }
    }
}

/// Name given to ad hoc tag checks and bars-derived profiles.
pub const TAG_CHECK_NAME: &str = "tags";
pub const BARS_PROFILE_NAME: &str = "bars";

impl Profile {
    pub fn name(&self) -> &str {
        match self {
            Profile::Implicit { name, .. } | Profile::Explicit { name, .. } => name,
            Profile::BarsDerived(_) => BARS_PROFILE_NAME,
        }
    }

    pub fn kind(&self) -> ProfileKind {
        match self {
            Profile::Implicit { .. } => ProfileKind::Profile,
            Profile::Explicit { .. } => ProfileKind::TagCheck,
            Profile::BarsDerived(_) => ProfileKind::BarsEvaluation,
        }
    }

    /// Resolves every tag to exactly one threshold and one comparison.
    pub fn resolve(&self) -> CoreResult<ResolvedProfile> {
        let checks: Vec<ThresholdCheck> = match self {
            Profile::Implicit { thresholds, .. } => thresholds
                .iter()
                .map(|(tag, threshold)| ThresholdCheck::implicit(tag.clone(), *threshold))
                .collect(),
            Profile::Explicit { entries, .. } => entries.clone(),
            Profile::BarsDerived(bars) => bars
                .peaks
                .iter()
                .map(|(tag, peak)| ThresholdCheck::implicit(tag.clone(), *peak))
                .collect(),
        };

        validate_checks(self.name(), &checks)?;
        log::debug!(
            "Resolved profile '{}': {}",
            self.name(),
            checks
                .iter()
                .map(|c| format!("{} {} {}", c.tag, c.comparison.symbol(), c.threshold))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ResolvedProfile {
            name: self.name().to_string(),
            kind: self.kind(),
            checks,
        })
    }
}

/// Checks that a list of threshold checks is usable as-is.
pub(crate) fn validate_checks(name: &str, checks: &[ThresholdCheck]) -> CoreResult<()> {
    if checks.is_empty() {
        return Err(CoreError::Config(format!("'{name}' defines no tags")));
    }
    let mut seen = HashSet::new();
    for check in checks {
        if !check.threshold.is_finite() {
            return Err(CoreError::Config(format!(
                "'{name}': threshold for {} is not a finite number",
                check.tag
            )));
        }
        if !seen.insert(check.tag.as_str()) {
            return Err(CoreError::Config(format!(
                "'{name}': tag {} is listed more than once",
                check.tag
            )));
        }
    }
    Ok(())
}

/// A profile with every comparison decided.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProfile {
    pub name: String,
    pub kind: ProfileKind,
    pub checks: Vec<ThresholdCheck>,
}

impl ResolvedProfile {
    /// Label embedded in thumbnail names and export file names.
    pub fn mode_label(&self) -> &str {
        &self.name
    }
}
