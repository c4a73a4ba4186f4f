//! Declarative intersection configuration.
//!
//! An [`IntersectionConfig`] is built once per run through
//! [`IntersectionConfigBuilder`], validated eagerly, and then only read by the
//! sweep and the report assembler.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Configuration errors, detected before any sweep begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("overlap fraction must be in (0, 1], got {0}")]
    FractionOutOfRange(f64),

    #[error("overlap bases must be at least 1")]
    ZeroBases,

    #[error("invalid overlap amount '{0}': expected bases (e.g. 5), a fraction (e.g. 0.5) or a percentage (e.g. 50%)")]
    InvalidOverlapAmount(String),

    #[error("unknown intersection mode '{0}' (expected default, not, per-overlap)")]
    UnknownMode(String),

    #[error("unknown intersection part '{0}' (expected whole, inverse, piece)")]
    UnknownPart(String),

    #[error("{mode} mode reports no b intervals, so {side} part '{part}' cannot be applied")]
    IncompatiblePart {
        mode: IntersectionMode,
        side: &'static str,
        part: IntersectionPart,
    },
}

/// Amount of overlap required between an interval and its partner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlapAmount {
    /// Fraction of the interval's own length that must be covered.
    Fraction(f64),
    /// Absolute number of overlapping bases.
    Bases(u64),
}

impl Default for OverlapAmount {
    fn default() -> Self {
        Self::Bases(1)
    }
}

impl OverlapAmount {
    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            OverlapAmount::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                Err(ConfigError::FractionOutOfRange(f))
            }
            OverlapAmount::Bases(0) => Err(ConfigError::ZeroBases),
            _ => Ok(()),
        }
    }

    /// Minimum overlapping bases for an interval of `length` bases.
    ///
    /// For fractions this is `ceil(f * length)`. Products within 1e-9 of an
    /// integer are snapped to it, so `0.3 * 10` requires 3 bases, not 4.
    #[inline]
    pub fn required_bases(&self, length: u64) -> u64 {
        match *self {
            OverlapAmount::Bases(n) => n,
            OverlapAmount::Fraction(f) => {
                let raw = f * length as f64;
                let nearest = raw.round();
                if (raw - nearest).abs() <= 1e-9 * nearest.max(1.0) {
                    nearest as u64
                } else {
                    raw.ceil() as u64
                }
            }
        }
    }

    /// True if `bases` of overlap satisfy this requirement for an interval of
    /// `length` bases.
    #[inline]
    pub fn is_satisfied(&self, bases: u64, length: u64) -> bool {
        bases >= self.required_bases(length)
    }
}

impl FromStr for OverlapAmount {
    type Err = ConfigError;

    /// `"5"` is bases, `"0.5"` a fraction, `"50%"` a percentage.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ConfigError::InvalidOverlapAmount(s.to_string());
        let amount = if let Some(pct) = s.strip_suffix('%') {
            OverlapAmount::Fraction(pct.trim().parse::<f64>().map_err(|_| invalid())? / 100.0)
        } else if s.contains('.') || s.contains('e') || s.contains('E') {
            OverlapAmount::Fraction(s.parse::<f64>().map_err(|_| invalid())?)
        } else {
            OverlapAmount::Bases(s.parse::<u64>().map_err(|_| invalid())?)
        };
        amount.validate()?;
        Ok(amount)
    }
}

impl fmt::Display for OverlapAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapAmount::Bases(bases) => write!(f, "Bases({})", bases),
            OverlapAmount::Fraction(fraction) => write!(f, "Fraction({:.3})", fraction),
        }
    }
}

/// Which "a" intervals are emitted and how their overlaps are grouped.
///
/// Modes only shape fragments after the overlap filter has run; adding a
/// variant does not touch the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntersectionMode {
    /// Every "a" interval exactly once, with all qualifying "b" overlaps.
    #[default]
    Default,
    /// Only "a" intervals without any qualifying overlap (bedtools `-v`).
    Not,
    /// One fragment per qualifying "b" (bedtools `-wa -wb` layout).
    PerOverlap,
}

impl IntersectionMode {
    /// True if fragments produced in this mode can carry "b" intervals.
    pub fn reports_b(&self) -> bool {
        !matches!(self, IntersectionMode::Not)
    }
}

impl FromStr for IntersectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "not" | "v" => Ok(Self::Not),
            "per-overlap" | "per_overlap" | "peroverlap" => Ok(Self::PerOverlap),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for IntersectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntersectionMode::Default => write!(f, "default"),
            IntersectionMode::Not => write!(f, "not"),
            IntersectionMode::PerOverlap => write!(f, "per-overlap"),
        }
    }
}

/// What slice of a reported interval is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntersectionPart {
    /// The entire interval.
    #[default]
    Whole,
    /// The portion(s) not overlapping the partner interval(s).
    Inverse,
    /// The portion overlapping the partner interval.
    Piece,
}

impl FromStr for IntersectionPart {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "whole" => Ok(Self::Whole),
            "inverse" => Ok(Self::Inverse),
            "piece" | "part" => Ok(Self::Piece),
            _ => Err(ConfigError::UnknownPart(s.to_string())),
        }
    }
}

impl fmt::Display for IntersectionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntersectionPart::Whole => write!(f, "whole"),
            IntersectionPart::Inverse => write!(f, "inverse"),
            IntersectionPart::Piece => write!(f, "piece"),
        }
    }
}

/// Immutable intersection settings for one run.
///
/// # Examples
///
/// ```
/// use fragmap::config::{IntersectionConfig, IntersectionPart, OverlapAmount};
///
/// let config = IntersectionConfig::builder()
///     .a_requirement(OverlapAmount::Fraction(0.3))
///     .b_part(Some(IntersectionPart::Whole))
///     .build()
///     .unwrap();
/// assert_eq!(config.b_requirement(), OverlapAmount::Bases(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionConfig {
    mode: IntersectionMode,
    a_part: Option<IntersectionPart>,
    b_part: Option<IntersectionPart>,
    a_requirement: OverlapAmount,
    b_requirement: OverlapAmount,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            mode: IntersectionMode::Default,
            a_part: None,
            b_part: Some(IntersectionPart::Whole),
            a_requirement: OverlapAmount::Bases(1),
            b_requirement: OverlapAmount::Bases(1),
        }
    }
}

impl IntersectionConfig {
    pub fn builder() -> IntersectionConfigBuilder {
        IntersectionConfigBuilder::new()
    }

    #[inline]
    pub fn mode(&self) -> IntersectionMode {
        self.mode
    }

    /// Part of "a" to report; `None` reports "a" whole.
    #[inline]
    pub fn a_part(&self) -> Option<IntersectionPart> {
        self.a_part
    }

    /// Part of each "b" to report; `None` leaves "b" out of report rows.
    #[inline]
    pub fn b_part(&self) -> Option<IntersectionPart> {
        self.b_part
    }

    #[inline]
    pub fn a_requirement(&self) -> OverlapAmount {
        self.a_requirement
    }

    #[inline]
    pub fn b_requirement(&self) -> OverlapAmount {
        self.b_requirement
    }

    /// True if `bases` of overlap between intervals of length `a_len` and
    /// `b_len` satisfy both sides' requirements.
    #[inline]
    pub fn qualifies(&self, bases: u64, a_len: u64, b_len: u64) -> bool {
        bases > 0
            && self.a_requirement.is_satisfied(bases, a_len)
            && self.b_requirement.is_satisfied(bases, b_len)
    }
}

/// Builder for [`IntersectionConfig`]; `build` validates the combination.
#[derive(Debug, Clone)]
pub struct IntersectionConfigBuilder {
    config: IntersectionConfig,
}

impl Default for IntersectionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IntersectionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: IntersectionConfig::default(),
        }
    }

    pub fn mode(mut self, mode: IntersectionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn a_part(mut self, part: Option<IntersectionPart>) -> Self {
        self.config.a_part = part;
        self
    }

    pub fn b_part(mut self, part: Option<IntersectionPart>) -> Self {
        self.config.b_part = part;
        self
    }

    pub fn a_requirement(mut self, amount: OverlapAmount) -> Self {
        self.config.a_requirement = amount;
        self
    }

    pub fn b_requirement(mut self, amount: OverlapAmount) -> Self {
        self.config.b_requirement = amount;
        self
    }

    pub fn build(self) -> Result<IntersectionConfig, ConfigError> {
        let config = self.config;
        config.a_requirement.validate()?;
        config.b_requirement.validate()?;

        if config.mode.reports_b() {
            return Ok(config);
        }

        // Whole is harmless on an empty b list; anything sliced against "a"
        // has nothing to slice.
        if let Some(part) = config.b_part {
            if part != IntersectionPart::Whole {
                return Err(ConfigError::IncompatiblePart {
                    mode: config.mode,
                    side: "b",
                    part,
                });
            }
        }
        // Pieces of "a" are cut by b intervals, and there are none.
        if config.a_part == Some(IntersectionPart::Piece) {
            return Err(ConfigError::IncompatiblePart {
                mode: config.mode,
                side: "a",
                part: IntersectionPart::Piece,
            });
        }
        Ok(config)
    }
}
