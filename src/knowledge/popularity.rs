// ============================================================
// Layer 5: Popularity Brackets
// ============================================================
// A bracket is a percentile range over the entities of ONE
// answer type, ranked by page views from least to most
// popular.
//
//   rank:        0    1    2    3  ...  n-1
//   percentile:  0%  ───────────────────▶ 100%
//   "bottom:50"  [0, 50)   the less popular half
//   "top:1"      [99, 100] the most popular 1%
//   "40-60"      [40, 60)  the middle fifth
//
// Rank i of n falls in [lower, upper) when
//   lower <= 100 * i / n < upper
// The top of the scale is closed: upper = 100 includes the
// most popular entity.
//
// Bracket bounds are configuration, never constants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Tolerance for float percentile arithmetic at bin edges
const EPSILON: f64 = 1e-9;

/// A [lower, upper) percentile range, bounds in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopularityBracket {
    pub lower: f64,
    pub upper: f64,
}

impl PopularityBracket {
    pub fn new(lower: f64, upper: f64) -> Result<Self, String> {
        if !(0.0..=100.0).contains(&lower) || !(0.0..=100.0).contains(&upper) {
            return Err(format!("bracket bounds must lie in 0..=100, got {lower}-{upper}"));
        }
        if lower >= upper {
            return Err(format!("bracket lower bound {lower} must be below upper bound {upper}"));
        }
        Ok(Self { lower, upper })
    }

    /// The most popular `pct` percent
    pub fn top(pct: f64) -> Result<Self, String> {
        Self::new(100.0 - pct, 100.0)
    }

    /// The least popular `pct` percent
    pub fn bottom(pct: f64) -> Result<Self, String> {
        Self::new(0.0, pct)
    }

    /// Split the scale into `k` equal-width brackets, least popular first.
    /// k = 1 yields the whole scale.
    pub fn equal_bins(k: usize) -> Vec<Self> {
        let k = k.max(1);
        (0..k)
            .map(|i| Self {
                lower: 100.0 * i as f64 / k as f64,
                upper: 100.0 * (i + 1) as f64 / k as f64,
            })
            .collect()
    }

    /// Ranks (ascending popularity) covered by this bracket among `n` entities
    pub fn rank_range(&self, n: usize) -> Range<usize> {
        let edge = |pct: f64| -> usize {
            let pos = (pct * n as f64 / 100.0 - EPSILON).ceil();
            (pos.max(0.0) as usize).min(n)
        };
        let start = edge(self.lower);
        let end   = if self.upper >= 100.0 { n } else { edge(self.upper) };
        start..end.max(start)
    }
}

impl fmt::Display for PopularityBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lower, self.upper)
    }
}

/// Accepts "top:1", "bottom:50" or "40-60"
impl FromStr for PopularityBracket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let pct = |v: &str| -> Result<f64, String> {
            v.trim().parse::<f64>().map_err(|e| format!("bad percentile '{v}': {e}"))
        };

        if let Some(v) = s.strip_prefix("top:") {
            return Self::top(pct(v)?);
        }
        if let Some(v) = s.strip_prefix("bottom:") {
            return Self::bottom(pct(v)?);
        }
        match s.split_once('-') {
            Some((lo, hi)) => Self::new(pct(lo)?, pct(hi)?),
            None => Err(format!("expected 'top:P', 'bottom:P' or 'LO-HI', got '{s}'")),
        }
    }
}
