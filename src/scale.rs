use crate::config::CategoryConfig;
use std::cmp::Ordering;

/// Ordinal color scale: a fixed list of category keys mapped to a fixed
/// list of colors by position.
///
/// Lookup of a key outside the configured set returns `None` from
/// [`OrdinalScale::apply`]; [`OrdinalScale::color_or_fallback`] resolves
/// that to the documented fallback color instead.
#[derive(Debug, Clone)]
pub struct OrdinalScale {
    pairs: Vec<(String, String)>,
    fallback: String,
}

impl OrdinalScale {
    pub fn new(categories: &[CategoryConfig], fallback: &str) -> Self {
        OrdinalScale {
            pairs: categories
                .iter()
                .map(|c| (c.key.clone(), c.color.clone()))
                .collect(),
            fallback: fallback.to_string(),
        }
    }

    pub fn apply(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, color)| color.as_str())
    }

    pub fn color_or_fallback(&self, key: &str) -> &str {
        self.apply(key).unwrap_or(&self.fallback)
    }
}

/// Square-root scale mapping `[d0, d1]` onto `[r0, r1]`.
///
/// Values beyond the domain extrapolate along the same curve rather than
/// clamping, matching the behavior of the usual charting scales. A
/// degenerate domain maps everything to `r0`.
#[derive(Debug, Clone, Copy)]
pub struct SqrtScale {
    d0: f64,
    d1: f64,
    r0: f64,
    r1: f64,
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        SqrtScale {
            d0: domain.0,
            d1: domain.1,
            r0: range.0,
            r1: range.1,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let t0 = signed_sqrt(self.d0);
        let t1 = signed_sqrt(self.d1);
        let span = t1 - t0;
        if span == 0.0 {
            return self.r0;
        }
        self.r0 + (signed_sqrt(value) - t0) / span * (self.r1 - self.r0)
    }
}

fn signed_sqrt(x: f64) -> f64 {
    if x < 0.0 {
        -(-x).sqrt()
    } else {
        x.sqrt()
    }
}

/// The p-quantile of an ascending-sorted slice, with linear
/// interpolation between adjacent order statistics (type R-7).
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if p <= 0.0 || n < 2 {
        return Some(sorted[0]);
    }
    if p >= 1.0 {
        return Some(sorted[n - 1]);
    }
    let h = (n - 1) as f64 * p;
    let i = h.floor() as usize;
    let v0 = sorted[i];
    let v1 = sorted[i + 1];
    Some(v0 + (v1 - v0) * (h - i as f64))
}

/// Ascending sort suitable for [`quantile`]; NaN values are kept but
/// treated as equal so the sort stays total.
pub fn sorted_values(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}
