//! Pure functions over per-step log-probability rows.
//!
//! The decoders only ever need two questions answered about a row returned by
//! the step function: "which `k` tokens are best?" and "which single token is
//! best?". Both answers use the same total order (higher value first, lower
//! index first on ties) so that greedy decoding and width-1 beam search pick
//! identical tokens.
//!
//! ```
//! use capbeam_logits::{argmax, log_softmax_in_place, top_k_stable};
//!
//! let mut row = vec![1.0f32, 3.0, 3.0, 0.5];
//! log_softmax_in_place(&mut row);
//! let best = top_k_stable(&row, 2);
//! assert_eq!(best[0].0, 1);
//! assert_eq!(best[1].0, 2);
//! assert_eq!(argmax(&row), 1);
//! ```

use std::cmp::Ordering;

/// Token identifier as produced by the selection helpers.
pub type TokenId = u32;

/// Problems found by [`validate_log_probs`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LogitsError {
    #[error("log-probability row is empty")]
    Empty,

    #[error("non-finite log-probability {value} at index {index}")]
    NonFinite { index: usize, value: f32 },

    #[error("positive log-probability {value} at index {index}")]
    Positive { index: usize, value: f32 },
}

/// Return the `min(k, row.len())` highest entries as `(token, value)` pairs.
///
/// Output is sorted by value descending; equal values keep ascending index
/// order, so the result is fully deterministic. Runs in `O(V + k log k)`.
///
/// # Examples
///
/// ```
/// use capbeam_logits::top_k_stable;
///
/// let row = vec![-2.0f32, -0.5, -0.5, -1.0];
/// let top = top_k_stable(&row, 3);
/// assert_eq!(top, vec![(1, -0.5), (2, -0.5), (3, -1.0)]);
///
/// // k larger than the row returns every entry.
/// assert_eq!(top_k_stable(&row, 10).len(), 4);
/// assert!(top_k_stable(&row, 0).is_empty());
/// ```
pub fn top_k_stable(row: &[f32], k: usize) -> Vec<(TokenId, f32)> {
    let k = k.min(row.len());
    if k == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(usize, f32)> = row.iter().copied().enumerate().collect();
    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, rank_order);
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(rank_order);
    ranked.into_iter().map(|(i, v)| (i as TokenId, v)).collect()
}

/// Index of the best entry under the same order as [`top_k_stable`].
///
/// Ties go to the **first** maximum. Returns `0` on an empty slice.
///
/// # Examples
///
/// ```
/// use capbeam_logits::argmax;
///
/// assert_eq!(argmax(&[-3.0f32, -0.1, -0.1]), 1);
/// assert_eq!(argmax(&[]), 0);
/// ```
pub fn argmax(row: &[f32]) -> usize {
    row.iter()
        .copied()
        .enumerate()
        .min_by(rank_order)
        .map_or(0, |(i, _)| i)
}

/// Normalise raw scores into log-probabilities in place.
///
/// Uses the "subtract max" form. `f32::NEG_INFINITY` entries stay at
/// negative infinity. A row without any finite entry is left untouched.
pub fn log_softmax_in_place(row: &mut [f32]) {
    let max = row.iter().copied().filter(|v| v.is_finite()).fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return;
    }
    let sum: f32 = row.iter().map(|&v| (v - max).exp()).sum();
    let log_sum = max + sum.ln();
    for v in row.iter_mut() {
        *v -= log_sum;
    }
}

/// Check that `row` looks like a normalised log-probability vector.
///
/// Every entry must be finite and `<= 0`. A small positive tolerance absorbs
/// rounding from upstream normalisation.
pub fn validate_log_probs(row: &[f32]) -> Result<(), LogitsError> {
    const TOLERANCE: f32 = 1e-5;

    if row.is_empty() {
        return Err(LogitsError::Empty);
    }
    for (index, &value) in row.iter().enumerate() {
        if !value.is_finite() {
            return Err(LogitsError::NonFinite { index, value });
        }
        if value > TOLERANCE {
            return Err(LogitsError::Positive { index, value });
        }
    }
    Ok(())
}

// --- helpers ---------------------------------------------------------------

/// "Better first": higher value, then lower index.
#[inline]
fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

// ---------------------------------------------------------------------------
