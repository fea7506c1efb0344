//! Merging of pre-sorted result lists with key-based deduplication.

use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::hash::Hash;

/// Merge `source` into `target` in place, keeping `target` sorted by `cmp`
/// and retaining only the first occurrence of each `key`.
///
/// The concatenation is sorted stably rather than merged pairwise, so the
/// inputs do not strictly need to be pre-sorted; with both lists already
/// trimmed to a result cap the `O((m + n) log (m + n))` sort is cheap and
/// avoids a hand-rolled merge.
///
/// # Examples
///
/// ```rust
/// use geocell::merge::merge_in_place;
///
/// let mut ranked = vec![("a", 1.0), ("b", 3.0)];
/// merge_in_place(
///     &mut ranked,
///     vec![("c", 2.0), ("a", 1.0)],
///     |r| r.0,
///     |x, y| x.1.total_cmp(&y.1),
/// );
/// assert_eq!(ranked, vec![("a", 1.0), ("c", 2.0), ("b", 3.0)]);
/// ```
pub fn merge_in_place<T, K, KF, CF>(
    target: &mut Vec<T>,
    source: impl IntoIterator<Item = T>,
    key: KF,
    mut cmp: CF,
) where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    CF: FnMut(&T, &T) -> Ordering,
{
    target.extend(source);
    target.sort_by(|a, b| cmp(a, b));

    let mut seen = FxHashSet::default();
    target.retain(|item| seen.insert(key(item)));
}
