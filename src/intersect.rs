//! The common-names computation.

use std::collections::HashSet;

/// Names of the first list that also occur somewhere in every other list.
///
/// Returns `None` when there are no lists at all. Duplicates collapse and
/// membership ignores position, so the result equals the intersection of all
/// the lists taken as sets.
pub fn common_names<S: AsRef<str>>(lists: &[Vec<S>]) -> Option<HashSet<String>> {
    let (first, rest) = lists.split_first()?;

    let others: Vec<HashSet<&str>> = rest
        .iter()
        .map(|list| list.iter().map(|name| name.as_ref()).collect())
        .collect();

    Some(
        first
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| others.iter().all(|other| other.contains(name)))
            .map(str::to_owned)
            .collect(),
    )
}
