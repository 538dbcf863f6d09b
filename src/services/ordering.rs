// src/services/ordering.rs

use std::collections::HashSet;

/// Computes the (child_id, new_order) assignments for a reorder request.
///
/// Each id in `ordered_ids` gets its zero-based position in the list.
/// Ids that are not children of the parent are skipped; children omitted
/// from the list keep their previous order and are not returned.
pub fn reorder_assignments(existing_ids: &[i64], ordered_ids: &[i64]) -> Vec<(i64, i32)> {
    let existing: HashSet<i64> = existing_ids.iter().copied().collect();

    ordered_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| existing.contains(id))
        .map(|(index, id)| (*id, index as i32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_zero_based_indexes_in_list_order() {
        let assignments = reorder_assignments(&[1, 2, 3], &[3, 1, 2]);
        assert_eq!(assignments, vec![(3, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn unknown_ids_are_silently_skipped() {
        let assignments = reorder_assignments(&[1, 2], &[2, 99, 1]);
        assert_eq!(assignments, vec![(2, 0), (1, 2)]);
    }

    #[test]
    fn omitted_children_are_left_alone() {
        let assignments = reorder_assignments(&[1, 2, 3], &[2]);
        assert_eq!(assignments, vec![(2, 0)]);
        assert!(!assignments.iter().any(|(id, _)| *id == 1 || *id == 3));
    }

    #[test]
    fn empty_list_reorders_nothing() {
        assert!(reorder_assignments(&[1, 2], &[]).is_empty());
    }
}
