use super::{is_descendant_or_self, set_sequential_order, sibling_group, write_back, FlatMenuItem};
use crate::models::MenuItem;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum MoveError {
    #[error("Cannot move \"{label}\" inside itself")]
    WouldCreateCycle { item_id: String, label: String },
}

/// Apply a drag from row `source` to slot `destination` of the flattened view.
///
/// `destination` names the slot in front of the row currently at that index
/// (`flat.len()` is the end of the list). The dragged item becomes a sibling of
/// whatever row ends up right after it, or of the last row when dropped at the end.
///
/// Returns `Ok(None)` when nothing moves: the drop was cancelled, landed on its own
/// slot, or pointed outside the list. Otherwise returns a full copy of `all` in which
/// the new sibling group (and the old one, if the parent changed) is densely
/// renumbered from 0.
pub(crate) fn resolve_move(
    flat: &[FlatMenuItem],
    all: &[MenuItem],
    source: usize,
    destination: Option<usize>,
) -> Result<Option<Vec<MenuItem>>, MoveError> {
    let Some(destination) = destination else {
        return Ok(None);
    };
    if source == destination || source >= flat.len() || destination > flat.len() {
        return Ok(None);
    }

    let dragged = &flat[source].item;
    if !all.iter().any(|n| n.id == dragged.id) {
        return Ok(None);
    }
    // Dropping an open parent onto its own lower half lands in front of its first child.
    if destination == source + 1
        && flat
            .get(destination)
            .is_some_and(|next| next.item.parent_key() == Some(dragged.id.as_str()))
    {
        return Ok(None);
    }
    let old_parent = dragged.parent_key().map(str::to_string);

    let without_dragged = flat
        .iter()
        .enumerate()
        .filter(|(ix, _)| *ix != source)
        .map(|(_, row)| &row.item)
        .collect::<Vec<_>>();

    // Removing the source row shifts every later slot up by one.
    let adjusted_dest = if destination > source {
        destination - 1
    } else {
        destination
    };

    let new_parent = without_dragged
        .get(adjusted_dest)
        .or_else(|| without_dragged.last())
        .and_then(|n| n.parent_key())
        .map(str::to_string);

    let insert_at = without_dragged[..adjusted_dest.min(without_dragged.len())]
        .iter()
        .filter(|n| n.parent_key() == new_parent.as_deref())
        .count();

    if let Some(parent) = new_parent.as_deref() {
        if is_descendant_or_self(all, &dragged.id, parent) {
            tracing::warn!(item = %dragged.id, parent, "rejected move into own subtree");
            return Err(MoveError::WouldCreateCycle {
                item_id: dragged.id.clone(),
                label: dragged.label.clone(),
            });
        }
    }

    let mut next = all.to_vec();

    let mut moved = next
        .iter()
        .find(|n| n.id == dragged.id)
        .cloned()
        .unwrap_or_else(|| dragged.clone());
    moved.parent_id = new_parent.clone();

    let mut sibs = sibling_group(&next, new_parent.as_deref(), Some(&dragged.id));
    sibs.insert(insert_at.min(sibs.len()), moved);
    write_back(&mut next, &set_sequential_order(sibs));

    if old_parent != new_parent {
        let rest = sibling_group(&next, old_parent.as_deref(), Some(&dragged.id));
        write_back(&mut next, &set_sequential_order(rest));
    }

    tracing::debug!(
        item = %dragged.id,
        from = ?old_parent,
        to = ?new_parent,
        index = insert_at,
        "resolved menu move"
    );

    Ok(Some(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu_tree::fixtures::{find, item};
    use crate::menu_tree::flatten;
    use std::collections::{BTreeMap, HashSet};

    fn flat_of(items: &[MenuItem]) -> Vec<FlatMenuItem> {
        flatten(items, &HashSet::new())
    }

    fn moved(items: &[MenuItem], source: usize, destination: usize) -> Vec<MenuItem> {
        resolve_move(&flat_of(items), items, source, Some(destination))
            .expect("move should be accepted")
            .expect("move should change something")
    }

    fn group_orders(items: &[MenuItem], parent: Option<&str>) -> Vec<(String, i32)> {
        let mut g = items
            .iter()
            .filter(|n| n.parent_key() == parent)
            .map(|n| (n.id.clone(), n.order))
            .collect::<Vec<_>>();
        g.sort_by_key(|(_, o)| *o);
        g
    }

    fn assert_dense(items: &[MenuItem]) {
        let mut groups: BTreeMap<Option<&str>, Vec<i32>> = BTreeMap::new();
        for n in items {
            groups.entry(n.parent_key()).or_default().push(n.order);
        }
        for (parent, mut orders) in groups {
            orders.sort();
            let want = (0..orders.len() as i32).collect::<Vec<_>>();
            assert_eq!(orders, want, "group {parent:?} is not dense");
        }
    }

    #[test]
    fn test_move_child_to_root_start() {
        let items = vec![item("a", None, 0), item("b", None, 1), item("c", Some("b"), 0)];
        let out = moved(&items, 2, 0);

        assert_eq!(find(&out, "c").parent_key(), None);
        assert_eq!(find(&out, "c").order, 0);
        assert_eq!(find(&out, "a").order, 1);
        assert_eq!(find(&out, "b").order, 2);
        assert_dense(&out);
    }

    #[test]
    fn test_move_root_item_after_first() {
        let items = vec![item("a", None, 0), item("b", None, 1), item("c", None, 2)];
        let out = moved(&items, 2, 1);

        assert_eq!(find(&out, "c").parent_key(), None);
        assert_eq!(find(&out, "a").order, 0);
        assert_eq!(find(&out, "c").order, 1);
        assert_eq!(find(&out, "b").order, 2);
    }

    #[test]
    fn test_move_down_accounts_for_removed_row() {
        let items = vec![item("a", None, 0), item("b", None, 1), item("c", None, 2)];

        // Slot 2 is in front of `c`.
        let out = moved(&items, 0, 2);
        assert_eq!(
            group_orders(&out, None),
            vec![("b".into(), 0), ("a".into(), 1), ("c".into(), 2)]
        );

        // Slot 3 is the end of the list.
        let out = moved(&items, 0, 3);
        assert_eq!(
            group_orders(&out, None),
            vec![("b".into(), 0), ("c".into(), 1), ("a".into(), 2)]
        );
    }

    #[test]
    fn test_noop_when_source_equals_destination() {
        let items = vec![item("a", None, 0), item("b", None, 1)];
        let flat = flat_of(&items);
        assert_eq!(resolve_move(&flat, &items, 1, Some(1)), Ok(None));
    }

    #[test]
    fn test_noop_when_cancelled_or_out_of_range() {
        let items = vec![item("a", None, 0), item("b", None, 1)];
        let flat = flat_of(&items);
        assert_eq!(resolve_move(&flat, &items, 0, None), Ok(None));
        assert_eq!(resolve_move(&flat, &items, 5, Some(0)), Ok(None));
        assert_eq!(resolve_move(&flat, &items, 0, Some(3)), Ok(None));
        assert_eq!(resolve_move(&[], &[], 0, Some(1)), Ok(None));
    }

    #[test]
    fn test_drop_into_other_group_renumbers_both() {
        // home, about[team, history], contact
        let items = vec![
            item("home", None, 0),
            item("about", None, 1),
            item("team", Some("about"), 0),
            item("history", Some("about"), 1),
            item("contact", None, 2),
        ];
        // Rows: home(0) about(1) team(2) history(3) contact(4).
        // Drag `home` in front of `history`.
        let out = moved(&items, 0, 3);

        assert_eq!(find(&out, "home").parent_key(), Some("about"));
        assert_eq!(
            group_orders(&out, Some("about")),
            vec![("team".into(), 0), ("home".into(), 1), ("history".into(), 2)]
        );
        assert_eq!(
            group_orders(&out, None),
            vec![("about".into(), 0), ("contact".into(), 1)]
        );
        assert_dense(&out);
    }

    #[test]
    fn test_drop_at_end_joins_last_rows_group() {
        let items = vec![
            item("a", None, 0),
            item("b", None, 1),
            item("b1", Some("b"), 0),
        ];
        // Rows: a b b1; end of list adopts b1's parent.
        let out = moved(&items, 0, 3);
        assert_eq!(find(&out, "a").parent_key(), Some("b"));
        assert_eq!(
            group_orders(&out, Some("b")),
            vec![("b1".into(), 0), ("a".into(), 1)]
        );
        assert_eq!(group_orders(&out, None), vec![("b".into(), 0)]);
    }

    #[test]
    fn test_last_child_dropped_before_next_root_is_outdented() {
        let items = vec![
            item("a", None, 0),
            item("a1", Some("a"), 0),
            item("b", None, 1),
        ];
        // Rows: a a1 b; slot 2 is in front of `b`.
        let out = moved(&items, 1, 2);
        assert_eq!(find(&out, "a1").parent_key(), None);
        assert_eq!(
            group_orders(&out, None),
            vec![("a".into(), 0), ("a1".into(), 1), ("b".into(), 2)]
        );
        assert!(group_orders(&out, Some("a")).is_empty());
    }

    #[test]
    fn test_collapsed_group_moves_with_parent() {
        let items = vec![
            item("a", None, 0),
            item("a1", Some("a"), 0),
            item("a2", Some("a"), 1),
            item("b", None, 1),
        ];
        let collapsed = HashSet::from(["a".to_string()]);
        let flat = flatten(&items, &collapsed);
        // Rows: a b
        let out = resolve_move(&flat, &items, 1, Some(0))
            .expect("accepted")
            .expect("changed");

        assert_eq!(find(&out, "b").order, 0);
        assert_eq!(find(&out, "a").order, 1);
        assert_eq!(find(&out, "a1").parent_key(), Some("a"));
        assert_eq!(find(&out, "a2").order, 1);
    }

    #[test]
    fn test_rejects_move_into_own_subtree() {
        let items = vec![
            item("a", None, 0),
            item("a1", Some("a"), 0),
            item("a2", Some("a"), 1),
            item("b", None, 1),
        ];
        // Rows: a a1 a2 b. Slot 2 is in front of a2, inside a's own group.
        let flat = flat_of(&items);
        let err = resolve_move(&flat, &items, 0, Some(2)).expect_err("cycle");
        assert!(matches!(err, MoveError::WouldCreateCycle { ref item_id, .. } if item_id == "a"));
    }

    #[test]
    fn test_drop_just_below_open_parent_is_noop() {
        let items = vec![item("a", None, 0), item("a1", Some("a"), 0), item("b", None, 1)];
        let flat = flat_of(&items);
        // Lower half of row 0 points at slot 1, in front of a's first child.
        assert_eq!(resolve_move(&flat, &items, 0, Some(1)), Ok(None));
    }

    #[test]
    fn test_drop_just_below_collapsed_parent_is_noop() {
        let items = vec![item("a", None, 0), item("a1", Some("a"), 0), item("b", None, 1)];
        let collapsed = HashSet::from(["a".to_string()]);
        let flat = flatten(&items, &collapsed);
        // Rows: a b. Slot 1 is in front of b, a's own spot.
        let out = resolve_move(&flat, &items, 0, Some(1))
            .expect("accepted")
            .expect("resolved");
        assert_eq!(find(&out, "a").order, 0);
        assert_eq!(find(&out, "a1").parent_key(), Some("a"));
        assert_eq!(find(&out, "b").order, 1);
    }

    #[test]
    fn test_conservation_and_untouched_items() {
        let items = vec![
            item("home", None, 0),
            item("about", None, 1),
            item("team", Some("about"), 0),
            item("history", Some("about"), 1),
            item("contact", None, 2),
            item("lost", Some("ghost"), 4),
        ];
        let out = moved(&items, 4, 2);

        assert_eq!(out.len(), items.len());
        let before = items.iter().map(|n| n.id.clone()).collect::<HashSet<_>>();
        let after = out.iter().map(|n| n.id.clone()).collect::<HashSet<_>>();
        assert_eq!(before, after);

        // The orphan group was not part of the move.
        assert_eq!(find(&out, "lost"), find(&items, "lost"));
        // Display fields ride along.
        assert_eq!(find(&out, "contact").label, "CONTACT");
    }

    #[test]
    fn test_input_is_not_mutated() {
        let items = vec![item("a", None, 0), item("b", None, 1)];
        let snapshot = items.clone();
        let _ = moved(&items, 1, 0);
        assert_eq!(items, snapshot);
    }

    #[test]
    fn test_every_move_leaves_dense_groups() {
        let items = vec![
            item("home", None, 0),
            item("about", None, 1),
            item("team", Some("about"), 0),
            item("history", Some("about"), 1),
            item("contact", None, 2),
        ];
        let flat = flat_of(&items);
        for source in 0..flat.len() {
            for destination in 0..=flat.len() {
                match resolve_move(&flat, &items, source, Some(destination)) {
                    Ok(Some(out)) => {
                        assert_eq!(out.len(), items.len());
                        assert_dense(&out);
                    }
                    Ok(None) => assert_eq!(source, destination),
                    Err(MoveError::WouldCreateCycle { item_id, .. }) => {
                        assert_eq!(item_id, "about")
                    }
                }
            }
        }
    }
}
