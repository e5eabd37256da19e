//! Menu tree maintenance.
//!
//! Menus arrive as a flat list of items that point at their parent by id. Everything
//! in here works on that shape directly: a throwaway `parent -> children` index is
//! built per call instead of materializing a nested tree.

mod flatten;
mod order;
mod reorder;
mod subtree;

use crate::models::MenuItem;
use std::collections::HashMap;

pub(crate) use flatten::{flatten, FlatMenuItem};
pub(crate) use order::{next_order_index, set_sequential_order};
pub(crate) use reorder::{resolve_move, MoveError};
pub(crate) use subtree::{collapse_all_ids, is_descendant_or_self, remove_subtree, subtree_ids};

/// Children grouped by normalized parent key (`None` = root), each group sorted by `order`.
///
/// The sort is stable, so items sharing an `order` keep their list position.
pub(crate) fn children_index(items: &[MenuItem]) -> HashMap<Option<&str>, Vec<&MenuItem>> {
    let mut index: HashMap<Option<&str>, Vec<&MenuItem>> = HashMap::new();
    for item in items {
        index.entry(item.parent_key()).or_default().push(item);
    }
    for kids in index.values_mut() {
        kids.sort_by_key(|n| n.order);
    }
    index
}

/// Owned copy of one sibling group, sorted by `order`, minus `exclude_id`.
pub(crate) fn sibling_group(
    items: &[MenuItem],
    parent: Option<&str>,
    exclude_id: Option<&str>,
) -> Vec<MenuItem> {
    let mut sibs = items
        .iter()
        .filter(|n| n.parent_key() == parent)
        .filter(|n| Some(n.id.as_str()) != exclude_id)
        .cloned()
        .collect::<Vec<_>>();
    sibs.sort_by_key(|n| n.order);
    sibs
}

/// Copy `order` and `parent_id` from `updated` onto the matching entries of `items`.
pub(crate) fn write_back(items: &mut [MenuItem], updated: &[MenuItem]) {
    let by_id: HashMap<&str, &MenuItem> = updated.iter().map(|n| (n.id.as_str(), n)).collect();
    for item in items.iter_mut() {
        if let Some(u) = by_id.get(item.id.as_str()) {
            item.order = u.order;
            item.parent_id = u.parent_id.clone();
        }
    }
}
