use crate::models::MenuItem;

/// Overwrite `order` with each item's position in `items`, starting at 0.
pub(crate) fn set_sequential_order(items: Vec<MenuItem>) -> Vec<MenuItem> {
    items
        .into_iter()
        .enumerate()
        .map(|(ix, mut item)| {
            item.order = ix as i32;
            item
        })
        .collect()
}

/// The `order` a newly appended child of `parent` takes.
pub(crate) fn next_order_index(items: &[MenuItem], parent: Option<&str>) -> i32 {
    let parent = parent.filter(|p| !p.trim().is_empty());
    items.iter().filter(|n| n.parent_key() == parent).count() as i32
}
