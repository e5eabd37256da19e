use super::children_index;
use crate::models::MenuItem;
use std::collections::{HashMap, HashSet};

/// A visible row of the menu editor.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FlatMenuItem {
    pub item: MenuItem,
    pub level: usize,
    /// Last row of its sibling group (drives the tree connector).
    pub is_last: bool,
    pub has_children: bool,
}

/// Pre-order, collapse-aware linearization of the menu tree.
///
/// Items whose parent does not exist are never reached and do not show up.
pub(crate) fn flatten(items: &[MenuItem], collapsed_ids: &HashSet<String>) -> Vec<FlatMenuItem> {
    let index = children_index(items);
    let mut out = Vec::with_capacity(items.len());
    let mut visited: HashSet<&str> = HashSet::new();
    walk(&index, None, 0, collapsed_ids, &mut visited, &mut out);
    out
}

fn walk<'a>(
    index: &HashMap<Option<&'a str>, Vec<&'a MenuItem>>,
    parent: Option<&'a str>,
    level: usize,
    collapsed_ids: &HashSet<String>,
    visited: &mut HashSet<&'a str>,
    out: &mut Vec<FlatMenuItem>,
) {
    let Some(kids) = index.get(&parent) else {
        return;
    };

    let last_ix = kids.len().saturating_sub(1);
    for (ix, item) in kids.iter().enumerate() {
        // A parent cycle would otherwise recurse forever.
        if !visited.insert(item.id.as_str()) {
            continue;
        }

        let has_children = index
            .get(&Some(item.id.as_str()))
            .is_some_and(|c| !c.is_empty());

        out.push(FlatMenuItem {
            item: (*item).clone(),
            level,
            is_last: ix == last_ix,
            has_children,
        });

        if has_children && !collapsed_ids.contains(&item.id) {
            walk(
                index,
                Some(item.id.as_str()),
                level + 1,
                collapsed_ids,
                visited,
                out,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu_tree::fixtures::item;

    fn rows(flat: &[FlatMenuItem]) -> Vec<(&str, usize)> {
        flat.iter().map(|r| (r.item.id.as_str(), r.level)).collect()
    }

    fn sample() -> Vec<MenuItem> {
        // about
        //   team
        //     alumni
        //   history
        // home
        // contact
        vec![
            item("contact", None, 2),
            item("history", Some("about"), 1),
            item("home", None, 0),
            item("about", None, 1),
            item("alumni", Some("team"), 0),
            item("team", Some("about"), 0),
        ]
    }

    #[test]
    fn test_flatten_empty() {
        assert!(flatten(&[], &HashSet::new()).is_empty());
    }

    #[test]
    fn test_flatten_is_preorder_with_sorted_siblings() {
        let flat = flatten(&sample(), &HashSet::new());
        assert_eq!(
            rows(&flat),
            vec![
                ("home", 0),
                ("about", 0),
                ("team", 1),
                ("alumni", 2),
                ("history", 1),
                ("contact", 0),
            ]
        );
    }

    #[test]
    fn test_flatten_flags() {
        let flat = flatten(&sample(), &HashSet::new());
        let get = |id: &str| flat.iter().find(|r| r.item.id == id).expect("row");

        assert!(get("about").has_children);
        assert!(get("team").has_children);
        assert!(!get("home").has_children);

        assert!(get("contact").is_last);
        assert!(!get("home").is_last);
        assert!(get("history").is_last);
        assert!(!get("team").is_last);
        assert!(get("alumni").is_last);
    }

    #[test]
    fn test_flatten_collapsed_hides_subtree() {
        let collapsed = HashSet::from(["about".to_string()]);
        let flat = flatten(&sample(), &collapsed);
        assert_eq!(rows(&flat), vec![("home", 0), ("about", 0), ("contact", 0)]);
        // The collapsed row still reports it has children.
        assert!(flat[1].has_children);
    }

    #[test]
    fn test_flatten_collapse_nested_then_expand_restores() {
        let items = sample();
        let open = flatten(&items, &HashSet::new());

        let collapsed = HashSet::from(["team".to_string()]);
        let closed = flatten(&items, &collapsed);
        assert!(closed.iter().all(|r| r.item.id != "alumni"));
        assert_eq!(closed.len(), open.len() - 1);

        // Collapsing twice changes nothing; expanding restores every row.
        assert_eq!(flatten(&items, &collapsed), closed);
        assert_eq!(flatten(&items, &HashSet::new()), open);
    }

    #[test]
    fn test_flatten_collapsing_leaf_is_harmless() {
        let collapsed = HashSet::from(["home".to_string()]);
        assert_eq!(
            flatten(&sample(), &collapsed),
            flatten(&sample(), &HashSet::new())
        );
    }

    #[test]
    fn test_flatten_omits_orphans() {
        let items = vec![
            item("a", None, 0),
            item("lost", Some("ghost"), 0),
            item("lost-child", Some("lost"), 0),
        ];
        let flat = flatten(&items, &HashSet::new());
        assert_eq!(rows(&flat), vec![("a", 0)]);
    }

    #[test]
    fn test_flatten_survives_parent_cycle() {
        // a <-> b never hangs off root.
        let items = vec![
            item("r", None, 0),
            item("a", Some("b"), 0),
            item("b", Some("a"), 0),
            item("x", Some("r"), 0),
        ];
        let flat = flatten(&items, &HashSet::new());
        assert_eq!(rows(&flat), vec![("r", 0), ("x", 1)]);
    }

    #[test]
    fn test_flatten_duplicate_id_under_itself_terminates() {
        let items = vec![item("d", None, 0), item("d", Some("d"), 1)];
        let flat = flatten(&items, &HashSet::new());
        assert_eq!(rows(&flat), vec![("d", 0)]);
    }

    #[test]
    fn test_flatten_does_not_mutate_input() {
        let items = sample();
        let before = items.clone();
        let _ = flatten(&items, &HashSet::new());
        assert_eq!(items, before);
    }
}
