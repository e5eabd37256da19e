use super::{set_sequential_order, sibling_group, write_back};
use crate::models::MenuItem;
use std::collections::{HashMap, HashSet};

/// Whether `candidate_id` is `ancestor_id` or sits somewhere below it.
///
/// Walks the parent chain up from `candidate_id`. The walk is bounded by the item
/// count, so an existing cycle cannot hang it.
pub(crate) fn is_descendant_or_self(
    items: &[MenuItem],
    ancestor_id: &str,
    candidate_id: &str,
) -> bool {
    let parents: HashMap<&str, Option<&str>> = items
        .iter()
        .map(|n| (n.id.as_str(), n.parent_key()))
        .collect();

    let mut cur = Some(candidate_id);
    for _ in 0..=items.len() {
        let Some(id) = cur else {
            return false;
        };
        if id == ancestor_id {
            return true;
        }
        cur = parents.get(id).copied().flatten();
    }
    false
}

/// `root_id` followed by all of its descendants.
pub(crate) fn subtree_ids(items: &[MenuItem], root_id: &str) -> Vec<String> {
    let mut out = vec![root_id.to_string()];
    let mut seen: HashSet<&str> = HashSet::from([root_id]);
    let mut ix = 0;
    while ix < out.len() {
        let parent = out[ix].clone();
        for n in items.iter().filter(|n| n.parent_key() == Some(parent.as_str())) {
            if seen.insert(n.id.as_str()) {
                out.push(n.id.clone());
            }
        }
        ix += 1;
    }
    out
}

/// Drop `root_id` and its descendants, then close the gap in its former sibling group.
pub(crate) fn remove_subtree(items: &[MenuItem], root_id: &str) -> Vec<MenuItem> {
    let Some(root) = items.iter().find(|n| n.id == root_id) else {
        return items.to_vec();
    };
    let parent = root.parent_key().map(str::to_string);

    let doomed: HashSet<String> = subtree_ids(items, root_id).into_iter().collect();
    let mut next = items
        .iter()
        .filter(|n| !doomed.contains(&n.id))
        .cloned()
        .collect::<Vec<_>>();

    let sibs = set_sequential_order(sibling_group(&next, parent.as_deref(), None));
    write_back(&mut next, &sibs);
    next
}

/// Ids of every item that has at least one child ("collapse all").
pub(crate) fn collapse_all_ids(items: &[MenuItem]) -> HashSet<String> {
    let ids: HashSet<&str> = items.iter().map(|n| n.id.as_str()).collect();
    items
        .iter()
        .filter_map(|n| n.parent_key())
        .filter(|p| ids.contains(p))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu_tree::fixtures::{find, item};

    fn sample() -> Vec<MenuItem> {
        vec![
            item("home", None, 0),
            item("about", None, 1),
            item("team", Some("about"), 0),
            item("alumni", Some("team"), 0),
            item("history", Some("about"), 1),
            item("contact", None, 2),
        ]
    }

    #[test]
    fn test_descendant_or_self() {
        let items = sample();
        assert!(is_descendant_or_self(&items, "about", "about"));
        assert!(is_descendant_or_self(&items, "about", "alumni"));
        assert!(is_descendant_or_self(&items, "about", "history"));
        assert!(!is_descendant_or_self(&items, "team", "history"));
        assert!(!is_descendant_or_self(&items, "alumni", "about"));
        assert!(!is_descendant_or_self(&items, "about", "missing"));
    }

    #[test]
    fn test_descendant_walk_terminates_on_cycle() {
        let items = vec![item("a", Some("b"), 0), item("b", Some("a"), 0)];
        assert!(!is_descendant_or_self(&items, "z", "a"));
        assert!(is_descendant_or_self(&items, "b", "a"));
    }

    #[test]
    fn test_subtree_ids() {
        let items = sample();
        let mut ids = subtree_ids(&items, "about");
        assert_eq!(ids[0], "about");
        ids.sort();
        assert_eq!(ids, vec!["about", "alumni", "history", "team"]);
        assert_eq!(subtree_ids(&items, "home"), vec!["home"]);
    }

    #[test]
    fn test_remove_subtree_renumbers_siblings() {
        let out = remove_subtree(&sample(), "about");
        let mut ids = out.iter().map(|n| n.id.as_str()).collect::<Vec<_>>();
        ids.sort();
        assert_eq!(ids, vec!["contact", "home"]);
        assert_eq!(find(&out, "home").order, 0);
        assert_eq!(find(&out, "contact").order, 1);
    }

    #[test]
    fn test_remove_subtree_unknown_id_is_noop() {
        assert_eq!(remove_subtree(&sample(), "nope"), sample());
    }

    #[test]
    fn test_collapse_all_ids() {
        let ids = collapse_all_ids(&sample());
        assert_eq!(
            ids,
            HashSet::from(["about".to_string(), "team".to_string()])
        );

        let orphaned = vec![item("x", Some("ghost"), 0)];
        assert!(collapse_all_ids(&orphaned).is_empty());
    }
}
