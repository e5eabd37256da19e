use crate::api::{
    ApiClient, ApiError, ApiResult, CreateMenuItemRequest, MenuItemPatch, UpdateMenuItemRequest,
};
use crate::menu_tree::{
    collapse_all_ids, flatten, next_order_index, remove_subtree, resolve_move, subtree_ids,
    FlatMenuItem,
};
use crate::models::{MenuGroup, MenuItem};
use crate::state::{AppContext, ToastKind};
use crate::storage::{load_collapsed_ids, save_collapsed_ids};
use crate::util::wire_parent_id;
use futures::future::join_all;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::collections::{HashMap, HashSet};

const REORDER_FAILED: &str = "Failed to reorder items";

/// Items of `after` whose `order` or parent differ from their counterpart in `before`.
///
/// Ids missing from `before` are ignored; they have nothing to update yet.
pub(crate) fn changed_items<'a>(before: &[MenuItem], after: &'a [MenuItem]) -> Vec<&'a MenuItem> {
    let old: HashMap<&str, &MenuItem> = before.iter().map(|n| (n.id.as_str(), n)).collect();
    after
        .iter()
        .filter(|n| match old.get(n.id.as_str()) {
            Some(o) => o.order != n.order || o.parent_key() != n.parent_key(),
            None => false,
        })
        .collect()
}

/// One update request per changed item. `parentId` is only sent when it moved.
pub(crate) fn reorder_requests(
    menu_id: &str,
    before: &[MenuItem],
    after: &[MenuItem],
) -> Vec<UpdateMenuItemRequest> {
    let old_parents: HashMap<&str, Option<&str>> = before
        .iter()
        .map(|n| (n.id.as_str(), n.parent_key()))
        .collect();

    changed_items(before, after)
        .into_iter()
        .map(|n| {
            let parent_moved = old_parents.get(n.id.as_str()).copied().flatten() != n.parent_key();
            UpdateMenuItemRequest {
                menu_id: menu_id.to_string(),
                item_id: n.id.clone(),
                payload: MenuItemPatch {
                    order_index: Some(n.order),
                    parent_id: parent_moved.then(|| n.parent_key().map(wire_parent_id)),
                    ..Default::default()
                },
            }
        })
        .collect()
}

/// Apply the display fields of `patch` to `item`. Structural fields are left to the resolver.
pub(crate) fn apply_field_patch(item: &mut MenuItem, patch: &MenuItemPatch) {
    if let Some(label) = &patch.label {
        item.label = label.clone();
    }
    if let Some(url) = &patch.url {
        item.url = url.clone();
    }
    if let Some(kind) = patch.kind {
        item.kind = kind;
    }
    if let Some(v) = patch.is_visible {
        item.is_visible = v;
    }
    if let Some(v) = patch.open_in_new_tab {
        item.open_in_new_tab = v;
    }
}

/// Fire every request at once and wait for all of them.
///
/// The batch fails if any request fails; requests that already landed are not undone.
pub(crate) async fn persist_batch(
    api_client: &ApiClient,
    requests: &[UpdateMenuItemRequest],
) -> ApiResult<usize> {
    if requests.is_empty() {
        return Ok(0);
    }

    let results = join_all(requests.iter().map(|r| api_client.update_menu_item(r))).await;
    settle_batch(results)
}

/// Fold the outcomes of one batch: every request must succeed.
///
/// On failure the first `Unauthorized` error is reported, otherwise the first error.
pub(crate) fn settle_batch(results: Vec<ApiResult<()>>) -> ApiResult<usize> {
    let total = results.len();
    let mut errors = results.into_iter().filter_map(Result::err).collect::<Vec<_>>();

    if errors.is_empty() {
        tracing::info!(count = total, "persisted menu item batch");
        return Ok(total);
    }

    tracing::warn!(
        failed = errors.len(),
        total,
        "menu item batch partially failed"
    );
    let first = match errors.iter().position(ApiError::is_unauthorized) {
        Some(ix) => errors.swap_remove(ix),
        None => errors.remove(0),
    };
    Err(first)
}

/// Failure text for the user; falls back to a generic line when the backend says nothing.
pub(crate) fn failure_message(e: &ApiError, fallback: &str) -> String {
    let msg = e.message.trim();
    if msg.is_empty() {
        fallback.to_string()
    } else {
        format!("{fallback}: {msg}")
    }
}

/// Local-first controller for one menu in the editor.
///
/// Every mutation follows the same cycle: update the local copy right away, send
/// the change to the backend, then re-fetch the menu no matter how that went. The
/// local copy is only a cache; the backend is the authority.
#[derive(Clone, Copy)]
pub(crate) struct MenuSyncController {
    app_state: AppContext,

    pub menu_id: RwSignal<String>,
    pub menu: RwSignal<Option<MenuGroup>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,

    /// Number of in-flight persistence batches.
    pub saving: RwSignal<u32>,

    /// Rows whose children are hidden in the editor.
    pub collapsed: RwSignal<HashSet<String>>,

    /// Guards against stale fetch responses overwriting newer ones.
    request_id: RwSignal<u64>,
}

impl MenuSyncController {
    pub fn new(app_state: AppContext) -> Self {
        Self {
            app_state,
            menu_id: RwSignal::new(String::new()),
            menu: RwSignal::new(None),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
            saving: RwSignal::new(0),
            collapsed: RwSignal::new(HashSet::new()),
            request_id: RwSignal::new(0),
        }
    }

    /// Switch to `menu_id` and fetch it.
    pub fn open(&self, menu_id: String) {
        if menu_id.trim().is_empty() {
            self.menu.set(None);
            return;
        }
        if self.menu_id.get_untracked() != menu_id {
            self.menu.set(None);
            self.collapsed.set(load_collapsed_ids(&menu_id));
            self.menu_id.set(menu_id);
        }
        self.fetch(true);
    }

    /// Throw away the local copy's authority and fetch the canonical menu.
    pub fn refetch(&self) {
        self.fetch(false);
    }

    fn fetch(&self, show_loading: bool) {
        let menu_id = self.menu_id.get_untracked();
        if menu_id.trim().is_empty() {
            return;
        }

        let rid = self.request_id.get_untracked().wrapping_add(1);
        self.request_id.set(rid);
        if show_loading {
            self.loading.set(true);
        }
        self.error.set(None);

        let this = *self;
        let api_client = self.app_state.0.api_client.get_untracked();
        spawn_local(async move {
            let res = api_client.get_menu(&menu_id).await;
            if this.request_id.get_untracked() != rid {
                tracing::debug!(menu = %menu_id, "dropping stale menu response");
                return;
            }
            match res {
                Ok(menu) => {
                    tracing::debug!(menu = %menu.id, items = menu.items.len(), "menu fetched");
                    this.menu.set(Some(menu));
                }
                Err(e) => {
                    if !this.app_state.0.handle_api_error(&e) {
                        this.error.set(Some(e.to_string()));
                    }
                }
            }
            this.loading.set(false);
        });
    }

    pub fn items(&self) -> Vec<MenuItem> {
        self.menu
            .with(|m| m.as_ref().map(|m| m.items.clone()))
            .unwrap_or_default()
    }

    /// Visible rows for the editor (tracks both the menu and the collapsed set).
    pub fn rows(&self) -> Vec<FlatMenuItem> {
        let collapsed = self.collapsed.get();
        self.menu.with(|m| {
            m.as_ref()
                .map(|m| flatten(&m.items, &collapsed))
                .unwrap_or_default()
        })
    }

    fn set_items(&self, items: Vec<MenuItem>) {
        self.menu.update(|m| {
            if let Some(m) = m.as_mut() {
                m.items = items;
            }
        });
    }

    fn store_collapsed(&self) {
        let menu_id = self.menu_id.get_untracked();
        self.collapsed
            .with_untracked(|ids| save_collapsed_ids(&menu_id, ids));
    }

    pub fn toggle_collapsed(&self, item_id: &str) {
        self.collapsed.update(|ids| {
            if !ids.remove(item_id) {
                ids.insert(item_id.to_string());
            }
        });
        self.store_collapsed();
    }

    pub fn collapse_all(&self) {
        self.collapsed.set(collapse_all_ids(&self.items()));
        self.store_collapsed();
    }

    pub fn expand_all(&self) {
        self.collapsed.set(HashSet::new());
        self.store_collapsed();
    }

    /// Handle a drop from row `source` onto slot `destination` (`None` = cancelled).
    pub fn apply_move(&self, source: usize, destination: Option<usize>) {
        let before = self.items();
        let flat = self.collapsed.with_untracked(|c| flatten(&before, c));

        let after = match resolve_move(&flat, &before, source, destination) {
            Ok(Some(after)) => after,
            Ok(None) => return,
            Err(e) => {
                self.app_state.0.toasts.push(ToastKind::Error, e.to_string());
                return;
            }
        };

        let requests = reorder_requests(&self.menu_id.get_untracked(), &before, &after);
        self.set_items(after);
        if requests.is_empty() {
            return;
        }

        self.persist(requests, REORDER_FAILED, None);
    }

    fn persist(
        &self,
        requests: Vec<UpdateMenuItemRequest>,
        failure: &'static str,
        success: Option<&'static str>,
    ) {
        self.saving.update(|n| *n += 1);
        let this = *self;
        let api_client = self.app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match persist_batch(&api_client, &requests).await {
                Ok(_) => {
                    if let Some(msg) = success {
                        this.app_state.0.toasts.push(ToastKind::Success, msg);
                    }
                }
                Err(e) => this.report(&e, failure),
            }
            this.saving.update(|n| *n = n.saturating_sub(1));
            this.refetch();
        });
    }

    fn report(&self, e: &ApiError, fallback: &str) {
        if self.app_state.0.handle_api_error(e) {
            return;
        }
        self.app_state
            .0
            .toasts
            .push(ToastKind::Error, failure_message(e, fallback));
    }

    /// Append a new item at the end of `parent_id`'s group.
    pub fn add_item(&self, label: String, url: String, parent_id: Option<String>) {
        let menu_id = self.menu_id.get_untracked();
        if menu_id.trim().is_empty() || label.trim().is_empty() {
            return;
        }

        let order = next_order_index(&self.items(), parent_id.as_deref());
        let req = CreateMenuItemRequest::new(&label, &url, parent_id.as_deref(), order);

        if let Some(parent) = parent_id.as_deref() {
            // Make the new child visible.
            self.collapsed.update(|ids| {
                ids.remove(parent);
            });
            self.store_collapsed();
        }

        self.saving.update(|n| *n += 1);
        let this = *self;
        let api_client = self.app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.create_menu_item(&menu_id, &req).await {
                Ok(mut created) => {
                    created.parent_id = parent_id.filter(|p| !p.trim().is_empty());
                    created.order = order;
                    tracing::info!(item = %created.id, "menu item created");
                    this.menu.update(|m| {
                        if let Some(m) = m.as_mut() {
                            m.items.push(created);
                        }
                    });
                    this.app_state
                        .0
                        .toasts
                        .push(ToastKind::Success, "Menu item added");
                }
                Err(e) => this.report(&e, "Failed to add menu item"),
            }
            this.saving.update(|n| *n = n.saturating_sub(1));
            this.refetch();
        });
    }

    /// Remove an item together with everything nested under it.
    pub fn delete_item(&self, item_id: String) {
        let menu_id = self.menu_id.get_untracked();
        let before = self.items();
        if !before.iter().any(|n| n.id == item_id) {
            return;
        }

        let doomed = subtree_ids(&before, &item_id);
        let after = remove_subtree(&before, &item_id);
        let renumber = reorder_requests(&menu_id, &before, &after);
        self.set_items(after);
        self.collapsed.update(|ids| ids.retain(|id| !doomed.contains(id)));
        self.store_collapsed();

        self.saving.update(|n| *n += 1);
        let this = *self;
        let api_client = self.app_state.0.api_client.get_untracked();
        spawn_local(async move {
            // Deepest first, so the backend never sees a child without its parent.
            let mut result = Ok(());
            for id in doomed.iter().rev() {
                if let Err(e) = api_client.delete_menu_item(&menu_id, id).await {
                    result = Err(e);
                    break;
                }
            }

            let result = match result {
                Ok(()) => persist_batch(&api_client, &renumber).await.map(|_| ()),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    tracing::info!(item = %doomed[0], removed = doomed.len(), "menu item deleted");
                    this.app_state
                        .0
                        .toasts
                        .push(ToastKind::Success, "Menu item deleted");
                }
                Err(e) => this.report(&e, "Failed to delete menu item"),
            }
            this.saving.update(|n| *n = n.saturating_sub(1));
            this.refetch();
        });
    }

    /// Edit display fields of one item (label, url, visibility, new tab).
    pub fn update_fields(&self, item_id: String, patch: MenuItemPatch) {
        let menu_id = self.menu_id.get_untracked();
        let mut items = self.items();
        let Some(item) = items.iter_mut().find(|n| n.id == item_id) else {
            return;
        };
        apply_field_patch(item, &patch);
        self.set_items(items);

        let req = UpdateMenuItemRequest {
            menu_id,
            item_id,
            payload: MenuItemPatch {
                order_index: None,
                parent_id: None,
                ..patch
            },
        };
        self.persist(
            vec![req],
            "Failed to update menu item",
            Some("Menu item updated"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiErrorKind, WireParentId};
    use crate::menu_tree::fixtures::item;
    use crate::models::MenuItemKind;

    #[test]
    fn test_changed_items_compares_order_and_parent() {
        let before = vec![
            item("a", None, 0),
            item("b", None, 1),
            item("c", Some("b"), 0),
            item("d", Some(""), 2),
        ];
        let mut after = before.clone();
        after[0].order = 1;
        after[1].order = 2;
        after[2].parent_id = None;
        // Empty and missing parents are the same root.
        after[3].parent_id = None;
        after[0].label = "label edits do not count".into();

        let ids = changed_items(&before, &after)
            .into_iter()
            .map(|n| n.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_changed_items_ignores_unknown_ids() {
        let before = vec![item("a", None, 0)];
        let after = vec![item("a", None, 0), item("new", None, 1)];
        assert!(changed_items(&before, &after).is_empty());
    }

    #[test]
    fn test_reorder_requests_after_move() {
        let before = vec![item("1", None, 0), item("2", None, 1), item("3", Some("2"), 0)];
        let flat = flatten(&before, &HashSet::new());
        let after = resolve_move(&flat, &before, 2, Some(0))
            .expect("accepted")
            .expect("changed");

        let reqs = reorder_requests("main", &before, &after);
        let by_id = |id: &str| {
            reqs.iter()
                .find(|r| r.item_id == id)
                .unwrap_or_else(|| panic!("no request for {id}"))
        };

        assert_eq!(reqs.len(), 3);
        assert!(reqs.iter().all(|r| r.menu_id == "main"));

        let moved = by_id("3");
        assert_eq!(moved.payload.order_index, Some(0));
        assert_eq!(moved.payload.parent_id, Some(None));

        let shifted = by_id("1");
        assert_eq!(shifted.payload.order_index, Some(1));
        assert_eq!(shifted.payload.parent_id, None);
    }

    #[test]
    fn test_reorder_requests_numeric_parent() {
        let before = vec![item("10", None, 0), item("11", None, 1)];
        let mut after = before.clone();
        after[1].parent_id = Some("10".into());
        after[1].order = 0;

        let reqs = reorder_requests("m", &before, &after);
        assert_eq!(reqs.len(), 1);
        assert_eq!(
            reqs[0].payload.parent_id,
            Some(Some(WireParentId::Numeric(10)))
        );
        let v = serde_json::to_value(&reqs[0]).expect("serialize");
        assert_eq!(v["payload"]["parentId"], 10);
        assert_eq!(v["payload"]["orderIndex"], 0);
    }

    #[test]
    fn test_reorder_requests_empty_when_nothing_changed() {
        let items = vec![item("a", None, 0), item("b", None, 1)];
        assert!(reorder_requests("m", &items, &items).is_empty());
    }

    #[test]
    fn test_apply_field_patch_leaves_structure_alone() {
        let mut it = item("a", Some("p"), 3);
        let patch = MenuItemPatch {
            order_index: Some(0),
            parent_id: Some(None),
            label: Some("Blog".into()),
            url: Some("/blog".into()),
            kind: Some(MenuItemKind::Post),
            is_visible: Some(false),
            open_in_new_tab: Some(true),
        };
        apply_field_patch(&mut it, &patch);
        assert_eq!(it.label, "Blog");
        assert_eq!(it.url, "/blog");
        assert_eq!(it.kind, MenuItemKind::Post);
        assert!(!it.is_visible);
        assert!(it.open_in_new_tab);
        assert_eq!(it.order, 3);
        assert_eq!(it.parent_key(), Some("p"));
    }

    fn err(kind: ApiErrorKind, message: &str) -> ApiError {
        ApiError {
            kind,
            message: message.into(),
        }
    }

    #[test]
    fn test_settle_batch_all_ok() {
        assert_eq!(settle_batch(vec![Ok(()), Ok(()), Ok(())]).expect("ok"), 3);
        assert_eq!(settle_batch(vec![]).expect("ok"), 0);
    }

    #[test]
    fn test_settle_batch_one_failure_fails_batch() {
        let e = settle_batch(vec![
            Ok(()),
            Err(err(ApiErrorKind::Http, "Request failed (500)")),
            Ok(()),
        ])
        .expect_err("batch should fail");
        assert_eq!(e.kind, ApiErrorKind::Http);
        assert_eq!(e.message, "Request failed (500)");
    }

    #[test]
    fn test_settle_batch_reports_first_error_in_order() {
        let e = settle_batch(vec![
            Err(err(ApiErrorKind::Network, "offline")),
            Err(err(ApiErrorKind::Http, "Request failed (409)")),
        ])
        .expect_err("batch should fail");
        assert_eq!(e.message, "offline");
    }

    #[test]
    fn test_settle_batch_prefers_unauthorized() {
        let e = settle_batch(vec![
            Err(err(ApiErrorKind::Http, "Request failed (500)")),
            Ok(()),
            Err(err(ApiErrorKind::Unauthorized, "Unauthorized")),
            Err(err(ApiErrorKind::Network, "offline")),
        ])
        .expect_err("batch should fail");
        assert!(e.is_unauthorized());
    }

    #[test]
    fn test_failure_message_fallback() {
        let blank = ApiError {
            kind: ApiErrorKind::Network,
            message: "  ".into(),
        };
        assert_eq!(failure_message(&blank, REORDER_FAILED), REORDER_FAILED);

        let http = ApiError {
            kind: ApiErrorKind::Http,
            message: "Request failed (500): boom".into(),
        };
        assert_eq!(
            failure_message(&http, REORDER_FAILED),
            "Failed to reorder items: Request failed (500): boom"
        );
    }
}
