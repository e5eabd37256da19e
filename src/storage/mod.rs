use crate::models::AccountInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub(crate) const TOKEN_KEY: &str = "menu_admin_token";
pub(crate) const USER_KEY: &str = "menu_admin_user";

fn collapsed_key(menu_id: &str) -> String {
    format!("menu_admin_collapsed::{menu_id}")
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn save_user_to_storage(user: &AccountInfo) {
    save_json_to_storage(USER_KEY, user);
}

pub(crate) fn load_user_from_storage() -> Option<AccountInfo> {
    load_json_from_storage(USER_KEY)
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let json = local_storage()?.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => {
            if let Some(storage) = local_storage() {
                let _ = storage.set_item(key, &json);
            }
        }
        Err(e) => tracing::warn!(key, error = %e, "failed to encode storage value"),
    }
}

/// Collapsed rows of the editor for one menu. A UI preference only; never synced.
pub(crate) fn load_collapsed_ids(menu_id: &str) -> HashSet<String> {
    if menu_id.trim().is_empty() {
        return HashSet::new();
    }
    load_json_from_storage::<Vec<String>>(&collapsed_key(menu_id))
        .map(|ids| ids.into_iter().collect())
        .unwrap_or_default()
}

pub(crate) fn save_collapsed_ids(menu_id: &str, ids: &HashSet<String>) {
    if menu_id.trim().is_empty() {
        return;
    }
    let mut sorted = ids.iter().cloned().collect::<Vec<_>>();
    sorted.sort();
    save_json_to_storage(&collapsed_key(menu_id), &sorted);
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_user_storage_roundtrip() {
        let user = AccountInfo {
            extra: serde_json::json!({"id": 1, "email": "admin@example.com"}),
        };
        save_user_to_storage(&user);
        let loaded = load_user_from_storage().expect("should load user from localStorage");
        assert_eq!(loaded.extra["email"], "admin@example.com");
    }

    #[wasm_bindgen_test]
    fn test_collapsed_ids_roundtrip_per_menu() {
        let ids = HashSet::from(["a".to_string(), "b".to_string()]);
        save_collapsed_ids("menu-1", &ids);
        assert_eq!(load_collapsed_ids("menu-1"), ids);
        assert!(load_collapsed_ids("menu-2").is_empty());
        assert!(load_collapsed_ids("").is_empty());
    }
}
