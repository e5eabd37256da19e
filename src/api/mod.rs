use crate::models::{AccountInfo, MenuGroup, MenuItem, MenuItemKind, MenuSummary};
use crate::storage::{TOKEN_KEY, USER_KEY};
use crate::util::wire_parent_id;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub log_level: String,
}

impl EnvConfig {
    /// Read `window.ENV`, accepting both `API_URL` and `api_url` style keys.
    pub fn new() -> Self {
        Self {
            api_url: read_window_env(&["API_URL", "api_url"])
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            log_level: read_window_env(&["LOG_LEVEL", "log_level"])
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_window_env(keys: &[&str]) -> Option<String> {
    let env = web_sys::window()?.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }
    keys.iter()
        .filter_map(|k| js_sys::Reflect::get(&env, &(*k).into()).ok())
        .find_map(|v| v.as_string())
        .filter(|s| !s.trim().is_empty())
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginResponse {
    pub token: String,
    pub user: AccountInfo,
}

/// Parent id as the API wants it: numeric ids go out as JSON numbers.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum WireParentId {
    Numeric(i64),
    Text(String),
}

/// Partial update of one menu item. Unset fields are left alone by the backend.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct MenuItemPatch {
    #[serde(rename = "orderIndex", skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,

    /// `Some(None)` is sent as `null` and moves the item to root.
    #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<WireParentId>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MenuItemKind>,

    #[serde(rename = "isVisible", skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,

    #[serde(rename = "openInNewTab", skip_serializing_if = "Option::is_none")]
    pub open_in_new_tab: Option<bool>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct UpdateMenuItemRequest {
    #[serde(rename = "menuId")]
    pub menu_id: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    pub payload: MenuItemPatch,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct CreateMenuItemRequest {
    pub label: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MenuItemKind,
    #[serde(rename = "isVisible")]
    pub is_visible: bool,
    #[serde(rename = "openInNewTab")]
    pub open_in_new_tab: bool,
    #[serde(rename = "parentId")]
    pub parent_id: Option<WireParentId>,
    #[serde(rename = "orderIndex")]
    pub order_index: i32,
}

impl CreateMenuItemRequest {
    pub fn new(label: &str, url: &str, parent_id: Option<&str>, order_index: i32) -> Self {
        Self {
            label: label.trim().to_string(),
            url: url.trim().to_string(),
            kind: MenuItemKind::Link,
            is_visible: true,
            open_in_new_tab: false,
            parent_id: parent_id
                .filter(|p| !p.trim().is_empty())
                .map(wire_parent_id),
            order_index,
        }
    }
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let mut client = Self::new(EnvConfig::new().api_url);
        client.token = leptos::web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten());
        client
    }

    pub fn save_to_storage(&self) {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            if let Some(token) = &self.token {
                let _ = storage.set_item(TOKEN_KEY, token);
            }
        }
    }

    pub fn clear_storage() {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn logout(&mut self) {
        self.token = None;
        Self::clear_storage();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    fn menu_path(menu_id: &str) -> String {
        format!("/menus/{}", urlencoding::encode(menu_id))
    }

    fn menu_item_path(menu_id: &str, item_id: &str) -> String {
        format!(
            "{}/items/{}",
            Self::menu_path(menu_id),
            urlencoding::encode(item_id)
        )
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, path, "api request");

        let mut req = client.request(method.clone(), url);
        if let Some(header) = self.get_auth_header() {
            req = req.header("Authorization", header);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "api request failed to send");
            ApiError::network(e)
        })?;

        let status = res.status();
        if status.as_u16() == 401 {
            return Err(ApiError::unauthorized());
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(%method, path, %status, "api request rejected");
            return Err(ApiError::http(status, body, "Request failed"));
        }

        // Update/delete endpoints may answer with an empty body.
        let text = res.text().await.map_err(ApiError::network)?;
        let data = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(ApiError::parse)?
        };
        serde_json::from_value(data).map_err(ApiError::parse)
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        self.request(
            Method::POST,
            "/auth/login",
            Some(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            }),
        )
        .await
    }

    pub async fn list_menus(&self) -> ApiResult<Vec<MenuSummary>> {
        let data: serde_json::Value = self.request(Method::GET, "/menus", None::<&()>).await?;
        Ok(Self::parse_menu_list_response(data))
    }

    pub async fn get_menu(&self, menu_id: &str) -> ApiResult<MenuGroup> {
        let data: serde_json::Value = self
            .request(Method::GET, &Self::menu_path(menu_id), None::<&()>)
            .await?;
        Self::parse_menu_response(data)
    }

    pub async fn create_menu_item(
        &self,
        menu_id: &str,
        req_body: &CreateMenuItemRequest,
    ) -> ApiResult<MenuItem> {
        let data: serde_json::Value = self
            .request(
                Method::POST,
                &format!("{}/items", Self::menu_path(menu_id)),
                Some(req_body),
            )
            .await?;

        // Accept `{item: {...}}`, `{data: {...}}` or the bare item.
        let node = data
            .get("item")
            .or_else(|| data.get("data"))
            .unwrap_or(&data);
        let mut items = Vec::new();
        collect_items(node, None, 0, &mut items);
        items
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::parse(format!("Create item response is missing an id: {data}")))
    }

    pub async fn update_menu_item(&self, req_body: &UpdateMenuItemRequest) -> ApiResult<()> {
        self.request::<serde_json::Value>(
            Method::PATCH,
            &Self::menu_item_path(&req_body.menu_id, &req_body.item_id),
            Some(&req_body.payload),
        )
        .await
        .map(|_| ())
    }

    pub async fn delete_menu_item(&self, menu_id: &str, item_id: &str) -> ApiResult<()> {
        self.request::<serde_json::Value>(
            Method::DELETE,
            &Self::menu_item_path(menu_id, item_id),
            None::<&()>,
        )
        .await
        .map(|_| ())
    }

    pub(crate) fn parse_menu_list_response(data: serde_json::Value) -> Vec<MenuSummary> {
        let list = data
            .get("menus")
            .or_else(|| data.get("data"))
            .unwrap_or(&data)
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut out: Vec<MenuSummary> = Vec::with_capacity(list.len());
        for item in list {
            let id = get_str(&item, &["id", "menuId", "menu_id"]).unwrap_or_default();
            if id.trim().is_empty() {
                continue;
            }

            let item_count = item
                .get("items")
                .and_then(|v| v.as_array())
                .map(|a| a.len())
                .or_else(|| {
                    get_num(&item, &["itemCount", "item_count"]).map(|n| n.max(0.0) as usize)
                })
                .unwrap_or(0);

            out.push(MenuSummary {
                id,
                name: get_str(&item, &["name", "title"]).unwrap_or_default(),
                location: get_str(&item, &["location"]).unwrap_or_default(),
                is_active: get_bool(&item, &["isActive", "is_active"]).unwrap_or(true),
                item_count,
            });
        }

        out
    }

    /// Normalize a menu response into a [`MenuGroup`] with a flat item list.
    ///
    /// The backend has been seen answering both with flat `items` carrying `parentId`
    /// and with nested `children`; nesting wins over an explicit parent id.
    pub(crate) fn parse_menu_response(data: serde_json::Value) -> ApiResult<MenuGroup> {
        let menu = data
            .get("menu")
            .or_else(|| data.get("data"))
            .unwrap_or(&data);

        let id = get_str(menu, &["id", "menuId", "menu_id"]).unwrap_or_default();
        if id.trim().is_empty() {
            return Err(ApiError::parse(format!("Menu response is missing an id: {data}")));
        }

        let mut items = Vec::new();
        if let Some(list) = menu
            .get("items")
            .or_else(|| menu.get("menuItems"))
            .or_else(|| menu.get("menu_items"))
            .and_then(|v| v.as_array())
        {
            for (ix, node) in list.iter().enumerate() {
                collect_items(node, None, ix, &mut items);
            }
        }

        Ok(MenuGroup {
            id,
            name: get_str(menu, &["name", "title"]).unwrap_or_default(),
            location: get_str(menu, &["location"]).unwrap_or_default(),
            is_active: get_bool(menu, &["isActive", "is_active"]).unwrap_or(true),
            created_at: get_str(menu, &["createdAt", "created_at"]).unwrap_or_default(),
            items,
        })
    }
}

/// Push `node` (and any nested `children`) onto `out` as flat items.
fn collect_items(
    node: &serde_json::Value,
    nested_parent: Option<&str>,
    position: usize,
    out: &mut Vec<MenuItem>,
) {
    let Some(id) = get_str(node, &["id", "itemId", "item_id"]).filter(|s| !s.trim().is_empty())
    else {
        return;
    };

    let parent_id = match nested_parent {
        Some(p) => Some(p.to_string()),
        None => get_str(node, &["parentId", "parent_id"]).filter(|s| !s.trim().is_empty()),
    };

    let order = get_num(node, &["order", "orderIndex", "order_index", "position"])
        .map(|n| n as i32)
        .unwrap_or(position as i32);

    out.push(MenuItem {
        id: id.clone(),
        parent_id,
        order,
        label: get_str(node, &["label", "title", "name"]).unwrap_or_default(),
        url: get_str(node, &["url", "href", "link"]).unwrap_or_default(),
        kind: get_str(node, &["type", "kind"])
            .map(|s| MenuItemKind::from_wire(&s))
            .unwrap_or_default(),
        is_visible: get_bool(node, &["isVisible", "is_visible"]).unwrap_or(true),
        open_in_new_tab: get_bool(node, &["openInNewTab", "open_in_new_tab"]).unwrap_or(false),
    });

    if let Some(children) = node.get("children").and_then(|v| v.as_array()) {
        for (ix, child) in children.iter().enumerate() {
            collect_items(child, Some(&id), ix, out);
        }
    }
}

/// First present key as a string; numbers are stringified (ids are opaque to us).
fn get_str(v: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match v.get(*k)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn get_num(v: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| match v.get(*k)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn get_bool(v: &serde_json::Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|k| v.get(*k)?.as_bool())
}
