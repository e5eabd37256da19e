use serde::{Deserialize, Serialize};

/// Backend account info object.
///
/// The admin API returns this under the `user` field of the login response.
/// We keep it flexible to avoid breaking when backend fields evolve.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct AccountInfo {
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl AccountInfo {
    /// Name for the header: `name`, then `username`, then `email`.
    pub fn display_name(&self) -> String {
        ["name", "username", "email"]
            .iter()
            .find_map(|k| {
                self.extra
                    .get(*k)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
            })
            .unwrap_or("Account")
            .to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemKind {
    #[default]
    Link,
    Page,
    Post,
    #[serde(other)]
    Custom,
}

impl MenuItemKind {
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "link" | "url" | "" => Self::Link,
            "page" => Self::Page,
            "post" => Self::Post,
            _ => Self::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Page => "page",
            Self::Post => "post",
            Self::Custom => "custom",
        }
    }
}

/// One navigation entry of a menu.
///
/// The tree is implicit: an item points at its parent by id, and siblings are
/// sequenced by `order`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,

    /// Parent item id. `None` (or an empty string) means root level.
    #[serde(rename = "parentId", default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub order: i32,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub url: String,

    #[serde(rename = "type", default)]
    pub kind: MenuItemKind,

    #[serde(rename = "isVisible", default = "default_true")]
    pub is_visible: bool,

    #[serde(rename = "openInNewTab", default)]
    pub open_in_new_tab: bool,
}

fn default_true() -> bool {
    true
}

impl MenuItem {
    pub fn new(id: impl Into<String>, parent_id: Option<&str>, order: i32) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
            order,
            label: String::new(),
            url: String::new(),
            kind: MenuItemKind::Link,
            is_visible: true,
            open_in_new_tab: false,
        }
    }

    /// Parent id with "no parent" and "empty parent" folded together.
    pub fn parent_key(&self) -> Option<&str> {
        self.parent_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

/// A named menu and the items it owns.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MenuGroup {
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub items: Vec<MenuItem>,
}

/// Menu list row (the list endpoint does not carry items).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct MenuSummary {
    pub id: String,
    pub name: String,
    pub location: String,
    pub is_active: bool,
    pub item_count: usize,
}
