pub(crate) mod menu_sync;
pub(crate) mod toast;

use crate::api::{ApiClient, ApiError};
use crate::models::{AccountInfo, MenuSummary};
use crate::storage::load_user_from_storage;
use leptos::prelude::*;
use leptos::task::spawn_local;

pub(crate) use menu_sync::MenuSyncController;
pub(crate) use toast::{ToastKind, Toasts};

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub current_user: RwSignal<Option<AccountInfo>>,

    /// Menu list for the index page.
    pub menus: RwSignal<Vec<MenuSummary>>,
    pub menus_loading: RwSignal<bool>,
    pub menus_error: RwSignal<Option<String>>,

    pub toasts: Toasts,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::load_from_storage()),
            current_user: RwSignal::new(load_user_from_storage()),
            menus: RwSignal::new(vec![]),
            menus_loading: RwSignal::new(false),
            menus_error: RwSignal::new(None),
            toasts: Toasts::new(),
        }
    }

    pub fn load_menus(&self) {
        if self.menus_loading.get_untracked() {
            return;
        }
        self.menus_loading.set(true);
        self.menus_error.set(None);

        let state = *self;
        let api_client = self.api_client.get_untracked();
        spawn_local(async move {
            match api_client.list_menus().await {
                Ok(list) => {
                    tracing::info!(count = list.len(), "loaded menus");
                    state.menus.set(list);
                }
                Err(e) => {
                    if !state.handle_api_error(&e) {
                        state.menus_error.set(Some(e.to_string()));
                    }
                }
            }
            state.menus_loading.set(false);
        });
    }

    /// Drop credentials and go back to the login screen.
    pub fn sign_out(&self) {
        self.api_client.update(|c| c.logout());
        self.current_user.set(None);
        self.menus.set(vec![]);
        let _ = window().location().set_href("/login");
    }

    /// Shared handling for errors every page treats the same way.
    ///
    /// Returns `true` when the error has been dealt with (session expired).
    pub fn handle_api_error(&self, e: &ApiError) -> bool {
        if e.is_unauthorized() {
            tracing::warn!("session expired, signing out");
            self.toasts.push(ToastKind::Error, "Your session has expired. Please sign in again.");
            self.sign_out();
            return true;
        }
        false
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
