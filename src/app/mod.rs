use crate::pages::{LoginPage, MenuEditorPage, MenusPage, RootAuthed, RootPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // Router hooks (`use_params`) need the <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("menus") view=move || view! {
                    <RootAuthed>
                        <MenusPage />
                    </RootAuthed>
                } />
                <Route path=path!("menus/:menu_id") view=move || view! {
                    <RootAuthed>
                        <MenuEditorPage />
                    </RootAuthed>
                } />
                <Route path=path!("") view=RootPage />
            </Routes>
        </Router>
    }
}
