use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription, CardHeader, CardTitle,
    Input, Spinner, Toaster,
};
use crate::editor::MenuTreeEditor;
use crate::state::{AppContext, MenuSyncController};
use crate::storage::save_user_to_storage;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params;
use leptos_router::params::Params;

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();
        let mut api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.login(&email_val, &password_val).await {
                Ok(response) => {
                    api_client.set_token(response.token);
                    api_client.save_to_storage();
                    save_user_to_storage(&response.user);
                    app_state.0.api_client.set(api_client);
                    app_state.0.current_user.set(Some(response.user));
                    let _ = window().location().set_href("/menus");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "login failed");
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <span class="text-sm font-medium text-foreground">"Menu Admin"</span>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Log in"</CardTitle>
                        <CardDescription class="text-xs">"Sign in to manage site navigation."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <label for="email" class="text-xs font-medium">"Email"</label>
                                <Input
                                    id="email"
                                    r#type="email"
                                    placeholder="you@example.com"
                                    bind_value=email
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <label for="password" class="text-xs font-medium">"Password"</label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=password
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            {move || {
                                error.get().map(|e| {
                                    view! {
                                        <div class="rounded-md border border-destructive/30 px-3 py-2 text-xs text-destructive">
                                            {e}
                                        </div>
                                    }
                                })
                            }}

                            <Button
                                class="w-full"
                                size=ButtonSize::Sm
                                attr:disabled=move || loading.get()
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Signing in..." } else { "Continue" }}
                                </span>
                            </Button>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn AppLayout(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let user_name = move || {
        app_state
            .0
            .current_user
            .get()
            .map(|u| u.display_name())
            .unwrap_or_default()
    };

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <header class="border-b">
                <div class="mx-auto flex h-12 max-w-4xl items-center gap-3 px-4">
                    <a href="/menus" class="text-sm font-medium">"Menu Admin"</a>
                    <div class="flex-1" />
                    <span class="text-xs text-muted-foreground">{user_name}</span>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        on:click=move |_| app_state.0.sign_out()
                    >
                        "Sign out"
                    </Button>
                </div>
            </header>
            <main class="mx-auto max-w-4xl px-4 py-6">
                {children()}
            </main>
            <Toaster />
        </div>
    }
}

#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.get().is_authenticated();

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <AppLayout>
                {move || children.with_value(|c| c())}
            </AppLayout>
        </Show>
    }
}

#[component]
pub fn RootPage() -> impl IntoView {
    view! {
        <RootAuthed>
            <MenusPage />
        </RootAuthed>
    }
}

#[component]
pub fn MenusPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let menus = app_state.0.menus;
    let loading = app_state.0.menus_loading;
    let error = app_state.0.menus_error;

    Effect::new(move |_| {
        app_state.0.load_menus();
    });

    view! {
        <div class="flex flex-col gap-4">
            <div class="flex items-center gap-2">
                <h1 class="text-base font-semibold">"Menus"</h1>
                <div class="flex-1" />
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    on:click=move |_| app_state.0.load_menus()
                >
                    "Refresh"
                </Button>
            </div>

            <Show when=move || loading.get() fallback=|| ().into_view()>
                <div class="flex items-center gap-2 text-xs text-muted-foreground">
                    <Spinner />
                    "Loading menus..."
                </div>
            </Show>

            {move || error.get().map(|e| view! { <div class="text-xs text-destructive">{e}</div> })}

            <Show
                when=move || !loading.get() && error.get().is_none() && menus.get().is_empty()
                fallback=|| ().into_view()
            >
                <div class="text-xs text-muted-foreground">"No menus yet."</div>
            </Show>

            <div class="grid gap-3 sm:grid-cols-2">
                <For
                    each=move || menus.get()
                    key=|m| m.id.clone()
                    children=move |m| {
                        let href = format!("/menus/{}", m.id);
                        view! {
                            <a href=href class="block">
                                <Card class="transition-colors hover:bg-accent/40">
                                    <CardHeader>
                                        <CardTitle class="text-sm">{m.name.clone()}</CardTitle>
                                        <CardDescription class="text-xs">
                                            {if m.location.is_empty() { "No location".to_string() } else { m.location.clone() }}
                                        </CardDescription>
                                    </CardHeader>
                                    <CardContent class="flex items-center gap-2 text-xs text-muted-foreground">
                                        <span>{format!("{} items", m.item_count)}</span>
                                        <span>{if m.is_active { "· active" } else { "· inactive" }}</span>
                                    </CardContent>
                                </Card>
                            </a>
                        }
                    }
                />
            </div>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct MenuRouteParams {
    pub menu_id: Option<String>,
}

#[component]
pub fn MenuEditorPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<MenuRouteParams>();

    // Use a closure so params access happens inside a reactive tracking context.
    let menu_id = move || params.get().ok().and_then(|p| p.menu_id).unwrap_or_default();

    let ctl = MenuSyncController::new(app_state);

    Effect::new(move |_| {
        ctl.open(menu_id());
    });

    let title = move || {
        ctl.menu
            .get()
            .map(|m| m.name)
            .unwrap_or_else(|| "Menu".to_string())
    };

    view! {
        <div class="flex flex-col gap-4">
            <div class="flex items-center gap-2">
                <a href="/menus" class="text-xs text-muted-foreground hover:text-foreground">"← Menus"</a>
                <h1 class="text-base font-semibold">{title}</h1>
                <div class="flex-1" />
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || ctl.loading.get()
                    on:click=move |_| ctl.refetch()
                >
                    <Show when=move || ctl.loading.get() fallback=|| ().into_view()>
                        <Spinner />
                    </Show>
                    "Reload"
                </Button>
            </div>

            <Show
                when=move || ctl.menu.with(Option::is_some)
                fallback=move || {
                    if let Some(e) = ctl.error.get() {
                        return view! { <div class="text-xs text-destructive">{e}</div> }.into_any();
                    }
                    if !ctl.loading.get() {
                        return ().into_any();
                    }
                    view! {
                        <div class="flex items-center gap-2 text-xs text-muted-foreground">
                            <Spinner />
                            "Loading menu..."
                        </div>
                    }
                    .into_any()
                }
            >
                <MenuTreeEditor ctl=ctl />
            </Show>
        </div>
    }
}
