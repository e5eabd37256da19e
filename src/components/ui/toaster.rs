use crate::state::{AppContext, ToastKind};
use leptos::prelude::*;
use std::time::Duration;

const TOAST_TTL: Duration = Duration::from_secs(5);

/// Bottom-right notification stack fed by `AppState::toasts`.
#[component]
pub fn Toaster() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let toasts = app_state.0.toasts;

    view! {
        <div class="pointer-events-none fixed bottom-4 right-4 z-50 flex w-80 flex-col gap-2">
            <For
                each=move || toasts.items()
                key=|t| t.id
                children=move |t| {
                    let id = t.id;
                    set_timeout(move || toasts.dismiss(id), TOAST_TTL);

                    let class = match t.kind {
                        ToastKind::Error => "border-destructive/40 bg-destructive/10 text-destructive",
                        ToastKind::Success => "border-success/40 bg-success/10 text-foreground",
                    };

                    view! {
                        <div
                            role="status"
                            class=format!("pointer-events-auto flex items-start gap-2 rounded-md border px-3 py-2 text-sm shadow-md {class}")
                        >
                            <div class="min-w-0 flex-1 break-words">{t.message}</div>
                            <button
                                class="text-xs text-muted-foreground hover:text-foreground"
                                title="Dismiss"
                                on:click=move |_| toasts.dismiss(id)
                            >
                                "✕"
                            </button>
                        </div>
                    }
                }
            />
        </div>
    }
}
