use crate::api::MenuItemPatch;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input};
use crate::menu_tree::FlatMenuItem;
use crate::state::MenuSyncController;
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use wasm_bindgen::JsCast;

const INDENT_PX: usize = 22;

/// Which slot a drag over row `ix` points at: in front of it, or right after it.
pub(crate) fn drop_slot_for(ix: usize, client_y: f64, row_top: f64, row_height: f64) -> usize {
    let mid = row_top + row_height / 2.0;
    if client_y >= mid {
        ix + 1
    } else {
        ix
    }
}

/// Tree connector drawn in front of a nested row.
pub(crate) fn connector(row: &FlatMenuItem) -> &'static str {
    match (row.level, row.is_last) {
        (0, _) => "",
        (_, true) => "└",
        (_, false) => "├",
    }
}

#[derive(Clone, Copy)]
struct DragCtx {
    source: RwSignal<Option<usize>>,
    slot: RwSignal<Option<usize>>,
}

impl DragCtx {
    fn clear(&self) {
        self.source.set(None);
        self.slot.set(None);
    }

    fn drop_on(&self, ctl: MenuSyncController, slot: usize) {
        let source = self.source.get_untracked();
        self.clear();
        if let Some(source) = source {
            ctl.apply_move(source, Some(slot));
        }
    }
}

#[derive(Clone, Copy)]
struct EditCtx {
    editing_id: RwSignal<Option<String>>,
    label: RwSignal<String>,
    url: RwSignal<String>,
    adding_under: RwSignal<Option<Option<String>>>,
}

/// Drag-and-drop tree editor for the items of one menu.
#[component]
pub(crate) fn MenuTreeEditor(ctl: MenuSyncController) -> impl IntoView {
    let drag = DragCtx {
        source: RwSignal::new(None),
        slot: RwSignal::new(None),
    };
    let edit = EditCtx {
        editing_id: RwSignal::new(None),
        label: RwSignal::new(String::new()),
        url: RwSignal::new(String::new()),
        adding_under: RwSignal::new(None),
    };

    let rows = Memo::new(move |_| ctl.rows());

    // Esc cancels an open form or a drag in progress.
    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ev.key() != "Escape" {
            return;
        }
        drag.clear();
        edit.editing_id.set(None);
        edit.adding_under.set(None);
    });
    on_cleanup(move || key_handle.remove());

    view! {
        <div class="flex flex-col gap-3">
            <div class="flex items-center gap-2">
                <Button
                    size=ButtonSize::Sm
                    on:click=move |_| {
                        edit.label.set(String::new());
                        edit.url.set(String::new());
                        edit.editing_id.set(None);
                        edit.adding_under.set(Some(None));
                    }
                >
                    "Add item"
                </Button>
                <Button size=ButtonSize::Sm variant=ButtonVariant::Outline on:click=move |_| ctl.expand_all()>
                    "Expand all"
                </Button>
                <Button size=ButtonSize::Sm variant=ButtonVariant::Outline on:click=move |_| ctl.collapse_all()>
                    "Collapse all"
                </Button>
                <Show when=move || { ctl.saving.get() > 0 } fallback=|| ().into_view()>
                    <span class="text-xs text-muted-foreground">"Saving…"</span>
                </Show>
            </div>

            <Show when=move || edit.adding_under.get() == Some(None) fallback=|| ().into_view()>
                <ItemForm ctl=ctl edit=edit />
            </Show>

            {move || {
                let rows = rows.get();
                if rows.is_empty() {
                    return view! {
                        <div class="rounded-md border border-dashed px-3 py-6 text-center text-xs text-muted-foreground">
                            "This menu has no items yet."
                        </div>
                    }
                    .into_any();
                }

                let total = rows.len();
                view! {
                    <div class="flex flex-col" on:dragend=move |_| drag.clear()>
                        {rows
                            .into_iter()
                            .enumerate()
                            .map(|(ix, row)| view! { <MenuRow ix=ix row=row ctl=ctl drag=drag edit=edit /> })
                            .collect_view()}
                        <EndDropZone slot=total ctl=ctl drag=drag />
                    </div>
                }
                .into_any()
            }}
        </div>
    }
}

#[component]
fn MenuRow(
    ix: usize,
    row: FlatMenuItem,
    ctl: MenuSyncController,
    drag: DragCtx,
    edit: EditCtx,
) -> impl IntoView {
    let item = row.item.clone();
    let id_sv = StoredValue::new(item.id.clone());
    let indent = row.level * INDENT_PX;
    let has_children = row.has_children;
    let elbow = connector(&row);

    let is_collapsed = move || ctl.collapsed.with(|c| c.contains(&id_sv.get_value()));
    let is_editing =
        move || edit.editing_id.get().as_deref() == Some(id_sv.get_value().as_str());
    let is_adding_child = move || {
        edit.adding_under.get().flatten().as_deref() == Some(id_sv.get_value().as_str())
    };

    let indicator = move || match drag.slot.get() {
        Some(s) if s == ix => "border-t-2 border-t-primary",
        Some(s) if s == ix + 1 => "border-b-2 border-b-primary",
        _ => "border-y-2 border-y-transparent",
    };

    let label_for_edit = item.label.clone();
    let url_for_edit = item.url.clone();
    let visible = item.is_visible;
    let new_tab = item.open_in_new_tab;

    view! {
        <div>
            <div
                class=move || {
                    let dragging = drag.source.get() == Some(ix);
                    format!(
                        "group flex items-center gap-2 rounded-md px-2 py-1.5 text-sm hover:bg-accent/50 {} {}",
                        indicator(),
                        if dragging { "opacity-40" } else { "" },
                    )
                }
                style=format!("padding-left: {}px", indent + 8)
                draggable="true"
                on:dragstart=move |ev: web_sys::DragEvent| {
                    if let Some(dt) = ev.data_transfer() {
                        let _ = dt.set_data("text/plain", &id_sv.get_value());
                        dt.set_effect_allowed("move");
                    }
                    drag.source.set(Some(ix));
                }
                on:dragover=move |ev: web_sys::DragEvent| {
                    if drag.source.get_untracked().is_none() {
                        return;
                    }
                    ev.prevent_default();
                    if let Some(dt) = ev.data_transfer() {
                        dt.set_drop_effect("move");
                    }
                    let slot = ev
                        .current_target()
                        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                        .map(|el| el.get_bounding_client_rect())
                        .map(|rect| drop_slot_for(ix, ev.client_y() as f64, rect.top(), rect.height()))
                        .unwrap_or(ix);
                    if drag.slot.get_untracked() != Some(slot) {
                        drag.slot.set(Some(slot));
                    }
                }
                on:drop=move |ev: web_sys::DragEvent| {
                    ev.prevent_default();
                    let slot = drag.slot.get_untracked().unwrap_or(ix);
                    drag.drop_on(ctl, slot);
                }
            >
                <span class="w-3 shrink-0 text-muted-foreground/60">{elbow}</span>
                <button
                    class="h-5 w-5 shrink-0 text-muted-foreground hover:text-foreground disabled:cursor-default"
                    disabled=!has_children
                    title=move || if !has_children { "" } else if is_collapsed() { "Expand" } else { "Collapse" }
                    on:click=move |_| ctl.toggle_collapsed(&id_sv.get_value())
                >
                    {move || if !has_children { "•" } else if is_collapsed() { "▸" } else { "▾" }}
                </button>

                <div class="min-w-0 flex-1">
                    <div class=if visible { "truncate" } else { "truncate text-muted-foreground line-through" }>
                        {item.label.clone()}
                    </div>
                    <div class="truncate text-xs text-muted-foreground">
                        {item.url.clone()}
                        {if new_tab { " ↗" } else { "" }}
                    </div>
                </div>

                <span class="rounded bg-muted px-1.5 py-0.5 text-[10px] uppercase text-muted-foreground">
                    {item.kind.as_str()}
                </span>

                <div class="flex shrink-0 items-center gap-1 opacity-0 group-hover:opacity-100">
                    <Button
                        size=ButtonSize::Sm
                        variant=ButtonVariant::Ghost
                        attr:title=if visible { "Hide" } else { "Show" }
                        on:click=move |_| ctl.update_fields(
                            id_sv.get_value(),
                            MenuItemPatch { is_visible: Some(!visible), ..Default::default() },
                        )
                    >
                        {if visible { "Hide" } else { "Show" }}
                    </Button>
                    <Button
                        size=ButtonSize::Sm
                        variant=ButtonVariant::Ghost
                        on:click=move |_| {
                            edit.adding_under.set(None);
                            edit.label.set(label_for_edit.clone());
                            edit.url.set(url_for_edit.clone());
                            edit.editing_id.set(Some(id_sv.get_value()));
                        }
                    >
                        "Edit"
                    </Button>
                    <Button
                        size=ButtonSize::Sm
                        variant=ButtonVariant::Ghost
                        on:click=move |_| {
                            edit.editing_id.set(None);
                            edit.label.set(String::new());
                            edit.url.set(String::new());
                            edit.adding_under.set(Some(Some(id_sv.get_value())));
                        }
                    >
                        "Add child"
                    </Button>
                    <Button
                        size=ButtonSize::Sm
                        variant=ButtonVariant::Ghost
                        class="text-destructive"
                        on:click=move |_| {
                            let confirmed = window()
                                .confirm_with_message("Delete this item and everything nested under it?")
                                .unwrap_or(false);
                            if confirmed {
                                ctl.delete_item(id_sv.get_value());
                            }
                        }
                    >
                        "Delete"
                    </Button>
                </div>
            </div>

            <Show when=move || is_editing() || is_adding_child() fallback=|| ().into_view()>
                <div style=format!("padding-left: {}px", indent + INDENT_PX + 8)>
                    <ItemForm ctl=ctl edit=edit />
                </div>
            </Show>
        </div>
    }
}

/// Catches drops below the last row (slot = row count).
#[component]
fn EndDropZone(slot: usize, ctl: MenuSyncController, drag: DragCtx) -> impl IntoView {
    view! {
        <div
            class=move || {
                if drag.slot.get() == Some(slot) {
                    "h-6 rounded-md border-t-2 border-t-primary"
                } else {
                    "h-6"
                }
            }
            on:dragover=move |ev: web_sys::DragEvent| {
                if drag.source.get_untracked().is_none() {
                    return;
                }
                ev.prevent_default();
                if drag.slot.get_untracked() != Some(slot) {
                    drag.slot.set(Some(slot));
                }
            }
            on:drop=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                drag.drop_on(ctl, slot);
            }
        />
    }
}

/// Shared form for "add item", "add child" and "edit".
#[component]
fn ItemForm(ctl: MenuSyncController, edit: EditCtx) -> impl IntoView {
    let close = move || {
        edit.editing_id.set(None);
        edit.adding_under.set(None);
        edit.label.set(String::new());
        edit.url.set(String::new());
    };

    let submit = Callback::new(move |_: ()| {
        let label = edit.label.get_untracked();
        if label.trim().is_empty() {
            return;
        }
        let url = edit.url.get_untracked();

        if let Some(id) = edit.editing_id.get_untracked() {
            ctl.update_fields(
                id,
                MenuItemPatch {
                    label: Some(label.trim().to_string()),
                    url: Some(url.trim().to_string()),
                    ..Default::default()
                },
            );
        } else if let Some(parent) = edit.adding_under.get_untracked() {
            ctl.add_item(label, url, parent);
        }
        close();
    });

    view! {
        <div class="my-1 flex items-center gap-2 rounded-md border bg-background p-2">
            <Input
                class="h-8"
                placeholder="Label"
                bind_value=edit.label
                autofocus=true
                on_enter=submit
            />
            <Input class="h-8" placeholder="/path or https://…" bind_value=edit.url on_enter=submit />
            <Button size=ButtonSize::Sm on:click=move |_| submit.run(())>
                {move || if edit.editing_id.get().is_some() { "Save" } else { "Add" }}
            </Button>
            <Button size=ButtonSize::Sm variant=ButtonVariant::Ghost on:click=move |_| close()>
                "Cancel"
            </Button>
        </div>
    }
}
