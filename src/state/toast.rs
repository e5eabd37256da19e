use leptos::prelude::*;

const MAX_VISIBLE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToastKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

/// Newest-last queue of notifications, capped so a burst of failures cannot flood the screen.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ToastQueue {
    next_id: u64,
    items: Vec<Toast>,
}

impl ToastQueue {
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.items.push(Toast {
            id: self.next_id,
            kind,
            message: message.into(),
        });
        if self.items.len() > MAX_VISIBLE {
            let overflow = self.items.len() - MAX_VISIBLE;
            self.items.drain(..overflow);
        }
        self.next_id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|t| t.id != id);
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Toasts(RwSignal<ToastQueue>);

impl Toasts {
    pub fn new() -> Self {
        Self(RwSignal::new(ToastQueue::default()))
    }

    pub fn push(&self, kind: ToastKind, message: impl Into<String>) -> u64 {
        let message = message.into();
        match kind {
            ToastKind::Error => tracing::warn!(%message, "toast"),
            _ => tracing::debug!(%message, "toast"),
        }
        let mut id = 0;
        self.0.update(|q| id = q.push(kind, message));
        id
    }

    pub fn dismiss(&self, id: u64) {
        self.0.update(|q| q.dismiss(id));
    }

    pub fn items(&self) -> Vec<Toast> {
        self.0.with(|q| q.items().to_vec())
    }
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new()
    }
}
