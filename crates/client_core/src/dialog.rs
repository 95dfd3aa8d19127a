use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A button on a dialog. The handler runs at most once, on activation.
pub struct DialogAction {
    pub label: String,
    pub primary: bool,
    handler: Box<dyn FnOnce() + Send>,
}

impl DialogAction {
    pub fn new(
        label: impl Into<String>,
        primary: bool,
        handler: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            primary,
            handler: Box::new(handler),
        }
    }
}

pub struct DialogRequest {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
    pub actions: Vec<DialogAction>,
}

impl DialogRequest {
    pub fn new(kind: DialogKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: DialogAction) -> Self {
        self.actions.push(action);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSnapshot {
    pub label: String,
    pub primary: bool,
}

/// Renderable copy of the active dialog, without the handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSnapshot {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
    pub actions: Vec<ActionSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DialogError {
    #[error("no dialog is active")]
    NoActiveDialog,
    #[error("active dialog has no action {0}")]
    NoSuchAction(usize),
}

/// Single-slot modal host. Showing a dialog while one is active replaces
/// it; the replaced dialog's handlers are dropped unrun.
#[derive(Default)]
pub struct DialogService {
    slot: Mutex<Option<DialogRequest>>,
}

impl DialogService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self, request: DialogRequest) {
        let replaced = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(request);
        if replaced.is_some() {
            debug!("dialog replaced before it was answered");
        }
    }

    /// Closes the active dialog without running any action. Returns
    /// whether a dialog was open.
    pub fn dismiss(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn snapshot(&self) -> Option<DialogSnapshot> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|request| DialogSnapshot {
                kind: request.kind,
                title: request.title.clone(),
                message: request.message.clone(),
                actions: request
                    .actions
                    .iter()
                    .map(|action| ActionSnapshot {
                        label: action.label.clone(),
                        primary: action.primary,
                    })
                    .collect(),
            })
    }

    /// Runs action `index` of the active dialog and closes it. The dialog
    /// leaves the slot before the handler runs, so a handler may show a
    /// follow-up dialog; an out-of-range index leaves the dialog open.
    pub fn activate(&self, index: usize) -> Result<(), DialogError> {
        let request = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            let request = slot.take().ok_or(DialogError::NoActiveDialog)?;
            if index >= request.actions.len() {
                *slot = Some(request);
                return Err(DialogError::NoSuchAction(index));
            }
            request
        };
        let mut actions = request.actions;
        let action = actions.swap_remove(index);
        (action.handler)();
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/dialog_tests.rs"]
mod tests;
