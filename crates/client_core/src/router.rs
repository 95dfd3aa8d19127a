use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::debug;

use shared::{
    domain::{Role, UserStatus, ViewName},
    error::RoleMismatch,
};

use crate::{session::Identity, WorkspaceEvent};

/// Entry requirement for a gated screen. Public screens have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRequirement {
    pub min_role: Role,
    pub requires_approved: bool,
}

/// The single place that says what each screen demands of the caller.
pub fn requirement(view: ViewName) -> Option<ViewRequirement> {
    match view {
        ViewName::Landing
        | ViewName::Login
        | ViewName::Signup
        | ViewName::Apply
        | ViewName::ManagerLogin => None,
        ViewName::Home
        | ViewName::Tasks
        | ViewName::Meetings
        | ViewName::Payouts
        | ViewName::Settings => Some(ViewRequirement {
            min_role: Role::Editor,
            requires_approved: true,
        }),
        ViewName::Approvals | ViewName::UserManagement => Some(ViewRequirement {
            min_role: Role::Manager,
            requires_approved: true,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    SignedOut,
    AwaitingApproval,
    RoleMismatch(RoleMismatch),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDecision {
    Render,
    Redirect {
        to: ViewName,
        reason: RedirectReason,
    },
}

/// Decides whether `identity` may land on `view`. Pure; navigation is
/// applied by the router.
///
/// Guests carry no approval status and skip that check entirely.
pub fn evaluate_entry(view: ViewName, identity: &Identity) -> EntryDecision {
    let Some(requirement) = requirement(view) else {
        return EntryDecision::Render;
    };
    let Some(role) = identity.role() else {
        return EntryDecision::Redirect {
            to: ViewName::Landing,
            reason: RedirectReason::SignedOut,
        };
    };
    if requirement.requires_approved {
        if let Some(status) = identity.status() {
            if status != UserStatus::Approved {
                return EntryDecision::Redirect {
                    to: ViewName::Login,
                    reason: RedirectReason::AwaitingApproval,
                };
            }
        }
    }
    if !role.satisfies(requirement.min_role) {
        let approved = identity
            .status()
            .map_or(true, |status| status == UserStatus::Approved);
        let to = if approved {
            ViewName::Home
        } else {
            ViewName::Landing
        };
        return EntryDecision::Redirect {
            to,
            reason: RedirectReason::RoleMismatch(RoleMismatch {
                required: requirement.min_role,
                actual: Some(role),
            }),
        };
    }
    EntryDecision::Render
}

/// Holds the single current view and applies gated navigation.
pub struct ViewRouter {
    current: RwLock<ViewName>,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl ViewRouter {
    pub(crate) fn new(events: broadcast::Sender<WorkspaceEvent>) -> Self {
        Self {
            current: RwLock::new(ViewName::default()),
            events,
        }
    }

    pub fn current(&self) -> ViewName {
        *self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Unconditional navigation. Gated flows go through [`ViewRouter::enter`].
    pub fn set_view(&self, view: ViewName) {
        let previous = {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, view)
        };
        if previous != view {
            debug!(from = ?previous, to = ?view, "view changed");
            let _ = self.events.send(WorkspaceEvent::ViewChanged(view));
        }
    }

    /// Evaluates the entry guard and navigates to the view or to its
    /// redirect target.
    pub fn enter(&self, view: ViewName, identity: &Identity) -> EntryDecision {
        let decision = evaluate_entry(view, identity);
        match decision {
            EntryDecision::Render => self.set_view(view),
            EntryDecision::Redirect { to, reason } => {
                debug!(requested = ?view, ?to, ?reason, "entry refused");
                self.set_view(to);
            }
        }
        decision
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
