use super::*;

use uuid::Uuid;

use shared::{domain::UserId, protocol::UserProfile};

fn events() -> broadcast::Sender<WorkspaceEvent> {
    broadcast::channel(16).0
}

fn user(role: Role, status: UserStatus) -> Identity {
    Identity::Authenticated(UserProfile {
        id: UserId(Uuid::new_v4()),
        username: "casey".to_string(),
        email: "casey@example.com".to_string(),
        role,
        status,
        theme: None,
        color_theme: None,
        sound_enabled: None,
    })
}

#[test]
fn public_views_render_for_everyone() {
    for view in [
        ViewName::Landing,
        ViewName::Login,
        ViewName::Signup,
        ViewName::Apply,
        ViewName::ManagerLogin,
    ] {
        assert_eq!(requirement(view), None);
        assert_eq!(
            evaluate_entry(view, &Identity::Anonymous),
            EntryDecision::Render
        );
    }
}

#[test]
fn gated_views_redirect_anonymous_to_landing() {
    for view in [ViewName::Home, ViewName::Settings, ViewName::Approvals] {
        assert_eq!(
            evaluate_entry(view, &Identity::Anonymous),
            EntryDecision::Redirect {
                to: ViewName::Landing,
                reason: RedirectReason::SignedOut,
            }
        );
    }
}

#[test]
fn pending_editor_is_sent_back_to_login() {
    let identity = user(Role::Editor, UserStatus::Pending);
    assert_eq!(
        evaluate_entry(ViewName::Home, &identity),
        EntryDecision::Redirect {
            to: ViewName::Login,
            reason: RedirectReason::AwaitingApproval,
        }
    );
}

#[test]
fn approved_editor_renders_editor_views() {
    let identity = user(Role::Editor, UserStatus::Approved);
    for view in [
        ViewName::Home,
        ViewName::Tasks,
        ViewName::Meetings,
        ViewName::Payouts,
        ViewName::Settings,
    ] {
        assert_eq!(evaluate_entry(view, &identity), EntryDecision::Render);
    }
}

#[test]
fn approved_editor_is_turned_away_from_manager_views() {
    let identity = user(Role::Editor, UserStatus::Approved);
    assert_eq!(
        evaluate_entry(ViewName::Approvals, &identity),
        EntryDecision::Redirect {
            to: ViewName::Home,
            reason: RedirectReason::RoleMismatch(RoleMismatch {
                required: Role::Manager,
                actual: Some(Role::Editor),
            }),
        }
    );
}

#[test]
fn approved_manager_renders_everything_gated() {
    let identity = user(Role::Manager, UserStatus::Approved);
    for view in [
        ViewName::Home,
        ViewName::Tasks,
        ViewName::Approvals,
        ViewName::UserManagement,
    ] {
        assert_eq!(evaluate_entry(view, &identity), EntryDecision::Render);
    }
}

#[test]
fn guest_skips_the_approval_check() {
    let guest = Identity::Guest { role: Role::Editor };
    assert_eq!(evaluate_entry(ViewName::Home, &guest), EntryDecision::Render);
    assert_eq!(
        evaluate_entry(ViewName::UserManagement, &guest),
        EntryDecision::Redirect {
            to: ViewName::Home,
            reason: RedirectReason::RoleMismatch(RoleMismatch {
                required: Role::Manager,
                actual: Some(Role::Editor),
            }),
        }
    );

    let guest_manager = Identity::Guest {
        role: Role::Manager,
    };
    assert_eq!(
        evaluate_entry(ViewName::Approvals, &guest_manager),
        EntryDecision::Render
    );
}

#[test]
fn enter_lands_on_the_redirect_target() {
    let router = ViewRouter::new(events());
    let decision = router.enter(ViewName::Payouts, &Identity::Anonymous);
    assert!(matches!(decision, EntryDecision::Redirect { .. }));
    assert_eq!(router.current(), ViewName::Landing);

    let identity = user(Role::Editor, UserStatus::Approved);
    assert_eq!(router.enter(ViewName::Payouts, &identity), EntryDecision::Render);
    assert_eq!(router.current(), ViewName::Payouts);
}

#[test]
fn set_view_emits_only_on_change() {
    let sender = events();
    let mut receiver = sender.subscribe();
    let router = ViewRouter::new(sender);

    router.set_view(ViewName::Login);
    router.set_view(ViewName::Login);

    assert!(matches!(
        receiver.try_recv(),
        Ok(WorkspaceEvent::ViewChanged(ViewName::Login))
    ));
    assert!(receiver.try_recv().is_err());
}
