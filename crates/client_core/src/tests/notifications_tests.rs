use super::*;

use chrono::{Duration, Utc};
use uuid::Uuid;

fn events() -> broadcast::Sender<WorkspaceEvent> {
    broadcast::channel(16).0
}

fn record(kind: NotificationKind, read: bool, age_secs: i64) -> NotificationRecord {
    NotificationRecord {
        id: NotificationId(Uuid::new_v4()),
        kind,
        title: "A task was assigned to you".to_string(),
        message: "Open it when you have a minute".to_string(),
        created_at: Utc::now() - Duration::seconds(age_secs),
        read,
    }
}

#[test]
fn replace_all_orders_most_recent_last() {
    let center = NotificationCenter::new(events());
    let newest = record(NotificationKind::Task, false, 10);
    let oldest = record(NotificationKind::Meeting, false, 300);
    center.replace_all(vec![newest.clone(), oldest.clone()]);

    let listed = center.list();
    assert_eq!(listed[0].id, oldest.id);
    assert_eq!(listed[1].id, newest.id);
}

#[test]
fn unread_count_is_derived_from_the_list() {
    let center = NotificationCenter::new(events());
    center.replace_all(vec![
        record(NotificationKind::Task, false, 30),
        record(NotificationKind::Payout, true, 20),
        record(NotificationKind::Meeting, false, 10),
    ]);
    assert_eq!(center.unread_count(), 2);

    center.clear();
    assert_eq!(center.unread_count(), 0);
    assert!(center.list().is_empty());
}

#[test]
fn mark_as_read_is_idempotent() {
    let sender = events();
    let mut receiver = sender.subscribe();
    let center = NotificationCenter::new(sender);
    let unread = record(NotificationKind::Task, false, 5);
    let id = unread.id;
    center.replace_all(vec![unread]);
    let _ = receiver.try_recv();

    assert_eq!(center.mark_as_read(id), Ok(true));
    assert_eq!(center.unread_count(), 0);
    assert!(matches!(
        receiver.try_recv(),
        Ok(WorkspaceEvent::NotificationsUpdated { unread: 0 })
    ));

    assert_eq!(center.mark_as_read(id), Ok(false));
    assert_eq!(center.unread_count(), 0);
    assert!(receiver.try_recv().is_err());
}

#[test]
fn marking_an_unknown_id_fails() {
    let center = NotificationCenter::new(events());
    let id = NotificationId(Uuid::new_v4());
    assert_eq!(center.mark_as_read(id), Err(NotificationError::NotFound(id)));
}

#[test]
fn targets_map_kind_to_screen() {
    let task = record(NotificationKind::Task, false, 1);
    let meeting = record(NotificationKind::Meeting, false, 1);
    let payout = record(NotificationKind::Payout, false, 1);
    assert_eq!(resolve_target(&task), Ok(ViewName::Tasks));
    assert_eq!(resolve_target(&meeting), Ok(ViewName::Meetings));
    assert_eq!(resolve_target(&payout), Ok(ViewName::Payouts));

    let other = record(NotificationKind::Other, false, 1);
    assert_eq!(
        resolve_target(&other),
        Err(NotificationError::UnknownKind(other.id))
    );
}

#[test]
fn unrecognized_kind_still_deserializes() {
    let raw = serde_json::json!({
        "id": Uuid::new_v4(),
        "type": "system_banner",
        "title": "Maintenance window",
        "message": "Back shortly",
        "created_at": Utc::now(),
    });
    let parsed: NotificationRecord = serde_json::from_value(raw).expect("deserialize");
    assert_eq!(parsed.kind, NotificationKind::Other);
    assert!(!parsed.read);
}
