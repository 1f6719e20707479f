use message_trail_core::atomic::Atomic;
use message_trail_core::messaging::{create_message, create_message_in, update_message_content};
use message_trail_core::models::{User, DEFAULT_NOTIFICATION_VERB};
use message_trail_core::notify::{
    get_notification, list_notifications, mark_all_notifications_read, mark_notification_read,
    unread_notification_count,
};
use message_trail_core::query::{create_user, store_stats};
use message_trail_core::open_in_memory;
use rusqlite::Connection;

fn setup_db() -> (Connection, User, User) {
    let conn = open_in_memory().expect("memory db");
    let alice = create_user(&conn, "alice@example.com", "Alice", "").expect("alice");
    let bob = create_user(&conn, "bob@example.com", "Bob", "").expect("bob");
    (conn, alice, bob)
}

#[test]
fn notification_created_on_message() {
    let (conn, alice, bob) = setup_db();
    let message = create_message(&conn, &alice.id, &bob.id, "Hi Bob!", None).expect("create");

    let notifications = list_notifications(&conn, &bob.id, false).expect("list");
    assert_eq!(notifications.len(), 1);
    let notification = &notifications[0];
    assert_eq!(notification.message_id, message.id);
    assert_eq!(notification.actor_id.as_deref(), Some(alice.id.as_str()));
    assert_eq!(notification.user_id, bob.id);
    assert_eq!(notification.verb, DEFAULT_NOTIFICATION_VERB);
    assert!(!notification.is_read);
}

#[test]
fn no_notification_if_sender_is_receiver() {
    let (conn, alice, _) = setup_db();
    create_message(&conn, &alice.id, &alice.id, "Talking to myself", None).expect("create");

    assert!(list_notifications(&conn, &alice.id, false).expect("list").is_empty());
    assert_eq!(store_stats(&conn).expect("stats").notifications, 0);
}

#[test]
fn edits_do_not_notify() {
    let (conn, alice, bob) = setup_db();
    let message = create_message(&conn, &alice.id, &bob.id, "first", None).expect("create");
    update_message_content(&conn, message.id, "second", Some(alice.id.as_str())).expect("edit");

    assert_eq!(list_notifications(&conn, &bob.id, false).expect("list").len(), 1);
}

#[test]
fn rolled_back_message_never_notifies() {
    let (conn, alice, bob) = setup_db();
    let mut tx = Atomic::begin(&conn).expect("begin");
    create_message_in(&mut tx, &alice.id, &bob.id, "never sent", None).expect("create");
    tx.rollback().expect("rollback");

    let stats = store_stats(&conn).expect("stats");
    assert_eq!(stats.messages, 0);
    assert_eq!(stats.notifications, 0);
}

#[test]
fn mark_read_is_idempotent() {
    let (conn, alice, bob) = setup_db();
    create_message(&conn, &alice.id, &bob.id, "ping", None).expect("create");
    let id = list_notifications(&conn, &bob.id, false).expect("list")[0].id;

    let first = mark_notification_read(&conn, id).expect("first");
    let second = mark_notification_read(&conn, id).expect("second");

    assert!(first.is_read);
    assert_eq!(first, second);
    assert_eq!(get_notification(&conn, id).expect("get"), first);
}

#[test]
fn unread_listing_and_bulk_mark_read() {
    let (conn, alice, bob) = setup_db();
    for body in ["one", "two", "three"] {
        create_message(&conn, &alice.id, &bob.id, body, None).expect("create");
    }
    let newest_first = list_notifications(&conn, &bob.id, false).expect("list");
    assert_eq!(newest_first.len(), 3);
    assert!(newest_first[0].id > newest_first[2].id);

    mark_notification_read(&conn, newest_first[0].id).expect("read one");
    assert_eq!(unread_notification_count(&conn, &bob.id).expect("count"), 2);
    assert_eq!(list_notifications(&conn, &bob.id, true).expect("unread").len(), 2);

    assert_eq!(mark_all_notifications_read(&conn, &bob.id).expect("bulk"), 2);
    assert_eq!(mark_all_notifications_read(&conn, &bob.id).expect("bulk again"), 0);
    assert_eq!(unread_notification_count(&conn, &bob.id).expect("count"), 0);
}
