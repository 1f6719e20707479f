use message_trail_core::history::list_message_history;
use message_trail_core::notify::list_notifications;
use message_trail_core::query::store_stats;
use message_trail_core::{get_thread_between, open_in_memory, seed::seed_demo};

#[test]
fn demo_seed_query_roundtrip() {
    let conn = open_in_memory().expect("memory db");
    let seed = seed_demo(&conn, 3).expect("seed");

    let threads = get_thread_between(&conn, &seed.alice.id, &seed.bob.id).expect("threads");
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].size(), 4);
    assert_eq!(threads[1].edit_count, 1);

    let history = list_message_history(&conn, seed.root_ids[1]).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_content, "Pizza or tacos?");

    let stats = store_stats(&conn).expect("stats");
    assert_eq!(stats.users, 2);
    assert_eq!(stats.messages, 6);
    // The self-addressed note does not notify anyone.
    assert_eq!(stats.notifications, 5);
    assert_eq!(
        list_notifications(&conn, &seed.alice.id, true).expect("alice").len()
            + list_notifications(&conn, &seed.bob.id, true).expect("bob").len(),
        5
    );
}

#[test]
fn reseeding_reuses_users() {
    let conn = open_in_memory().expect("memory db");
    let first = seed_demo(&conn, 0).expect("seed");
    let second = seed_demo(&conn, 0).expect("reseed");

    assert_eq!(first.alice.id, second.alice.id);
    assert_eq!(store_stats(&conn).expect("stats").users, 2);
}
