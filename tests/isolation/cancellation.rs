//! Closing a connection from another thread, idle or waiting for a lock.

use crate::common::*;

#[test]
fn close_wakes_blocked_connection() {
    let test_db = TestDb::with_timeout(LONG_TIMEOUT);
    let mut writer = test_db.connect_manual();
    writer.execute(&Statement::update("test", "id", 2)).unwrap();

    let mut blocked = test_db.connect_manual();
    let id = blocked.id();
    let started = Instant::now();
    let handle = thread::spawn(move || {
        let result = blocked.query("test");
        (blocked, result)
    });

    test_db.wait_for_waiter("test");
    assert!(test_db.db.close_session(id));

    let (mut blocked, result) = handle.join().unwrap();
    let err = assert_lock_timeout(result);
    assert!(err.is_session_closed());
    assert!(!err.is_retryable());
    assert!(started.elapsed() < LONG_TIMEOUT);

    assert!(blocked.is_closed());
    assert!(matches!(blocked.query("test"), Err(Error::SessionClosed(_))));
    assert_eq!(test_db.waiting_on("test"), 0);

    // the lock holder is unaffected
    assert_eq!(
        writer.locks(),
        vec![(TableId::new("test"), LockKind::Exclusive)]
    );
    writer.commit().unwrap();
    assert_eq!(test_db.db.session_count(), 1);
}

#[test]
fn close_rolls_back_blocked_transaction() {
    let test_db = TestDb::with_timeout(LONG_TIMEOUT);
    test_db
        .connect()
        .execute(&Statement::create_table("other", ["id"]))
        .unwrap();

    let mut holder = test_db.connect_manual();
    holder.execute(&Statement::insert("test", [2])).unwrap();

    let mut victim = test_db.connect_manual();
    victim.execute(&Statement::insert("other", [1])).unwrap();
    let id = victim.id();
    let handle = thread::spawn(move || victim.execute(&Statement::delete("test")));

    test_db.wait_for_waiter("test");
    test_db.db.close_session(id);
    assert_lock_timeout(handle.join().unwrap());

    // the victim's insert was undone and its lock released
    assert!(test_db.db.holders("other").is_free());
    let mut check = test_db.connect();
    assert!(check.query("other").unwrap().is_empty());

    holder.rollback().unwrap();
    assert_eq!(single_value(&mut check, "test"), Value::Int(1));
}

#[test]
fn close_of_idle_connection_releases_its_locks_at_once() {
    let test_db = TestDb::with_timeout(SHORT_TIMEOUT);
    let mut conn = test_db.connect_manual();
    conn.execute(&Statement::update("test", "id", 3)).unwrap();

    assert!(test_db.db.close_session(conn.id()));
    assert!(test_db.db.holders("test").is_free());
    assert_eq!(test_db.db.session_count(), 0);

    // readable before the closed connection makes another call
    let mut check = test_db.connect();
    assert_eq!(single_value(&mut check, "test"), Value::Int(1));

    assert!(matches!(conn.commit(), Err(Error::SessionClosed(_))));
    assert!(conn.is_closed());
}

#[test]
fn close_unknown_session() {
    let test_db = TestDb::new();
    assert!(!test_db.db.close_session(SessionId::new(999)));
}

#[test]
fn drop_releases_locks() {
    let test_db = TestDb::new();
    let mut conn = test_db.connect_manual();
    conn.execute(&Statement::delete("test")).unwrap();
    assert!(!test_db.db.holders("test").is_free());

    drop(conn);
    assert!(test_db.db.holders("test").is_free());
    let mut check = test_db.connect();
    assert_eq!(single_value(&mut check, "test"), Value::Int(1));
}
