//! SERIALIZABLE_TABLE: table locks held until commit or rollback.

use crate::common::*;

fn serializable_db(timeout: Duration) -> TestDb {
    let test_db = TestDb::with_timeout(timeout);
    test_db.db.set_lock_mode(LockMode::SerializableTable);
    test_db
}

#[test]
fn readers_share_a_table() {
    let test_db = serializable_db(SHORT_TIMEOUT);
    let mut first = test_db.connect_manual();
    let mut second = test_db.connect_manual();

    assert_eq!(single_value(&mut first, "test"), Value::Int(1));
    assert_eq!(single_value(&mut second, "test"), Value::Int(1));

    let holders = test_db.db.holders("test");
    assert_eq!(holders.shared, vec![first.id(), second.id()]);
    assert_eq!(holders.exclusive, None);

    first.commit().unwrap();
    second.commit().unwrap();
    assert!(test_db.db.holders("test").is_free());
}

#[test]
fn uncommitted_write_blocks_reader_until_timeout() {
    let test_db = serializable_db(SHORT_TIMEOUT);
    let mut writer = test_db.connect_manual();
    let mut reader = test_db.connect_manual();

    writer.execute(&Statement::update("test", "id", 2)).unwrap();

    let started = Instant::now();
    let err = assert_lock_timeout(reader.query("test"));
    assert!(started.elapsed() >= SHORT_TIMEOUT);
    assert!(err.is_retryable());

    // the failed read neither queued nor took anything
    assert_eq!(test_db.waiting_on("test"), 0);
    assert!(reader.locks().is_empty());
    assert_eq!(
        writer.locks(),
        vec![(TableId::new("test"), LockKind::Exclusive)]
    );

    writer.commit().unwrap();
    reader.commit().unwrap();
    assert_eq!(single_value(&mut reader, "test"), Value::Int(2));
}

#[test]
fn held_read_lock_blocks_writer() {
    let test_db = serializable_db(SHORT_TIMEOUT);
    let mut reader = test_db.connect_manual();
    let mut writer = test_db.connect_manual();

    reader.query("test").unwrap();
    assert_lock_timeout(writer.execute(&Statement::delete("test")));

    reader.commit().unwrap();
    let out = writer.execute(&Statement::delete("test")).unwrap();
    assert_eq!(out.affected(), Some(1));
    writer.commit().unwrap();
}

#[test]
fn blocked_reader_proceeds_after_commit() {
    let test_db = serializable_db(LONG_TIMEOUT);
    let mut writer = test_db.connect_manual();
    let mut reader = test_db.connect_manual();

    writer.execute(&Statement::update("test", "id", 7)).unwrap();

    let handle = thread::spawn(move || {
        let value = single_value(&mut reader, "test");
        (reader, value)
    });

    test_db.wait_for_waiter("test");
    writer.commit().unwrap();

    let (mut reader, value) = handle.join().unwrap();
    assert_eq!(value, Value::Int(7));
    assert_eq!(
        reader.locks(),
        vec![(TableId::new("test"), LockKind::Shared)]
    );
    reader.commit().unwrap();
}

#[test]
fn sole_reader_upgrades_in_place() {
    let test_db = serializable_db(SHORT_TIMEOUT);
    let mut conn = test_db.connect_manual();

    conn.query("test").unwrap();
    conn.execute(&Statement::update("test", "id", 5)).unwrap();
    assert_eq!(
        conn.locks(),
        vec![(TableId::new("test"), LockKind::Exclusive)]
    );
    assert!(test_db.db.holders("test").shared.is_empty());
    conn.commit().unwrap();
}

#[test]
fn failed_upgrade_keeps_shared_lock() {
    let test_db = serializable_db(SHORT_TIMEOUT);
    let mut first = test_db.connect_manual();
    let mut second = test_db.connect_manual();

    first.query("test").unwrap();
    second.query("test").unwrap();

    assert_lock_timeout(first.execute(&Statement::update("test", "id", 2)));
    assert_eq!(first.locks(), vec![(TableId::new("test"), LockKind::Shared)]);

    second.commit().unwrap();
    first.execute(&Statement::update("test", "id", 2)).unwrap();
    first.commit().unwrap();
}

#[test]
fn rollback_restores_and_releases() {
    let test_db = serializable_db(SHORT_TIMEOUT);
    let mut writer = test_db.connect_manual();
    let mut reader = test_db.connect();

    writer.execute(&Statement::insert("test", [2])).unwrap();
    writer.execute(&Statement::update("test", "id", 9)).unwrap();
    writer.rollback().unwrap();

    assert!(writer.locks().is_empty());
    assert_eq!(single_value(&mut reader, "test"), Value::Int(1));
}

#[test]
fn writers_are_serialized() {
    let test_db = serializable_db(LONG_TIMEOUT);
    let mut setup = test_db.connect();
    setup
        .execute(&Statement::create_table("counter", ["n", "touched"]))
        .unwrap();
    setup
        .execute(&Statement::insert(
            "counter",
            vec![Value::Int(0), Value::Bool(false)],
        ))
        .unwrap();

    const THREADS: usize = 4;
    const ROUNDS: i64 = 10;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let mut conn = test_db.connect_manual();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..ROUNDS {
                    // take the Exclusive lock before reading
                    conn.execute(&Statement::update("counter", "touched", true))
                        .unwrap();
                    let n = conn.query("counter").unwrap()[0][0].as_int().unwrap();
                    conn.execute(&Statement::update("counter", "n", n + 1))
                        .unwrap();
                    conn.commit().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    let rows = setup.query("counter").unwrap();
    assert_eq!(rows[0][0], Value::Int(THREADS as i64 * ROUNDS));
    assert!(test_db.db.holders("counter").is_free());
}
