//! READ_COMMITTED: read locks end with the statement, write locks with the transaction.
//!
//! Also covers OFF (READ_UNCOMMITTED), where no locks are taken at all.

use crate::common::*;

#[test]
fn read_locks_are_released_after_each_statement() {
    let test_db = TestDb::new();
    let mut reader = test_db.connect_manual();

    assert_eq!(single_value(&mut reader, "test"), Value::Int(1));
    assert!(reader.locks().is_empty());
    assert_eq!(reader.phase(), TransactionPhase::InTransaction);
    assert!(test_db.db.holders("test").is_free());
    reader.commit().unwrap();
}

#[test]
fn reader_sees_value_committed_between_its_reads() {
    let test_db = TestDb::new();
    let mut reader = test_db.connect_manual();
    let mut writer = test_db.connect_manual();

    assert_eq!(single_value(&mut reader, "test"), Value::Int(1));

    writer.execute(&Statement::update("test", "id", 3)).unwrap();
    writer.commit().unwrap();

    assert_eq!(single_value(&mut reader, "test"), Value::Int(3));
    reader.commit().unwrap();
}

#[test]
fn uncommitted_write_blocks_delete_until_commit() {
    let test_db = TestDb::new();
    let mut first = test_db.connect_manual();
    let mut second = test_db.connect_manual();

    assert_eq!(single_value(&mut first, "test"), Value::Int(1));
    assert_eq!(single_value(&mut second, "test"), Value::Int(1));

    second.execute(&Statement::update("test", "id", 4)).unwrap();
    let err = assert_lock_timeout(first.execute(&Statement::delete("test")));
    assert!(err.is_retryable());
    assert_eq!(first.phase(), TransactionPhase::InTransaction);

    second.commit().unwrap();
    assert_eq!(single_value(&mut first, "test"), Value::Int(4));
    first.commit().unwrap();
}

#[test]
fn uncommitted_write_blocks_readers() {
    let test_db = TestDb::new();
    let mut writer = test_db.connect_manual();
    let mut reader = test_db.connect();

    writer.execute(&Statement::update("test", "id", 8)).unwrap();
    assert_lock_timeout(reader.query("test"));

    writer.rollback().unwrap();
    assert_eq!(single_value(&mut reader, "test"), Value::Int(1));
}

#[test]
fn timeout_keeps_earlier_write_locks() {
    let test_db = TestDb::new();
    test_db
        .connect()
        .execute(&Statement::create_table("other", ["id"]))
        .unwrap();
    let mut first = test_db.connect_manual();
    let mut second = test_db.connect_manual();

    first.execute(&Statement::insert("other", [1])).unwrap();
    second.execute(&Statement::update("test", "id", 2)).unwrap();

    assert_lock_timeout(first.execute(&Statement::update("test", "id", 3)));
    assert_eq!(
        first.locks(),
        vec![(TableId::new("other"), LockKind::Exclusive)]
    );

    // the caller decides: commit the work that did succeed
    first.commit().unwrap();
    second.commit().unwrap();
    let mut check = test_db.connect();
    assert_eq!(single_value(&mut check, "other"), Value::Int(1));
    assert_eq!(single_value(&mut check, "test"), Value::Int(2));
}

#[test]
fn queued_writer_is_not_overtaken_by_later_readers() {
    let test_db = TestDb::with_timeout(LONG_TIMEOUT);
    test_db.db.set_lock_mode(LockMode::SerializableTable);
    let mut holder = test_db.connect_manual();
    holder.query("test").unwrap();

    let mut writer = test_db.connect_manual();
    let writer_handle = thread::spawn(move || {
        writer.execute(&Statement::update("test", "id", 5)).unwrap();
        writer
    });
    test_db.wait_for_waiter("test");

    // back to READ_COMMITTED for the late reader's transaction
    test_db.db.set_lock_mode(LockMode::ReadCommitted);
    let mut late = test_db.connect_manual();
    let reader_handle = thread::spawn(move || {
        let value = single_value(&mut late, "test");
        late.commit().unwrap();
        value
    });
    wait_until("late reader to queue", || test_db.waiting_on("test") == 2);
    let waiting = test_db.db.holders("test").waiting;
    assert_eq!(waiting[0].1, LockKind::Exclusive);
    assert_eq!(waiting[1].1, LockKind::Shared);

    holder.commit().unwrap();
    let mut writer = writer_handle.join().unwrap();
    writer.commit().unwrap();

    assert_eq!(reader_handle.join().unwrap(), Value::Int(5));
}

#[test]
fn off_takes_no_locks_and_reads_dirty_data() {
    let test_db = TestDb::new();
    let mut writer = test_db.connect_manual();
    let mut reader = test_db.connect_manual();

    writer
        .set_transaction_isolation(IsolationLevel::ReadUncommitted)
        .unwrap();
    writer.execute(&Statement::update("test", "id", 6)).unwrap();
    assert!(writer.locks().is_empty());

    assert_eq!(single_value(&mut reader, "test"), Value::Int(6));
    writer.rollback().unwrap();
    assert_eq!(single_value(&mut reader, "test"), Value::Int(1));
    reader.commit().unwrap();
}

#[test]
fn off_rollback_keeps_rows_committed_by_others() {
    let test_db = TestDb::new();
    test_db.db.set_lock_mode(LockMode::Off);
    let mut first = test_db.connect_manual();
    let mut second = test_db.connect();

    first.execute(&Statement::update("test", "id", 9)).unwrap();
    second.execute(&Statement::insert("test", [42])).unwrap();
    first.rollback().unwrap();

    assert_eq!(
        second.query("test").unwrap(),
        vec![vec![Value::Int(1)], vec![Value::Int(42)]]
    );
}
