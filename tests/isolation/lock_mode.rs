//! Lock mode and isolation level are two views of one setting.

use crate::common::*;

#[test]
fn default_isolation_is_read_committed() {
    let test_db = TestDb::new();
    let mut conn = test_db.connect();

    assert_eq!(
        conn.transaction_isolation().unwrap(),
        IsolationLevel::ReadCommitted
    );
    let out = conn.execute_command("CALL LOCK_MODE()").unwrap();
    assert_eq!(out.single_value(), Some(&Value::Int(3)));
}

#[test]
fn isolation_level_sets_lock_mode() {
    let test_db = TestDb::new();
    let mut conn = test_db.connect();

    let cases = [
        (IsolationLevel::Serializable, LockMode::SerializableTable, 1),
        (IsolationLevel::ReadUncommitted, LockMode::Off, 0),
        (IsolationLevel::ReadCommitted, LockMode::ReadCommitted, 3),
    ];
    for (level, mode, value) in cases {
        conn.set_transaction_isolation(level).unwrap();
        assert_eq!(conn.transaction_isolation().unwrap(), level);
        assert_eq!(conn.lock_mode(), mode);
        let out = conn.execute_command("SELECT LOCK_MODE()").unwrap();
        assert_eq!(out.single_value(), Some(&Value::Int(value)), "{level}");
    }
}

#[test]
fn lock_mode_command_sets_isolation_level() {
    let test_db = TestDb::new();
    let mut conn = test_db.connect();

    conn.execute_command("SET LOCK_MODE 1").unwrap();
    assert_eq!(
        conn.transaction_isolation().unwrap(),
        IsolationLevel::Serializable
    );

    conn.execute_command("set lock_mode 0").unwrap();
    assert_eq!(
        conn.transaction_isolation().unwrap(),
        IsolationLevel::ReadUncommitted
    );

    conn.execute_command("SET LOCK_MODE 3").unwrap();
    assert_eq!(
        conn.transaction_isolation().unwrap(),
        IsolationLevel::ReadCommitted
    );
}

#[test]
fn lock_mode_is_shared_by_every_connection() {
    let test_db = TestDb::new();
    let mut first = test_db.connect();
    let mut second = test_db.connect();

    first.execute_command("SET LOCK_MODE 1").unwrap();
    assert_eq!(
        second.transaction_isolation().unwrap(),
        IsolationLevel::Serializable
    );
    assert_eq!(test_db.db.lock_mode(), LockMode::SerializableTable);
}

#[test]
fn invalid_lock_mode_is_rejected() {
    let test_db = TestDb::new();
    let mut conn = test_db.connect();

    for command in ["SET LOCK_MODE 2", "SET LOCK_MODE -1", "SET LOCK_MODE 4"] {
        let err = conn.execute_command(command).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "{command}: {err}");
    }
    assert_eq!(conn.lock_mode(), LockMode::ReadCommitted);
}

#[test]
fn isolation_level_codes() {
    let test_db = TestDb::new();
    let mut conn = test_db.connect();

    conn.set_transaction_isolation_code(8).unwrap();
    assert_eq!(conn.lock_mode(), LockMode::SerializableTable);
    conn.set_transaction_isolation_code(1).unwrap();
    assert_eq!(conn.lock_mode(), LockMode::Off);
    conn.set_transaction_isolation_code(2).unwrap();
    assert_eq!(conn.lock_mode(), LockMode::ReadCommitted);

    let err = conn.set_transaction_isolation_code(4).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(conn.lock_mode(), LockMode::ReadCommitted);
}

#[test]
fn lock_timeout_command_applies_to_next_wait() {
    let test_db = TestDb::with_timeout(LONG_TIMEOUT);
    let mut writer = test_db.connect_manual();
    let mut reader = test_db.connect();

    writer.execute(&Statement::update("test", "id", 2)).unwrap();
    reader.execute_command("SET LOCK_TIMEOUT 50").unwrap();
    assert_eq!(test_db.db.lock_timeout(), Duration::from_millis(50));

    let started = Instant::now();
    assert_lock_timeout(reader.query("test"));
    assert!(started.elapsed() < LONG_TIMEOUT);
    writer.commit().unwrap();
}

#[test]
fn mode_change_does_not_affect_open_transaction() {
    let test_db = TestDb::new();
    let mut conn = test_db.connect_manual();

    conn.execute_command("SET LOCK_MODE 1").unwrap();
    conn.query("test").unwrap();
    assert_eq!(conn.locks(), vec![(TableId::new("test"), LockKind::Shared)]);

    conn.execute_command("SET LOCK_MODE 3").unwrap();
    conn.query("test").unwrap();
    assert_eq!(conn.locks().len(), 1, "read lock kept until commit");

    conn.commit().unwrap();
    assert!(conn.locks().is_empty());
    conn.query("test").unwrap();
    assert!(conn.locks().is_empty(), "next transaction reads under READ_COMMITTED");
}
