//! Two connections through every isolation setting, end to end.

use crate::common::*;

fn call_lock_mode(conn: &mut Connection) -> Value {
    conn.execute_command("CALL LOCK_MODE()")
        .unwrap()
        .single_value()
        .cloned()
        .unwrap()
}

#[test]
fn table_level_locking() {
    init_tracing();
    let db = Strata::builder().lock_timeout(Duration::from_millis(200)).open();

    let mut conn1 = db.connect();
    assert_eq!(
        conn1.transaction_isolation().unwrap(),
        IsolationLevel::ReadCommitted
    );
    conn1
        .set_transaction_isolation(IsolationLevel::Serializable)
        .unwrap();
    assert_eq!(
        conn1.transaction_isolation().unwrap(),
        IsolationLevel::Serializable
    );
    conn1
        .set_transaction_isolation(IsolationLevel::ReadUncommitted)
        .unwrap();
    assert_eq!(
        conn1.transaction_isolation().unwrap(),
        IsolationLevel::ReadUncommitted
    );
    assert_eq!(call_lock_mode(&mut conn1), Value::Int(0));
    conn1
        .set_transaction_isolation(IsolationLevel::ReadCommitted)
        .unwrap();
    assert_eq!(call_lock_mode(&mut conn1), Value::Int(3));
    assert_eq!(
        conn1.transaction_isolation().unwrap(),
        IsolationLevel::ReadCommitted
    );
    conn1.execute_command("SET LOCK_MODE 1").unwrap();
    assert_eq!(
        conn1.transaction_isolation().unwrap(),
        IsolationLevel::Serializable
    );
    conn1
        .execute(&Statement::create_table("test", ["id"]))
        .unwrap();
    conn1.execute(&Statement::insert("test", [1])).unwrap();
    conn1.set_auto_commit(false).unwrap();

    let mut conn2 = db.connect();
    conn2.set_auto_commit(false).unwrap();

    conn1
        .set_transaction_isolation(IsolationLevel::Serializable)
        .unwrap();

    // serializable: just reading
    assert_eq!(single_value(&mut conn1, "test"), Value::Int(1));
    assert_eq!(single_value(&mut conn2, "test"), Value::Int(1));
    conn1.commit().unwrap();
    conn2.commit().unwrap();

    // serializable: write lock
    conn1.execute(&Statement::update("test", "id", 2)).unwrap();
    assert_lock_timeout(conn2.query("test"));
    conn1.commit().unwrap();
    conn2.commit().unwrap();

    conn1
        .set_transaction_isolation(IsolationLevel::ReadCommitted)
        .unwrap();

    // read committed: #1 read, #2 update, #1 read again
    assert_eq!(single_value(&mut conn1, "test"), Value::Int(2));
    conn2.execute(&Statement::update("test", "id", 3)).unwrap();
    conn2.commit().unwrap();
    assert_eq!(single_value(&mut conn1, "test"), Value::Int(3));
    conn1.commit().unwrap();

    // read committed: #1 read, #2 read, #2 update, #1 delete
    assert_eq!(single_value(&mut conn1, "test"), Value::Int(3));
    assert_eq!(single_value(&mut conn2, "test"), Value::Int(3));
    conn2.execute(&Statement::update("test", "id", 4)).unwrap();
    assert_lock_timeout(conn1.execute(&Statement::delete("test")));
    conn2.commit().unwrap();
    conn1.commit().unwrap();
    assert_eq!(single_value(&mut conn1, "test"), Value::Int(4));
    assert_eq!(single_value(&mut conn2, "test"), Value::Int(4));

    conn1.close();
    conn2.close();
    assert_eq!(db.session_count(), 0);
    assert!(db.holders("test").is_free());
}
