//! Transaction lifecycle tests: commit durability, abort rollback, strict
//! two-phase lock release

use std::sync::Arc;
use std::thread;

use granite::tuple::{Column, DataType, Schema, Tuple, Value};
use granite::{
    Database, HeapFile, HeapPage, PageId, Permissions, TableId, TransactionId, TupleIterator,
};
use tempfile::NamedTempFile;

fn test_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![Column::new("id", DataType::Int)]))
}

fn setup(pool_capacity: usize, pages: usize) -> (Database, TableId, NamedTempFile) {
    let db = Database::new(pool_capacity);
    let temp = NamedTempFile::new().unwrap();
    let table_id = TableId::new(1);
    let file = Arc::new(HeapFile::new(table_id, temp.path(), test_schema()).unwrap());
    for page_no in 0..pages {
        let page = HeapPage::new_empty(PageId::new(table_id, page_no), test_schema());
        file.write_page(&page).unwrap();
    }
    db.catalog().add_table(file);
    (db, table_id, temp)
}

fn make_tuple(id: i32) -> Tuple {
    Tuple::new(test_schema(), vec![Value::Int(id)])
}

#[test]
fn test_commit_flushes_exactly_the_exclusive_pages() {
    let (db, table_id, _temp) = setup(8, 2);
    let pool = db.buffer_pool();
    let file = db.catalog().table_file(table_id).unwrap();

    // A dirties page 0; B dirties page 1; A also reads page 1's neighbor
    let a = TransactionId::new();
    let b = TransactionId::new();
    pool.insert_tuple(a, table_id, make_tuple(1)).unwrap();

    let page1 = pool
        .get_page(b, PageId::new(table_id, 1), Permissions::ReadWrite)
        .unwrap();
    {
        let mut guard = page1.write();
        guard.insert_tuple(make_tuple(2)).unwrap();
        guard.mark_dirty(Some(b));
    }

    assert_eq!(
        pool.lock_manager().exclusive_pages(a),
        vec![PageId::new(table_id, 0)]
    );
    pool.transaction_complete(a, true).unwrap();

    // A's page is durable, B's uncommitted page is not
    let disk0 = file.read_page(PageId::new(table_id, 0)).unwrap();
    assert_eq!(disk0.iter().count(), 1);
    let disk1 = file.read_page(PageId::new(table_id, 1)).unwrap();
    assert_eq!(disk1.iter().count(), 0, "commit must not flush B's page");

    pool.transaction_complete(b, false).unwrap();
}

#[test]
fn test_abort_discards_uncommitted_pages() {
    let (db, table_id, _temp) = setup(8, 1);
    let pool = db.buffer_pool();
    let file = db.catalog().table_file(table_id).unwrap();

    let a = TransactionId::new();
    pool.insert_tuple(a, table_id, make_tuple(42)).unwrap();
    pool.transaction_complete(a, false).unwrap();

    // nothing reached disk and nothing dirty lingers in cache
    let disk0 = file.read_page(PageId::new(table_id, 0)).unwrap();
    assert_eq!(disk0.iter().count(), 0);

    let reader = TransactionId::new();
    let mut iter = file.iter(pool, reader);
    iter.open().unwrap();
    assert!(!iter.has_next().unwrap());
    pool.transaction_complete(reader, true).unwrap();
}

#[test]
fn test_locks_released_after_completion() {
    let (db, table_id, _temp) = setup(8, 2);
    let pool = db.buffer_pool();

    let a = TransactionId::new();
    let p0 = PageId::new(table_id, 0);
    let p1 = PageId::new(table_id, 1);
    pool.get_page(a, p0, Permissions::ReadWrite).unwrap();
    pool.get_page(a, p1, Permissions::ReadOnly).unwrap();
    assert!(pool.holds_lock(a, p0));
    assert!(pool.holds_lock(a, p1));

    pool.transaction_complete(a, true).unwrap();
    assert!(!pool.holds_lock(a, p0));
    assert!(!pool.holds_lock(a, p1));

    // another transaction can immediately write both pages
    let b = TransactionId::new();
    pool.get_page(b, p0, Permissions::ReadWrite).unwrap();
    pool.get_page(b, p1, Permissions::ReadWrite).unwrap();
    pool.transaction_complete(b, false).unwrap();
}

#[test]
fn test_aborted_writer_is_invisible_to_later_readers() {
    let (db, table_id, _temp) = setup(8, 1);
    let pool = db.buffer_pool();
    let file = db.catalog().table_file(table_id).unwrap();

    // committed baseline
    let setup_txn = TransactionId::new();
    pool.insert_tuple(setup_txn, table_id, make_tuple(1)).unwrap();
    pool.transaction_complete(setup_txn, true).unwrap();

    // writer adds a tuple, then aborts
    let writer = TransactionId::new();
    pool.insert_tuple(writer, table_id, make_tuple(2)).unwrap();
    pool.transaction_complete(writer, false).unwrap();

    let reader = TransactionId::new();
    let mut iter = file.iter(pool, reader);
    iter.open().unwrap();
    let mut ids = Vec::new();
    while iter.has_next().unwrap() {
        ids.push(iter.next().unwrap().value(0).cloned());
    }
    assert_eq!(ids, vec![Some(Value::Int(1))]);
    pool.transaction_complete(reader, true).unwrap();
}

#[test]
fn test_concurrent_committing_writers_all_land() {
    let (db, table_id, _temp) = setup(8, 1);
    let db = Arc::new(db);
    let writers = 4;
    let per_writer = 5;

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let mut committed = 0;
                while committed < per_writer {
                    let txn = TransactionId::new();
                    let id = (w * per_writer + committed) as i32;
                    match db.buffer_pool().insert_tuple(txn, table_id, make_tuple(id)) {
                        Ok(()) => {
                            db.buffer_pool().transaction_complete(txn, true).unwrap();
                            committed += 1;
                        }
                        Err(_) => {
                            // lock timeout: roll back and retry
                            db.buffer_pool().transaction_complete(txn, false).unwrap();
                        }
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let file = db.catalog().table_file(table_id).unwrap();
    let reader = TransactionId::new();
    let mut iter = file.iter(db.buffer_pool(), reader);
    iter.open().unwrap();
    let mut count = 0;
    while iter.has_next().unwrap() {
        iter.next().unwrap();
        count += 1;
    }
    assert_eq!(count, writers * per_writer);
}
