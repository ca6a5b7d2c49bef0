use std::io::Read;
use std::sync::Arc;

use spimi_io::BlockStore;
use tempfile::TempDir;

struct TestStore {
    store: Arc<dyn BlockStore>,
    _dir: Option<TempDir>,
}

fn create_stores() -> Vec<TestStore> {
    let dir = tempfile::tempdir().unwrap();
    vec![
        TestStore {
            store: super::create_in_memory(10 * 1024 * 1024).unwrap(),
            _dir: None,
        },
        TestStore {
            store: super::create_local(&dir.path().join("disk")).unwrap(),
            _dir: Some(dir),
        },
    ]
}

fn write_block(store: &dyn BlockStore, block: u32, data: &[u8]) {
    let mut writer = store.create_block(block).expect("create_block");
    writer.write_all(data).expect("write_all");
    writer.seal().expect("seal");
}

fn read_block(store: &dyn BlockStore, block: u32) -> Vec<u8> {
    let mut reader = store.open_block(block).expect("open_block");
    let mut data = Vec::new();
    reader.read_to_end(&mut data).expect("read_to_end");
    data
}

#[test]
fn test_write_read_block() {
    for t in create_stores() {
        let store = t.store.as_ref();
        write_block(store, 1, b"cat dog");
        write_block(store, 2, b"");
        assert_eq!(read_block(store, 1), b"cat dog");
        assert!(read_block(store, 2).is_empty());
    }
}

#[test]
fn test_blocks_are_write_once() {
    for t in create_stores() {
        let store = t.store.as_ref();
        write_block(store, 1, b"first");
        let err = store.create_block(1).err().expect("second create must fail");
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(read_block(store, 1), b"first");

        store.remove_block(1).unwrap();
        write_block(store, 1, b"second");
        assert_eq!(read_block(store, 1), b"second");
    }
}

#[test]
fn test_list_blocks_ascending() {
    for t in create_stores() {
        let store = t.store.as_ref();
        assert!(store.list_blocks().unwrap().is_empty());
        for block in [3, 1, 12, 2] {
            write_block(store, block, &block.to_le_bytes());
        }
        assert_eq!(store.list_blocks().unwrap(), vec![1, 2, 3, 12]);
    }
}

#[test]
fn test_remove_and_reset() {
    for t in create_stores() {
        let store = t.store.as_ref();
        write_block(store, 1, b"a");
        write_block(store, 2, b"b");
        store.remove_block(1).unwrap();
        store.remove_block(7).unwrap();
        assert_eq!(store.list_blocks().unwrap(), vec![2]);
        assert!(store.open_block(1).is_err());

        store.reset().unwrap();
        assert!(store.list_blocks().unwrap().is_empty());
        write_block(store, 1, b"c");
        assert_eq!(read_block(store, 1), b"c");
    }
}

#[test]
fn test_partial_block_removal() {
    for t in create_stores() {
        let store = t.store.as_ref();
        let mut writer = store.create_block(1).unwrap();
        writer.write_all(b"partial").unwrap();
        drop(writer);

        store.remove_block(1).unwrap();
        write_block(store, 1, b"complete");
        assert_eq!(read_block(store, 1), b"complete");
    }
}

#[test]
fn test_local_store_open_clean() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("disk");
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(path.join("block_9"), b"stale").unwrap();
    std::fs::write(path.join("notes.txt"), b"stale").unwrap();

    let store = super::fs::LocalBlockStore::open_clean(&path).unwrap();
    assert_eq!(store.dir(), path.as_path());
    assert!(store.list_blocks().unwrap().is_empty());
    assert!(!path.join("notes.txt").exists());
}

#[test]
fn test_local_store_open_clean_failure() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("not_a_dir");
    std::fs::write(&file, b"x").unwrap();
    assert!(super::fs::LocalBlockStore::open_clean(file.join("disk")).is_err());
}

#[test]
fn test_in_memory_store_budget() {
    let store = super::memory::InMemoryBlockStore::new(10);
    let mut writer = store.create_block(1).unwrap();
    writer.write_all(b"0123456").unwrap();
    let err = writer.write_all(b"789abc").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::StorageFull);
    writer.seal().unwrap();
    assert_eq!(store.available_space(), 3);

    store.remove_block(1).unwrap();
    assert_eq!(store.available_space(), 10);
}

#[test]
fn test_in_memory_unsealed_block() {
    let store = super::memory::InMemoryBlockStore::new(1024);
    let mut writer = store.create_block(5).unwrap();
    writer.write_all(b"abc").unwrap();
    assert!(store.list_blocks().unwrap().is_empty());
    assert_eq!(
        store.open_block(5).err().unwrap().kind(),
        std::io::ErrorKind::InvalidInput
    );
    writer.seal().unwrap();
    assert_eq!(store.list_blocks().unwrap(), vec![5]);
}

#[test]
fn test_unsealed_blocks_are_not_listed() {
    for t in create_stores() {
        let store = t.store.as_ref();
        write_block(store, 1, b"sealed");

        let mut writer = store.create_block(2).unwrap();
        writer.write_all(b"partial").unwrap();
        assert_eq!(store.list_blocks().unwrap(), vec![1]);
        assert!(store.open_block(2).is_err());
        assert_eq!(
            store.create_block(2).err().unwrap().kind(),
            std::io::ErrorKind::AlreadyExists
        );

        drop(writer);
        assert_eq!(store.list_blocks().unwrap(), vec![1]);
        write_block(store, 2, b"retried");
        assert_eq!(store.list_blocks().unwrap(), vec![1, 2]);
        assert_eq!(read_block(store, 2), b"retried");
    }
}

#[test]
fn test_local_store_stages_block_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("disk");
    let store = super::fs::LocalBlockStore::open_clean(&path).unwrap();

    let mut writer = store.create_block(3).unwrap();
    writer.write_all(b"abc").unwrap();
    assert!(path.join("block_3.tmp").exists());
    assert!(!path.join("block_3").exists());
    assert!(store.list_blocks().unwrap().is_empty());

    store.remove_block(3).unwrap();
    assert!(!path.join("block_3.tmp").exists());
    drop(writer);

    let mut writer = store.create_block(3).unwrap();
    writer.write_all(b"abc").unwrap();
    writer.seal().unwrap();
    assert!(!path.join("block_3.tmp").exists());
    assert_eq!(std::fs::read(path.join("block_3")).unwrap(), b"abc");
    assert_eq!(store.list_blocks().unwrap(), vec![3]);
}
