//! Cross-process behavior of the filesystem store, driven through two
//! handles on one shared directory.

use std::sync::Arc;
use std::time::Duration;

use winmesh::geometry::WindowRect;
use winmesh::registry::{RegistryStore, WindowId, PALETTE, REGISTRY_KEY};
use winmesh::store::{FsStore, StoreBackend};

const POLL: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn registrations_are_visible_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let a = RegistryStore::new(Arc::new(FsStore::open(dir.path(), POLL).unwrap()));
    let b = RegistryStore::new(Arc::new(FsStore::open(dir.path(), POLL).unwrap()));

    a.register(&WindowId::from("a"), WindowRect::new(0, 0, 100, 100));
    b.register(&WindowId::from("b"), WindowRect::new(10, 10, 100, 100));

    let seen_by_a = a.read_all();
    assert_eq!(seen_by_a.len(), 2);
    assert_eq!(seen_by_a.get(&WindowId::from("a")).unwrap().color, PALETTE[0]);
    assert_eq!(seen_by_a.get(&WindowId::from("b")).unwrap().color, PALETTE[1]);
    assert_eq!(b.read_counter(), 2);
}

#[tokio::test]
async fn peer_registration_fires_a_change_event() {
    let dir = tempfile::tempdir().unwrap();
    let a = FsStore::open(dir.path(), POLL).unwrap();
    let b = FsStore::open(dir.path(), POLL).unwrap();

    let mut events = a.watch_external();
    let b_registry = RegistryStore::new(Arc::new(b));
    b_registry.register(&WindowId::from("b"), WindowRect::new(0, 0, 50, 50));

    // The registry write must surface on A's watcher with a decodable
    // payload. The counter write may surface too; skip past it.
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .expect("timed out waiting for registry change event");
        let event = tokio::time::timeout(remaining, events.recv())
            .await
            .expect("timed out waiting for registry change event")
            .unwrap();
        if event.key == REGISTRY_KEY {
            let registry: winmesh::registry::Registry =
                serde_json::from_slice(&event.value).unwrap();
            assert!(registry.contains(&WindowId::from("b")));
            break;
        }
    }
}

#[tokio::test]
async fn corrupt_registry_file_heals_on_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("windows.json"), b"\xff\xfe not json").unwrap();

    let store = RegistryStore::new(Arc::new(FsStore::open(dir.path(), POLL).unwrap()));
    assert!(store.read_all().is_empty());

    // The file itself was overwritten with an empty registry.
    let healed = std::fs::read(dir.path().join("windows.json")).unwrap();
    assert_eq!(healed, b"{}");
}

#[tokio::test]
async fn unregister_of_missing_file_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(Arc::new(FsStore::open(dir.path(), POLL).unwrap()));
    let registry = store.unregister(&WindowId::from("ghost"));
    assert!(registry.is_empty());
}
