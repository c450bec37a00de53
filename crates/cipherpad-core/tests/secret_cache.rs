use std::time::Duration;

use cipherpad_core::crypto::{KeyMaterial, Label};
use cipherpad_core::SecretCache;

fn key() -> KeyMaterial {
    KeyMaterial::from_bytes(Label::default(), vec![0x42; 64])
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let cache = SecretCache::new().expect("runtime should be available");
    cache.set(key(), Duration::from_millis(100));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(cache.get().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_access_does_not_extend_ttl() {
    let cache = SecretCache::new().expect("runtime should be available");
    cache.set(key(), Duration::from_millis(200));

    let mut elapsed = Duration::ZERO;
    while elapsed < Duration::from_millis(200) {
        assert!(cache.get().is_some(), "key vanished early at {:?}", elapsed);
        tokio::time::sleep(Duration::from_millis(50)).await;
        elapsed += Duration::from_millis(50);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.get().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_one_minute_timeout_after_inactivity() {
    let cache = SecretCache::new().expect("runtime should be available");
    cache.set(key(), Duration::from_secs(60));

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(cache.get().is_none());
    assert!(!cache.is_unlocked());
}

#[tokio::test(start_paused = true)]
async fn test_consumers_share_one_state() {
    let cache = SecretCache::new().expect("runtime should be available");
    let editor = cache.clone();
    let background = cache.clone();

    editor.set(key(), Duration::from_secs(60));
    assert!(background.get().is_some());

    background.clear();
    assert!(editor.get().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_never_sees_torn_state() {
    let cache = SecretCache::new().expect("runtime should be available");
    let mut tasks = Vec::new();

    for worker in 0..8u8 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move {
            for round in 0..200u32 {
                match (u32::from(worker) + round) % 3 {
                    0 => cache.set(
                        KeyMaterial::from_bytes(Label::default(), vec![worker; 64]),
                        Duration::from_millis(u64::from(round % 5)),
                    ),
                    1 => {
                        if let Some(found) = cache.get() {
                            let first = found.as_bytes()[0];
                            assert!(found.as_bytes().iter().all(|b| *b == first));
                        }
                    }
                    _ => cache.clear(),
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    for task in tasks {
        task.await.expect("worker should not panic");
    }
}
