//! Concurrent readers and writers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use resource_mirror::kinds::{self, default_indexes};
use resource_mirror::{Cache, QueryRequest, StoredObject, Uid};
use serde_json::json;

fn connection(host: &str, namespace: &str, address_space: &str) -> StoredObject {
  StoredObject::new(kinds::CONNECTION, Uid::generate(), namespace, host)
    .with_spec(json!({"AddressSpace": address_space}))
}

#[test]
fn test_readers_never_see_partial_batches() {
  const BATCH: usize = 5;
  const ROUNDS: usize = 200;

  let cache = Arc::new(Cache::new(default_indexes()).unwrap());
  let done = Arc::new(AtomicBool::new(false));

  let writer = {
    let cache = cache.clone();
    let done = done.clone();
    thread::spawn(move || {
      for round in 0..ROUNDS {
        let batch: Vec<_> = (0..BATCH)
          .map(|i| connection(&format!("host:{}-{}", round, i), "ns", "as"))
          .collect();
        let uids: Vec<_> = batch.iter().map(|o| o.uid().clone()).collect();
        cache.add(batch).unwrap();
        if round % 2 == 1 {
          cache.delete_many(uids.iter());
        }
      }
      done.store(true, Ordering::SeqCst);
    })
  };

  let readers: Vec<_> = (0..4)
    .map(|_| {
      let cache = cache.clone();
      let done = done.clone();
      thread::spawn(move || {
        let request = QueryRequest::new(kinds::CONNECTION);
        while !done.load(Ordering::SeqCst) {
          let result = cache.query(&request).unwrap();
          assert_eq!(result.total % BATCH, 0, "saw a partial batch");
          assert_eq!(result.items.len(), result.total);

          let children = cache.descendants("ns/as", kinds::CONNECTION).unwrap();
          assert_eq!(children.len() % BATCH, 0, "saw a partial batch");

          for obj in &result.items {
            if let Some(keys) = cache.index_keys("hierarchy", obj.uid()) {
              assert_eq!(keys.len(), 1);
            }
          }
        }
      })
    })
    .collect();

  writer.join().unwrap();
  for reader in readers {
    reader.join().unwrap();
  }

  // odd rounds were deleted again
  assert_eq!(cache.len(), BATCH * ROUNDS / 2);
  assert_eq!(
    cache.descendants("ns/as", kinds::CONNECTION).unwrap().len(),
    BATCH * ROUNDS / 2
  );
}

#[test]
fn test_concurrent_writers_on_disjoint_objects() {
  let cache = Arc::new(Cache::new(default_indexes()).unwrap());

  let handles: Vec<_> = (0..4)
    .map(|w| {
      let cache = cache.clone();
      thread::spawn(move || {
        for i in 0..50 {
          cache
            .add_one(connection(&format!("host:{}", i), "ns", &format!("as{}", w)))
            .unwrap();
        }
      })
    })
    .collect();
  for handle in handles {
    handle.join().unwrap();
  }

  assert_eq!(cache.len(), 200);
  for w in 0..4 {
    let root = format!("ns/as{}", w);
    assert_eq!(cache.descendants(&root, kinds::CONNECTION).unwrap().len(), 50);
  }
  assert_eq!(cache.stats().index_keys["hierarchy"], 200);
}

#[test]
fn test_upserts_of_same_identity_converge() {
  let cache = Arc::new(Cache::new(default_indexes()).unwrap());
  let uid = Uid::generate();

  let handles: Vec<_> = (0..4)
    .map(|w| {
      let cache = cache.clone();
      let uid = uid.clone();
      thread::spawn(move || {
        for _ in 0..50 {
          let obj = StoredObject::new(kinds::CONNECTION, uid.clone(), "ns", "host:1")
            .with_spec(json!({"AddressSpace": format!("as{}", w)}));
          cache.add_one(obj).unwrap();
        }
      })
    })
    .collect();
  for handle in handles {
    handle.join().unwrap();
  }

  assert_eq!(cache.len(), 1);
  let stored = cache.get(&uid).unwrap();
  let owner = stored.spec().unwrap()["AddressSpace"].as_str().unwrap().to_string();
  let keys = cache.index_keys("hierarchy", &uid).unwrap();
  assert_eq!(keys.len(), 1);
  assert!(keys.contains(&format!("Connection/ns/{}/host:1", owner)));
  assert_eq!(cache.stats().index_keys["hierarchy"], 1);
}
