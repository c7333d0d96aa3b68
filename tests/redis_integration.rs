//! Integration tests against a live Redis server.
//!
//! Ignored by default; run them against a scratch database with
//! `DQUEUE_TEST_REDIS_URL=redis://127.0.0.1:6379/15 cargo test -- --ignored`.
//! Each test uses its own namespace so leftovers never leak between tests.

use dqueue::claims::{KeySpace, Pid};
use dqueue::config::RelockPolicy;
use dqueue::error::QueueError;
use dqueue::expiry::MAX_TTL;
use dqueue::queue::DistributedQueue;
use dqueue::store::RedisStore;
use serial_test::serial;
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(60);

fn set(pids: &[Pid]) -> BTreeSet<Pid> {
    pids.iter().copied().collect()
}

fn redis_url() -> String {
    std::env::var("DQUEUE_TEST_REDIS_URL").expect("DQUEUE_TEST_REDIS_URL must be set")
}

fn unique_namespace(test: &str) -> String {
    format!(
        "dqtest-{}-{}-{}",
        test,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn create_store(url: &str, test: &str) -> RedisStore {
    RedisStore::open(url, KeySpace::new(unique_namespace(test)).unwrap()).unwrap()
}

fn raw_connection(url: &str) -> redis::Connection {
    redis::Client::open(url).unwrap().get_connection().unwrap()
}

#[test]
#[serial]
#[ignore = "requires DQUEUE_TEST_REDIS_URL"]
fn moderation_team_scenario() {
    let url = redis_url();
    let queue = DistributedQueue::new(create_store(&url, "scenario")).with_ttl(TTL);

    assert_eq!(queue.lock_default(1, [1, 2, 3, 4, 5]).unwrap(), set(&[1, 2, 3, 4, 5]));
    assert_eq!(queue.lock_default(2, [6, 7, 8]).unwrap(), set(&[6, 7, 8]));
    assert_eq!(queue.retrieve_user(1).unwrap(), set(&[1, 2, 3, 4, 5]));
    assert_eq!(queue.retrieve_user(2).unwrap(), set(&[6, 7, 8]));
    assert_eq!(queue.retrieve_all().unwrap(), set(&[1, 2, 3, 4, 5, 6, 7, 8]));
    assert_eq!(queue.remove_pids(2, [6, 8]).unwrap(), set(&[6, 8]));
    assert_eq!(queue.remove_all(1).unwrap(), set(&[1, 2, 3, 4, 5]));
    assert_eq!(queue.retrieve_all().unwrap(), set(&[7]));

    queue.remove_all(2).unwrap();
}

#[test]
#[serial]
#[ignore = "requires DQUEUE_TEST_REDIS_URL"]
fn conflicting_and_repeated_locks() {
    let url = redis_url();
    let queue = DistributedQueue::new(create_store(&url, "conflict"));

    assert_eq!(queue.lock(1, [1, 2], TTL).unwrap(), set(&[1, 2]));
    assert_eq!(queue.lock(1, [1, 2], TTL).unwrap(), set(&[1, 2]));
    assert_eq!(queue.lock(2, [2, 3], TTL).unwrap(), set(&[3]));
    assert_eq!(queue.remove_pids(2, [1, 2, 3]).unwrap(), set(&[3]));
    assert_eq!(queue.retrieve_user(1).unwrap(), set(&[1, 2]));

    let claim = queue.owner_of(2).unwrap().unwrap();
    assert_eq!(claim.user_id, 1);
    assert!(claim.expires_at > chrono::Utc::now());

    queue.remove_all(1).unwrap();
    assert!(queue.owner_of(2).unwrap().is_none());
}

#[test]
#[serial]
#[ignore = "requires DQUEUE_TEST_REDIS_URL"]
fn claims_expire_natively() {
    let url = redis_url();
    let queue = DistributedQueue::new(create_store(&url, "expiry"));

    assert_eq!(queue.lock(1, [1], Duration::from_secs(1)).unwrap(), set(&[1]));
    thread::sleep(Duration::from_millis(1200));

    assert!(queue.retrieve_user(1).unwrap().is_empty());
    assert!(queue.retrieve_all().unwrap().is_empty());
    assert_eq!(queue.lock(2, [1], TTL).unwrap(), set(&[1]));

    queue.remove_all(2).unwrap();
}

#[test]
#[serial]
#[ignore = "requires DQUEUE_TEST_REDIS_URL"]
fn refresh_policy_extends_ttl() {
    let url = redis_url();
    let queue = DistributedQueue::new(create_store(&url, "refresh"))
        .with_relock_policy(RelockPolicy::Refresh);

    queue.lock(1, [1], Duration::from_secs(2)).unwrap();
    queue.lock(1, [1], TTL).unwrap();

    let claim = queue.owner_of(1).unwrap().unwrap();
    let left = claim.expires_at - chrono::Utc::now();
    assert!(left > chrono::Duration::seconds(30));

    queue.remove_all(1).unwrap();
}

#[test]
#[serial]
#[ignore = "requires DQUEUE_TEST_REDIS_URL"]
fn longest_ttl_is_stored_and_longer_is_rejected() {
    let url = redis_url();
    let queue = DistributedQueue::new(create_store(&url, "maxttl"));

    assert_eq!(queue.lock(1, [1], MAX_TTL).unwrap(), set(&[1]));
    let claim = queue.owner_of(1).unwrap().unwrap();
    let left = claim.expires_at - chrono::Utc::now();
    assert!(left > chrono::Duration::days(3600));

    let err = queue
        .lock(2, [2], MAX_TTL + Duration::from_secs(1))
        .unwrap_err();
    assert!(matches!(err, QueueError::InvalidArgument(_)));

    queue.remove_all(1).unwrap();
}

#[test]
#[serial]
#[ignore = "requires DQUEUE_TEST_REDIS_URL"]
fn corrupted_owner_is_a_protocol_violation() {
    let url = redis_url();
    let store = create_store(&url, "corrupt");
    let key = store.keys().claim_key(5);
    let queue = DistributedQueue::new(store);

    let mut con = raw_connection(&url);
    redis::cmd("SET")
        .arg(&key)
        .arg("not-a-user")
        .arg("PX")
        .arg(60_000)
        .query::<()>(&mut con)
        .unwrap();

    let err = queue.owner_of(5).unwrap_err();
    assert!(matches!(err, QueueError::ProtocolViolation(_)));

    redis::cmd("DEL").arg(&key).query::<()>(&mut con).unwrap();
}

#[test]
#[serial]
#[ignore = "requires DQUEUE_TEST_REDIS_URL"]
fn concurrent_lockers_never_share_a_pid() {
    let url = redis_url();
    let store = Arc::new(create_store(&url, "race"));
    let barrier = Arc::new(Barrier::new(6));

    let handles: Vec<_> = (1..=6u64)
        .map(|user| {
            let queue = DistributedQueue::new(Arc::clone(&store));
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (user, queue.lock(user, 0..50, TTL).unwrap())
            })
        })
        .collect();

    let mut seen = BTreeSet::new();
    for handle in handles {
        let (_user, locked) = handle.join().unwrap();
        assert!(seen.is_disjoint(&locked), "pid locked by two users");
        seen.extend(locked);
    }

    let queue = DistributedQueue::new(Arc::clone(&store));
    assert_eq!(seen, (0..50).collect::<BTreeSet<Pid>>());
    assert_eq!(queue.retrieve_all().unwrap(), seen);

    for user in 1..=6 {
        queue.remove_all(user).unwrap();
    }
}
