//! Integration tests for racing first access.
//!
//! Every test owns its holders, so these run in parallel without interference.

use lazy_singleton::{CreationPolicy, InstanceState, LazyHolder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_eight_racing_threads_create_once() {
    static CREATE_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Counter {
        id: usize,
    }

    struct CounterPolicy;

    impl CreationPolicy<Counter> for CounterPolicy {
        fn create() -> Counter {
            let id = CREATE_CALLS.fetch_add(1, Ordering::SeqCst) + 1;
            // Widen the creation window so the other threads pile up behind it.
            thread::sleep(Duration::from_millis(20));
            Counter { id }
        }
    }

    static COUNTER: LazyHolder<Counter, CounterPolicy> = LazyHolder::new();

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                COUNTER.get() as *const Counter as usize
            })
        })
        .collect();

    let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(CREATE_CALLS.load(Ordering::SeqCst), 1);
    assert!(addresses.iter().all(|&a| a == addresses[0]));
    assert_eq!(COUNTER.get().id, 1);
}

#[test]
fn test_thousand_sequential_calls_reuse_instance() {
    static CREATE_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Service;

    struct ServicePolicy;

    impl CreationPolicy<Service> for ServicePolicy {
        fn create() -> Service {
            CREATE_CALLS.fetch_add(1, Ordering::SeqCst);
            Service
        }
    }

    static SERVICE: LazyHolder<Service, ServicePolicy> = LazyHolder::new();

    let first = SERVICE.get();
    for _ in 0..1000 {
        assert!(std::ptr::eq(first, SERVICE.get()));
    }
    assert_eq!(CREATE_CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_no_thread_sees_partial_construction() {
    const LEN: usize = 4096;

    struct Table {
        entries: Vec<u64>,
        checksum: u64,
    }

    struct TablePolicy;

    impl CreationPolicy<Table> for TablePolicy {
        fn create() -> Table {
            let mut entries = Vec::with_capacity(LEN);
            for i in 0..LEN as u64 {
                entries.push(i * 3 + 1);
                if i % 512 == 0 {
                    thread::yield_now();
                }
            }
            let checksum = entries.iter().sum();
            Table { entries, checksum }
        }
    }

    static TABLE: LazyHolder<Table, TablePolicy> = LazyHolder::new();

    let barrier = Arc::new(Barrier::new(16));
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let table = TABLE.get();
                assert_eq!(table.entries.len(), LEN);
                assert_eq!(table.entries.iter().sum::<u64>(), table.checksum);
                assert_eq!(table.entries[LEN - 1], (LEN as u64 - 1) * 3 + 1);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_many_holders_many_threads() {
    static CREATE_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Shard(#[allow(dead_code)] u8);

    struct ShardPolicy;

    impl CreationPolicy<Shard> for ShardPolicy {
        fn create() -> Shard {
            CREATE_CALLS.fetch_add(1, Ordering::SeqCst);
            Shard(0)
        }
    }

    let holders: &'static [LazyHolder<Shard, ShardPolicy>] = Box::leak(
        (0..32)
            .map(|_| LazyHolder::new())
            .collect::<Vec<_>>()
            .into_boxed_slice(),
    );

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                holders
                    .iter()
                    .map(|h| h.get() as *const Shard as usize)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<Vec<usize>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(CREATE_CALLS.load(Ordering::SeqCst), holders.len());
    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
    assert!(holders.iter().all(|h| h.state() == InstanceState::Created));
}
