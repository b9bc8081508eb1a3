#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use prometheus_client::registry::Registry;
use sockpool::{CompletionHandler, ContextPool, Error, IoContext, PoolConfig, SocketHandle};
use std::{collections::HashSet, sync::Arc};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    capacity: u8,
    slice_size: u16,
    operations: Vec<PoolOperation>,
}

#[derive(Arbitrary, Debug)]
enum PoolOperation {
    Acquire,
    Release { slot: u8 },
    ReleaseNone,
    Bind { slot: u8 },
    SetTransients { slot: u8, socket: u64 },
    Write { slot: u8, byte: u8 },
}

fn fuzz(input: FuzzInput) {
    let capacity = input.capacity as usize;
    // Zero-length slices would alias (every empty slice shares an address),
    // breaking the identity checks below.
    let slice_size = (input.slice_size as usize).max(1);

    let mut registry = Registry::default();
    let pool = ContextPool::new(
        PoolConfig {
            capacity,
            slice_size,
        },
        None,
        &mut registry,
    );
    assert_eq!(pool.count(), capacity);
    assert_eq!(pool.created(), capacity);

    let handler: CompletionHandler = Arc::new(|_| {});
    let mut held: Vec<IoContext> = Vec::new();
    let mut held_ptrs: HashSet<usize> = HashSet::new();

    for operation in input.operations {
        match operation {
            PoolOperation::Acquire => {
                let context = pool.acquire();
                assert_eq!(context.buffer().len(), slice_size);

                // Transients must always read back empty after acquire.
                assert!(context.socket.is_none());
                assert!(context.peer.is_none());
                assert!(context.token.is_none());
                assert!(context.reuse_socket);

                // No double-lend: nothing we currently hold shares a slice.
                let ptr = context.buffer().as_ptr() as usize;
                assert!(held_ptrs.insert(ptr), "context lent twice");
                held.push(context);
            }
            PoolOperation::Release { slot } => {
                if held.is_empty() {
                    continue;
                }
                let index = slot as usize % held.len();
                let context = held.swap_remove(index);
                held_ptrs.remove(&(context.buffer().as_ptr() as usize));
                pool.release(Some(context)).unwrap();
            }
            PoolOperation::ReleaseNone => {
                let before = pool.count();
                assert_eq!(pool.release(None), Err(Error::NullContext));
                assert_eq!(pool.count(), before);
            }
            PoolOperation::Bind { slot } => {
                if held.is_empty() {
                    continue;
                }
                let index = slot as usize % held.len();
                let context = &mut held[index];
                if context.bind_completion(handler.clone()) {
                    // The binding is one-time.
                    assert!(!context.bind_completion(handler.clone()));
                }
                assert!(context.completion().is_some());
            }
            PoolOperation::SetTransients { slot, socket } => {
                if held.is_empty() {
                    continue;
                }
                let index = slot as usize % held.len();
                let context = &mut held[index];
                context.socket = Some(SocketHandle::new(socket));
                context.token = Some(Box::new(socket));
                context.reuse_socket = false;
            }
            PoolOperation::Write { slot, byte } => {
                if held.is_empty() {
                    continue;
                }
                let index = slot as usize % held.len();
                let buffer = held[index].buffer_mut();
                buffer.as_mut()[0] = byte;
                assert_eq!(buffer.as_ref()[0], byte);
            }
        }
        assert_eq!(pool.created(), pool.count() + held.len());
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
