//! Reusable per-operation I/O context.

use crate::BufferSlice;
#[cfg(unix)]
use std::os::fd::RawFd;
use std::{any::Any, net::SocketAddr, sync::Arc};

/// Callback invoked by the I/O subsystem (never by the pool) when an
/// operation using a pooled context completes.
pub type CompletionHandler = Arc<dyn Fn(&mut IoContext) + Send + Sync>;

/// An opaque, non-owning reference to a platform socket.
///
/// The pool never dereferences or closes the handle; it only clears a
/// context's handle field on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketHandle(u64);

impl SocketHandle {
    /// Wraps a raw platform identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw platform identifier.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

#[cfg(unix)]
impl From<RawFd> for SocketHandle {
    fn from(fd: RawFd) -> Self {
        Self(fd as u64)
    }
}

/// A reusable bundle of one buffer slice plus transient per-operation socket
/// metadata.
///
/// A context is handed to exactly one in-flight operation at a time: the pool
/// moves it out on [`acquire`](crate::ContextPool::acquire) and takes it back
/// on [`release`](crate::ContextPool::release), so the holder has exclusive
/// access to every field. The buffer slice and completion binding are fixed
/// for the context's lifetime; the public fields are transient and cleared on
/// every release.
pub struct IoContext {
    /// Fixed arena slice; offset and length never change after creation.
    buffer: BufferSlice,
    /// Bound once, never reassigned afterwards.
    completion: Option<CompletionHandler>,
    /// Socket the current operation runs on. Cleared on release.
    pub socket: Option<SocketHandle>,
    /// Remote endpoint of the current operation. Cleared on release.
    pub peer: Option<SocketAddr>,
    /// Opaque caller payload. Dropped on release.
    pub token: Option<Box<dyn Any + Send>>,
    /// Whether to reuse the underlying socket on disconnect. Reset to `true`
    /// on release.
    pub reuse_socket: bool,
}

impl IoContext {
    pub(crate) fn new(buffer: BufferSlice, completion: Option<CompletionHandler>) -> Self {
        Self {
            buffer,
            completion,
            socket: None,
            peer: None,
            token: None,
            reuse_socket: true,
        }
    }

    /// Returns the context's fixed buffer slice.
    #[inline]
    pub fn buffer(&self) -> &BufferSlice {
        &self.buffer
    }

    /// Returns mutable access to the context's fixed buffer slice.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut BufferSlice {
        &mut self.buffer
    }

    /// Returns the bound completion handler, if any.
    #[inline]
    pub fn completion(&self) -> Option<&CompletionHandler> {
        self.completion.as_ref()
    }

    /// Binds a completion handler to a context created without one.
    ///
    /// The binding is one-time: returns `true` on success, or `false` (leaving
    /// the existing binding untouched) if a handler is already bound.
    pub fn bind_completion(&mut self, handler: CompletionHandler) -> bool {
        if self.completion.is_some() {
            return false;
        }
        self.completion = Some(handler);
        true
    }

    /// Clears all transient state ahead of the next borrower. The buffer and
    /// completion binding are left untouched.
    pub(crate) fn reset(&mut self) {
        self.socket = None;
        self.peer = None;
        self.token = None;
        self.reuse_socket = true;
    }
}

impl std::fmt::Debug for IoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoContext")
            .field("buffer", &self.buffer)
            .field("bound", &self.completion.is_some())
            .field("socket", &self.socket)
            .field("peer", &self.peer)
            .field("has_token", &self.token.is_some())
            .field("reuse_socket", &self.reuse_socket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BufferArena;

    fn test_context() -> IoContext {
        let mut arena = BufferArena::new(1, 64);
        IoContext::new(arena.take_slice(64).unwrap(), None)
    }

    #[test]
    fn test_new_context_defaults() {
        let context = test_context();
        assert!(context.socket.is_none());
        assert!(context.peer.is_none());
        assert!(context.token.is_none());
        assert!(context.reuse_socket);
        assert!(context.completion().is_none());
        assert_eq!(context.buffer().len(), 64);
    }

    #[test]
    fn test_reset_clears_transients_only() {
        let mut context = test_context();
        let ptr = context.buffer().as_ptr();

        context.socket = Some(SocketHandle::new(7));
        context.peer = Some("127.0.0.1:8080".parse().unwrap());
        context.token = Some(Box::new(42u32));
        context.reuse_socket = false;
        context.buffer_mut().as_mut()[0] = 0xAB;

        context.reset();
        assert!(context.socket.is_none());
        assert!(context.peer.is_none());
        assert!(context.token.is_none());
        assert!(context.reuse_socket);

        // The buffer window (and its content) is untouched by reset.
        assert_eq!(context.buffer().as_ptr(), ptr);
        assert_eq!(context.buffer().as_ref()[0], 0xAB);
    }

    #[test]
    fn test_bind_completion_is_one_time() {
        let mut context = test_context();

        let first: CompletionHandler = Arc::new(|ctx| ctx.reuse_socket = false);
        assert!(context.bind_completion(first.clone()));

        // Second bind fails and leaves the first handler in place.
        let second: CompletionHandler = Arc::new(|_| {});
        assert!(!context.bind_completion(second));
        let bound = context.completion().unwrap().clone();
        assert!(Arc::ptr_eq(&bound, &first));

        // Reset never clears the binding.
        context.reset();
        assert!(context.completion().is_some());
    }

    #[test]
    fn test_bound_at_construction_rejects_rebind() {
        let mut arena = BufferArena::new(1, 16);
        let handler: CompletionHandler = Arc::new(|_| {});
        let mut context = IoContext::new(arena.take_slice(16).unwrap(), Some(handler.clone()));

        assert!(!context.bind_completion(Arc::new(|_| {})));
        assert!(Arc::ptr_eq(context.completion().unwrap(), &handler));
    }

    #[cfg(unix)]
    #[test]
    fn test_socket_handle_from_raw_fd() {
        let handle = SocketHandle::from(5 as RawFd);
        assert_eq!(handle.raw(), 5);
    }
}
