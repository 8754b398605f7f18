//! Bridges the synchronous `impl_registry!` factory signature to the
//! adapters' async connection constructors.
//!
//! Provider resolution happens once at startup, off the hot path, so
//! blocking the calling thread for the duration of a connection handshake
//! is an acceptable trade. Requires a multi-threaded Tokio runtime, since
//! `block_in_place` panics on a current-thread one.

pub(crate) fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
