//! Connection liveness probe supplied by the hosting HTTP layer.

use std::future::Future;

/// Reports whether the client on the other end of a stream is still
/// connected.
pub trait Liveness: Send + Sync {
    /// `true` while the client is connected. Polled once per iteration.
    fn is_alive(&self) -> bool;

    /// Resolves once the client has gone away.
    ///
    /// Lets the emitter wake early from its inter-event sleep. A probe
    /// that cannot signal this may return a future that never completes;
    /// [`is_alive`](Self::is_alive) still catches the disconnect on the
    /// next iteration.
    fn closed(&self) -> impl Future<Output = ()> + Send;
}
