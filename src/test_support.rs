//! Test-only helpers shared across `#[cfg(test)]` modules.

#![cfg(test)]

use std::future::Future;

/// Drives `fut` to completion on the current thread.
pub(crate) fn block_on<F: Future>(fut: F) -> F::Output {
    embassy_futures::block_on(fut)
}
