//! Shared tokio runtime for blocking command entry points.

use once_cell::sync::Lazy;
use tokio::runtime::Runtime;

static POOL: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Run a future to completion on the shared runtime.
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    POOL.block_on(future)
}
