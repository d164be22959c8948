//! Blocking entry point for the async runs.

use once_cell::sync::Lazy;
use tokio::runtime::{Builder, Runtime};

// Built once; the CLI drives every run through it.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    Builder::new_multi_thread()
        .thread_name("resepi-rt")
        .enable_all()
        .build()
        .expect("tokio runtime")
});

/// Drive `future` to completion from synchronous code.
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}
