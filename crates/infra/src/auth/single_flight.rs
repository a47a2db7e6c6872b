//! Single-flight coalescing of concurrent async operations

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

type InFlight<T> = Shared<BoxFuture<'static, T>>;

/// At most one operation in progress; concurrent callers share its result
///
/// The slot is cleared once the operation settles, so the next call after
/// completion starts a fresh operation.
pub struct SingleFlight<T: Clone + Send + Sync + 'static> {
    slot: Arc<Mutex<Option<InFlight<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self { slot: Arc::new(Mutex::new(None)) }
    }

    /// Join the operation in progress, or start one with `make`
    pub async fn run<F, Fut>(&self, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = {
            let mut slot = self.slot.lock();
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let shared = make().boxed().shared();
                    *slot = Some(shared.clone());
                    shared
                }
            }
        };

        let result = shared.clone().await;

        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&shared)) {
            *slot = None;
        }

        result
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}
