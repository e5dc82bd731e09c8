//! Deferred continuations and local task spawning.
//!
//! The grid is single-threaded. `next_tick` is a pure scheduling seam: it
//! yields once to the platform queue so a freeze overlay can paint before
//! the synchronous re-render runs. Nothing here is parallel.

use std::future::Future;
#[cfg(not(target_arch = "wasm32"))]
use std::pin::Pin;
#[cfg(not(target_arch = "wasm32"))]
use std::task::{Context, Poll};

/// Milliseconds from a monotonic-enough clock, for debounce and timings.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    if let Some(window) = web_sys::window() {
        if let Some(perf) = window.performance() {
            return perf.now();
        }
    }
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}

/// Yield once to the event loop.
#[cfg(target_arch = "wasm32")]
pub async fn next_tick() {
    let mut cb = |resolve: js_sys::Function, _reject: js_sys::Function| {
        let scheduled = web_sys::window().map(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0)
        });
        if !matches!(scheduled, Some(Ok(_))) {
            let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
        }
    };
    let promise = js_sys::Promise::new(&mut cb);
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Yield once to the executor.
#[cfg(not(target_arch = "wasm32"))]
pub fn next_tick() -> impl Future<Output = ()> {
    YieldNow { yielded: false }
}

#[cfg(not(target_arch = "wasm32"))]
struct YieldNow {
    yielded: bool,
}

#[cfg(not(target_arch = "wasm32"))]
impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Spawns fire-and-forget tasks on the local executor.
///
/// On wasm this is the browser microtask queue. Natively tasks go to a
/// `LocalPool` that the owner drives with [`TaskSpawner::run_until_stalled`].
#[derive(Clone)]
pub struct TaskSpawner {
    #[cfg(not(target_arch = "wasm32"))]
    pool: std::rc::Rc<std::cell::RefCell<futures::executor::LocalPool>>,
    #[cfg(not(target_arch = "wasm32"))]
    spawner: futures::executor::LocalSpawner,
}

impl Default for TaskSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSpawner {
    #[cfg(target_arch = "wasm32")]
    pub fn new() -> Self {
        Self {}
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> Self {
        let pool = futures::executor::LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: std::rc::Rc::new(std::cell::RefCell::new(pool)),
            spawner,
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        wasm_bindgen_futures::spawn_local(task);
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        use futures::task::LocalSpawnExt;
        if let Err(e) = self.spawner.spawn_local(task) {
            log::warn!("failed to spawn grid task: {e}");
        }
    }

    /// Run every spawned task until none can make progress.
    ///
    /// Must not be called from inside another executor.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run_until_stalled(&self) {
        match self.pool.try_borrow_mut() {
            Ok(mut pool) => pool.run_until_stalled(),
            Err(_) => log::debug!("task pool already running"),
        }
    }
}
