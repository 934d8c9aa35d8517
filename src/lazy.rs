//! 惰性求值单元
//!
//! `Lazy` 是一个线程安全的"只计算一次"单元：第一次 `get` 执行工厂函数，
//! 之后的调用直接返回缓存结果。失败同样被缓存，工厂不会被再次调用。
//! 并发调用者在构建期间会阻塞等待，而不是重复构建。

use parking_lot::{Condvar, Mutex};

/// 单元的生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyState {
    /// 尚未尝试构建
    Unbuilt,
    /// 工厂正在某个线程上执行
    Building,
    /// 构建成功
    Built,
    /// 构建失败
    Failed,
}

enum Slot<T, E> {
    Unbuilt,
    Building,
    Ready(Result<T, E>),
}

/// 线程安全的只计算一次单元
pub struct Lazy<T, E> {
    slot: Mutex<Slot<T, E>>,
    ready: Condvar,
}

impl<T: Clone, E: Clone> Lazy<T, E> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Unbuilt),
            ready: Condvar::new(),
        }
    }

    /// 返回缓存结果，首次调用时执行 `factory`
    ///
    /// 同一时刻只有一个调用者执行工厂；其余调用者等待其完成后获得相同结果。
    /// 如果工厂 panic，单元回到 `Unbuilt`，等待者被唤醒，其中一个会重新尝试。
    pub fn get<F>(&self, factory: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        {
            let mut slot = self.slot.lock();
            loop {
                if let Slot::Ready(result) = &*slot {
                    return result.clone();
                }
                if matches!(*slot, Slot::Unbuilt) {
                    break;
                }
                self.ready.wait(&mut slot);
            }
            *slot = Slot::Building;
        }

        let reset = ResetOnUnwind { lazy: self };
        let result = factory();
        std::mem::forget(reset);

        let mut slot = self.slot.lock();
        *slot = Slot::Ready(result.clone());
        self.ready.notify_all();
        result
    }

    /// 不触发构建，仅在已完成时返回结果
    pub fn peek(&self) -> Option<Result<T, E>> {
        match &*self.slot.lock() {
            Slot::Ready(result) => Some(result.clone()),
            _ => None,
        }
    }
}

impl<T, E> Lazy<T, E> {
    pub fn state(&self) -> LazyState {
        match &*self.slot.lock() {
            Slot::Unbuilt => LazyState::Unbuilt,
            Slot::Building => LazyState::Building,
            Slot::Ready(Ok(_)) => LazyState::Built,
            Slot::Ready(Err(_)) => LazyState::Failed,
        }
    }
}

impl<T: Clone, E: Clone> Default for Lazy<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for Lazy<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy").field("state", &self.state()).finish()
    }
}

/// 工厂 panic 时把单元恢复为 `Unbuilt`
struct ResetOnUnwind<'a, T, E> {
    lazy: &'a Lazy<T, E>,
}

impl<T, E> Drop for ResetOnUnwind<'_, T, E> {
    fn drop(&mut self) {
        let mut slot = self.lazy.slot.lock();
        *slot = Slot::Unbuilt;
        self.lazy.ready.notify_all();
    }
}
