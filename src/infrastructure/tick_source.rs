//! 节拍源 - 基础设施层
//!
//! 持有周期性回调这一稀缺资源，只暴露"租用一个每秒节拍"的能力。
//! 租约（`TickLease`）释放或被丢弃时，对应的回调随之取消。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// 计时器身份
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// 整场作答的总计时
    Overall,
    /// 某道语音题的准备倒计时
    VoicePrep(String),
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerId::Overall => f.write_str("overall"),
            TimerId::VoicePrep(question_id) => write!(f, "voice-prep:{}", question_id),
        }
    }
}

/// 租约编号，同一节拍源内唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeaseId(u64);

/// 一次节拍
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub timer: TimerId,
    pub lease: LeaseId,
}

/// 节拍租约
///
/// 谁启动计时器谁持有租约；`release` 可重复调用，`Drop` 时自动释放
pub struct TickLease {
    id: LeaseId,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickLease {
    pub fn new(id: LeaseId, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> LeaseId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// 取消底层的周期回调
    pub fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TickLease {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for TickLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickLease")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// 节拍源
pub trait TickSource: Send + Sync {
    /// 为 `timer` 租用一个周期节拍
    fn acquire(&self, timer: TimerId) -> TickLease;
}

/// 基于 tokio interval 的节拍源
///
/// 每个租约对应一个后台任务，节拍通过 channel 送回会话事件循环。
/// 错过的节拍不补发（`MissedTickBehavior::Delay`），允许漂移。
pub struct TokioTickSource {
    period: Duration,
    sender: mpsc::UnboundedSender<Tick>,
    next_id: AtomicU64,
}

impl TokioTickSource {
    /// 创建节拍源，返回节拍接收端
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let source = Self {
            period,
            sender,
            next_id: AtomicU64::new(1),
        };
        (source, receiver)
    }
}

impl TickSource for TokioTickSource {
    fn acquire(&self, timer: TimerId) -> TickLease {
        let lease = LeaseId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let sender = self.sender.clone();
        let period = self.period;
        let label = timer.to_string();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let tick = Tick {
                    timer: timer.clone(),
                    lease,
                };
                if sender.send(tick).is_err() {
                    break;
                }
            }
        });

        debug!("⏱️ 租用节拍 {} ({:?})", label, lease);
        TickLease::new(lease, move || {
            handle.abort();
            debug!("⏹️ 释放节拍 {} ({:?})", label, lease);
        })
    }
}

#[derive(Debug, Default)]
struct VirtualInner {
    next_id: u64,
    live: BTreeMap<LeaseId, TimerId>,
    elapsed_seconds: u64,
}

/// 虚拟时钟，由调用方逐秒推进
///
/// 用于测试和脚本化驱动；可以检查还有多少租约没有释放
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    inner: Arc<Mutex<VirtualInner>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VirtualInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 推进一秒，返回此刻每个存活租约的节拍（按租用先后排序）
    pub fn advance(&self) -> Vec<Tick> {
        let mut inner = self.lock();
        inner.elapsed_seconds += 1;
        inner
            .live
            .iter()
            .map(|(lease, timer)| Tick {
                timer: timer.clone(),
                lease: *lease,
            })
            .collect()
    }

    pub fn live_leases(&self) -> usize {
        self.lock().live.len()
    }

    pub fn live_timers(&self) -> Vec<TimerId> {
        self.lock().live.values().cloned().collect()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.lock().elapsed_seconds
    }
}

impl TickSource for VirtualClock {
    fn acquire(&self, timer: TimerId) -> TickLease {
        let lease = {
            let mut inner = self.lock();
            inner.next_id += 1;
            let lease = LeaseId(inner.next_id);
            inner.live.insert(lease, timer);
            lease
        };

        let inner = Arc::clone(&self.inner);
        TickLease::new(lease, move || {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .live
                .remove(&lease);
        })
    }
}
