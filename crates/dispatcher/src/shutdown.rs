use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

/// 关闭信号管理器
///
/// 调度循环订阅广播信号，任意克隆上触发一次关闭即可让所有
/// 订阅者退出。重复触发是无操作；关闭之后再订阅会立即收到信号。
#[derive(Clone)]
pub struct ShutdownManager {
    tx: broadcast::Sender<()>,
    is_shutdown: Arc<AtomicBool>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            is_shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 订阅关闭信号
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        let rx = self.tx.subscribe();
        // 已经关闭过：补发一条让新订阅者立即退出（老订阅者多收一条无妨）
        if self.is_shutdown.load(Ordering::SeqCst) {
            let _ = self.tx.send(());
        }
        rx
    }

    /// 触发关闭
    pub fn shutdown(&self) {
        if self.is_shutdown.swap(true, Ordering::SeqCst) {
            debug!("已经触发过关闭");
            return;
        }
        info!("发送关闭信号给 {} 个订阅者", self.tx.receiver_count());
        let _ = self.tx.send(());
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
