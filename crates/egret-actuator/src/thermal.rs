//! 温度保护巡检
//!
//! [`ThermalGuard`] 在后台线程按固定周期轮询受监护执行器的温度：
//! 超过上限时强制失力（保护性掉电）并标记为需要降温；读数回落到
//! `上限 − 滞回` 以下才解除标记。巡检独立于任何活动轨迹运行，
//! 失力对跟随循环的目标写入自然生效（失力状态下写入被忽略）。
//!
//! 降温期间的运动请求不会被静默丢弃：调用方通过
//! [`ThermalGuard::need_cooldown`] 查询或 [`ThermalGuard::wait_for_cooldown`]
//! 阻塞等待，自行决定何时恢复运动。解除标记后执行器保持失力，
//! 重新上力由调用方负责。

use crate::actuator::Actuator;
use crate::fan::FanControl;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// 温度保护参数
#[derive(Debug, Clone, Copy)]
pub struct ThermalConfig {
    /// 过热上限（°C）
    pub temperature_limit: f64,
    /// 滞回宽度（°C）：降到 `limit − hysteresis` 以下才算降温完成
    pub hysteresis: f64,
    /// 巡检周期
    pub poll_period: Duration,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            temperature_limit: 50.0,
            hysteresis: 5.0,
            poll_period: Duration::from_secs(1),
        }
    }
}

struct Watched {
    actuator: Arc<dyn Actuator>,
    fan: Option<Arc<dyn FanControl>>,
}

struct GuardShared {
    watched: Vec<Watched>,
    config: ThermalConfig,
    /// 当前处于过热状态的执行器名
    hot: Mutex<HashSet<String>>,
    cooled: Condvar,
    stop: AtomicBool,
}

impl GuardShared {
    fn poll_once(&self) {
        for entry in &self.watched {
            let name = entry.actuator.name().to_string();
            let temperature = match entry.actuator.temperature() {
                Ok(t) => t,
                Err(err) => {
                    warn!(actuator = %name, %err, "temperature read failed, skipping");
                    continue;
                }
            };

            let is_hot = self.hot.lock().contains(&name);

            if temperature > self.config.temperature_limit {
                if !is_hot {
                    warn!(
                        actuator = %name,
                        temperature,
                        limit = self.config.temperature_limit,
                        "actuator over temperature, forcing compliant"
                    );
                    self.hot.lock().insert(name.clone());
                    if let Some(fan) = &entry.fan {
                        if let Err(err) = fan.set_on(true) {
                            warn!(actuator = %name, %err, "failed to switch fan on");
                        }
                    }
                }

                // 过热期间持续强制失力：外部重新上力也会被压回去
                match entry.actuator.compliant() {
                    Ok(false) => {
                        if let Err(err) = entry.actuator.set_compliant(true) {
                            warn!(actuator = %name, %err, "failed to force compliance");
                        }
                    }
                    Ok(true) => {}
                    Err(err) => {
                        warn!(actuator = %name, %err, "compliance read failed");
                    }
                }
            } else if is_hot && temperature < self.config.temperature_limit - self.config.hysteresis
            {
                info!(actuator = %name, temperature, "actuator cooled down");
                if let Some(fan) = &entry.fan {
                    if let Err(err) = fan.set_on(false) {
                        warn!(actuator = %name, %err, "failed to switch fan off");
                    }
                }
                let mut hot = self.hot.lock();
                hot.remove(&name);
                if hot.is_empty() {
                    self.cooled.notify_all();
                }
            } else {
                trace!(actuator = %name, temperature, "temperature nominal");
            }
        }
    }

    fn run(&self) {
        debug!(
            actuators = self.watched.len(),
            limit = self.config.temperature_limit,
            "thermal guard started"
        );
        while !self.stop.load(Ordering::Acquire) {
            self.poll_once();
            spin_sleep::sleep(self.config.poll_period);
        }
        trace!("thermal guard worker exited");
    }
}

/// 温度保护巡检器
///
/// # Example
///
/// ```ignore
/// let guard = ThermalGuard::builder(ThermalConfig::default())
///     .watch(shoulder.clone())
///     .watch_with_fan(elbow.clone(), elbow_fan)
///     .start();
///
/// if guard.need_cooldown() {
///     guard.wait_for_cooldown();
/// }
/// ```
pub struct ThermalGuard {
    shared: Arc<GuardShared>,
    worker: Option<JoinHandle<()>>,
}

impl ThermalGuard {
    /// 创建构建器
    pub fn builder(config: ThermalConfig) -> ThermalGuardBuilder {
        ThermalGuardBuilder {
            config,
            watched: Vec::new(),
        }
    }

    /// 是否有执行器需要降温（非阻塞）
    pub fn need_cooldown(&self) -> bool {
        !self.shared.hot.lock().is_empty()
    }

    /// 当前过热的执行器名
    pub fn hot_actuators(&self) -> Vec<String> {
        self.shared.hot.lock().iter().cloned().collect()
    }

    /// 阻塞等待所有过热执行器降温完成
    ///
    /// 巡检被停止时同样返回，避免调用方永久阻塞。
    pub fn wait_for_cooldown(&self) {
        let mut hot = self.shared.hot.lock();
        while !hot.is_empty() && !self.shared.stop.load(Ordering::Acquire) {
            self.shared.cooled.wait(&mut hot);
        }
    }

    /// 停止巡检并 join 工作线程（幂等）
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        // 唤醒可能阻塞在 wait_for_cooldown 的调用方
        self.shared.cooled.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ThermalGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

/// [`ThermalGuard`] 构建器
pub struct ThermalGuardBuilder {
    config: ThermalConfig,
    watched: Vec<Watched>,
}

impl ThermalGuardBuilder {
    /// 监护一个执行器
    pub fn watch(mut self, actuator: Arc<dyn Actuator>) -> Self {
        self.watched.push(Watched {
            actuator,
            fan: None,
        });
        self
    }

    /// 监护一个执行器并配对风扇
    pub fn watch_with_fan(
        mut self,
        actuator: Arc<dyn Actuator>,
        fan: Arc<dyn FanControl>,
    ) -> Self {
        self.watched.push(Watched {
            actuator,
            fan: Some(fan),
        });
        self
    }

    /// 启动巡检工作线程
    pub fn start(self) -> ThermalGuard {
        let shared = Arc::new(GuardShared {
            watched: self.watched,
            config: self.config,
            hot: Mutex::new(HashSet::new()),
            cooled: Condvar::new(),
            stop: AtomicBool::new(false),
        });

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("thermal-guard".to_string())
            .spawn(move || worker_shared.run())
            .expect("failed to spawn thermal guard worker");

        ThermalGuard {
            shared,
            worker: Some(worker),
        }
    }
}
