//! 单关节执行器
//!
//! 对单电机后端做本地坐标换算与边界约束，并提供可选的
//! **静差修正**：dynamixel 控制器在负载下可能出现「出力却到不了
//! 目标位置」的静差，开启修正后，每次目标写入都会安排一次延迟
//! 检查，如果届时位置误差仍超过阈值，就发出一次（且仅一次）
//! 半误差幅度的纠正微动，避免反复修正引起振荡。

use crate::actuator::Actuator;
use crate::backend::MotorBackend;
use crate::error::ActuatorError;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// 单关节执行器配置（来自只读静态配置）
#[derive(Debug, Clone)]
pub struct JointConfig {
    /// 零点偏移（度）
    pub offset: f64,
    /// 方向：true = 正装（direct），false = 反装（角度取反）
    pub direct: bool,
    /// 本地坐标系角度边界（度）
    pub bounds: (f64, f64),
}

impl Default for JointConfig {
    fn default() -> Self {
        Self {
            offset: 0.0,
            direct: true,
            bounds: (-180.0, 180.0),
        }
    }
}

/// 静差修正参数
#[derive(Debug, Clone, Copy)]
pub struct StaticFixConfig {
    /// 目标写入后到检查的延迟
    pub delay: Duration,
    /// 触发修正的最小误差（度）
    pub threshold: f64,
}

impl Default for StaticFixConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            threshold: 2.0,
        }
    }
}

/// 静差修正工作线程的共享状态
struct FixShared {
    backend: Arc<dyn MotorBackend>,
    name: String,
    offset: f64,
    direct: bool,
    config: StaticFixConfig,
    /// 下一次检查的时间点；新的目标写入会覆盖（即取消上一次）
    deadline: Mutex<Option<Instant>>,
    cv: Condvar,
    stop: AtomicBool,
}

impl FixShared {
    fn as_local(&self, motor: f64) -> f64 {
        (if self.direct { motor } else { -motor }) - self.offset
    }

    fn to_motor(&self, local: f64) -> f64 {
        (local + self.offset) * if self.direct { 1.0 } else { -1.0 }
    }

    /// 到期检查：误差超阈值则发出一次半幅纠正
    fn check_and_fix(&self) {
        let (present, goal) = match (self.backend.present_position(), self.backend.goal_position())
        {
            (Ok(p), Ok(g)) => (self.as_local(p), self.as_local(g)),
            (Err(err), _) | (_, Err(err)) => {
                warn!(actuator = %self.name, %err, "static error check failed");
                return;
            }
        };

        let error = present - goal;
        if error.abs() > self.config.threshold {
            let fixed = goal + error / 2.0;
            info!(
                actuator = %self.name,
                goal_position = goal,
                present_position = present,
                fixed_goal_position = fixed,
                "static error correction applied"
            );
            if let Err(err) = self.backend.set_goal_position(self.to_motor(fixed)) {
                warn!(actuator = %self.name, %err, "static error correction write failed");
            }
        }
    }

    fn run(&self) {
        loop {
            let mut deadline = self.deadline.lock();
            if self.stop.load(Ordering::Acquire) {
                break;
            }
            match *deadline {
                None => {
                    self.cv.wait(&mut deadline);
                }
                Some(at) => {
                    if Instant::now() < at {
                        let _ = self.cv.wait_until(&mut deadline, at);
                    } else {
                        // 取出后释放锁再做总线 IO
                        *deadline = None;
                        drop(deadline);
                        self.check_and_fix();
                    }
                }
            }
        }
        trace!(actuator = %self.name, "static fix worker exited");
    }
}

struct FixWorker {
    shared: Arc<FixShared>,
    thread: Option<JoinHandle<()>>,
}

impl FixWorker {
    fn spawn(shared: Arc<FixShared>) -> Self {
        let worker_shared = shared.clone();
        let thread = std::thread::Builder::new()
            .name(format!("static-fix-{}", shared.name))
            .spawn(move || worker_shared.run())
            .expect("failed to spawn static fix worker");
        Self {
            shared,
            thread: Some(thread),
        }
    }

    fn schedule(&self) {
        let mut deadline = self.shared.deadline.lock();
        *deadline = Some(Instant::now() + self.shared.config.delay);
        self.shared.cv.notify_all();
    }

    fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.cv.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for FixWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 单关节执行器
///
/// 对外暴露本地坐标系角度（已含零点偏移和方向换算），
/// 对后端写入电机原生角度。所有读写可与跟随循环并发。
pub struct JointActuator {
    name: String,
    backend: Arc<dyn MotorBackend>,
    config: JointConfig,
    static_fix: Mutex<Option<FixWorker>>,
}

impl JointActuator {
    pub fn new(name: impl Into<String>, backend: Arc<dyn MotorBackend>, config: JointConfig) -> Self {
        Self {
            name: name.into(),
            backend,
            config,
            static_fix: Mutex::new(None),
        }
    }

    /// 零点偏移（度）
    pub fn offset(&self) -> f64 {
        self.config.offset
    }

    /// 是否正装
    pub fn is_direct(&self) -> bool {
        self.config.direct
    }

    /// 开关静差修正（默认参数：1s 延迟，2° 阈值）
    pub fn use_static_error_fix(&self, activate: bool) {
        self.use_static_error_fix_with(activate, StaticFixConfig::default());
    }

    /// 开关静差修正并指定参数
    pub fn use_static_error_fix_with(&self, activate: bool, config: StaticFixConfig) {
        let mut slot = self.static_fix.lock();
        if activate {
            if slot.is_none() {
                let shared = Arc::new(FixShared {
                    backend: self.backend.clone(),
                    name: self.name.clone(),
                    offset: self.config.offset,
                    direct: self.config.direct,
                    config,
                    deadline: Mutex::new(None),
                    cv: Condvar::new(),
                    stop: AtomicBool::new(false),
                });
                *slot = Some(FixWorker::spawn(shared));
            }
        } else if let Some(mut worker) = slot.take() {
            worker.stop();
        }
    }

    fn as_local(&self, motor: f64) -> f64 {
        (if self.config.direct { motor } else { -motor }) - self.config.offset
    }

    fn to_motor(&self, local: f64) -> f64 {
        (local + self.config.offset) * if self.config.direct { 1.0 } else { -1.0 }
    }

    fn write_goal(&self, degrees: f64) -> Result<(), ActuatorError> {
        // 失力状态下电机掉电，目标写入无意义
        if self.backend.compliant()? {
            debug!(actuator = %self.name, "goal write ignored, actuator is compliant");
            return Ok(());
        }

        self.backend.set_goal_position(self.to_motor(degrees))?;

        if let Some(worker) = self.static_fix.lock().as_ref() {
            worker.schedule();
        }
        Ok(())
    }
}

impl Actuator for JointActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> (f64, f64) {
        self.config.bounds
    }

    fn goal_position(&self) -> Result<f64, ActuatorError> {
        Ok(self.as_local(self.backend.goal_position()?))
    }

    fn set_goal_position(&self, degrees: f64) -> Result<(), ActuatorError> {
        let (lower, upper) = self.config.bounds;
        if degrees < lower || degrees > upper {
            return Err(ActuatorError::OutOfBounds {
                actuator: self.name.clone(),
                value: degrees,
                lower,
                upper,
            });
        }
        self.write_goal(degrees)
    }

    fn set_goal_position_clamped(&self, degrees: f64) -> Result<(), ActuatorError> {
        let (lower, upper) = self.config.bounds;
        let clamped = degrees.clamp(lower, upper);
        if clamped != degrees {
            warn!(
                actuator = %self.name,
                requested = degrees,
                clamped,
                "goal position clamped to bounds"
            );
        }
        self.write_goal(clamped)
    }

    fn present_position(&self) -> Result<f64, ActuatorError> {
        Ok(self.as_local(self.backend.present_position()?))
    }

    fn compliant(&self) -> Result<bool, ActuatorError> {
        self.backend.compliant()
    }

    fn set_compliant(&self, compliant: bool) -> Result<(), ActuatorError> {
        self.backend.set_compliant(compliant)
    }

    fn temperature(&self) -> Result<f64, ActuatorError> {
        self.backend.temperature()
    }

    fn torque_limit(&self) -> Result<f64, ActuatorError> {
        self.backend.torque_limit()
    }

    fn set_torque_limit(&self, percent: f64) -> Result<(), ActuatorError> {
        self.backend.set_torque_limit(percent)
    }

    fn moving_speed(&self) -> Result<f64, ActuatorError> {
        self.backend.moving_speed()
    }

    fn set_moving_speed(&self, deg_per_sec: f64) -> Result<(), ActuatorError> {
        self.backend.set_moving_speed(deg_per_sec)
    }
}

impl std::fmt::Debug for JointActuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JointActuator")
            .field("name", &self.name)
            .field("offset", &self.config.offset)
            .field("direct", &self.config.direct)
            .finish()
    }
}
