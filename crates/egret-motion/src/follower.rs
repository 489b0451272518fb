//! 轨迹跟随器
//!
//! [`Follower`] 把一条位置轮廓按采样频率逐点写入执行器，
//! 状态机只有两态：`Idle → Playing`（start），`Playing → Idle`
//! （自然播完或 stop）。
//!
//! # 定时
//!
//! 工作线程使用绝对时间锚点：第 k 拍的应发时刻 = 锚点 + k/频率，
//! 消除逐拍累计漂移；亚毫秒睡眠用 spin_sleep。
//!
//! # 取消语义
//!
//! `stop()` 是协作式的：置停止标志，在下一个采样拍边界生效，
//! 调用返回时工作线程已经 join。因此 `stop()` 的精度以一个采样
//! 周期为界。
//!
//! # 在途接管
//!
//! [`Follower::retarget`] 从当前设定点出发构造替换轮廓，交给
//! 混合器与剩余流做 sigmoid 淡入合成，原子地替换余下的样本 ——
//! 换动作不会产生超过源流自然步长的位置跳变。

use crate::error::MotionError;
use crate::interpolation::{InterpolationMode, Profile};
use crate::mixer;
use egret_actuator::Actuator;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, trace};

/// 播放中的可变状态：样本序列 + 游标
///
/// retarget 会整体替换 `samples` 并把游标归零，工作线程每拍在
/// 同一把锁下取样，两者天然互斥。
struct PlayState {
    samples: Vec<f64>,
    cursor: usize,
}

struct FollowerShared {
    actuator: Arc<dyn Actuator>,
    frequency: f64,
    state: Mutex<PlayState>,
    stop: AtomicBool,
    playing: AtomicBool,
    faulted: AtomicBool,
}

impl FollowerShared {
    fn run(&self) {
        #[cfg(feature = "realtime")]
        {
            use thread_priority::{ThreadPriority, set_current_thread_priority};
            if let Err(e) = set_current_thread_priority(ThreadPriority::Max) {
                tracing::warn!("Failed to set follower thread priority: {:?}", e);
            }
        }

        let anchor = Instant::now();
        let mut tick: u64 = 0;

        loop {
            if self.stop.load(Ordering::Acquire) {
                trace!(actuator = self.actuator.name(), "follower stopped");
                break;
            }

            let setpoint = {
                let mut state = self.state.lock();
                if state.cursor >= state.samples.len() {
                    None
                } else {
                    let value = state.samples[state.cursor];
                    state.cursor += 1;
                    Some(value)
                }
            };

            let Some(setpoint) = setpoint else {
                trace!(actuator = self.actuator.name(), "follower completed");
                break;
            };

            if let Err(err) = self.actuator.set_goal_position_clamped(setpoint) {
                // 写入故障进入终止态：记录并停止，绝不拖垮 owner
                error!(
                    actuator = self.actuator.name(),
                    %err,
                    "follower write failed, entering faulted state"
                );
                self.faulted.store(true, Ordering::Release);
                break;
            }

            tick += 1;
            let due = anchor + Duration::from_secs_f64(tick as f64 / self.frequency);
            let now = Instant::now();
            if due > now {
                spin_sleep::sleep(due - now);
            }
        }

        // Release: 状态翻转对 is_playing()/wait() 的观察方可见
        self.playing.store(false, Ordering::Release);
    }
}

/// 单执行器轨迹跟随器
pub struct Follower {
    shared: Arc<FollowerShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Follower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Follower")
            .field("actuator", &self.shared.actuator.name())
            .field("frequency", &self.shared.frequency)
            .field("playing", &self.shared.playing.load(Ordering::Acquire))
            .finish()
    }
}

impl Follower {
    /// 开始跟随：采样轮廓并启动后台工作线程（Idle → Playing）
    ///
    /// # Panics
    ///
    /// `frequency` 不为正数时 panic（与 [`Profile::sample`] 一致）。
    pub fn start(actuator: Arc<dyn Actuator>, profile: &Profile, frequency: f64) -> Self {
        let samples: Vec<f64> = profile.sample(frequency).collect();

        let shared = Arc::new(FollowerShared {
            actuator,
            frequency,
            state: Mutex::new(PlayState { samples, cursor: 0 }),
            stop: AtomicBool::new(false),
            playing: AtomicBool::new(true),
            faulted: AtomicBool::new(false),
        });

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name(format!("follower-{}", shared.actuator.name()))
            .spawn(move || worker_shared.run())
            .expect("failed to spawn follower worker");

        Self {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// 是否仍在播放
    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }

    /// 工作线程是否因写入故障而终止
    pub fn faulted(&self) -> bool {
        self.shared.faulted.load(Ordering::Acquire)
    }

    /// 采样频率（Hz）
    pub fn frequency(&self) -> f64 {
        self.shared.frequency
    }

    /// 被驱动的执行器
    pub fn actuator(&self) -> &Arc<dyn Actuator> {
        &self.shared.actuator
    }

    /// 阻塞等待播放结束（Playing → Idle）
    pub fn wait(&self) {
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
            return;
        }
        // 句柄已被其他等待方取走：轮询状态位直到 Idle
        while self.is_playing() {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// 请求提前终止并等待工作线程退出
    ///
    /// 协作式取消：在下一个采样拍边界生效，返回时线程已 join。
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
        self.wait();
    }

    /// 在途接管：把余下的动作平滑替换为新目标
    ///
    /// 从当前设定点出发构造替换轮廓，与剩余流做 `fade_duration`
    /// 秒的 sigmoid 淡入合成。已经播完（Idle）时返回
    /// [`MotionError::FollowerIdle`]，调用方应发起新的 goto。
    pub fn retarget(
        &self,
        goal: f64,
        duration: f64,
        mode: InterpolationMode,
        fade_duration: f64,
    ) -> Result<(), MotionError> {
        if !self.is_playing() {
            return Err(MotionError::FollowerIdle);
        }

        let mut state = self.shared.state.lock();
        if state.cursor >= state.samples.len() {
            return Err(MotionError::FollowerIdle);
        }

        let remaining = &state.samples[state.cursor..];
        let current = remaining[0];

        let replacement = Profile::point_to_point(current, goal, duration, mode)?;
        let new_samples: Vec<f64> = replacement.sample(self.shared.frequency).collect();

        let fade_samples = ((fade_duration * self.shared.frequency).round() as usize)
            .min(new_samples.len());
        let merged = mixer::blend(remaining, &new_samples, fade_samples, mixer::DEFAULT_SLOPE);

        trace!(
            actuator = self.shared.actuator.name(),
            goal,
            fade_samples,
            "follower retargeted"
        );

        state.samples = merged;
        state.cursor = 0;
        Ok(())
    }
}

impl Drop for Follower {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}
