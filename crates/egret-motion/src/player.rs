//! 轨迹播放器
//!
//! 把一条多执行器设定点流按采样频率整行推进：同一拍内写完所有
//! 执行器，再等到下一拍。播放在后台工作线程进行，`play()` 不阻塞，
//! `wait_for_end()` 阻塞到所有流耗尽。
//!
//! 播放从不假设执行器恰好停在流的起点：开播前先用最小加加速度
//! 轮廓把每个执行器从当前位置淡入到各自流的首样本，避免录制
//! 回放从半途启动时的位置跳变。淡入同样发生在工作线程内，
//! 不会让 `play()` 变成阻塞调用。

use crate::error::MotionError;
use crate::interpolation::{InterpolationMode, Profile};
use crate::trajectory::ActuatorTrajectory;
use egret_actuator::Actuator;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// 播放选项
#[derive(Debug, Clone, Copy)]
pub struct PlayerOptions {
    /// 淡入时长（秒）：从当前位置平滑到流的首样本；0 关闭淡入
    pub fade_in_duration: f64,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            fade_in_duration: 0.5,
        }
    }
}

struct PlayerEntry {
    actuator: Arc<dyn Actuator>,
    samples: Vec<f64>,
}

struct PlayerShared {
    entries: Vec<PlayerEntry>,
    frequency: f64,
    stop: AtomicBool,
    playing: AtomicBool,
}

impl PlayerShared {
    /// 整行推进一组对齐的流；返回 false 表示被停止
    fn run_rows(&self, streams: &[Vec<f64>], anchor: Instant, tick_base: u64) -> (bool, u64) {
        let max_len = streams.iter().map(Vec::len).max().unwrap_or(0);
        let mut dead: Vec<bool> = vec![false; self.entries.len()];
        let mut tick = tick_base;

        for row in 0..max_len {
            if self.stop.load(Ordering::Acquire) {
                return (false, tick);
            }

            for (i, entry) in self.entries.iter().enumerate() {
                if dead[i] {
                    continue;
                }
                if let Some(&setpoint) = streams[i].get(row) {
                    if let Err(err) = entry.actuator.set_goal_position_clamped(setpoint) {
                        // 单个执行器故障不拖垮整场回放，停用它并继续
                        error!(
                            actuator = entry.actuator.name(),
                            %err,
                            "playback write failed, muting actuator"
                        );
                        dead[i] = true;
                    }
                }
            }

            tick += 1;
            let due = anchor + Duration::from_secs_f64(tick as f64 / self.frequency);
            let now = Instant::now();
            if due > now {
                spin_sleep::sleep(due - now);
            }
        }

        (true, tick)
    }

    fn run(&self, options: PlayerOptions) {
        #[cfg(feature = "realtime")]
        {
            use thread_priority::{ThreadPriority, set_current_thread_priority};
            if let Err(e) = set_current_thread_priority(ThreadPriority::Max) {
                warn!("Failed to set player thread priority: {:?}", e);
            }
        }

        let anchor = Instant::now();
        let mut tick = 0;

        // === 淡入阶段：当前位置 → 流首样本 ===
        if options.fade_in_duration > 0.0 {
            let mut fade_streams: Vec<Vec<f64>> = Vec::with_capacity(self.entries.len());
            for entry in &self.entries {
                let first = entry.samples.first().copied().unwrap_or(0.0);
                let current = match entry.actuator.present_position() {
                    Ok(position) => position,
                    Err(err) => {
                        warn!(
                            actuator = entry.actuator.name(),
                            %err,
                            "present position unavailable, skipping fade-in"
                        );
                        first
                    }
                };

                match Profile::point_to_point(
                    current,
                    first,
                    options.fade_in_duration,
                    InterpolationMode::MinimumJerk,
                ) {
                    Ok(profile) => fade_streams.push(profile.sample(self.frequency).collect()),
                    Err(err) => {
                        warn!(%err, "fade-in profile construction failed");
                        fade_streams.push(vec![first]);
                    }
                }
            }

            let (completed, next_tick) = self.run_rows(&fade_streams, anchor, tick);
            if !completed {
                self.playing.store(false, Ordering::Release);
                return;
            }
            tick = next_tick;
        }

        // === 正式回放：整行锁步推进 ===
        let streams: Vec<Vec<f64>> = self
            .entries
            .iter()
            .map(|entry| entry.samples.clone())
            .collect();
        self.run_rows(&streams, anchor, tick);

        trace!("playback finished");
        self.playing.store(false, Ordering::Release);
    }
}

/// 多执行器轨迹播放器
///
/// # Example
///
/// ```ignore
/// let player = TrajectoryPlayer::new(actuators, &recording.to_trajectory())?;
/// player.play(PlayerOptions::default());
/// player.wait_for_end();
/// ```
pub struct TrajectoryPlayer {
    shared: Arc<PlayerShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TrajectoryPlayer {
    /// 绑定执行器与设定点流
    ///
    /// 执行器集合必须与轨迹控制的执行器全名一一对应，
    /// 否则返回 [`MotionError::ActuatorSetMismatch`]。
    pub fn new(
        actuators: Vec<Arc<dyn Actuator>>,
        trajectory: &ActuatorTrajectory,
    ) -> Result<Self, MotionError> {
        if actuators.len() != trajectory.streams.len() {
            return Err(MotionError::ActuatorSetMismatch);
        }

        let mut entries = Vec::with_capacity(actuators.len());
        for actuator in actuators {
            let samples = trajectory
                .streams
                .get(actuator.name())
                .ok_or(MotionError::ActuatorSetMismatch)?
                .clone();
            entries.push(PlayerEntry { actuator, samples });
        }

        Ok(Self {
            shared: Arc::new(PlayerShared {
                entries,
                frequency: trajectory.frequency,
                stop: AtomicBool::new(false),
                playing: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
        })
    }

    /// 启动回放（非阻塞）
    ///
    /// 已经在播放时忽略并告警。一次播放结束后可以再次调用重放。
    pub fn play(&self, options: PlayerOptions) {
        if self.shared.playing.swap(true, Ordering::AcqRel) {
            warn!("player already playing, ignoring play request");
            return;
        }
        self.shared.stop.store(false, Ordering::Release);

        // 上一轮的句柄此时已经退出，先收掉
        if let Some(previous) = self.worker.lock().take() {
            let _ = previous.join();
        }

        debug!(
            actuators = self.shared.entries.len(),
            frequency = self.shared.frequency,
            fade_in = options.fade_in_duration,
            "starting playback"
        );

        let shared = self.shared.clone();
        let worker = std::thread::Builder::new()
            .name("trajectory-player".to_string())
            .spawn(move || shared.run(options))
            .expect("failed to spawn player worker");
        *self.worker.lock() = Some(worker);
    }

    /// 是否正在播放
    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }

    /// 阻塞等待所有流耗尽
    pub fn wait_for_end(&self) {
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
            return;
        }
        while self.is_playing() {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// 请求提前停止并等待工作线程退出
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
        self.wait_for_end();
    }
}

impl Drop for TrajectoryPlayer {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}
