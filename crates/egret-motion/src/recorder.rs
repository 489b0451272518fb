//! 轨迹录制器
//!
//! 在后台工作线程按固定频率采样一组执行器的位置（可选目标寄存器
//! 或实际寄存器）与失力状态。`start()` 开始采集（重复调用是
//! no-op），`stop()` 停止并定稿 [`Recording`]，定稿后的记录不再
//! 变化。录制样本经 crossbeam 通道从工作线程流出，`stop()` 时
//! 一次性汇入记录。
//!
//! 手把手示教的常用形态：`turn_compliant_on_start` 先让执行器
//! 失力，录完 `turn_stiff_on_stop` 再重新上力。

use crate::trajectory::ActuatorTrajectory;
use crossbeam_channel::{Receiver, Sender};
use egret_actuator::Actuator;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// 录制哪个位置寄存器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// 实际位置（缺省；示教录制用）
    PresentPosition,
    /// 目标位置（复刻指令流的特殊场景）
    GoalPosition,
}

/// 录制选项
#[derive(Debug, Clone, Copy)]
pub struct RecorderOptions {
    /// 采样频率（Hz）
    pub frequency: f64,
    /// 位置来源寄存器
    pub source: RecordSource,
    /// 开始录制前把执行器置为失力（手把手示教）
    pub turn_compliant_on_start: bool,
    /// 停止录制后重新上力
    pub turn_stiff_on_stop: bool,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            frequency: 100.0,
            source: RecordSource::PresentPosition,
            turn_compliant_on_start: false,
            turn_stiff_on_stop: false,
        }
    }
}

/// 单个录制样本
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordedSample {
    /// 距录制开始的时间（秒）
    pub t: f64,
    /// 位置（本地度数）
    pub position: f64,
    /// 采样时刻的失力状态
    pub compliant: bool,
}

/// 定稿的录制结果
///
/// 录制进行中只增长，`stop()` 之后不再变化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// 采样频率（Hz）
    pub frequency: f64,
    /// 执行器全名 → 样本序列
    pub samples: BTreeMap<String, Vec<RecordedSample>>,
}

impl Recording {
    pub fn empty(frequency: f64) -> Self {
        Self {
            frequency,
            samples: BTreeMap::new(),
        }
    }

    /// 最长样本序列的长度
    pub fn len(&self) -> usize {
        self.samples.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 录制时长（秒）
    pub fn duration(&self) -> f64 {
        self.samples
            .values()
            .filter_map(|s| s.last())
            .map(|sample| sample.t)
            .fold(0.0, f64::max)
    }

    /// 抽出纯位置流，供播放器回放
    pub fn to_trajectory(&self) -> ActuatorTrajectory {
        let mut trajectory = ActuatorTrajectory::new(self.frequency);
        for (name, samples) in &self.samples {
            trajectory.insert(
                name.clone(),
                samples.iter().map(|sample| sample.position).collect(),
            );
        }
        trajectory
    }
}

/// 一拍的采样行（按执行器顺序；读失败的执行器留空）
struct Row {
    t: f64,
    values: Vec<Option<(f64, bool)>>,
}

struct RecorderShared {
    actuators: Vec<Arc<dyn Actuator>>,
    options: RecorderOptions,
    stop: AtomicBool,
}

impl RecorderShared {
    fn run(&self, tx: Sender<Row>) {
        let anchor = Instant::now();
        let mut tick: u64 = 0;

        while !self.stop.load(Ordering::Acquire) {
            let t = tick as f64 / self.options.frequency;
            let values = self
                .actuators
                .iter()
                .map(|actuator| {
                    let position = match self.options.source {
                        RecordSource::PresentPosition => actuator.present_position(),
                        RecordSource::GoalPosition => actuator.goal_position(),
                    };
                    match (position, actuator.compliant()) {
                        (Ok(position), Ok(compliant)) => Some((position, compliant)),
                        (Err(err), _) | (_, Err(err)) => {
                            warn!(
                                actuator = actuator.name(),
                                %err,
                                "sample read failed, dropping sample"
                            );
                            None
                        }
                    }
                })
                .collect();

            if tx.send(Row { t, values }).is_err() {
                // 接收端没了（录制器被丢弃），没有继续采样的意义
                break;
            }

            tick += 1;
            let due = anchor + Duration::from_secs_f64(tick as f64 / self.options.frequency);
            let now = Instant::now();
            if due > now {
                spin_sleep::sleep(due - now);
            }
        }
        trace!("recorder worker exited");
    }
}

/// 多执行器轨迹录制器
///
/// 同一个录制器可以反复使用：每次 `start()` 都开启一段全新的
/// 录制，上一段的定稿结果被替换。
pub struct TrajectoryRecorder {
    shared: Arc<RecorderShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    rx: Mutex<Option<Receiver<Row>>>,
    recording: AtomicBool,
    finalized: Mutex<Recording>,
}

impl TrajectoryRecorder {
    pub fn new(actuators: Vec<Arc<dyn Actuator>>, options: RecorderOptions) -> Self {
        let frequency = options.frequency;
        Self {
            shared: Arc::new(RecorderShared {
                actuators,
                options,
                stop: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
            rx: Mutex::new(None),
            recording: AtomicBool::new(false),
            finalized: Mutex::new(Recording::empty(frequency)),
        }
    }

    /// 开始采集；已在录制时为 no-op
    pub fn start(&self) {
        if self.recording.swap(true, Ordering::AcqRel) {
            debug!("recorder already running, start ignored");
            return;
        }
        self.shared.stop.store(false, Ordering::Release);

        if self.shared.options.turn_compliant_on_start {
            for actuator in &self.shared.actuators {
                if let Err(err) = actuator.set_compliant(true) {
                    warn!(actuator = actuator.name(), %err, "failed to turn compliant");
                }
            }
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        *self.rx.lock() = Some(rx);

        debug!(
            actuators = self.shared.actuators.len(),
            frequency = self.shared.options.frequency,
            "recording started"
        );

        let shared = self.shared.clone();
        let worker = std::thread::Builder::new()
            .name("trajectory-recorder".to_string())
            .spawn(move || shared.run(tx))
            .expect("failed to spawn recorder worker");
        *self.worker.lock() = Some(worker);
    }

    /// 是否正在录制
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    /// 停止采集并定稿
    ///
    /// 未在录制时直接返回当前定稿结果。
    pub fn stop(&self) -> Recording {
        if !self.recording.load(Ordering::Acquire) {
            return self.finalized.lock().clone();
        }

        self.shared.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }

        let mut recording = Recording::empty(self.shared.options.frequency);
        for actuator in &self.shared.actuators {
            recording
                .samples
                .insert(actuator.name().to_string(), Vec::new());
        }

        if let Some(rx) = self.rx.lock().take() {
            for row in rx.try_iter() {
                for (actuator, value) in self.shared.actuators.iter().zip(row.values) {
                    if let Some((position, compliant)) = value {
                        recording
                            .samples
                            .entry(actuator.name().to_string())
                            .or_default()
                            .push(RecordedSample {
                                t: row.t,
                                position,
                                compliant,
                            });
                    }
                }
            }
        }

        if self.shared.options.turn_stiff_on_stop {
            for actuator in &self.shared.actuators {
                if let Err(err) = actuator.set_compliant(false) {
                    warn!(actuator = actuator.name(), %err, "failed to turn stiff");
                }
            }
        }

        debug!(
            samples = recording.len(),
            duration = recording.duration(),
            "recording finalized"
        );

        *self.finalized.lock() = recording.clone();
        self.recording.store(false, Ordering::Release);
        recording
    }

    /// 最近一次定稿的录制结果
    pub fn trajectories(&self) -> Recording {
        self.finalized.lock().clone()
    }
}

impl Drop for TrajectoryRecorder {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}
