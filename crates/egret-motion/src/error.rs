//! 运动层错误类型定义

use egret_actuator::ActuatorError;
use thiserror::Error;

/// 运动层统一错误类型
#[derive(Error, Debug)]
pub enum MotionError {
    /// 轨迹段至少需要两个关键点
    #[error("A profile needs at least two keypoints")]
    NotEnoughKeypoints,

    /// 关键点时间必须严格递增
    #[error("Keypoint times must be strictly increasing (offending index: {index})")]
    NonMonotonicKeypoints { index: usize },

    /// 插值段退化（数值上无法求解边界条件）
    #[error("Degenerate interpolation segment at index {index}")]
    DegenerateSegment { index: usize },

    /// 混合的两条轨迹控制的执行器集合不一致
    #[error("Actuator sets differ between blended trajectories")]
    ActuatorSetMismatch,

    /// 混合的两条轨迹采样频率不一致
    #[error("Sample frequencies differ: {left} Hz vs {right} Hz")]
    FrequencyMismatch { left: f64, right: f64 },

    /// 跟随器已经播完，应当发起新动作而不是改目标
    #[error("Follower is idle, start a new motion instead of retargeting")]
    FollowerIdle,

    /// 录制文件损坏或格式不符
    #[error("Recording file corrupt: {0}")]
    CorruptRecording(String),

    /// 录制文件序列化失败
    #[error("Recording serialization failed: {0}")]
    Serialization(String),

    /// 文件 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 执行器层错误（越界、总线故障）
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
}
