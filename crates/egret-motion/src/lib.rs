//! # Egret 运动栈
//!
//! 把高层运动请求（「到位姿 P、用时 T」）变成连续、可打断、
//! 可录制回放的设定点流，包括：
//! - [`interpolation`]：关键点 → 位置轮廓（Linear / MinimumJerk）
//!   与惰性设定点流
//! - [`follower`]：单执行器跟随状态机（Idle ⇄ Playing），
//!   支持在途平滑接管
//! - [`mixer`]：在途流与替换流的 sigmoid 淡入混合（纯函数）
//! - [`goto`]：单执行器 / 多执行器 / Orbita 平台的运动入口
//! - [`player`]：多执行器锁步回放（带淡入）
//! - [`recorder`]：定频采样录制与定稿
//! - [`file`]：录制文件格式（magic + version + bincode）
//! - [`smooth`]：示教录制的三次样条平滑
//!
//! # 线程模型
//!
//! 每个后台活动（跟随、播放、录制）都是一个由 owner 持有的工作
//! 线程：显式停止信号、析构时 join。取消是协作式的，精度以一个
//! 采样周期为界。内部故障转成终止态并上报日志，绝不 panic 连坐
//! owner。

pub mod error;
pub mod file;
pub mod follower;
pub mod goto;
pub mod interpolation;
pub mod keypoint;
pub mod mixer;
pub mod player;
pub mod recorder;
pub mod smooth;
pub mod trajectory;

pub use error::MotionError;
pub use follower::Follower;
pub use goto::{GotoOptions, StartingPoint, goto, goto_many, orbita_goto, orbita_orient, orbita_point_at};
pub use interpolation::{InterpolationMode, Profile, SetpointStream};
pub use keypoint::Keypoint;
pub use mixer::{DEFAULT_SLOPE, blend, blend_trajectories, norm_sigmoid, sigmoid};
pub use player::{PlayerOptions, TrajectoryPlayer};
pub use recorder::{
    RecordSource, RecordedSample, RecorderOptions, Recording, TrajectoryRecorder,
};
pub use smooth::cubic_smooth;
pub use trajectory::ActuatorTrajectory;
