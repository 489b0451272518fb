//! # Egret SDK
//!
//! 驱动 Egret 机器人身体（双臂、Orbita 颈部、末端夹爪）的统一入口，
//! 聚合各层 crate 并提供日志初始化与只读静态配置解析：
//!
//! | 层 | crate | 职责 |
//! |----|-------|------|
//! | 几何 | `egret-kinematics` | DH 链正/逆运动学 |
//! | 总线 | `egret-bus` | gate 发现与连接缓存 |
//! | 执行器 | `egret-actuator` | 关节/Orbita 抽象、温度保护 |
//! | 运动 | `egret-motion` | 插值、混合、跟随、录制回放 |
//!
//! # 快速上手
//!
//! ```ignore
//! use egret_sdk::prelude::*;
//!
//! egret_sdk::init_logging();
//!
//! let gateway = BusGateway::new(opener);
//! let gate = gateway.with_gate("r_right_arm")?;
//! let elbow: Arc<dyn Actuator> = Arc::new(JointActuator::new(
//!     "right_arm.elbow_pitch",
//!     Arc::new(GateMotor::new(gate.find_dxl(12)?)),
//!     config.joint("right_arm", "elbow_pitch")?,
//! ));
//!
//! let follower = goto(&elbow, 45.0, 2.0, GotoOptions::minimum_jerk())?;
//! follower.wait();
//! ```

pub use egret_actuator as actuator;
pub use egret_bus as bus;
pub use egret_kinematics as kinematics;
pub use egret_motion as motion;

pub mod config;
pub mod logging;

pub use config::{ConfigError, RobotConfig};
pub use logging::init_logging;

/// 常用类型一揽子导入
pub mod prelude {
    pub use crate::config::RobotConfig;
    pub use egret_actuator::{
        Actuator, ActuatorError, FanControl, GateMotor, JointActuator, JointConfig,
        MotorBackend, OrbitaActuator, OrbitaGeometry, SimMotor, ThermalConfig, ThermalGuard,
    };
    pub use egret_bus::{BusError, BusGateway, Gate, GateLink, GateOpener};
    pub use egret_kinematics::{Chain, IkSolution, Link};
    pub use egret_motion::{
        ActuatorTrajectory, Follower, GotoOptions, InterpolationMode, Keypoint, MotionError,
        PlayerOptions, Profile, RecorderOptions, Recording, TrajectoryPlayer,
        TrajectoryRecorder, cubic_smooth, goto, goto_many, orbita_goto, orbita_orient,
        orbita_point_at,
    };
    pub use std::sync::Arc;
}
