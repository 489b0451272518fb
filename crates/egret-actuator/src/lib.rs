//! # Egret 执行器抽象层
//!
//! 本 crate 定义驱动 Egret 机器人身体的执行器模型，包括：
//! - [`MotorBackend`]：单电机能力接口，恰好两个实现 —— 总线后端
//!   [`GateMotor`] 与仿真后端 [`SimMotor`]，构造时二选一，
//!   其余代码对后端无感
//! - [`JointActuator`]：单关节执行器（本地/电机坐标换算、边界约束、
//!   静差修正）
//! - [`OrbitaActuator`]：三盘姿态平台（四元数 / 指向向量 → 三盘角度）
//! - [`ThermalGuard`]：温度巡检与保护性失力
//!
//! # 并发模型
//!
//! goal/present/compliant 等字段会被 API 调用方与后台工作线程
//! （轨迹跟随、录制、温度巡检）并发访问，所有访问都经过同步
//! （锁或 ArcSwap 快照）。每个后台工作线程都有显式停止信号，
//! 并在 owner 析构时 join，不存在游离线程。
//!
//! # 单位约定
//!
//! 对外角度一律为本地坐标系下的度数；温度为摄氏度；
//! 力矩上限为百分比；转速为度/秒。两个后端语义完全一致。

pub mod actuator;
pub mod backend;
pub mod error;
pub mod fan;
pub mod gate_motor;
pub mod joint;
pub mod orbita;
pub mod sim;
pub mod thermal;

pub use actuator::Actuator;
pub use backend::MotorBackend;
pub use error::ActuatorError;
pub use fan::{FanControl, GateFan, SimFan};
pub use gate_motor::GateMotor;
pub use joint::{JointActuator, JointConfig, StaticFixConfig};
pub use orbita::{OrbitaActuator, OrbitaDisk, OrbitaGeometry};
pub use sim::SimMotor;
pub use thermal::{ThermalConfig, ThermalGuard, ThermalGuardBuilder};
