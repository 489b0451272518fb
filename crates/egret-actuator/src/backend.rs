//! 单电机能力接口
//!
//! [`MotorBackend`] 是执行器与具体硬件之间的唯一接缝。
//! 本仓库恰好提供两个实现：
//! - [`GateMotor`](crate::gate_motor::GateMotor)：经由总线 gate 的真实电机
//! - [`SimMotor`](crate::sim::SimMotor)：进程内仿真电机
//!
//! 在执行器构造时二选一；其余代码不做任何运行时类型判断。
//! 两个实现使用完全一致的单位（电机原生坐标系度数、摄氏度）
//! 和边界语义，上层因此对后端无感。

use crate::error::ActuatorError;

/// 电机后端契约（电机原生坐标系）
///
/// 所有方法都必须可与后台跟随循环并发调用。
pub trait MotorBackend: Send + Sync {
    /// 上电后的一次性准备（如使能位置控制模式），默认无操作
    fn setup(&self) -> Result<(), ActuatorError> {
        Ok(())
    }

    /// 当前目标角度（度）
    fn goal_position(&self) -> Result<f64, ActuatorError>;

    /// 写入目标角度（度）
    fn set_goal_position(&self, degrees: f64) -> Result<(), ActuatorError>;

    /// 当前实际角度（度）
    fn present_position(&self) -> Result<f64, ActuatorError>;

    /// 是否处于失力状态
    fn compliant(&self) -> Result<bool, ActuatorError>;

    /// 设置失力状态（true = 掉电，可自由转动）
    fn set_compliant(&self, compliant: bool) -> Result<(), ActuatorError>;

    /// 电机温度（°C）
    fn temperature(&self) -> Result<f64, ActuatorError>;

    /// 力矩上限（%）
    fn torque_limit(&self) -> Result<f64, ActuatorError>;

    /// 设置力矩上限（%）
    fn set_torque_limit(&self, percent: f64) -> Result<(), ActuatorError>;

    /// 最大转速（度/秒）
    fn moving_speed(&self) -> Result<f64, ActuatorError>;

    /// 设置最大转速（度/秒）
    fn set_moving_speed(&self, deg_per_sec: f64) -> Result<(), ActuatorError>;
}
