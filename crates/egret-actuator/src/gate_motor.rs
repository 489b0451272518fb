//! 总线后端电机
//!
//! 把 [`MotorBackend`] 的每个寄存器操作转发到 gate 上的电机模块。
//! 链路故障以 [`ActuatorError::Bus`] 立即上抛，对应执行器在重连前
//! 不可用。

use crate::backend::MotorBackend;
use crate::error::ActuatorError;
use egret_bus::MotorModule;

/// 经由总线 gate 的真实电机后端
///
/// 由 `gateway.with_gate(..)?.find_dxl(..)` 或 `find_orbita_disks()`
/// 得到的模块句柄构造。句柄持有 gate 链路的引用计数，
/// 网关关闭链路后所有操作返回链路关闭错误。
pub struct GateMotor {
    module: MotorModule,
}

impl GateMotor {
    pub fn new(module: MotorModule) -> Self {
        Self { module }
    }

    /// 底层模块名（如 "dxl_10"）
    pub fn module_name(&self) -> &str {
        self.module.name()
    }
}

impl MotorBackend for GateMotor {
    fn setup(&self) -> Result<(), ActuatorError> {
        self.module.enable_position_mode()?;
        Ok(())
    }

    fn goal_position(&self) -> Result<f64, ActuatorError> {
        Ok(self.module.goal_position()?)
    }

    fn set_goal_position(&self, degrees: f64) -> Result<(), ActuatorError> {
        Ok(self.module.set_goal_position(degrees)?)
    }

    fn present_position(&self) -> Result<f64, ActuatorError> {
        Ok(self.module.present_position()?)
    }

    fn compliant(&self) -> Result<bool, ActuatorError> {
        Ok(self.module.compliant()?)
    }

    fn set_compliant(&self, compliant: bool) -> Result<(), ActuatorError> {
        Ok(self.module.set_compliant(compliant)?)
    }

    fn temperature(&self) -> Result<f64, ActuatorError> {
        Ok(self.module.temperature()?)
    }

    fn torque_limit(&self) -> Result<f64, ActuatorError> {
        Ok(self.module.torque_limit()?)
    }

    fn set_torque_limit(&self, percent: f64) -> Result<(), ActuatorError> {
        Ok(self.module.set_torque_limit(percent)?)
    }

    fn moving_speed(&self) -> Result<f64, ActuatorError> {
        Ok(self.module.moving_speed()?)
    }

    fn set_moving_speed(&self, deg_per_sec: f64) -> Result<(), ActuatorError> {
        Ok(self.module.set_moving_speed(deg_per_sec)?)
    }
}
