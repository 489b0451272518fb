//! 执行器层错误类型定义

use egret_bus::BusError;
use thiserror::Error;

/// 执行器层统一错误类型
#[derive(Error, Debug)]
pub enum ActuatorError {
    /// 目标角度超出标定边界
    ///
    /// 请求被拒绝，不会静默越界。跟随循环使用钳制写入路径，
    /// 不会触发该错误。
    #[error("Goal position {value:.2} deg out of bounds [{lower:.2}, {upper:.2}] for \"{actuator}\"")]
    OutOfBounds {
        actuator: String,
        value: f64,
        lower: f64,
        upper: f64,
    },

    /// 底层总线错误（模块缺失、链路断开等）
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
}
