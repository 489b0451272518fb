//! 总线层错误类型定义

use crate::link::{ModuleKind, Register};
use thiserror::Error;

/// 总线层统一错误类型
///
/// `GateNotFound` / `ModuleNotFound` 属于非致命错误：调用方可以
/// 选择降级（如跳过缺失的风扇）或中止当前操作。
/// `Connection` 则意味着对应外设在重连前不可用。
#[derive(Error, Debug)]
pub enum BusError {
    /// 指定名称的 gate 不存在或无法打开
    #[error("Gate \"{gate}\" not found")]
    GateNotFound { gate: String },

    /// 指定模块在 gate 上不存在
    #[error("Module \"{module}\" not found on gate \"{gate}\"")]
    ModuleNotFound { module: String, gate: String },

    /// 模块存在但类型不符（例如把风扇当电机用）
    #[error("Wrong module kind for \"{module}\": expected {expected:?}, found {found:?}")]
    WrongModuleKind {
        module: String,
        expected: ModuleKind,
        found: ModuleKind,
    },

    /// 寄存器返回了意料之外的值类型
    #[error("Unexpected value in register {register:?} of module \"{module}\"")]
    InvalidValue { module: String, register: Register },

    /// 底层链路不可达（串口断开、仿真链路关闭等）
    #[error("Connection failure: {0}")]
    Connection(String),

    /// 链路已被关闭，需要重新通过网关打开
    #[error("Gate link closed")]
    LinkClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BusError::GateNotFound {
            gate: "left_arm".into(),
        };
        assert_eq!(format!("{err}"), "Gate \"left_arm\" not found");

        let err = BusError::ModuleNotFound {
            module: "dxl_10".into(),
            gate: "right_arm".into(),
        };
        assert!(format!("{err}").contains("dxl_10"));
        assert!(format!("{err}").contains("right_arm"));

        let err = BusError::WrongModuleKind {
            module: "fan_shoulder".into(),
            expected: ModuleKind::DxlMotor,
            found: ModuleKind::Fan,
        };
        assert!(format!("{err}").contains("expected DxlMotor"));
    }
}
