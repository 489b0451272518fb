//! 类型化模块句柄
//!
//! 对 [`GateLink`] 上的裸寄存器访问做一层薄封装，上层代码
//! 拿到的是带类型的句柄而不是字符串 + 寄存器枚举。

use crate::error::BusError;
use crate::link::{GateLink, ModuleKind, RegValue, Register};
use std::sync::Arc;

/// 通用模块句柄
///
/// 持有所属链路的引用计数；gate 连接被网关关闭后，
/// 后续读写会得到 [`BusError::LinkClosed`]。
#[derive(Clone)]
pub struct ModuleHandle {
    gate: String,
    name: String,
    kind: ModuleKind,
    link: Arc<dyn GateLink>,
}

impl ModuleHandle {
    pub(crate) fn new(
        gate: String,
        name: String,
        kind: ModuleKind,
        link: Arc<dyn GateLink>,
    ) -> Self {
        Self {
            gate,
            name,
            kind,
            link,
        }
    }

    /// 模块名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 所在 gate 名
    pub fn gate(&self) -> &str {
        &self.gate
    }

    /// 模块类型
    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// 读浮点寄存器
    pub fn read_f64(&self, register: Register) -> Result<f64, BusError> {
        self.link
            .read(&self.name, register)?
            .as_f64()
            .ok_or(BusError::InvalidValue {
                module: self.name.clone(),
                register,
            })
    }

    /// 读布尔寄存器
    pub fn read_bool(&self, register: Register) -> Result<bool, BusError> {
        self.link
            .read(&self.name, register)?
            .as_bool()
            .ok_or(BusError::InvalidValue {
                module: self.name.clone(),
                register,
            })
    }

    /// 写浮点寄存器
    pub fn write_f64(&self, register: Register, value: f64) -> Result<(), BusError> {
        self.link.write(&self.name, register, RegValue::Float(value))
    }

    /// 写布尔寄存器
    pub fn write_bool(&self, register: Register, value: bool) -> Result<(), BusError> {
        self.link.write(&self.name, register, RegValue::Bool(value))
    }
}

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("gate", &self.gate)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// 电机模块句柄（dxl 舵机或 Orbita 盘）
///
/// 角度均为电机原生坐标系下的度数；
/// 本地坐标系换算（零点偏移、方向翻转）在执行器层完成。
#[derive(Clone, Debug)]
pub struct MotorModule(ModuleHandle);

impl MotorModule {
    pub(crate) fn new(handle: ModuleHandle) -> Self {
        Self(handle)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn goal_position(&self) -> Result<f64, BusError> {
        self.0.read_f64(Register::GoalPosition)
    }

    pub fn set_goal_position(&self, degrees: f64) -> Result<(), BusError> {
        self.0.write_f64(Register::GoalPosition, degrees)
    }

    pub fn present_position(&self) -> Result<f64, BusError> {
        self.0.read_f64(Register::PresentPosition)
    }

    pub fn compliant(&self) -> Result<bool, BusError> {
        self.0.read_bool(Register::Compliant)
    }

    pub fn set_compliant(&self, compliant: bool) -> Result<(), BusError> {
        self.0.write_bool(Register::Compliant, compliant)
    }

    pub fn temperature(&self) -> Result<f64, BusError> {
        self.0.read_f64(Register::Temperature)
    }

    pub fn torque_limit(&self) -> Result<f64, BusError> {
        self.0.read_f64(Register::TorqueLimit)
    }

    pub fn set_torque_limit(&self, percent: f64) -> Result<(), BusError> {
        self.0.write_f64(Register::TorqueLimit, percent)
    }

    pub fn moving_speed(&self) -> Result<f64, BusError> {
        self.0.read_f64(Register::MovingSpeed)
    }

    pub fn set_moving_speed(&self, deg_per_sec: f64) -> Result<(), BusError> {
        self.0.write_f64(Register::MovingSpeed, deg_per_sec)
    }

    /// 使能位置控制模式（Orbita 盘上电后的 setup 步骤）
    pub fn enable_position_mode(&self) -> Result<(), BusError> {
        self.0.write_bool(Register::PositionMode, true)
    }
}

/// 风扇模块句柄
#[derive(Clone, Debug)]
pub struct FanModule(ModuleHandle);

impl FanModule {
    pub(crate) fn new(handle: ModuleHandle) -> Self {
        Self(handle)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn is_on(&self) -> Result<bool, BusError> {
        self.0.read_bool(Register::FanState)
    }

    pub fn on(&self) -> Result<(), BusError> {
        self.0.write_bool(Register::FanState, true)
    }

    pub fn off(&self) -> Result<(), BusError> {
        self.0.write_bool(Register::FanState, false)
    }
}
