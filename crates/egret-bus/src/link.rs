//! 外部传输层契约
//!
//! [`GateLink`] 是总线传输的最小抽象：一条已打开的 gate 连接，
//! 提供按名发现外设和类型化寄存器的原始读写。物理串口/固件协议的
//! 实现在本仓库之外；进程内仿真后端实现同一契约。

use crate::error::BusError;
use std::sync::Arc;

/// 外设模块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// 单关节舵机（dynamixel 系）
    DxlMotor,
    /// Orbita 三盘执行器的单个盘
    OrbitaDisk,
    /// 散热风扇
    Fan,
    /// 相机（仅占位句柄，采集在本仓库之外）
    Camera,
    /// 其他模块（力传感器等）
    Generic,
}

/// 模块寄存器
///
/// 所有后端使用同一套寄存器语义：角度一律为电机原生坐标系下的度数，
/// 温度为摄氏度，力矩上限为百分比。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// 目标角度（度，电机原生坐标系）
    GoalPosition,
    /// 当前角度（度，电机原生坐标系）
    PresentPosition,
    /// 失力状态（true = 掉电可自由转动）
    Compliant,
    /// 温度（°C）
    Temperature,
    /// 力矩上限（%）
    TorqueLimit,
    /// 最大转速（度/秒）
    MovingSpeed,
    /// 位置控制模式使能（Orbita 盘 setup 用）
    PositionMode,
    /// 风扇开关
    FanState,
}

/// 寄存器值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegValue {
    Float(f64),
    Bool(bool),
}

impl RegValue {
    /// 按浮点解读寄存器值
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RegValue::Float(v) => Some(*v),
            RegValue::Bool(_) => None,
        }
    }

    /// 按布尔解读寄存器值
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RegValue::Bool(v) => Some(*v),
            RegValue::Float(_) => None,
        }
    }
}

/// gate 上一个模块的描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// 模块名（gate 内唯一，如 "dxl_10"、"disk_top"、"fan_shoulder"）
    pub name: String,
    /// 模块类型
    pub kind: ModuleKind,
}

/// 已打开的 gate 连接
///
/// 实现必须线程安全：上层的跟随循环、录制循环和温度巡检会并发读写
/// 同一条链路。关闭后的链路对任何读写返回 [`BusError::LinkClosed`]。
pub trait GateLink: Send + Sync {
    /// gate 名称（如 "r_right_arm"）
    fn gate_name(&self) -> &str;

    /// 枚举该 gate 上的全部模块
    fn modules(&self) -> Vec<ModuleInfo>;

    /// 读取模块寄存器
    fn read(&self, module: &str, register: Register) -> Result<RegValue, BusError>;

    /// 写入模块寄存器
    fn write(&self, module: &str, register: Register, value: RegValue) -> Result<(), BusError>;

    /// 关闭链路并释放底层资源（幂等）
    fn close(&self);
}

/// gate 连接的打开方式
///
/// 网关通过它打开尚未缓存的 gate。硬件环境下由外部传输层提供实现
/// （串口扫描 + 握手），测试与仿真环境注入进程内实现。
pub trait GateOpener: Send + Sync {
    /// 按名打开一条 gate 连接
    ///
    /// 找不到对应 gate 时返回 [`BusError::GateNotFound`]。
    fn open(&self, gate_name: &str) -> Result<Arc<dyn GateLink>, BusError>;
}
