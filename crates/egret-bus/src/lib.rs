//! # Egret 总线网关层
//!
//! 执行器总线的发现与连接缓存抽象，提供：
//! - [`GateLink`]：外部传输层的最小契约（按名发现外设 + 原始寄存器读写）
//! - [`BusGateway`]：按 gate 名缓存共享连接的注册表（同名 gate 至多一条连接）
//! - 类型化的模块句柄（电机 / Orbita 盘 / 风扇 / 相机占位）
//!
//! # 分层位置
//!
//! 本 crate 不实现物理传输本身：真实硬件的 [`GateLink`] 实现（串口、
//! 网关固件协议）由外部提供，仿真后端则在进程内实现同一契约。
//! 上层执行器代码只依赖这里的句柄类型，因此对后端保持无感。
//!
//! # 缓存语义
//!
//! `with_gate(name)` 首次调用打开连接并缓存，后续调用返回同一个
//! `Arc` 实例；`close_all_cached_gates()` 关闭并清空全部缓存，
//! 之后的查找会重新打开连接。打开/关闭同名 gate 互斥，
//! 不同名 gate 互不阻塞。

pub mod error;
pub mod gateway;
pub mod link;
pub mod modules;

pub use error::BusError;
pub use gateway::{BusGateway, Gate};
pub use link::{GateLink, GateOpener, ModuleInfo, ModuleKind, RegValue, Register};
pub use modules::{FanModule, ModuleHandle, MotorModule};
