//! 集成测试共用的内存 gate 传输
//!
//! 实现 `GateLink`/`GateOpener` 契约的进程内替身：寄存器存在
//! HashMap 里，实际位置镜像目标位置，模块表按 gate 名给定。
//! 走这条链路的测试覆盖的是「总线后端」整条路径，与 SimMotor
//! 直连后端互为补充。

use egret_bus::{BusError, GateLink, GateOpener, ModuleInfo, ModuleKind, RegValue, Register};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub struct InMemoryGate {
    name: String,
    modules: Vec<ModuleInfo>,
    registers: RwLock<HashMap<(String, Register), RegValue>>,
    closed: AtomicBool,
}

impl InMemoryGate {
    pub fn new(name: &str, modules: Vec<(&str, ModuleKind)>) -> Self {
        Self {
            name: name.to_string(),
            modules: modules
                .into_iter()
                .map(|(module, kind)| ModuleInfo {
                    name: module.to_string(),
                    kind,
                })
                .collect(),
            registers: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), BusError> {
        if self.closed.load(Ordering::Acquire) {
            Err(BusError::LinkClosed)
        } else {
            Ok(())
        }
    }

    fn known_module(&self, module: &str) -> Result<(), BusError> {
        if self.modules.iter().any(|m| m.name == module) {
            Ok(())
        } else {
            Err(BusError::ModuleNotFound {
                module: module.to_string(),
                gate: self.name.clone(),
            })
        }
    }
}

impl GateLink for InMemoryGate {
    fn gate_name(&self) -> &str {
        &self.name
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        self.modules.clone()
    }

    fn read(&self, module: &str, register: Register) -> Result<RegValue, BusError> {
        self.ensure_open()?;
        self.known_module(module)?;

        let registers = self.registers.read();
        let stored = registers.get(&(module.to_string(), register)).copied();

        Ok(match register {
            // 实际位置镜像目标位置（理想到位的替身模型）
            Register::PresentPosition => stored
                .or_else(|| {
                    registers
                        .get(&(module.to_string(), Register::GoalPosition))
                        .copied()
                })
                .unwrap_or(RegValue::Float(0.0)),
            Register::Compliant | Register::FanState | Register::PositionMode => {
                stored.unwrap_or(RegValue::Bool(false))
            }
            Register::Temperature => stored.unwrap_or(RegValue::Float(25.0)),
            Register::TorqueLimit => stored.unwrap_or(RegValue::Float(100.0)),
            _ => stored.unwrap_or(RegValue::Float(0.0)),
        })
    }

    fn write(&self, module: &str, register: Register, value: RegValue) -> Result<(), BusError> {
        self.ensure_open()?;
        self.known_module(module)?;
        self.registers
            .write()
            .insert((module.to_string(), register), value);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// 按 gate 名开内存链路；记录打开次数供缓存断言
pub struct InMemoryOpener {
    layouts: HashMap<String, Vec<(String, ModuleKind)>>,
    pub open_count: AtomicUsize,
}

impl InMemoryOpener {
    pub fn new(layouts: Vec<(&str, Vec<(&str, ModuleKind)>)>) -> Self {
        Self {
            layouts: layouts
                .into_iter()
                .map(|(gate, modules)| {
                    (
                        gate.to_string(),
                        modules
                            .into_iter()
                            .map(|(m, k)| (m.to_string(), k))
                            .collect(),
                    )
                })
                .collect(),
            open_count: AtomicUsize::new(0),
        }
    }

    /// Egret 上半身的典型布局：右臂 gate + 头部 gate
    pub fn upper_body() -> Self {
        Self::new(vec![
            (
                "r_right_arm",
                vec![
                    ("dxl_10", ModuleKind::DxlMotor),
                    ("dxl_12", ModuleKind::DxlMotor),
                    ("fan_shoulder", ModuleKind::Fan),
                ],
            ),
            (
                "r_head",
                vec![
                    ("disk_bottom", ModuleKind::OrbitaDisk),
                    ("disk_middle", ModuleKind::OrbitaDisk),
                    ("disk_top", ModuleKind::OrbitaDisk),
                    ("dxl_30", ModuleKind::DxlMotor),
                ],
            ),
        ])
    }
}

impl GateOpener for InMemoryOpener {
    fn open(&self, gate_name: &str) -> Result<Arc<dyn GateLink>, BusError> {
        let Some(modules) = self.layouts.get(gate_name) else {
            return Err(BusError::GateNotFound {
                gate: gate_name.to_string(),
            });
        };
        self.open_count.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryGate::new(
            gate_name,
            modules
                .iter()
                .map(|(m, k)| (m.as_str(), *k))
                .collect(),
        )))
    }
}
