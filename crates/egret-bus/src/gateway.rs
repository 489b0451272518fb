//! gate 连接网关与共享缓存
//!
//! [`BusGateway`] 是实例持有的连接注册表：按 gate 名缓存打开的
//! [`Gate`]，保证同名 gate 在任意时刻至多一条硬件连接。
//! 打开/关闭某个 gate 名互斥（两级锁，逐名加锁），
//! 打开 "left_arm" 不会阻塞 "head" 的查找。

use crate::error::BusError;
use crate::link::{GateLink, GateOpener, ModuleInfo, ModuleKind};
use crate::modules::{FanModule, ModuleHandle, MotorModule};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Orbita 三个盘在 gate 上的固定模块名（底 / 中 / 顶）
pub const ORBITA_DISK_NAMES: [&str; 3] = ["disk_bottom", "disk_middle", "disk_top"];

/// 一条已打开并被缓存的 gate 连接
///
/// 通过 [`BusGateway::with_gate`] 获取；同名 gate 的两次获取
/// 返回同一个 `Arc<Gate>` 实例（可用 `Arc::ptr_eq` 验证）。
pub struct Gate {
    name: String,
    link: Arc<dyn GateLink>,
}

impl Gate {
    /// gate 名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 底层链路
    pub fn link(&self) -> &Arc<dyn GateLink> {
        &self.link
    }

    fn module_info(&self, module: &str) -> Result<ModuleInfo, BusError> {
        self.link
            .modules()
            .into_iter()
            .find(|m| m.name == module)
            .ok_or_else(|| BusError::ModuleNotFound {
                module: module.to_string(),
                gate: self.name.clone(),
            })
    }

    /// 按名查找任意模块
    pub fn find_module(&self, module: &str) -> Result<ModuleHandle, BusError> {
        let info = self.module_info(module)?;
        Ok(ModuleHandle::new(
            self.name.clone(),
            info.name,
            info.kind,
            self.link.clone(),
        ))
    }

    /// 按名查找指定类型的模块
    fn find_typed(&self, module: &str, expected: ModuleKind) -> Result<ModuleHandle, BusError> {
        let handle = self.find_module(module)?;
        if handle.kind() != expected {
            return Err(BusError::WrongModuleKind {
                module: module.to_string(),
                expected,
                found: handle.kind(),
            });
        }
        Ok(handle)
    }

    /// 按 id 查找 dynamixel 电机（模块名约定为 `dxl_{id}`）
    pub fn find_dxl(&self, id: u8) -> Result<MotorModule, BusError> {
        let module = format!("dxl_{id}");
        Ok(MotorModule::new(
            self.find_typed(&module, ModuleKind::DxlMotor)?,
        ))
    }

    /// 按名查找风扇
    pub fn find_fan(&self, name: &str) -> Result<FanModule, BusError> {
        Ok(FanModule::new(self.find_typed(name, ModuleKind::Fan)?))
    }

    /// 查找 Orbita 的三个盘控制模块（底、中、顶）
    pub fn find_orbita_disks(&self) -> Result<[MotorModule; 3], BusError> {
        let find = |name: &str| -> Result<MotorModule, BusError> {
            Ok(MotorModule::new(
                self.find_typed(name, ModuleKind::OrbitaDisk)?,
            ))
        };
        Ok([
            find(ORBITA_DISK_NAMES[0])?,
            find(ORBITA_DISK_NAMES[1])?,
            find(ORBITA_DISK_NAMES[2])?,
        ])
    }

    /// 按名查找相机（仅返回占位句柄，图像采集在本仓库之外）
    pub fn find_camera(&self, name: &str) -> Result<ModuleHandle, BusError> {
        self.find_typed(name, ModuleKind::Camera)
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate").field("name", &self.name).finish()
    }
}

/// 逐名互斥的缓存槽
#[derive(Default)]
struct GateSlot {
    cell: Mutex<Option<Arc<Gate>>>,
}

/// gate 连接网关
///
/// 持有 gate 连接缓存与打开策略。不变式：同一 gate 名任意时刻
/// 至多一条打开的连接；缓存为网关实例所有，不是进程级单例。
///
/// # Example
///
/// ```ignore
/// let gateway = BusGateway::new(opener);
/// let arm = gateway.with_gate("r_right_arm")?;
/// let shoulder = arm.find_dxl(10)?;
/// ```
pub struct BusGateway {
    opener: Arc<dyn GateOpener>,
    gates: Mutex<HashMap<String, Arc<GateSlot>>>,
}

impl BusGateway {
    /// 用给定的打开策略创建网关
    pub fn new(opener: Arc<dyn GateOpener>) -> Self {
        Self {
            opener,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// 获取指定 gate 的缓存连接，必要时打开
    ///
    /// 首次请求打开连接并缓存；后续对同名 gate 的请求返回同一实例。
    /// 两个线程并发请求同一个名字时只会打开一条连接。
    pub fn with_gate(&self, name: &str) -> Result<Arc<Gate>, BusError> {
        // 第一级锁只用于取/建槽位，持有时间极短
        let slot = {
            let mut gates = self.gates.lock();
            gates
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(GateSlot::default()))
                .clone()
        };

        // 第二级锁按名互斥：同名并发打开只进行一次
        let mut cell = slot.cell.lock();
        if let Some(gate) = cell.as_ref() {
            trace!(gate = name, "gate cache hit");
            return Ok(gate.clone());
        }

        info!(gate = name, "opening gate connection");
        let link = self.opener.open(name)?;
        let gate = Arc::new(Gate {
            name: name.to_string(),
            link,
        });
        *cell = Some(gate.clone());
        Ok(gate)
    }

    /// 当前已缓存的 gate 名列表
    pub fn cached_gates(&self) -> Vec<String> {
        let gates = self.gates.lock();
        gates
            .iter()
            .filter(|(_, slot)| slot.cell.lock().is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// 关闭并清空全部缓存连接
    ///
    /// 之后对任意 gate 的查找会重新打开连接。可在关停时调用，
    /// 也可用于强制重新发现硬件。
    pub fn close_all_cached_gates(&self) {
        let slots: Vec<(String, Arc<GateSlot>)> = {
            let mut gates = self.gates.lock();
            gates.drain().collect()
        };

        for (name, slot) in slots {
            if let Some(gate) = slot.cell.lock().take() {
                gate.link.close();
                info!(gate = %name, "gate connection closed");
            }
        }
    }

    fn for_each_cached<T>(
        &self,
        mut find: impl FnMut(&Gate) -> Result<T, BusError>,
    ) -> Option<T> {
        let slots: Vec<Arc<GateSlot>> = {
            let gates = self.gates.lock();
            gates.values().cloned().collect()
        };

        for slot in slots {
            let gate = slot.cell.lock().clone();
            if let Some(gate) = gate {
                match find(&gate) {
                    Ok(found) => return Some(found),
                    Err(err) => debug!(gate = gate.name(), %err, "module lookup miss"),
                }
            }
        }
        None
    }

    /// 在所有已缓存的 gate 上按名查找模块
    pub fn find_module(&self, module: &str) -> Result<ModuleHandle, BusError> {
        self.for_each_cached(|gate| gate.find_module(module))
            .ok_or_else(|| BusError::ModuleNotFound {
                module: module.to_string(),
                gate: "*".to_string(),
            })
    }

    /// 在所有已缓存的 gate 上按 id 查找 dynamixel 电机
    pub fn find_dxl(&self, id: u8) -> Result<MotorModule, BusError> {
        self.for_each_cached(|gate| gate.find_dxl(id))
            .ok_or_else(|| BusError::ModuleNotFound {
                module: format!("dxl_{id}"),
                gate: "*".to_string(),
            })
    }

    /// 在所有已缓存的 gate 上按名查找风扇
    pub fn find_fan(&self, name: &str) -> Result<FanModule, BusError> {
        self.for_each_cached(|gate| gate.find_fan(name))
            .ok_or_else(|| BusError::ModuleNotFound {
                module: name.to_string(),
                gate: "*".to_string(),
            })
    }

    /// 在所有已缓存的 gate 上查找一组完整的 Orbita 盘
    pub fn find_orbita_disks(&self) -> Result<[MotorModule; 3], BusError> {
        self.for_each_cached(|gate| gate.find_orbita_disks())
            .ok_or_else(|| BusError::ModuleNotFound {
                module: ORBITA_DISK_NAMES.join("/"),
                gate: "*".to_string(),
            })
    }

    /// 在所有已缓存的 gate 上按名查找相机
    pub fn find_camera(&self, name: &str) -> Result<ModuleHandle, BusError> {
        self.for_each_cached(|gate| gate.find_camera(name))
            .ok_or_else(|| BusError::ModuleNotFound {
                module: name.to_string(),
                gate: "*".to_string(),
            })
    }
}

impl Drop for BusGateway {
    fn drop(&mut self) {
        self.close_all_cached_gates();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{RegValue, Register};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    /// 测试用内存链路：固定模块表，寄存器读写记录在原子量里
    struct MockLink {
        gate: String,
        modules: Vec<ModuleInfo>,
        closed: AtomicBool,
    }

    impl MockLink {
        fn new(gate: &str, modules: Vec<(&str, ModuleKind)>) -> Self {
            Self {
                gate: gate.to_string(),
                modules: modules
                    .into_iter()
                    .map(|(name, kind)| ModuleInfo {
                        name: name.to_string(),
                        kind,
                    })
                    .collect(),
                closed: AtomicBool::new(false),
            }
        }
    }

    impl GateLink for MockLink {
        fn gate_name(&self) -> &str {
            &self.gate
        }

        fn modules(&self) -> Vec<ModuleInfo> {
            self.modules.clone()
        }

        fn read(&self, _module: &str, _register: Register) -> Result<RegValue, BusError> {
            if self.closed.load(Ordering::Acquire) {
                return Err(BusError::LinkClosed);
            }
            Ok(RegValue::Float(0.0))
        }

        fn write(&self, _module: &str, _register: Register, _value: RegValue) -> Result<(), BusError> {
            if self.closed.load(Ordering::Acquire) {
                return Err(BusError::LinkClosed);
            }
            Ok(())
        }

        fn close(&self) {
            self.closed.store(true, Ordering::Release);
        }
    }

    struct MockOpener {
        open_count: AtomicUsize,
    }

    impl MockOpener {
        fn new() -> Self {
            Self {
                open_count: AtomicUsize::new(0),
            }
        }
    }

    impl GateOpener for MockOpener {
        fn open(&self, gate_name: &str) -> Result<Arc<dyn GateLink>, BusError> {
            if gate_name == "missing" {
                return Err(BusError::GateNotFound {
                    gate: gate_name.to_string(),
                });
            }
            self.open_count.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockLink::new(
                gate_name,
                vec![
                    ("dxl_10", ModuleKind::DxlMotor),
                    ("dxl_11", ModuleKind::DxlMotor),
                    ("fan_shoulder", ModuleKind::Fan),
                    ("camera_left", ModuleKind::Camera),
                    ("disk_bottom", ModuleKind::OrbitaDisk),
                    ("disk_middle", ModuleKind::OrbitaDisk),
                    ("disk_top", ModuleKind::OrbitaDisk),
                ],
            )))
        }
    }

    #[test]
    fn test_with_gate_caches_same_instance() {
        let opener = Arc::new(MockOpener::new());
        let gateway = BusGateway::new(opener.clone());

        let a = gateway.with_gate("left_arm").unwrap();
        let b = gateway.with_gate("left_arm").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(opener.open_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_all_forces_reopen() {
        let opener = Arc::new(MockOpener::new());
        let gateway = BusGateway::new(opener.clone());

        let a = gateway.with_gate("head").unwrap();
        gateway.close_all_cached_gates();
        assert!(gateway.cached_gates().is_empty());

        let b = gateway.with_gate("head").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(opener.open_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_closed_link_rejects_io() {
        let opener = Arc::new(MockOpener::new());
        let gateway = BusGateway::new(opener);

        let gate = gateway.with_gate("head").unwrap();
        let motor = gate.find_dxl(10).unwrap();
        gateway.close_all_cached_gates();

        assert!(matches!(
            motor.present_position(),
            Err(BusError::LinkClosed)
        ));
    }

    #[test]
    fn test_concurrent_with_gate_opens_once() {
        let opener = Arc::new(MockOpener::new());
        let gateway = Arc::new(BusGateway::new(opener.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gateway = gateway.clone();
                thread::spawn(move || gateway.with_gate("right_arm").unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(opener.open_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_gate_not_found() {
        let gateway = BusGateway::new(Arc::new(MockOpener::new()));
        assert!(matches!(
            gateway.with_gate("missing"),
            Err(BusError::GateNotFound { .. })
        ));
    }

    #[test]
    fn test_find_module_and_kind_check() {
        let gateway = BusGateway::new(Arc::new(MockOpener::new()));
        let gate = gateway.with_gate("left_arm").unwrap();

        assert!(gate.find_module("dxl_10").is_ok());
        assert!(matches!(
            gate.find_module("dxl_99"),
            Err(BusError::ModuleNotFound { .. })
        ));
        // 模块存在但类型不符
        assert!(matches!(
            gate.find_fan("dxl_10"),
            Err(BusError::WrongModuleKind { .. })
        ));
    }

    #[test]
    fn test_find_orbita_disks_order() {
        let gateway = BusGateway::new(Arc::new(MockOpener::new()));
        let gate = gateway.with_gate("head").unwrap();

        let disks = gate.find_orbita_disks().unwrap();
        assert_eq!(disks[0].name(), "disk_bottom");
        assert_eq!(disks[1].name(), "disk_middle");
        assert_eq!(disks[2].name(), "disk_top");
    }

    #[test]
    fn test_gateway_wide_lookup_searches_cached_gates() {
        let gateway = BusGateway::new(Arc::new(MockOpener::new()));

        // 未缓存任何 gate 时找不到
        assert!(matches!(
            gateway.find_dxl(10),
            Err(BusError::ModuleNotFound { .. })
        ));

        gateway.with_gate("left_arm").unwrap();
        assert!(gateway.find_dxl(10).is_ok());
        assert!(gateway.find_fan("fan_shoulder").is_ok());
        assert!(gateway.find_orbita_disks().is_ok());
        assert!(gateway.find_camera("camera_left").is_ok());
        assert!(matches!(
            gateway.find_camera("camera_right"),
            Err(BusError::ModuleNotFound { .. })
        ));
    }
}
