//! Orbita 三盘姿态平台
//!
//! 平台由三个沿 z 轴堆叠的驱动盘带动，盘上的三条臂（彼此相隔 120°）
//! 共同决定平台姿态。本模块提供：
//! - [`OrbitaDisk`]：单个盘，实现通用执行器契约（录制、跟随、
//!   温度巡检直接复用）
//! - [`OrbitaGeometry`]：固定盘几何（臂方位、基座旋转、指向轴）
//! - [`OrbitaActuator`]：把目标姿态（四元数）或指向向量分解成
//!   三个盘的目标角度
//!
//! # 硬件零点
//!
//! 盘的编码器经由减速比 52/24 读取，上电读数对真实零点存在
//! 周期 `A = 360/(52/24)` 的多值性。装配标定给出每个盘的硬件零点
//! `z` 后，setup 在候选 `{z, -(A-z), A+z}` 中取距当前读数最近者，
//! 再加上固定的 60° 装配偏移。

use crate::actuator::Actuator;
use crate::backend::MotorBackend;
use crate::error::ActuatorError;
use nalgebra::{Unit, UnitQuaternion, Vector3};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// 编码器读数对真实零点的多值周期（度）：360 / (52/24)
const DISK_REDUCTION_PERIOD: f64 = 360.0 / (52.0 / 24.0);

/// 固定装配偏移（度）
const DISK_ASSEMBLY_SHIFT: f64 = 60.0;

/// 盘名（底、中、顶），与 gate 上的模块名保持一致
const DISK_NAMES: [&str; 3] = ["disk_bottom", "disk_middle", "disk_top"];

/// 在零点候选中取距当前读数最近者
fn find_zero(present: f64, hardware_zero: f64) -> f64 {
    let a = DISK_REDUCTION_PERIOD;
    let candidates = [hardware_zero, -(a - hardware_zero), a + hardware_zero];

    candidates
        .into_iter()
        .min_by(|x, y| {
            (present - x)
                .abs()
                .partial_cmp(&(present - y).abs())
                .expect("zero candidates are finite")
        })
        .expect("candidate list is non-empty")
}

/// 把角度规范化到 (-180, 180]
fn wrap_deg(mut degrees: f64) -> f64 {
    degrees %= 360.0;
    if degrees > 180.0 {
        degrees -= 360.0;
    } else if degrees <= -180.0 {
        degrees += 360.0;
    }
    degrees
}

/// Orbita 的单个驱动盘
///
/// 本地角度 = 电机读数 − 零点偏移；盘可以多圈转动，不设边界。
pub struct OrbitaDisk {
    name: String,
    backend: Arc<dyn MotorBackend>,
    /// setup 时确定；重新标定会更新
    offset: Mutex<f64>,
}

impl OrbitaDisk {
    fn new(name: String, backend: Arc<dyn MotorBackend>) -> Self {
        Self {
            name,
            backend,
            offset: Mutex::new(0.0),
        }
    }

    /// 当前零点偏移（度）
    pub fn offset(&self) -> f64 {
        *self.offset.lock()
    }

    /// 盘的 setup：使能位置控制，按硬件零点确定偏移
    fn setup(&self, hardware_zero: f64) -> Result<(), ActuatorError> {
        self.backend.setup()?;
        let present = self.backend.present_position()?;
        let offset = find_zero(present, hardware_zero) + DISK_ASSEMBLY_SHIFT;
        debug!(disk = %self.name, offset, "orbita disk zeroed");
        *self.offset.lock() = offset;
        Ok(())
    }

    fn as_local(&self, motor: f64) -> f64 {
        motor - self.offset()
    }

    fn to_motor(&self, local: f64) -> f64 {
        local + self.offset()
    }
}

impl Actuator for OrbitaDisk {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> (f64, f64) {
        (f64::NEG_INFINITY, f64::INFINITY)
    }

    fn goal_position(&self) -> Result<f64, ActuatorError> {
        Ok(self.as_local(self.backend.goal_position()?))
    }

    fn set_goal_position(&self, degrees: f64) -> Result<(), ActuatorError> {
        self.backend.set_goal_position(self.to_motor(degrees))
    }

    fn set_goal_position_clamped(&self, degrees: f64) -> Result<(), ActuatorError> {
        // 盘不设边界，钳制路径与普通写入一致
        self.set_goal_position(degrees)
    }

    fn present_position(&self) -> Result<f64, ActuatorError> {
        Ok(self.as_local(self.backend.present_position()?))
    }

    fn compliant(&self) -> Result<bool, ActuatorError> {
        self.backend.compliant()
    }

    fn set_compliant(&self, compliant: bool) -> Result<(), ActuatorError> {
        self.backend.set_compliant(compliant)
    }

    fn temperature(&self) -> Result<f64, ActuatorError> {
        self.backend.temperature()
    }

    fn torque_limit(&self) -> Result<f64, ActuatorError> {
        self.backend.torque_limit()
    }

    fn set_torque_limit(&self, percent: f64) -> Result<(), ActuatorError> {
        self.backend.set_torque_limit(percent)
    }

    fn moving_speed(&self) -> Result<f64, ActuatorError> {
        self.backend.moving_speed()
    }

    fn set_moving_speed(&self, deg_per_sec: f64) -> Result<(), ActuatorError> {
        self.backend.set_moving_speed(deg_per_sec)
    }
}

/// 固定盘几何
#[derive(Debug, Clone)]
pub struct OrbitaGeometry {
    /// 初始姿态的基座旋转 R0
    pub base_rotation: UnitQuaternion<f64>,
    /// 静止时平台的指向轴（头部颈关节为 x 轴）
    pub base_axis: Unit<Vector3<f64>>,
}

impl Default for OrbitaGeometry {
    fn default() -> Self {
        Self {
            base_rotation: UnitQuaternion::identity(),
            base_axis: Vector3::x_axis(),
        }
    }
}

/// Orbita 三盘姿态执行器
///
/// 盘序固定为（底、中、顶）。目标姿态经盘几何分解为三个盘角：
/// 第 i 条臂的静止方位为 120°·i，姿态 q 作用后，臂在平台平面上的
/// 方位变化量即该盘需要转过的角度。
pub struct OrbitaActuator {
    name: String,
    disks: [Arc<OrbitaDisk>; 3],
    geometry: OrbitaGeometry,
}

impl OrbitaActuator {
    /// 创建并 setup 三盘执行器
    ///
    /// # 参数
    ///
    /// - `name`: 执行器全名（如 "head.neck"）
    /// - `backends`: 底、中、顶三个盘的后端
    /// - `geometry`: 固定盘几何
    /// - `hardware_zero`: 三个盘的装配标定零点（度）
    pub fn new(
        name: impl Into<String>,
        backends: [Arc<dyn MotorBackend>; 3],
        geometry: OrbitaGeometry,
        hardware_zero: [f64; 3],
    ) -> Result<Self, ActuatorError> {
        let name = name.into();
        let [bottom, middle, top] = backends;

        let disks = [
            Arc::new(OrbitaDisk::new(format!("{name}.{}", DISK_NAMES[0]), bottom)),
            Arc::new(OrbitaDisk::new(format!("{name}.{}", DISK_NAMES[1]), middle)),
            Arc::new(OrbitaDisk::new(format!("{name}.{}", DISK_NAMES[2]), top)),
        ];

        for (disk, zero) in disks.iter().zip(hardware_zero) {
            disk.setup(zero)?;
        }

        Ok(Self {
            name,
            disks,
            geometry,
        })
    }

    /// 执行器全名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 三个盘（底、中、顶），每个盘都是独立的执行器
    pub fn disks(&self) -> &[Arc<OrbitaDisk>; 3] {
        &self.disks
    }

    /// 盘几何
    pub fn geometry(&self) -> &OrbitaGeometry {
        &self.geometry
    }

    /// 把目标姿态分解成三个盘的目标角度（本地度数）
    ///
    /// 臂 i 的静止方向为绕 z 转 120°·i 的单位向量；姿态
    /// `q · R0` 作用后，臂在 xy 平面上的方位角变化量即为盘角。
    /// 臂接近竖直（方位角退化）时保持该盘不动并告警。
    pub fn disk_targets_from_quaternion(&self, orientation: &UnitQuaternion<f64>) -> [f64; 3] {
        let mut targets = [0.0_f64; 3];

        for (i, target) in targets.iter_mut().enumerate() {
            let rest_azimuth = 120.0 * i as f64;
            let arm = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), rest_azimuth.to_radians())
                * Vector3::x();

            let rotated = orientation * (self.geometry.base_rotation * arm);
            let planar = rotated.xy().norm();
            if planar < 1e-9 {
                warn!(
                    actuator = %self.name,
                    arm = i,
                    "arm azimuth degenerate, keeping disk in place"
                );
                continue;
            }

            let base = self.geometry.base_rotation * arm;
            let azimuth = rotated.y.atan2(rotated.x).to_degrees();
            let base_azimuth = base.y.atan2(base.x).to_degrees();
            *target = wrap_deg(azimuth - base_azimuth);
        }

        targets
    }

    /// 把「指向向量 + 绕向量滚转角」分解成三个盘的目标角度
    ///
    /// # Panics
    ///
    /// 零向量没有方向可言，属于调用方编程错误，直接 panic。
    pub fn disk_targets_for_vector(&self, vector: Vector3<f64>, roll_deg: f64) -> [f64; 3] {
        assert!(
            vector.norm() > 1e-12,
            "pointing vector must be non-zero"
        );
        let direction = Unit::new_normalize(vector);

        // 先把指向轴对到目标向量，再绕目标向量滚转
        let aim = UnitQuaternion::rotation_between(
            &self.geometry.base_axis.into_inner(),
            &direction.into_inner(),
        )
            .unwrap_or_else(|| {
                // 反向指向：绕任意垂直轴翻转 180°
                let perpendicular = Unit::new_normalize(pick_perpendicular(&self.geometry.base_axis));
                UnitQuaternion::from_axis_angle(&perpendicular, std::f64::consts::PI)
            });
        let roll = UnitQuaternion::from_axis_angle(&direction, roll_deg.to_radians());

        self.disk_targets_from_quaternion(&(roll * aim))
    }

    /// 所有盘都失力时为 true
    pub fn compliant(&self) -> Result<bool, ActuatorError> {
        for disk in &self.disks {
            if !disk.compliant()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// 广播失力状态到三个盘
    pub fn set_compliant(&self, compliant: bool) -> Result<(), ActuatorError> {
        for disk in &self.disks {
            disk.set_compliant(compliant)?;
        }
        Ok(())
    }

    /// 最热盘的温度
    pub fn temperature(&self) -> Result<f64, ActuatorError> {
        let mut hottest = f64::NEG_INFINITY;
        for disk in &self.disks {
            hottest = hottest.max(disk.temperature()?);
        }
        Ok(hottest)
    }

    /// 广播最大转速到三个盘
    pub fn set_moving_speed(&self, deg_per_sec: f64) -> Result<(), ActuatorError> {
        for disk in &self.disks {
            disk.set_moving_speed(deg_per_sec)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for OrbitaActuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrbitaActuator")
            .field("name", &self.name)
            .finish()
    }
}

/// 取与给定轴垂直的任意向量
fn pick_perpendicular(axis: &Unit<Vector3<f64>>) -> Vector3<f64> {
    let candidate = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    axis.cross(&candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMotor;

    fn orbita() -> (Vec<Arc<SimMotor>>, OrbitaActuator) {
        let sims: Vec<Arc<SimMotor>> = (0..3).map(|_| SimMotor::new()).collect();
        let backends: [Arc<dyn MotorBackend>; 3] = [
            sims[0].clone(),
            sims[1].clone(),
            sims[2].clone(),
        ];
        let actuator = OrbitaActuator::new(
            "head.neck",
            backends,
            OrbitaGeometry::default(),
            [0.0, 0.0, 0.0],
        )
        .unwrap();
        (sims, actuator)
    }

    #[test]
    fn test_find_zero_picks_nearest_candidate() {
        // A ≈ 166.15°，候选 {30, -136.15, 196.15}
        assert!((find_zero(0.0, 30.0) - 30.0).abs() < 1e-9);
        assert!((find_zero(-130.0, 30.0) - (-(DISK_REDUCTION_PERIOD - 30.0))).abs() < 1e-9);
        assert!((find_zero(200.0, 30.0) - (DISK_REDUCTION_PERIOD + 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_setup_applies_assembly_shift() {
        let (_sims, actuator) = orbita();
        // 硬件零点 0，当前读数 0 → 偏移 = 0 + 60
        for disk in actuator.disks() {
            assert!((disk.offset() - DISK_ASSEMBLY_SHIFT).abs() < 1e-9);
        }
    }

    #[test]
    fn test_disk_local_frame_uses_offset() {
        let (sims, actuator) = orbita();
        let disk = &actuator.disks()[2];

        disk.set_goal_position(10.0).unwrap();
        // motor = local + offset(60)
        assert!((sims[2].goal_position().unwrap() - 70.0).abs() < 1e-9);
        assert!((disk.goal_position().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_identity_orientation_keeps_disks() {
        let (_sims, actuator) = orbita();
        let targets = actuator.disk_targets_from_quaternion(&UnitQuaternion::identity());
        for t in targets {
            assert!(t.abs() < 1e-9);
        }
    }

    #[test]
    fn test_pure_yaw_turns_all_disks_equally() {
        let (_sims, actuator) = orbita();
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 30.0_f64.to_radians());
        let targets = actuator.disk_targets_from_quaternion(&q);
        for t in targets {
            assert!((t - 30.0).abs() < 1e-6, "target: {t}");
        }
    }

    #[test]
    fn test_tilt_differentiates_disks() {
        let (_sims, actuator) = orbita();
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 15.0_f64.to_radians());
        let targets = actuator.disk_targets_from_quaternion(&q);
        // 俯仰让三条臂的方位变化不一致
        let spread = targets
            .iter()
            .fold(f64::NEG_INFINITY, |m, t| m.max(*t))
            - targets.iter().fold(f64::INFINITY, |m, t| m.min(*t));
        assert!(spread > 0.1, "targets: {targets:?}");
    }

    #[test]
    fn test_point_at_base_axis_is_identity() {
        let (_sims, actuator) = orbita();
        let targets = actuator.disk_targets_for_vector(Vector3::x(), 0.0);
        for t in targets {
            assert!(t.abs() < 1e-6);
        }
    }

    #[test]
    fn test_point_at_with_roll() {
        let (_sims, actuator) = orbita();
        // 指向不变，纯滚转 = 绕 x 轴转动
        let with_roll = actuator.disk_targets_for_vector(Vector3::x(), 20.0);
        let without = actuator.disk_targets_for_vector(Vector3::x(), 0.0);
        assert!(with_roll
            .iter()
            .zip(without)
            .any(|(a, b)| (a - b).abs() > 1e-3));
    }

    #[test]
    fn test_aggregate_compliance() {
        let (_sims, actuator) = orbita();
        assert!(!actuator.compliant().unwrap());

        actuator.set_compliant(true).unwrap();
        assert!(actuator.compliant().unwrap());
        for disk in actuator.disks() {
            assert!(disk.compliant().unwrap());
        }
    }

    #[test]
    fn test_hottest_disk_temperature() {
        let (sims, actuator) = orbita();
        sims[0].set_temperature(30.0);
        sims[1].set_temperature(48.0);
        sims[2].set_temperature(41.0);
        assert!((actuator.temperature().unwrap() - 48.0).abs() < 1e-9);
    }
}
