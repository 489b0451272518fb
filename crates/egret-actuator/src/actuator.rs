//! 执行器公共契约
//!
//! 轨迹跟随、录制回放和温度巡检统一通过 `Arc<dyn Actuator>` 驱动
//! 执行器，单关节电机与 Orbita 的单个盘都实现本契约。
//! 角度为本地坐标系度数（已含零点偏移与方向换算）。

use crate::error::ActuatorError;

/// 可被运动栈驱动的执行器
///
/// 所有方法都可与活动中的跟随循环并发调用。
pub trait Actuator: Send + Sync {
    /// 执行器全名（如 "right_arm.elbow_pitch"、"head.neck.disk_top"）
    fn name(&self) -> &str;

    /// 本地坐标系角度边界（度）
    fn bounds(&self) -> (f64, f64);

    /// 当前目标角度（本地度数）
    fn goal_position(&self) -> Result<f64, ActuatorError>;

    /// 写入目标角度（本地度数）
    ///
    /// 越界返回 [`ActuatorError::OutOfBounds`]；失力状态下的写入
    /// 被忽略（电机掉电，写入无意义）。
    fn set_goal_position(&self, degrees: f64) -> Result<(), ActuatorError>;

    /// 钳制写入路径：越界值钳制到边界并告警，不报错
    ///
    /// 供后台跟随循环使用，插值的数值溢出不会中断一条正在
    /// 播放的轨迹。
    fn set_goal_position_clamped(&self, degrees: f64) -> Result<(), ActuatorError>;

    /// 当前实际角度（本地度数）
    fn present_position(&self) -> Result<f64, ActuatorError>;

    /// 是否失力
    fn compliant(&self) -> Result<bool, ActuatorError>;

    /// 设置失力状态
    fn set_compliant(&self, compliant: bool) -> Result<(), ActuatorError>;

    /// 温度（°C）
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
