//! goto 运动入口
//!
//! 把「到目标位置、给定时长」的运动请求变成跟随器：
//! - [`goto`]：单执行器
//! - [`goto_many`]：多执行器同步（各自独立跟随，同一时长）
//! - [`orbita_goto`] / [`orbita_orient`] / [`orbita_point_at`]：
//!   Orbita 平台的三盘联动
//!
//! 目标越界的请求直接拒绝（OutOfBounds），绝不静默越界。

use crate::error::MotionError;
use crate::follower::Follower;
use crate::interpolation::{InterpolationMode, Profile};
use egret_actuator::{Actuator, ActuatorError, OrbitaActuator};
use nalgebra::{UnitQuaternion, Vector3};
use std::sync::Arc;
use tracing::debug;

/// 轨迹起点取自哪个寄存器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartingPoint {
    /// 从实际位置出发（缺省；机械臂被手动摆过后从实际位置接管）
    PresentPosition,
    /// 从目标位置出发（接续上一条轨迹的终点，避免读数噪声）
    GoalPosition,
}

/// goto 运动选项
#[derive(Debug, Clone, Copy)]
pub struct GotoOptions {
    pub starting_point: StartingPoint,
    pub mode: InterpolationMode,
    /// 设定点流采样频率（Hz）
    pub frequency: f64,
    /// 是否阻塞等待运动结束
    pub wait: bool,
}

impl Default for GotoOptions {
    fn default() -> Self {
        Self {
            starting_point: StartingPoint::PresentPosition,
            mode: InterpolationMode::Linear,
            frequency: 100.0,
            wait: false,
        }
    }
}

impl GotoOptions {
    /// 最小加加速度插值的常用预设
    pub fn minimum_jerk() -> Self {
        Self {
            mode: InterpolationMode::MinimumJerk,
            ..Self::default()
        }
    }
}

fn starting_position(
    actuator: &Arc<dyn Actuator>,
    starting_point: StartingPoint,
) -> Result<f64, MotionError> {
    Ok(match starting_point {
        StartingPoint::PresentPosition => actuator.present_position()?,
        StartingPoint::GoalPosition => actuator.goal_position()?,
    })
}

/// 单执行器 goto
///
/// 返回跟随器，可用于 `wait()`、`stop()` 或在途 `retarget()`。
pub fn goto(
    actuator: &Arc<dyn Actuator>,
    goal: f64,
    duration: f64,
    options: GotoOptions,
) -> Result<Follower, MotionError> {
    let (lower, upper) = actuator.bounds();
    if goal < lower || goal > upper {
        return Err(ActuatorError::OutOfBounds {
            actuator: actuator.name().to_string(),
            value: goal,
            lower,
            upper,
        }
        .into());
    }

    let from = starting_position(actuator, options.starting_point)?;
    debug!(
        actuator = actuator.name(),
        from, goal, duration, "starting goto"
    );

    let profile = Profile::point_to_point(from, goal, duration, options.mode)?;
    let follower = Follower::start(actuator.clone(), &profile, options.frequency);

    if options.wait {
        follower.wait();
    }
    Ok(follower)
}

/// 多执行器同步 goto
///
/// 所有执行器同时启动、同一时长；`options.wait` 为 true 时
/// 等待全部结束。
pub fn goto_many(
    moves: &[(Arc<dyn Actuator>, f64)],
    duration: f64,
    options: GotoOptions,
) -> Result<Vec<Follower>, MotionError> {
    let mut followers = Vec::with_capacity(moves.len());
    let start_options = GotoOptions {
        wait: false,
        ..options
    };

    for (actuator, goal) in moves {
        followers.push(goto(actuator, *goal, duration, start_options)?);
    }

    if options.wait {
        for follower in &followers {
            follower.wait();
        }
    }
    Ok(followers)
}

/// Orbita 三盘联动 goto（底、中、顶）
pub fn orbita_goto(
    orbita: &OrbitaActuator,
    targets: [f64; 3],
    duration: f64,
    options: GotoOptions,
) -> Result<Vec<Follower>, MotionError> {
    let moves: Vec<(Arc<dyn Actuator>, f64)> = orbita
        .disks()
        .iter()
        .zip(targets)
        .map(|(disk, target)| {
            let actuator: Arc<dyn Actuator> = disk.clone();
            (actuator, target)
        })
        .collect();
    goto_many(&moves, duration, options)
}

/// 把 Orbita 平台转到目标姿态（缺省最小加加速度插值）
pub fn orbita_orient(
    orbita: &OrbitaActuator,
    orientation: &UnitQuaternion<f64>,
    duration: f64,
    options: GotoOptions,
) -> Result<Vec<Follower>, MotionError> {
    let targets = orbita.disk_targets_from_quaternion(orientation);
    orbita_goto(orbita, targets, duration, options)
}

/// 让 Orbita 平台指向给定向量并绕其滚转
pub fn orbita_point_at(
    orbita: &OrbitaActuator,
    vector: Vector3<f64>,
    roll_deg: f64,
    duration: f64,
    options: GotoOptions,
) -> Result<Vec<Follower>, MotionError> {
    let targets = orbita.disk_targets_for_vector(vector, roll_deg);
    orbita_goto(orbita, targets, duration, options)
}
