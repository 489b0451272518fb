//! 轨迹关键点
//!
//! 一个关键点是一条轨迹段的边界条件：段内时间偏移、位置，
//! 以及可选的速度/加速度（缺省按 0 处理，对应平滑起止）。

use serde::{Deserialize, Serialize};

/// 轨迹段边界条件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// 段内时间偏移（秒）
    pub time: f64,
    /// 位置（度）
    pub position: f64,
    /// 速度（度/秒），None 视为 0
    pub velocity: Option<f64>,
    /// 加速度（度/秒²），None 视为 0
    pub acceleration: Option<f64>,
}

impl Keypoint {
    pub fn new(time: f64, position: f64) -> Self {
        Self {
            time,
            position,
            velocity: None,
            acceleration: None,
        }
    }

    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = Some(acceleration);
        self
    }

    /// 速度边界条件（缺省 0）
    pub fn velocity_or_default(&self) -> f64 {
        self.velocity.unwrap_or(0.0)
    }

    /// 加速度边界条件（缺省 0）
    pub fn acceleration_or_default(&self) -> f64 {
        self.acceleration.unwrap_or(0.0)
    }
}
