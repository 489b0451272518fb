//! 仿真电机后端
//!
//! 进程内实现 [`MotorBackend`] 契约，与总线后端使用完全一致的
//! 单位和语义。寄存器状态以 ArcSwap 快照发布：跟随循环的高频
//! goal 写入与观察方的读取互不阻塞。
//!
//! 仿真模型刻意保持最简：实际角度镜像目标角度（理想到位），
//! 测试可通过 [`SimMotor::force_present_position`] 注入偏差来模拟
//! 机械静差，通过 [`SimMotor::set_temperature`] 注入温度来驱动
//! 温度保护场景。

use crate::backend::MotorBackend;
use crate::error::ActuatorError;
use arc_swap::ArcSwap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct SimState {
    goal: f64,
    /// 为 None 时实际角度镜像目标角度
    present_override: Option<f64>,
    compliant: bool,
    temperature: f64,
    torque_limit: f64,
    moving_speed: f64,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            goal: 0.0,
            present_override: None,
            compliant: false,
            temperature: 25.0,
            torque_limit: 100.0,
            moving_speed: 0.0,
        }
    }
}

/// 仿真电机
pub struct SimMotor {
    state: ArcSwap<SimState>,
}

impl SimMotor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: ArcSwap::from_pointee(SimState::default()),
        })
    }

    /// 以给定初始角度（电机原生度数）创建
    pub fn with_initial_position(degrees: f64) -> Arc<Self> {
        Arc::new(Self {
            state: ArcSwap::from_pointee(SimState {
                goal: degrees,
                ..SimState::default()
            }),
        })
    }

    fn update(&self, f: impl Fn(&mut SimState)) {
        self.state.rcu(|old| {
            let mut state = (**old).clone();
            f(&mut state);
            Arc::new(state)
        });
    }

    /// 注入温度读数（测试 / 仿真场景驱动）
    pub fn set_temperature(&self, celsius: f64) {
        self.update(|s| s.temperature = celsius);
    }

    /// 强制实际角度偏离目标角度（`None` 恢复镜像行为）
    pub fn force_present_position(&self, degrees: Option<f64>) {
        self.update(|s| s.present_override = degrees);
    }
}

impl MotorBackend for SimMotor {
    fn goal_position(&self) -> Result<f64, ActuatorError> {
        Ok(self.state.load().goal)
    }

    fn set_goal_position(&self, degrees: f64) -> Result<(), ActuatorError> {
        self.update(|s| s.goal = degrees);
        Ok(())
    }

    fn present_position(&self) -> Result<f64, ActuatorError> {
        let state = self.state.load();
        Ok(state.present_override.unwrap_or(state.goal))
    }

    fn compliant(&self) -> Result<bool, ActuatorError> {
        Ok(self.state.load().compliant)
    }

    fn set_compliant(&self, compliant: bool) -> Result<(), ActuatorError> {
        self.update(|s| s.compliant = compliant);
        Ok(())
    }

    fn temperature(&self) -> Result<f64, ActuatorError> {
        Ok(self.state.load().temperature)
    }

    fn torque_limit(&self) -> Result<f64, ActuatorError> {
        Ok(self.state.load().torque_limit)
    }

    fn set_torque_limit(&self, percent: f64) -> Result<(), ActuatorError> {
        self.update(|s| s.torque_limit = percent);
        Ok(())
    }

    fn moving_speed(&self) -> Result<f64, ActuatorError> {
        Ok(self.state.load().moving_speed)
    }

    fn set_moving_speed(&self, deg_per_sec: f64) -> Result<(), ActuatorError> {
        self.update(|s| s.moving_speed = deg_per_sec);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_mirrors_goal() {
        let motor = SimMotor::new();
        motor.set_goal_position(42.0).unwrap();
        assert_eq!(motor.present_position().unwrap(), 42.0);
    }

    #[test]
    fn test_present_override() {
        let motor = SimMotor::new();
        motor.set_goal_position(30.0).unwrap();
        motor.force_present_position(Some(25.0));
        assert_eq!(motor.present_position().unwrap(), 25.0);

        motor.force_present_position(None);
        assert_eq!(motor.present_position().unwrap(), 30.0);
    }

    #[test]
    fn test_temperature_injection() {
        let motor = SimMotor::new();
        assert_eq!(motor.temperature().unwrap(), 25.0);
        motor.set_temperature(55.5);
        assert_eq!(motor.temperature().unwrap(), 55.5);
    }

    #[test]
    fn test_concurrent_goal_writes() {
        let motor = SimMotor::new();
        let writers: Vec<_> = (0..4)
            .map(|i| {
                let motor = motor.clone();
                std::thread::spawn(move || {
                    for k in 0..100 {
                        motor.set_goal_position((i * 100 + k) as f64).unwrap();
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        // 最终值必须是某次完整写入的结果
        let goal = motor.goal_position().unwrap();
        assert!((0.0..400.0).contains(&goal));
    }
}
