//! 散热风扇控制
//!
//! 风扇可以手动开关，也可以交给 [`ThermalGuard`](crate::thermal::ThermalGuard)
//! 与某个执行器配对：过热时自动开启，降温完成后关闭。

use crate::error::ActuatorError;
use egret_bus::FanModule;
use std::sync::atomic::{AtomicBool, Ordering};

/// 风扇控制契约
pub trait FanControl: Send + Sync {
    fn name(&self) -> &str;
    fn is_on(&self) -> Result<bool, ActuatorError>;
    fn set_on(&self, on: bool) -> Result<(), ActuatorError>;
}

/// gate 上的真实风扇
pub struct GateFan {
    module: FanModule,
}

impl GateFan {
    pub fn new(module: FanModule) -> Self {
        Self { module }
    }
}

impl FanControl for GateFan {
    fn name(&self) -> &str {
        self.module.name()
    }

    fn is_on(&self) -> Result<bool, ActuatorError> {
        Ok(self.module.is_on()?)
    }

    fn set_on(&self, on: bool) -> Result<(), ActuatorError> {
        if on {
            Ok(self.module.on()?)
        } else {
            Ok(self.module.off()?)
        }
    }
}

/// 仿真风扇
pub struct SimFan {
    name: String,
    state: AtomicBool,
}

impl SimFan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: AtomicBool::new(false),
        }
    }
}

impl FanControl for SimFan {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_on(&self) -> Result<bool, ActuatorError> {
        Ok(self.state.load(Ordering::Acquire))
    }

    fn set_on(&self, on: bool) -> Result<(), ActuatorError> {
        self.state.store(on, Ordering::Release);
        Ok(())
    }
}
