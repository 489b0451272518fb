//! 多执行器设定点流
//!
//! [`ActuatorTrajectory`] 把执行器全名映射到各自的设定点序列，
//! 并携带统一采样频率。由插值器/混合器产出，由播放器按行
//! （同一采样时刻的所有执行器）推进。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 多执行器对齐设定点流
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorTrajectory {
    /// 采样频率（Hz）
    pub frequency: f64,
    /// 执行器全名 → 设定点序列（度）
    pub streams: BTreeMap<String, Vec<f64>>,
}

impl ActuatorTrajectory {
    pub fn new(frequency: f64) -> Self {
        Self {
            frequency,
            streams: BTreeMap::new(),
        }
    }

    /// 插入一条执行器设定点流
    pub fn insert(&mut self, actuator: impl Into<String>, samples: Vec<f64>) {
        self.streams.insert(actuator.into(), samples);
    }

    /// 最长流的样本数
    pub fn len(&self) -> usize {
        self.streams.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 控制的执行器全名集合
    pub fn actuators(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    /// 轨迹时长（秒）
    pub fn duration(&self) -> f64 {
        if self.frequency > 0.0 {
            self.len() as f64 / self.frequency
        } else {
            0.0
        }
    }
}
