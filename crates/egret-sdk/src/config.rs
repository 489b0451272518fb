//! 只读静态配置
//!
//! 机器人结构的静态描述：每个部件挂在哪个 gate、各电机的
//! id/零点/方向/角度边界、运动学链的 DH 参数、Orbita 的硬件零点
//! 与温度保护参数。配置从 TOML 文本解析，解析后只读 ——
//! 本 SDK 不负责配置的持久化与修改。
//!
//! ```toml
//! [parts.right_arm]
//! gate = "r_right_arm"
//! chain = ["shoulder_pitch", "elbow_pitch"]
//!
//! [parts.right_arm.motors.shoulder_pitch]
//! id = 10
//! offset = 90.0
//! orientation = "indirect"
//! angle_limits = [-180.0, 60.0]
//! dh = { length = 0.0, twist = 1.5708, offset = 0.19, theta_ref = 0.0 }
//! ```

use egret_actuator::{JointConfig, ThermalConfig};
use egret_kinematics::{Chain, Link};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// 配置解析与查询错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// TOML 语法或结构不符
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// 引用了不存在的部件
    #[error("Unknown part \"{part}\"")]
    UnknownPart { part: String },

    /// 引用了不存在的电机
    #[error("Unknown motor \"{motor}\" in part \"{part}\"")]
    UnknownMotor { part: String, motor: String },

    /// 电机缺少 DH 参数，无法加入运动学链
    #[error("Motor \"{motor}\" has no DH parameters")]
    MissingDh { motor: String },
}

/// 电机方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Direct,
    Indirect,
}

/// 单连杆 DH 参数（弧度 / 与链同单位的长度）
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DhEntry {
    pub length: f64,
    pub twist: f64,
    pub offset: f64,
    #[serde(default)]
    pub theta_ref: f64,
}

/// 单电机配置
#[derive(Debug, Clone, Deserialize)]
pub struct MotorEntry {
    /// 总线 id（模块名约定 `dxl_{id}`）
    pub id: u8,
    /// 零点偏移（度）
    #[serde(default)]
    pub offset: f64,
    /// 安装方向
    pub orientation: Orientation,
    /// 本地角度边界（度）
    pub angle_limits: [f64; 2],
    /// 运动学链 DH 参数（不在链上的电机可省略）
    #[serde(default)]
    pub dh: Option<DhEntry>,
}

impl MotorEntry {
    /// 转成执行器层的关节配置
    pub fn joint_config(&self) -> JointConfig {
        JointConfig {
            offset: self.offset,
            direct: self.orientation == Orientation::Direct,
            bounds: (self.angle_limits[0], self.angle_limits[1]),
        }
    }
}

/// Orbita 平台配置
#[derive(Debug, Clone, Deserialize)]
pub struct OrbitaEntry {
    /// 三个盘（底、中、顶）的装配标定零点（度）
    pub hardware_zero: [f64; 3],
}

/// 单部件配置
#[derive(Debug, Clone, Deserialize)]
pub struct PartConfig {
    /// 部件挂载的 gate 名
    pub gate: String,
    /// 电机表
    #[serde(default)]
    pub motors: BTreeMap<String, MotorEntry>,
    /// 运动学链上的电机顺序（根到末端）
    #[serde(default)]
    pub chain: Vec<String>,
    /// Orbita 平台（仅头部等部件有）
    #[serde(default)]
    pub orbita: Option<OrbitaEntry>,
}

impl PartConfig {
    /// 查电机配置
    pub fn motor(&self, part: &str, motor: &str) -> Result<&MotorEntry, ConfigError> {
        self.motors.get(motor).ok_or_else(|| ConfigError::UnknownMotor {
            part: part.to_string(),
            motor: motor.to_string(),
        })
    }

    /// 按 `chain` 声明的顺序构建运动学链
    ///
    /// 链上每个电机都必须有 DH 参数；角度边界从度转成弧度。
    pub fn kinematic_chain(&self, part: &str) -> Result<Chain, ConfigError> {
        let mut links = Vec::with_capacity(self.chain.len());
        for motor_name in &self.chain {
            let motor = self.motor(part, motor_name)?;
            let dh = motor.dh.ok_or_else(|| ConfigError::MissingDh {
                motor: motor_name.clone(),
            })?;

            links.push(
                Link::new(dh.length, dh.twist, dh.offset, dh.theta_ref).with_bounds(
                    motor.angle_limits[0].to_radians(),
                    motor.angle_limits[1].to_radians(),
                ),
            );
        }
        Ok(Chain::new(links))
    }
}

/// 温度保护配置
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThermalEntry {
    pub temperature_limit: f64,
    pub hysteresis: f64,
    /// 巡检周期（毫秒）
    #[serde(default = "default_poll_period_ms")]
    pub poll_period_ms: u64,
}

fn default_poll_period_ms() -> u64 {
    1000
}

impl ThermalEntry {
    pub fn to_config(self) -> ThermalConfig {
        ThermalConfig {
            temperature_limit: self.temperature_limit,
            hysteresis: self.hysteresis,
            poll_period: Duration::from_millis(self.poll_period_ms),
        }
    }
}

/// 整机静态配置
#[derive(Debug, Clone, Deserialize)]
pub struct RobotConfig {
    /// 部件表（right_arm / left_arm / head ...）
    #[serde(default)]
    pub parts: BTreeMap<String, PartConfig>,
    /// 温度保护（可省略，用缺省值）
    #[serde(default)]
    pub thermal: Option<ThermalEntry>,
}

impl RobotConfig {
    /// 从 TOML 文本解析
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// 查部件配置
    pub fn part(&self, part: &str) -> Result<&PartConfig, ConfigError> {
        self.parts.get(part).ok_or_else(|| ConfigError::UnknownPart {
            part: part.to_string(),
        })
    }

    /// 查关节配置（部件 + 电机）
    pub fn joint(&self, part: &str, motor: &str) -> Result<JointConfig, ConfigError> {
        Ok(self.part(part)?.motor(part, motor)?.joint_config())
    }

    /// 温度保护配置（缺省值兜底）
    pub fn thermal_config(&self) -> ThermalConfig {
        self.thermal
            .map(ThermalEntry::to_config)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [parts.right_arm]
        gate = "r_right_arm"
        chain = ["shoulder_pitch", "elbow_pitch"]

        [parts.right_arm.motors.shoulder_pitch]
        id = 10
        offset = 90.0
        orientation = "indirect"
        angle_limits = [-180.0, 60.0]
        dh = { length = 0.0, twist = 1.5708, offset = 0.19, theta_ref = 0.0 }

        [parts.right_arm.motors.elbow_pitch]
        id = 12
        orientation = "direct"
        angle_limits = [-125.0, 0.0]
        dh = { length = 0.0, twist = 0.0, offset = 0.28 }

        [parts.head]
        gate = "r_head"

        [parts.head.orbita]
        hardware_zero = [102.5, 24.3, 77.1]

        [parts.head.motors.left_antenna]
        id = 30
        orientation = "direct"
        angle_limits = [-150.0, 150.0]

        [thermal]
        temperature_limit = 50.0
        hysteresis = 5.0
        poll_period_ms = 500
    "#;

    #[test]
    fn test_parse_full_sample() {
        let config = RobotConfig::from_toml_str(SAMPLE).unwrap();

        let arm = config.part("right_arm").unwrap();
        assert_eq!(arm.gate, "r_right_arm");
        assert_eq!(arm.motors.len(), 2);

        let shoulder = arm.motor("right_arm", "shoulder_pitch").unwrap();
        assert_eq!(shoulder.id, 10);
        assert_eq!(shoulder.orientation, Orientation::Indirect);

        let head = config.part("head").unwrap();
        assert!(head.orbita.is_some());
    }

    #[test]
    fn test_joint_config_conversion() {
        let config = RobotConfig::from_toml_str(SAMPLE).unwrap();
        let joint = config.joint("right_arm", "shoulder_pitch").unwrap();

        assert_eq!(joint.offset, 90.0);
        assert!(!joint.direct);
        assert_eq!(joint.bounds, (-180.0, 60.0));
    }

    #[test]
    fn test_kinematic_chain_order_and_bounds() {
        let config = RobotConfig::from_toml_str(SAMPLE).unwrap();
        let chain = config
            .part("right_arm")
            .unwrap()
            .kinematic_chain("right_arm")
            .unwrap();

        assert_eq!(chain.len(), 2);
        // 链序来自 chain 声明而不是电机表的字典序
        assert!((chain.links()[0].offset - 0.19).abs() < 1e-12);
        assert!((chain.links()[1].offset - 0.28).abs() < 1e-12);
        // 边界已转弧度
        assert!((chain.links()[1].bounds.0 - (-125.0_f64).to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_lookups() {
        let config = RobotConfig::from_toml_str(SAMPLE).unwrap();
        assert!(matches!(
            config.part("tail"),
            Err(ConfigError::UnknownPart { .. })
        ));
        assert!(matches!(
            config.joint("right_arm", "wrist_roll"),
            Err(ConfigError::UnknownMotor { .. })
        ));
    }

    #[test]
    fn test_chain_requires_dh() {
        let text = r#"
            [parts.head]
            gate = "r_head"
            chain = ["left_antenna"]

            [parts.head.motors.left_antenna]
            id = 30
            orientation = "direct"
            angle_limits = [-150.0, 150.0]
        "#;
        let config = RobotConfig::from_toml_str(text).unwrap();
        assert!(matches!(
            config.part("head").unwrap().kinematic_chain("head"),
            Err(ConfigError::MissingDh { .. })
        ));
    }

    #[test]
    fn test_thermal_defaults() {
        let config = RobotConfig::from_toml_str("").unwrap();
        let thermal = config.thermal_config();
        assert_eq!(thermal.temperature_limit, 50.0);
        assert_eq!(thermal.hysteresis, 5.0);

        let config = RobotConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.thermal_config().poll_period, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            RobotConfig::from_toml_str("parts = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
