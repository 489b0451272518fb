//! 轨迹混合器
//!
//! 用一条新轨迹平滑替换一条在途轨迹：归一化 sigmoid 权重 w(t)
//! 在淡入窗口内单调从 0 升到 1，
//! `merged(t) = (1 − w(t))·old(t) + w(t)·new(t)`。
//!
//! 目的：换动作时绝不出现大于两条源流自然步长的位置跳变。
//! 为此新流必须从在途流的当前样本出发 ——
//! [`Follower::retarget`](crate::follower::Follower::retarget) 和 goto
//! 系列入口构造的替换流都满足这一点。
//!
//! 这里全部是纯函数：不持有状态，也不做任何 IO。

use crate::error::MotionError;
use crate::trajectory::ActuatorTrajectory;

/// 缺省 sigmoid 斜率因子（x 取值范围 [-r, r]）
pub const DEFAULT_SLOPE: f64 = 5.0;

/// sigmoid 函数
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// 归一化 sigmoid 权重序列
///
/// 在 `[-slope, slope]` 上均匀取 `n` 个点求 sigmoid，再归一化到
/// 首点恰为 0、末点恰为 1。权重序列单调不减。
pub fn norm_sigmoid(n: usize, slope: f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let raw: Vec<f64> = (0..n)
                .map(|i| {
                    let x = -slope + 2.0 * slope * i as f64 / (n - 1) as f64;
                    sigmoid(x)
                })
                .collect();

            let min = raw[0];
            let max = raw[n - 1];
            raw.into_iter().map(|y| (y - min) / (max - min)).collect()
        }
    }
}

/// 混合单条在途流与替换流
///
/// - `old`: 在途流的剩余样本（从当前播放位置起）
/// - `new`: 替换流（应从在途流的当前样本出发）
/// - `fade_samples`: 淡入窗口长度（样本数）；0 表示硬切换
/// - `slope`: sigmoid 斜率因子，见 [`DEFAULT_SLOPE`]
///
/// 输出长度为 `max(new.len(), fade_samples)`；任一输入耗尽后按其
/// 末样本保持。淡入结束后输出完全等于替换流 —— 被替换的旧流
/// 剩余部分即被丢弃。
pub fn blend(old: &[f64], new: &[f64], fade_samples: usize, slope: f64) -> Vec<f64> {
    if old.is_empty() || fade_samples == 0 {
        return new.to_vec();
    }
    if new.is_empty() {
        return old.to_vec();
    }

    let weights = norm_sigmoid(fade_samples, slope);
    let len = new.len().max(fade_samples);

    (0..len)
        .map(|k| {
            let w = if k < fade_samples { weights[k] } else { 1.0 };
            let o = old[k.min(old.len() - 1)];
            let n = new[k.min(new.len() - 1)];
            (1.0 - w) * o + w * n
        })
        .collect()
}

/// 混合两条多执行器轨迹
///
/// 两条轨迹必须控制同一组执行器且采样频率一致。
/// `fade_duration` 为淡入时长（秒）。
pub fn blend_trajectories(
    old: &ActuatorTrajectory,
    new: &ActuatorTrajectory,
    fade_duration: f64,
    slope: f64,
) -> Result<ActuatorTrajectory, MotionError> {
    if (old.frequency - new.frequency).abs() > f64::EPSILON {
        return Err(MotionError::FrequencyMismatch {
            left: old.frequency,
            right: new.frequency,
        });
    }
    if !old.streams.keys().eq(new.streams.keys()) {
        return Err(MotionError::ActuatorSetMismatch);
    }

    let fade_samples = (fade_duration * old.frequency).round() as usize;
    let mut merged = ActuatorTrajectory::new(old.frequency);
    for (name, old_samples) in &old.streams {
        let new_samples = &new.streams[name];
        merged.insert(name.clone(), blend(old_samples, new_samples, fade_samples, slope));
    }
    Ok(merged)
}
