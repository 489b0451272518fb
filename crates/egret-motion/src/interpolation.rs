//! 轨迹插值器
//!
//! 把有序关键点序列变成可按采样频率展开的连续位置轮廓
//! [`Profile`]，两种可互换的插值策略：
//!
//! - **Linear**：相邻关键点间分段线性
//! - **MinimumJerk**：逐段五次多项式，拟合段两端的位置/速度/加速度
//!   边界条件（缺省 0），速度与加速度连续，端点处加加速度无跳变
//!
//! 五次多项式 `p(τ) = c0 + c1·τ + c2·τ² + c3·τ³ + c4·τ⁴ + c5·τ⁵`
//! 的前三项由起点边界条件直接给出，后三项解 3×3 线性方程组得到。
//!
//! [`Profile::sample`] 产出惰性、有限、一次性的设定点流：
//! `n = ceil(时长 × 频率)` 个样本均匀铺满 [0, 时长]，
//! 首样本恰为起点位置，末样本恰为终点位置。

use crate::error::MotionError;
use crate::keypoint::Keypoint;
use nalgebra::{Matrix3, Vector3};

/// 插值策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    /// 分段线性
    Linear,
    /// 逐段五次多项式（最小加加速度）
    MinimumJerk,
}

/// 单段五次多项式（系数按段内时间 τ = t − t0 计）
#[derive(Debug, Clone, Copy)]
struct Quintic {
    c: [f64; 6],
}

impl Quintic {
    /// 由段边界条件求解系数
    fn fit(from: &Keypoint, to: &Keypoint, index: usize) -> Result<Self, MotionError> {
        let duration = to.time - from.time;

        let c0 = from.position;
        let c1 = from.velocity_or_default();
        let c2 = from.acceleration_or_default() / 2.0;

        let d1 = duration;
        let d2 = d1 * d1;
        let d3 = d2 * d1;
        let d4 = d3 * d1;
        let d5 = d4 * d1;

        #[rustfmt::skip]
        let a = Matrix3::new(
                 d3,       d4,       d5,
            3.0 * d2, 4.0 * d3, 5.0 * d4,
            6.0 * d1, 12.0 * d2, 20.0 * d3,
        );
        let b = Vector3::new(
            to.position - c0 - c1 * d1 - c2 * d2,
            to.velocity_or_default() - c1 - 2.0 * c2 * d1,
            to.acceleration_or_default() - 2.0 * c2,
        );

        let x = a
            .lu()
            .solve(&b)
            .ok_or(MotionError::DegenerateSegment { index })?;

        Ok(Self {
            c: [c0, c1, c2, x[0], x[1], x[2]],
        })
    }

    fn position(&self, tau: f64) -> f64 {
        // Horner 形式，避免显式幂运算
        let c = &self.c;
        ((((c[5] * tau + c[4]) * tau + c[3]) * tau + c[2]) * tau + c[1]) * tau + c[0]
    }

    fn velocity(&self, tau: f64) -> f64 {
        let c = &self.c;
        (((5.0 * c[5] * tau + 4.0 * c[4]) * tau + 3.0 * c[3]) * tau + 2.0 * c[2]) * tau + c[1]
    }
}

/// 位置轮廓：有序关键点 + 插值策略
#[derive(Debug, Clone)]
pub struct Profile {
    /// 关键点，时间已平移为从 0 开始
    keypoints: Vec<Keypoint>,
    mode: InterpolationMode,
    /// MinimumJerk 的逐段系数（Linear 为空）
    segments: Vec<Quintic>,
}

impl Profile {
    /// 构建轮廓
    ///
    /// 要求至少两个关键点且时间严格递增。
    pub fn new(mode: InterpolationMode, keypoints: Vec<Keypoint>) -> Result<Self, MotionError> {
        if keypoints.len() < 2 {
            return Err(MotionError::NotEnoughKeypoints);
        }
        for (index, pair) in keypoints.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(MotionError::NonMonotonicKeypoints { index: index + 1 });
            }
        }

        // 时间平移到 0 起点，后续计算一律用段内偏移
        let t0 = keypoints[0].time;
        let keypoints: Vec<Keypoint> = keypoints
            .into_iter()
            .map(|mut kp| {
                kp.time -= t0;
                kp
            })
            .collect();

        let segments = match mode {
            InterpolationMode::Linear => Vec::new(),
            InterpolationMode::MinimumJerk => {
                let mut segments = Vec::with_capacity(keypoints.len() - 1);
                for (index, pair) in keypoints.windows(2).enumerate() {
                    segments.push(Quintic::fit(&pair[0], &pair[1], index)?);
                }
                segments
            }
        };

        Ok(Self {
            keypoints,
            mode,
            segments,
        })
    }

    /// 线性轮廓
    pub fn linear(keypoints: Vec<Keypoint>) -> Result<Self, MotionError> {
        Self::new(InterpolationMode::Linear, keypoints)
    }

    /// 最小加加速度轮廓
    pub fn minimum_jerk(keypoints: Vec<Keypoint>) -> Result<Self, MotionError> {
        Self::new(InterpolationMode::MinimumJerk, keypoints)
    }

    /// 两点轮廓（goto 的常用形态）
    pub fn point_to_point(
        from: f64,
        to: f64,
        duration: f64,
        mode: InterpolationMode,
    ) -> Result<Self, MotionError> {
        Self::new(mode, vec![Keypoint::new(0.0, from), Keypoint::new(duration, to)])
    }

    /// 插值策略
    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    /// 轮廓时长（秒）
    pub fn duration(&self) -> f64 {
        self.keypoints.last().map(|kp| kp.time).unwrap_or(0.0)
    }

    /// 起点位置
    pub fn start_position(&self) -> f64 {
        self.keypoints[0].position
    }

    /// 终点位置
    pub fn end_position(&self) -> f64 {
        self.keypoints[self.keypoints.len() - 1].position
    }

    /// 找到 t 所在的段索引（t 已钳制到 [0, 时长]）
    fn segment_index(&self, t: f64) -> usize {
        // 关键点数 ≥ 2，段数 = 关键点数 − 1
        let last = self.keypoints.len() - 2;
        for (i, pair) in self.keypoints.windows(2).enumerate() {
            if t <= pair[1].time {
                return i;
            }
        }
        last
    }

    /// t 时刻的位置（t 超出范围时取端点值）
    pub fn position_at(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, self.duration());
        let i = self.segment_index(t);
        let (a, b) = (&self.keypoints[i], &self.keypoints[i + 1]);

        match self.mode {
            InterpolationMode::Linear => {
                let alpha = (t - a.time) / (b.time - a.time);
                a.position + (b.position - a.position) * alpha
            }
            InterpolationMode::MinimumJerk => self.segments[i].position(t - a.time),
        }
    }

    /// t 时刻的速度（度/秒）
    pub fn velocity_at(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, self.duration());
        let i = self.segment_index(t);
        let (a, b) = (&self.keypoints[i], &self.keypoints[i + 1]);

        match self.mode {
            InterpolationMode::Linear => (b.position - a.position) / (b.time - a.time),
            InterpolationMode::MinimumJerk => self.segments[i].velocity(t - a.time),
        }
    }

    /// 按采样频率展开为设定点流
    ///
    /// # Panics
    ///
    /// `frequency` 不为正数时 panic。
    pub fn sample(&self, frequency: f64) -> SetpointStream {
        assert!(
            frequency > 0.0,
            "sample frequency must be positive, got: {frequency}"
        );

        let total = (self.duration() * frequency).ceil() as usize;
        SetpointStream {
            profile: self.clone(),
            cursor: 0,
            total: total.max(1),
        }
    }
}

/// 惰性、有限、一次性的设定点流
///
/// `n` 个样本均匀铺满 [0, 时长]：首样本为起点位置，末样本为终点
/// 位置。流不可重置；重放同一轮廓请重新调用 [`Profile::sample`]。
pub struct SetpointStream {
    profile: Profile,
    cursor: usize,
    total: usize,
}

impl SetpointStream {
    /// 总样本数
    pub fn total_samples(&self) -> usize {
        self.total
    }

    /// 播放进度 [0, 1]
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.cursor as f64 / self.total as f64
        }
    }
}

impl Iterator for SetpointStream {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.cursor >= self.total {
            return None;
        }

        let t = if self.total <= 1 {
            self.profile.duration()
        } else {
            self.cursor as f64 / (self.total - 1) as f64 * self.profile.duration()
        };

        self.cursor += 1;
        Some(self.profile.position_at(t))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.cursor;
        (remaining, Some(remaining))
    }
}
