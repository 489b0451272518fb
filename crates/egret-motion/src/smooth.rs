//! 录制轨迹平滑
//!
//! 手把手示教录下的轨迹带着读数噪声和手抖，直接回放会让电机
//! 发出「沙沙」的微抖。`cubic_smooth` 把密集采样先压缩成少量
//! 关键点，再用 Catmull-Rom 三次样条重采样回去：关键点越少，
//! 平滑越强。端点位置保持不变。

use crate::error::MotionError;
use crate::trajectory::ActuatorTrajectory;

/// 在样本序列的分数位置处线性取值（frac ∈ [0, 1]）
fn sample_at_fraction(samples: &[f64], frac: f64) -> f64 {
    let scaled = frac * (samples.len() - 1) as f64;
    let index = scaled.floor() as usize;
    if index + 1 >= samples.len() {
        return samples[samples.len() - 1];
    }
    let alpha = scaled - index as f64;
    samples[index] * (1.0 - alpha) + samples[index + 1] * alpha
}

/// Catmull-Rom 样条过给定控制点重采样为 n 个输出样本
fn catmull_rom_resample(points: &[f64], n: usize) -> Vec<f64> {
    let m = points.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![points[m - 1]];
    }

    (0..n)
        .map(|k| {
            let s = k as f64 / (n - 1) as f64 * (m - 1) as f64;
            let i = (s.floor() as usize).min(m - 2);
            let t = s - i as f64;

            let p1 = points[i];
            let p2 = points[i + 1];
            let p0 = points[i.saturating_sub(1)];
            let p3 = points[(i + 2).min(m - 1)];

            // 切线取中心差分，端点退化为单侧差分
            let m1 = (p2 - p0) / 2.0;
            let m2 = (p3 - p1) / 2.0;

            let t2 = t * t;
            let t3 = t2 * t;
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;

            h00 * p1 + h10 * m1 + h01 * p2 + h11 * m2
        })
        .collect()
}

/// 轨迹三次平滑
///
/// # 参数
///
/// - `trajectory`: 待平滑的设定点流（通常来自录制）
/// - `keypoint_count`: 压缩后的关键点数（≥ 2，越少越平滑）
/// - `output_len`: 输出样本数；`None` 保持与输入相同
///
/// 过短的流（样本数 < 2）原样保留。
pub fn cubic_smooth(
    trajectory: &ActuatorTrajectory,
    keypoint_count: usize,
    output_len: Option<usize>,
) -> Result<ActuatorTrajectory, MotionError> {
    if keypoint_count < 2 {
        return Err(MotionError::NotEnoughKeypoints);
    }

    let mut smoothed = ActuatorTrajectory::new(trajectory.frequency);
    for (name, samples) in &trajectory.streams {
        if samples.len() < 2 {
            smoothed.insert(name.clone(), samples.clone());
            continue;
        }

        let n_out = output_len.unwrap_or(samples.len());
        let keypoints: Vec<f64> = (0..keypoint_count)
            .map(|i| sample_at_fraction(samples, i as f64 / (keypoint_count - 1) as f64))
            .collect();

        smoothed.insert(name.clone(), catmull_rom_resample(&keypoints, n_out));
    }
    Ok(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// 逐样本二阶差分绝对值之和，作为粗糙度度量
    fn roughness(samples: &[f64]) -> f64 {
        samples
            .windows(3)
            .map(|w| (w[2] - 2.0 * w[1] + w[0]).abs())
            .sum()
    }

    #[test]
    fn test_smoothing_reduces_noise() {
        let mut rng = StdRng::seed_from_u64(7);
        let noisy: Vec<f64> = (0..200)
            .map(|k| k as f64 * 0.25 + rng.gen_range(-0.5..0.5))
            .collect();

        let mut traj = ActuatorTrajectory::new(100.0);
        traj.insert("arm.shoulder_pitch", noisy.clone());

        let smoothed = cubic_smooth(&traj, 12, None).unwrap();
        let result = &smoothed.streams["arm.shoulder_pitch"];

        assert_eq!(result.len(), noisy.len());
        assert!(roughness(result) < roughness(&noisy) / 5.0);
    }

    #[test]
    fn test_endpoints_preserved() {
        let samples: Vec<f64> = (0..100).map(|k| (k as f64 * 0.1).sin() * 20.0).collect();
        let mut traj = ActuatorTrajectory::new(100.0);
        traj.insert("a", samples.clone());

        let smoothed = cubic_smooth(&traj, 10, None).unwrap();
        let result = &smoothed.streams["a"];
        assert!((result[0] - samples[0]).abs() < 1e-9);
        assert!((result.last().unwrap() - samples.last().unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_constant_stream_stays_constant() {
        let mut traj = ActuatorTrajectory::new(100.0);
        traj.insert("a", vec![13.5; 80]);

        let smoothed = cubic_smooth(&traj, 5, None).unwrap();
        for v in &smoothed.streams["a"] {
            assert!((v - 13.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_output_length_override() {
        let mut traj = ActuatorTrajectory::new(100.0);
        traj.insert("a", (0..50).map(|k| k as f64).collect());

        let smoothed = cubic_smooth(&traj, 8, Some(200)).unwrap();
        assert_eq!(smoothed.streams["a"].len(), 200);
    }

    #[test]
    fn test_too_few_keypoints_rejected() {
        let traj = ActuatorTrajectory::new(100.0);
        assert!(matches!(
            cubic_smooth(&traj, 1, None),
            Err(MotionError::NotEnoughKeypoints)
        ));
    }

    #[test]
    fn test_short_stream_passthrough() {
        let mut traj = ActuatorTrajectory::new(100.0);
        traj.insert("a", vec![4.2]);
        let smoothed = cubic_smooth(&traj, 4, None).unwrap();
        assert_eq!(smoothed.streams["a"], vec![4.2]);
    }
}
