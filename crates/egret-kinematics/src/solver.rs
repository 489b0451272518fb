//! 数值逆运动学求解器
//!
//! 采用阻尼最小二乘（damped least squares / Levenberg-Marquardt）迭代：
//! 对 6 维位姿误差（平移 + 加权姿态）做数值雅可比线性化，每步求解
//! `(JᵀJ + λ²I)·Δq = −Jᵀe`，并把迭代点投影到关节边界内。
//!
//! 位姿距离沿用「1° 姿态误差 ≈ 1mm 平移误差」的加权约定，
//! 平移与姿态误差可以直接相加比较。
//!
//! 求解不保证收敛：达到容差即成功，否则在迭代上限处返回最优迭代点，
//! `converged` 标志置为 false，由调用方决定重试或接受近似解。

use nalgebra::{DMatrix, DVector, Matrix3, Matrix4, Rotation3, Vector3, Vector6};
use tracing::{debug, trace};

use crate::chain::Chain;

/// 姿态误差权重：1 弧度的姿态误差折算成的平移距离
///
/// 即 1° ≈ 1mm（以链的长度单位为 mm 计）。
const ROTATION_WEIGHT: f64 = 180.0 / std::f64::consts::PI * 1e-3;

/// 数值雅可比的差分步长（弧度）
const JACOBIAN_EPS: f64 = 1e-6;

/// 单次迭代允许的最大关节角增量（弧度）
///
/// 数值雅可比只在当前点附近有效，限制步长避免外推过远。
const MAX_STEP: f64 = 0.5;

/// 逆运动学求解结果
///
/// 无论是否收敛都返回迄今最优的迭代点；`converged` 为 false 时
/// `angles` 是最佳近似解，`residual` 给出剩余位姿距离。
#[derive(Debug, Clone)]
pub struct IkSolution {
    /// 关节角（弧度），已投影到各关节边界内
    pub angles: Vec<f64>,
    /// 是否在容差内收敛
    pub converged: bool,
    /// 剩余位姿距离（见 [`pose_dist`]）
    pub residual: f64,
}

/// 两个位姿间的平移距离（欧氏距离）
pub fn position_dist(a: &Matrix4<f64>, b: &Matrix4<f64>) -> f64 {
    (translation(a) - translation(b)).norm()
}

/// 两个位姿间的姿态距离（相对旋转的转角，弧度）
pub fn rotation_dist(a: &Matrix4<f64>, b: &Matrix4<f64>) -> f64 {
    let r = rotation(a) * rotation(b).transpose();
    let c = ((r.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    c.acos()
}

/// 组合位姿距离：平移距离 + 加权姿态距离（1° ≈ 1mm）
pub fn pose_dist(a: &Matrix4<f64>, b: &Matrix4<f64>) -> f64 {
    position_dist(a, b) + rotation_dist(a, b).to_degrees() * 1e-3
}

fn translation(m: &Matrix4<f64>) -> Vector3<f64> {
    m.fixed_view::<3, 1>(0, 3).into_owned()
}

fn rotation(m: &Matrix4<f64>) -> Matrix3<f64> {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

/// 6 维位姿误差向量：[Δp; w·轴角(R·R_tgtᵀ)]
fn pose_error(pose: &Matrix4<f64>, target: &Matrix4<f64>) -> Vector6<f64> {
    let dp = translation(pose) - translation(target);
    let r_rel = rotation(pose) * rotation(target).transpose();
    let w = Rotation3::from_matrix_unchecked(r_rel).scaled_axis() * ROTATION_WEIGHT;

    Vector6::new(dp.x, dp.y, dp.z, w.x, w.y, w.z)
}

impl Chain {
    /// 逆运动学：迭代逼近目标位姿
    ///
    /// # 参数
    ///
    /// - `target`: 目标末端位姿（齐次矩阵）
    /// - `initial_guess`: 初始关节角（弧度），用于引导迭代
    /// - `max_iterations`: 迭代上限
    /// - `tolerance`: 收敛容差（位姿距离，见 [`pose_dist`]）
    ///
    /// # 返回
    ///
    /// [`IkSolution`]。不收敛不是错误：返回最优迭代点并置
    /// `converged = false`，重试策略由调用方决定。
    ///
    /// # Panics
    ///
    /// `initial_guess` 长度与连杆数不一致时 panic（编程错误）。
    pub fn inverse(
        &self,
        target: &Matrix4<f64>,
        initial_guess: &[f64],
        max_iterations: usize,
        tolerance: f64,
    ) -> IkSolution {
        assert_eq!(
            initial_guess.len(),
            self.len(),
            "initial guess length ({}) does not match link count ({})",
            initial_guess.len(),
            self.len(),
        );

        let n = self.len();
        let mut q = initial_guess.to_vec();
        self.clamp_to_bounds(&mut q);

        let mut residual = pose_dist(&self.forward(&q), target);
        let mut best_q = q.clone();
        let mut best_residual = residual;
        let mut lambda = 1e-3_f64;

        for iter in 0..max_iterations {
            if best_residual < tolerance {
                trace!(iterations = iter, residual = best_residual, "ik converged");
                return IkSolution {
                    angles: best_q,
                    converged: true,
                    residual: best_residual,
                };
            }

            let e = pose_error(&self.forward(&q), target);
            let e_dyn = DVector::from_column_slice(e.as_slice());
            let j = self.numeric_jacobian(&q, target);
            let jt = j.transpose();

            let a = &jt * &j + DMatrix::identity(n, n) * (lambda * lambda);
            let b = -(&jt * &e_dyn);

            let Some(step) = a.lu().solve(&b) else {
                // λ > 0 时系统正定，理论上不会到这里；加大阻尼重试
                lambda = (lambda * 10.0).min(1e6);
                continue;
            };

            let amax = step.amax();
            let scale = if amax > MAX_STEP { MAX_STEP / amax } else { 1.0 };

            let mut candidate = q.clone();
            for (qk, sk) in candidate.iter_mut().zip(step.iter()) {
                *qk += sk * scale;
            }
            self.clamp_to_bounds(&mut candidate);

            let candidate_residual = pose_dist(&self.forward(&candidate), target);
            if candidate_residual < residual {
                // 接受：减小阻尼，向高斯-牛顿靠拢
                q = candidate;
                residual = candidate_residual;
                lambda = (lambda * 0.7).max(1e-9);

                if residual < best_residual {
                    best_q = q.clone();
                    best_residual = residual;
                }
            } else {
                // 拒绝：加大阻尼，退回梯度方向的小步
                lambda = (lambda * 2.5).min(1e6);
            }
        }

        let converged = best_residual < tolerance;
        if !converged {
            debug!(
                residual = best_residual,
                tolerance, "ik did not reach tolerance, returning best iterate"
            );
        }

        IkSolution {
            angles: best_q,
            converged,
            residual: best_residual,
        }
    }

    /// 位姿误差对关节角的数值雅可比（中心差分，6×n）
    fn numeric_jacobian(&self, q: &[f64], target: &Matrix4<f64>) -> DMatrix<f64> {
        let n = self.len();
        let mut j = DMatrix::zeros(6, n);
        let mut probe = q.to_vec();

        for k in 0..n {
            let original = probe[k];

            probe[k] = original + JACOBIAN_EPS;
            let plus = pose_error(&self.forward(&probe), target);

            probe[k] = original - JACOBIAN_EPS;
            let minus = pose_error(&self.forward(&probe), target);

            probe[k] = original;

            for i in 0..6 {
                j[(i, k)] = (plus[i] - minus[i]) / (2.0 * JACOBIAN_EPS);
            }
        }

        j
    }
}
