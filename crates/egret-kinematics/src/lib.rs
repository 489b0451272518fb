//! 运动学计算模块
//!
//! 本模块提供 Egret 机器人肢体的纯几何运动学计算，包括：
//! - 基于简化 DH (Denavit-Hartenberg) 记法的连杆链建模
//! - 正向运动学（关节角 → 末端位姿）
//! - 数值逆运动学（末端位姿 → 关节角，阻尼最小二乘迭代）
//!
//! # 设计要点
//!
//! - **纯几何**：本 crate 不持有任何可变状态，所有计算都是确定性的
//! - **显式收敛标志**：逆解不保证收敛，结果通过 [`IkSolution`] 返回
//!   最优迭代点和 `converged` 标志，由调用方决定是否接受近似解
//! - **边界投影**：每次迭代都将关节角投影到各关节的角度边界内
//!
//! # 使用场景
//!
//! 上层运动 API（如手臂的 goto 目标位姿）先通过本模块求出关节角，
//! 再交给轨迹插值器生成平滑的设定点流。

pub mod chain;
pub mod solver;

pub use chain::{Chain, Link};
pub use solver::{IkSolution, pose_dist, position_dist, rotation_dist};
