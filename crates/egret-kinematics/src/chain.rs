//! 连杆链定义与正向运动学
//!
//! 一条 [`Chain`] 由有序的 [`Link`] 序列和一个根变换组成。
//! 链一经构建不再变化；关节角向量长度必须与连杆数一致。

use nalgebra::Matrix4;

/// 单个连杆（简化 DH 记法）
///
/// 四个 DH 参数描述该连杆相对前一连杆的几何关系：
///
/// | 参数 | 含义 |
/// |------|------|
/// | `length` | 连杆长度 a（沿本地 x 轴平移） |
/// | `twist` | 扭转角 α（绕本地 x 轴旋转，弧度） |
/// | `offset` | 连杆偏距 d（沿 z 轴平移） |
/// | `theta_ref` | 关节角参考值 θ₀（弧度），实际关节角 = θ₀ + q |
///
/// 另附每个关节的角度边界，逆解迭代会投影到该边界内。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    /// 连杆长度 a
    pub length: f64,
    /// 扭转角 α（弧度）
    pub twist: f64,
    /// 连杆偏距 d
    pub offset: f64,
    /// 关节角参考值 θ₀（弧度）
    pub theta_ref: f64,
    /// 关节角边界 (下限, 上限)（弧度）
    pub bounds: (f64, f64),
}

impl Link {
    /// 创建一个新连杆，默认边界为整圈 (-π, π]
    pub fn new(length: f64, twist: f64, offset: f64, theta_ref: f64) -> Self {
        Self {
            length,
            twist,
            offset,
            theta_ref,
            bounds: (-std::f64::consts::PI, std::f64::consts::PI),
        }
    }

    /// 指定关节角边界（弧度）
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        debug_assert!(lower <= upper, "link bounds reversed: {lower} > {upper}");
        self.bounds = (lower, upper);
        self
    }

    /// 给定关节角 q，计算该连杆的局部齐次变换矩阵
    ///
    /// 采用标准 DH 组合顺序：`Rz(θ₀+q) · Tz(d) · Tx(a) · Rx(α)`。
    pub fn transform(&self, q: f64) -> Matrix4<f64> {
        let theta = self.theta_ref + q;
        let (st, ct) = theta.sin_cos();
        let (sa, ca) = self.twist.sin_cos();

        #[rustfmt::skip]
        let m = Matrix4::new(
            ct, -st * ca,  st * sa, self.length * ct,
            st,  ct * ca, -ct * sa, self.length * st,
            0.0,      sa,       ca, self.offset,
            0.0,     0.0,      0.0, 1.0,
        );
        m
    }

    /// 将关节角钳制到本连杆的边界内
    pub fn clamp(&self, q: f64) -> f64 {
        q.clamp(self.bounds.0, self.bounds.1)
    }
}

/// 由连杆组成的运动学链
///
/// 持有根变换（默认单位阵）和有序连杆序列。
/// 不变式：所有操作的关节角向量长度等于连杆数，
/// 不满足视为编程错误，直接 panic。
#[derive(Debug, Clone)]
pub struct Chain {
    base: Matrix4<f64>,
    links: Vec<Link>,
}

impl Chain {
    /// 以单位根变换创建链
    pub fn new(links: Vec<Link>) -> Self {
        Self {
            base: Matrix4::identity(),
            links,
        }
    }

    /// 指定根变换（如肩部相对躯干的固定安装位姿）
    pub fn with_base(base: Matrix4<f64>, links: Vec<Link>) -> Self {
        Self { base, links }
    }

    /// 连杆数（= 关节数）
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// 链是否为空
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// 连杆序列
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// 根变换
    pub fn base(&self) -> &Matrix4<f64> {
        &self.base
    }

    /// 正向运动学：按链序组合各连杆变换，返回末端执行器位姿
    ///
    /// # Panics
    ///
    /// 关节角数量与连杆数不一致时 panic（编程错误，非运行时故障）。
    pub fn forward(&self, angles: &[f64]) -> Matrix4<f64> {
        assert_eq!(
            angles.len(),
            self.links.len(),
            "joint angle count ({}) does not match link count ({})",
            angles.len(),
            self.links.len(),
        );

        let mut pose = self.base;
        for (link, &q) in self.links.iter().zip(angles) {
            pose *= link.transform(q);
        }
        pose
    }

    /// 将关节角向量逐个投影到各关节边界内
    pub fn clamp_to_bounds(&self, angles: &mut [f64]) {
        for (link, q) in self.links.iter().zip(angles.iter_mut()) {
            *q = link.clamp(*q);
        }
    }
}
