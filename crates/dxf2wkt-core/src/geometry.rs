//! 几何图元定义
//!
//! 与DXF实体一一对应的平面几何数据，以及转换所需的采样方法：
//! - 线段 (Line)
//! - 多段线 (Polyline)
//! - 圆 (Circle)
//! - 圆弧 (Arc)
//! - 椭圆 (Ellipse)
//! - 点 (Point)
//! - 样条曲线 (Spline)
//! - 文本 (Text)
//! - 面 (Face，对应 3DFACE / SOLID / TRACE)
//! - 填充 (Hatch)
//!
//! 所有坐标都是源投影坐标系中的原始值，采样结果同样未经投影转换。

use crate::math::{points_approx_eq, Point2, Vector2, Vector3, EPSILON};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// 点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub position: Point2,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point2::new(x, y),
        }
    }

    pub fn from_point2(position: Point2) -> Self {
        Self { position }
    }
}

/// 线段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// 计算线段长度
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// 多段线（LWPOLYLINE 与 POLYLINE 共用）
///
/// 凸度（bulge）不参与WKT转换，顶点之间始终按直线连接。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<Point2>,
    /// 是否闭合
    pub closed: bool,
}

impl Polyline {
    pub fn new(vertices: Vec<Point2>, closed: bool) -> Self {
        Self { vertices, closed }
    }

    /// 顶点数量
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 不计与首点重合的末点时的顶点数
    pub fn distinct_vertex_count(&self) -> usize {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) if self.vertices.len() > 1 && points_approx_eq(first, last) => {
                self.vertices.len() - 1
            }
            _ => self.vertices.len(),
        }
    }

    /// 是否应作为多边形输出：闭合且至少3个不同顶点
    pub fn is_area(&self) -> bool {
        self.closed && self.distinct_vertex_count() >= 3
    }
}

/// 圆
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// 获取圆上指定角度（弧度）的点
    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    /// 按等角步长采样一周，不含闭合点
    pub fn sample_points(&self, segments: usize) -> Vec<Point2> {
        (0..segments)
            .map(|i| self.point_at_angle(TAU * i as f64 / segments as f64))
            .collect()
    }
}

/// 圆弧
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    /// 起始角度（度，与DXF一致）
    pub start_angle: f64,
    /// 终止角度（度）
    pub end_angle: f64,
}

impl Arc {
    pub fn new(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// 逆时针扫过的角度（度）
    ///
    /// 终止角小于起始角时跨越0°，加上360°。
    pub fn sweep_degrees(&self) -> f64 {
        let end = if self.end_angle < self.start_angle {
            self.end_angle + 360.0
        } else {
            self.end_angle
        };
        end - self.start_angle
    }

    /// 分段数：每 `step_degrees` 一段，至少 `min_segments` 段
    pub fn segment_count(&self, step_degrees: f64, min_segments: usize) -> usize {
        let by_step = (self.sweep_degrees() / step_degrees) as usize;
        by_step.max(min_segments)
    }

    /// 采样圆弧，包含两个端点
    pub fn sample_points(&self, step_degrees: f64, min_segments: usize) -> Vec<Point2> {
        let segments = self.segment_count(step_degrees, min_segments);
        let sweep = self.sweep_degrees();
        (0..=segments)
            .map(|i| {
                let angle = self.start_angle + sweep * i as f64 / segments as f64;
                let rad = angle.to_radians();
                Point2::new(
                    self.center.x + self.radius * rad.cos(),
                    self.center.y + self.radius * rad.sin(),
                )
            })
            .collect()
    }
}

/// 椭圆
///
/// 使用中心点 + 长轴向量 + 短长轴比例定义（与DXF一致）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ellipse {
    /// 中心点
    pub center: Point2,
    /// 长轴端点（相对于中心的向量）
    pub major_axis: Vector2,
    /// 短轴与长轴的比例
    pub ratio: f64,
    /// 起始参数（弧度）
    pub start_param: f64,
    /// 终止参数（弧度）
    pub end_param: f64,
}

impl Ellipse {
    /// 创建完整椭圆
    pub fn new(center: Point2, major_axis: Vector2, ratio: f64) -> Self {
        Self {
            center,
            major_axis,
            ratio,
            start_param: 0.0,
            end_param: TAU,
        }
    }

    /// 创建椭圆弧
    pub fn arc(center: Point2, major_axis: Vector2, ratio: f64, start_param: f64, end_param: f64) -> Self {
        Self {
            center,
            major_axis,
            ratio,
            start_param,
            end_param,
        }
    }

    /// 长轴半径
    pub fn major_radius(&self) -> f64 {
        self.major_axis.norm()
    }

    /// 短轴半径
    pub fn minor_radius(&self) -> f64 {
        self.major_radius() * self.ratio
    }

    /// 长轴旋转角度（相对于X轴）
    pub fn rotation(&self) -> f64 {
        self.major_axis.y.atan2(self.major_axis.x)
    }

    /// 参数方程上的点：先在局部坐标系取点，再旋转、平移
    pub fn point_at_param(&self, t: f64) -> Point2 {
        let a = self.major_radius();
        let b = self.minor_radius();
        let (sin_r, cos_r) = self.rotation().sin_cos();
        let lx = a * t.cos();
        let ly = b * t.sin();
        Point2::new(
            self.center.x + lx * cos_r - ly * sin_r,
            self.center.y + lx * sin_r + ly * cos_r,
        )
    }

    /// 整周等参数采样，不含闭合点
    ///
    /// 起止参数被忽略：椭圆弧同样按整个椭圆输出。
    pub fn sample_points(&self, segments: usize) -> Vec<Point2> {
        (0..segments)
            .map(|i| self.point_at_param(TAU * i as f64 / segments as f64))
            .collect()
    }
}

/// 样条曲线
///
/// 支持 B-样条和 NURBS（`weights` 非空时），使用 De Boor 算法求值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spline {
    /// 曲线阶数
    pub degree: u8,
    /// 控制点
    pub control_points: Vec<Point2>,
    /// 节点向量
    pub knots: Vec<f64>,
    /// 权重，为空表示全部为1
    pub weights: Vec<f64>,
    /// 拟合点
    pub fit_points: Vec<Point2>,
    /// 是否闭合
    pub closed: bool,
}

impl Spline {
    /// 创建一个空的样条
    pub fn new(degree: u8) -> Self {
        Self {
            degree,
            control_points: Vec::new(),
            knots: Vec::new(),
            weights: Vec::new(),
            fit_points: Vec::new(),
            closed: false,
        }
    }

    /// 从控制点创建（节点向量留空，求值时自动生成钳位均匀节点）
    pub fn from_control_points(control_points: Vec<Point2>, degree: u8) -> Self {
        Self {
            control_points,
            ..Self::new(degree)
        }
    }

    /// 控制点是否足以用 De Boor 求值
    fn has_control_polygon(&self) -> bool {
        self.degree >= 1 && self.control_points.len() > self.degree as usize
    }

    /// 有效节点向量：长度不符时生成钳位均匀节点
    fn effective_knots(&self) -> Vec<f64> {
        let n = self.control_points.len();
        let p = self.degree as usize;
        if self.knots.len() == n + p + 1 {
            return self.knots.clone();
        }

        let inner = n - p;
        (0..n + p + 1)
            .map(|i| {
                if i <= p {
                    0.0
                } else if i >= n {
                    inner as f64
                } else {
                    (i - p) as f64
                }
            })
            .collect()
    }

    fn weight(&self, index: usize) -> f64 {
        if self.weights.len() == self.control_points.len() {
            self.weights[index]
        } else {
            1.0
        }
    }

    /// De Boor 求值（齐次坐标，兼容有理样条）
    fn evaluate(&self, knots: &[f64], t: f64) -> Point2 {
        let n = self.control_points.len();
        let p = self.degree as usize;

        let mut span = p;
        while span < n - 1 && knots[span + 1] <= t {
            span += 1;
        }

        let mut d: Vec<Vector3> = (0..=p)
            .map(|j| {
                let idx = span - p + j;
                let w = self.weight(idx);
                let cp = self.control_points[idx];
                Vector3::new(cp.x * w, cp.y * w, w)
            })
            .collect();

        for r in 1..=p {
            for j in (r..=p).rev() {
                let i = span - p + j;
                let left = knots[i];
                let right = knots[i + p + 1 - r];
                let denom = right - left;
                let alpha = if denom.abs() < EPSILON {
                    0.0
                } else {
                    (t - left) / denom
                };
                d[j] = d[j - 1] * (1.0 - alpha) + d[j] * alpha;
            }
        }

        let h = d[p];
        if h.z.abs() < EPSILON {
            Point2::new(h.x, h.y)
        } else {
            Point2::new(h.x / h.z, h.y / h.z)
        }
    }

    /// 将样条近似为折线
    ///
    /// 控制多边形可用时按参数区间等分 `segments` 段求值；否则退回到拟合点。
    /// 少于两个点时返回 `None`。
    pub fn approximate(&self, segments: usize) -> Option<Vec<Point2>> {
        if self.has_control_polygon() && segments > 0 {
            let knots = self.effective_knots();
            let p = self.degree as usize;
            let n = self.control_points.len();
            let (start, end) = (knots[p], knots[n]);
            if end - start > EPSILON {
                let points = (0..=segments)
                    .map(|i| self.evaluate(&knots, start + (end - start) * i as f64 / segments as f64))
                    .collect();
                return Some(points);
            }
        }

        if self.fit_points.len() >= 2 {
            return Some(self.fit_points.clone());
        }

        None
    }
}

/// 文本对齐方式以外的简化文本（TEXT / MTEXT 共用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    /// 插入点
    pub position: Point2,
    /// 文本内容
    pub content: String,
    /// 文本高度
    pub height: f64,
    /// 旋转角度（度）
    pub rotation: f64,
}

impl Text {
    pub fn new(position: Point2, content: impl Into<String>, height: f64) -> Self {
        Self {
            position,
            content: content.into(),
            height,
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }
}

/// 平面面片（3DFACE / SOLID / TRACE）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    /// 按边界顺序排列的顶点，不含闭合点
    pub vertices: Vec<Point2>,
}

impl Face {
    pub fn new(vertices: Vec<Point2>) -> Self {
        Self { vertices }
    }

    /// 3DFACE：角点按 1,2,3,4 的顺序围成边界
    pub fn from_face_corners(corners: [Point2; 4]) -> Self {
        Self::new(dedup_trailing(corners.to_vec()))
    }

    /// SOLID / TRACE：DXF 中角点按 Z 字形存储，边界顺序为 1,2,4,3
    pub fn from_solid_corners(corners: [Point2; 4]) -> Self {
        let [c1, c2, c3, c4] = corners;
        let mut vertices = vec![c1, c2, c4, c3];
        // 三角形 SOLID 的第3、4角点重合
        if points_approx_eq(&c3, &c4) {
            vertices.truncate(3);
        }
        Self::new(dedup_trailing(vertices))
    }
}

/// 去掉与前一个点重合的顶点（三角形面片的重复角点）
fn dedup_trailing(mut vertices: Vec<Point2>) -> Vec<Point2> {
    vertices.dedup_by(|b, a| points_approx_eq(a, b));
    vertices
}

/// 填充边界路径
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HatchPath {
    /// 多段线边界，携带顶点
    Polyline { vertices: Vec<Point2>, closed: bool },
    /// 由直线/圆弧/椭圆/样条边组成的边界，不携带顶点
    Edges { edge_count: usize },
}

impl HatchPath {
    /// 路径的顶点；边界由边组成时为 `None`
    pub fn vertices(&self) -> Option<&[Point2]> {
        match self {
            HatchPath::Polyline { vertices, .. } => Some(vertices),
            HatchPath::Edges { .. } => None,
        }
    }
}

/// 填充
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hatch {
    /// 边界路径
    pub paths: Vec<HatchPath>,
    /// 图案名称
    pub pattern_name: String,
    /// 是否为实心填充
    pub solid: bool,
}

impl Hatch {
    pub fn new(paths: Vec<HatchPath>, pattern_name: impl Into<String>, solid: bool) -> Self {
        Self {
            paths,
            pattern_name: pattern_name.into(),
            solid,
        }
    }

    /// 具有顶点的边界路径
    pub fn vertex_paths(&self) -> impl Iterator<Item = &[Point2]> {
        self.paths.iter().filter_map(HatchPath::vertices)
    }
}
