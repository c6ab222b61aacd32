//! 坐标参考系转换
//!
//! 将源投影坐标（米）转换为 WGS84 经纬度（度）。源坐标系固定为
//! Amersfoort / RD New (EPSG:28992)，使用 RD ↔ WGS84 近似多项式，
//! 在荷兰范围内精度优于 1 米。
//!
//! 转换器在构造时建立系数表，整批转换只构造一次，通过引用共享；
//! 构造后只读，可安全地跨线程共享。

use crate::error::TransformError;
use crate::math::Point2;
use serde::{Deserialize, Serialize};

/// 源坐标参考系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceCrs {
    /// Amersfoort / RD New
    #[default]
    #[serde(rename = "EPSG:28992")]
    RdNew,
}

/// 往返转换的文档化容差（米）
pub const ROUND_TRIP_TOLERANCE_M: f64 = 1.0;

/// 多项式的一项：`coef * u^p * v^q`
#[derive(Debug, Clone, Copy)]
struct Term {
    p: i32,
    q: i32,
    coef: f64,
}

/// 二元多项式
#[derive(Debug, Clone)]
struct Polynomial {
    terms: Vec<Term>,
}

impl Polynomial {
    fn new(table: &[(i32, i32, f64)]) -> Self {
        Self {
            terms: table
                .iter()
                .map(|&(p, q, coef)| Term { p, q, coef })
                .collect(),
        }
    }

    fn eval(&self, u: f64, v: f64) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coef * u.powi(t.p) * v.powi(t.q))
            .sum()
    }
}

// RD 原点（Amersfoort）
const RD_X0: f64 = 155_000.0;
const RD_Y0: f64 = 463_000.0;
const RD_PHI0: f64 = 52.155_174_40;
const RD_LAM0: f64 = 5.387_206_21;

// 纬度（角秒），自变量 dX, dY
const RD_LATITUDE: [(i32, i32, f64); 11] = [
    (0, 1, 3235.65389),
    (2, 0, -32.58297),
    (0, 2, -0.24750),
    (2, 1, -0.84978),
    (0, 3, -0.06550),
    (2, 2, -0.01709),
    (1, 0, -0.00738),
    (4, 0, 0.00530),
    (2, 3, -0.00039),
    (4, 1, 0.00033),
    (1, 1, -0.00012),
];

// 经度（角秒），自变量 dX, dY
const RD_LONGITUDE: [(i32, i32, f64); 12] = [
    (1, 0, 5260.52916),
    (1, 1, 105.94684),
    (1, 2, 2.45656),
    (3, 0, -0.81885),
    (1, 3, 0.05594),
    (3, 1, -0.05607),
    (0, 1, 0.01199),
    (3, 2, -0.00256),
    (1, 4, 0.00128),
    (0, 2, 0.00022),
    (2, 0, -0.00022),
    (5, 0, 0.00026),
];

// 东坐标（米），自变量 dPhi, dLam
const RD_EASTING: [(i32, i32, f64); 9] = [
    (0, 1, 190094.945),
    (1, 1, -11832.228),
    (2, 1, -114.221),
    (0, 3, -32.391),
    (1, 0, -0.705),
    (3, 1, -2.340),
    (1, 3, -0.608),
    (0, 2, -0.008),
    (2, 3, 0.148),
];

// 北坐标（米），自变量 dPhi, dLam
const RD_NORTHING: [(i32, i32, f64); 10] = [
    (1, 0, 309056.544),
    (0, 2, 3638.893),
    (2, 0, 73.077),
    (1, 2, -157.984),
    (3, 0, 59.788),
    (0, 1, 0.433),
    (2, 2, -6.439),
    (1, 1, -0.032),
    (0, 4, 0.092),
    (1, 4, -0.054),
];

/// 坐标转换器
#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    latitude: Polynomial,
    longitude: Polynomial,
    easting: Polynomial,
    northing: Polynomial,
}

impl CoordinateTransformer {
    /// 为指定源坐标系建立转换器
    pub fn new(source: SourceCrs) -> Self {
        match source {
            SourceCrs::RdNew => Self {
                latitude: Polynomial::new(&RD_LATITUDE),
                longitude: Polynomial::new(&RD_LONGITUDE),
                easting: Polynomial::new(&RD_EASTING),
                northing: Polynomial::new(&RD_NORTHING),
            },
        }
    }

    /// 投影坐标 → (经度, 纬度)
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), TransformError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(TransformError::NonFinite(x, y));
        }

        let dx = (x - RD_X0) * 1e-5;
        let dy = (y - RD_Y0) * 1e-5;
        let lat = RD_PHI0 + self.latitude.eval(dx, dy) / 3600.0;
        let lon = RD_LAM0 + self.longitude.eval(dx, dy) / 3600.0;

        if !lon.is_finite() || !lat.is_finite() {
            return Err(TransformError::NonFinite(x, y));
        }
        Ok((lon, lat))
    }

    /// (经度, 纬度) → 投影坐标，用于往返校验
    pub fn inverse(&self, lon: f64, lat: f64) -> Result<(f64, f64), TransformError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(TransformError::NonFinite(lon, lat));
        }

        let dphi = 0.36 * (lat - RD_PHI0);
        let dlam = 0.36 * (lon - RD_LAM0);
        Ok((
            RD_X0 + self.easting.eval(dphi, dlam),
            RD_Y0 + self.northing.eval(dphi, dlam),
        ))
    }

    /// 转换单个点，结果的 x 为经度、y 为纬度
    pub fn transform_point(&self, p: &Point2) -> Result<Point2, TransformError> {
        let (lon, lat) = self.transform(p.x, p.y)?;
        Ok(Point2::new(lon, lat))
    }

    /// 转换点序列，任一点失败即整体失败
    pub fn transform_points<'a>(
        &self,
        points: impl IntoIterator<Item = &'a Point2>,
    ) -> Result<Vec<Point2>, TransformError> {
        points.into_iter().map(|p| self.transform_point(p)).collect()
    }
}

impl Default for CoordinateTransformer {
    fn default() -> Self {
        Self::new(SourceCrs::default())
    }
}
