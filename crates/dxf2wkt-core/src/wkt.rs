//! WKT (Well-Known Text) 几何
//!
//! 只覆盖转换器产生的四种类型：POINT、LINESTRING、POLYGON、MULTIPOLYGON。
//! 坐标写作 `x y`，顶点之间用逗号分隔，环以重复首点闭合。

use crate::math::{points_approx_eq, Point2};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// WKT 几何
#[derive(Debug, Clone, PartialEq)]
pub enum WktGeometry {
    Point(Point2),
    LineString(Vec<Point2>),
    /// 外环（转换器不产生内环）
    Polygon(Vec<Point2>),
    MultiPolygon(Vec<Vec<Point2>>),
}

impl WktGeometry {
    /// 几何类型关键字
    pub fn type_name(&self) -> &'static str {
        match self {
            WktGeometry::Point(_) => "POINT",
            WktGeometry::LineString(_) => "LINESTRING",
            WktGeometry::Polygon(_) => "POLYGON",
            WktGeometry::MultiPolygon(_) => "MULTIPOLYGON",
        }
    }

    /// 所有环（POINT / LINESTRING 无环）
    pub fn rings(&self) -> Vec<&[Point2]> {
        match self {
            WktGeometry::Polygon(ring) => vec![ring.as_slice()],
            WktGeometry::MultiPolygon(rings) => rings.iter().map(Vec::as_slice).collect(),
            _ => Vec::new(),
        }
    }

    /// 坐标总数
    pub fn coordinate_count(&self) -> usize {
        match self {
            WktGeometry::Point(_) => 1,
            WktGeometry::LineString(points) | WktGeometry::Polygon(points) => points.len(),
            WktGeometry::MultiPolygon(rings) => rings.iter().map(Vec::len).sum(),
        }
    }
}

/// 闭合环：末点与首点近似相等时替换为首点，否则追加首点
///
/// 处理后首末坐标严格相等。
pub fn close_ring(ring: &mut Vec<Point2>) {
    let Some(first) = ring.first().copied() else {
        return;
    };
    if ring.len() > 1 {
        if let Some(last) = ring.last_mut() {
            if points_approx_eq(last, &first) {
                *last = first;
                return;
            }
        }
    }
    ring.push(first);
}

fn write_coords(f: &mut fmt::Formatter<'_>, points: &[Point2]) -> fmt::Result {
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{} {}", p.x, p.y)?;
    }
    Ok(())
}

impl fmt::Display for WktGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WktGeometry::Point(p) => write!(f, "POINT({} {})", p.x, p.y),
            WktGeometry::LineString(points) => {
                f.write_str("LINESTRING(")?;
                write_coords(f, points)?;
                f.write_str(")")
            }
            WktGeometry::Polygon(ring) => {
                f.write_str("POLYGON((")?;
                write_coords(f, ring)?;
                f.write_str("))")
            }
            WktGeometry::MultiPolygon(rings) => {
                f.write_str("MULTIPOLYGON(")?;
                for (i, ring) in rings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("((")?;
                    write_coords(f, ring)?;
                    f.write_str("))")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// WKT 解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WktParseError {
    #[error("Unknown geometry type: {0}")]
    UnknownType(String),

    #[error("Malformed WKT: {0}")]
    Malformed(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

/// 去掉一层括号
fn strip_parens(s: &str) -> Result<&str, WktParseError> {
    let s = s.trim();
    s.strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| WktParseError::Malformed(s.to_string()))
}

fn parse_coord(s: &str) -> Result<Point2, WktParseError> {
    let mut parts = s.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(WktParseError::InvalidCoordinate(s.to_string()));
    };
    let x: f64 = x
        .parse()
        .map_err(|_| WktParseError::InvalidCoordinate(s.to_string()))?;
    let y: f64 = y
        .parse()
        .map_err(|_| WktParseError::InvalidCoordinate(s.to_string()))?;
    Ok(Point2::new(x, y))
}

fn parse_coords(s: &str) -> Result<Vec<Point2>, WktParseError> {
    s.split(',').map(parse_coord).collect()
}

/// 按顶层逗号拆分 `((..)), ((..))`
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_ring(s: &str) -> Result<Vec<Point2>, WktParseError> {
    let ring = parse_coords(strip_parens(s)?)?;
    if ring.len() < 4 || ring.first() != ring.last() {
        return Err(WktParseError::Malformed(format!("ring is not closed: {}", s.trim())));
    }
    Ok(ring)
}

impl FromStr for WktGeometry {
    type Err = WktParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let open = s
            .find('(')
            .ok_or_else(|| WktParseError::Malformed(s.to_string()))?;
        let keyword = s[..open].trim().to_ascii_uppercase();
        let body = strip_parens(&s[open..])?;

        match keyword.as_str() {
            "POINT" => Ok(WktGeometry::Point(parse_coord(body)?)),
            "LINESTRING" => {
                let points = parse_coords(body)?;
                if points.len() < 2 {
                    return Err(WktParseError::Malformed(s.to_string()));
                }
                Ok(WktGeometry::LineString(points))
            }
            "POLYGON" => {
                let rings = split_top_level(body);
                let outer = rings
                    .first()
                    .ok_or_else(|| WktParseError::Malformed(s.to_string()))?;
                Ok(WktGeometry::Polygon(parse_ring(outer)?))
            }
            "MULTIPOLYGON" => {
                let rings = split_top_level(body)
                    .into_iter()
                    .map(|polygon| {
                        let inner = strip_parens(polygon)?;
                        let outer = split_top_level(inner)
                            .into_iter()
                            .next()
                            .ok_or_else(|| WktParseError::Malformed(polygon.to_string()))?;
                        parse_ring(outer)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(WktGeometry::MultiPolygon(rings))
            }
            other => Err(WktParseError::UnknownType(other.to_string())),
        }
    }
}
