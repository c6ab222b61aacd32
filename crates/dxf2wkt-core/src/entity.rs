//! CAD实体
//!
//! 解析后的DXF实体：图层、颜色和按类型区分的几何数据。
//! 不支持的实体类型同样保留为 [`Geometry::Unsupported`]，由转换器显式跳过。

use crate::geometry::{Arc, Circle, Ellipse, Face, Hatch, Line, Point, Polyline, Spline, Text};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 实体几何数据（按DXF实体类型区分）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Geometry {
    Line(Line),
    LwPolyline(Polyline),
    Polyline(Polyline),
    Circle(Circle),
    Arc(Arc),
    Ellipse(Ellipse),
    Point(Point),
    Spline(Spline),
    Text(Text),
    MText(Text),
    Face(Face),
    Solid(Face),
    Trace(Face),
    Hatch(Hatch),
    /// 不支持的实体，保存其DXF类型名
    Unsupported(String),
}

impl Geometry {
    /// 对应的实体类型标签
    pub fn entity_type(&self) -> EntityType {
        match self {
            Geometry::Line(_) => EntityType::Line,
            Geometry::LwPolyline(_) => EntityType::LwPolyline,
            Geometry::Polyline(_) => EntityType::Polyline,
            Geometry::Circle(_) => EntityType::Circle,
            Geometry::Arc(_) => EntityType::Arc,
            Geometry::Ellipse(_) => EntityType::Ellipse,
            Geometry::Point(_) => EntityType::Point,
            Geometry::Spline(_) => EntityType::Spline,
            Geometry::Text(_) => EntityType::Text,
            Geometry::MText(_) => EntityType::MText,
            Geometry::Face(_) => EntityType::Face,
            Geometry::Solid(_) => EntityType::Solid,
            Geometry::Trace(_) => EntityType::Trace,
            Geometry::Hatch(_) => EntityType::Hatch,
            Geometry::Unsupported(name) => EntityType::Unsupported(name.clone()),
        }
    }
}

/// 实体类型
///
/// 序列化为DXF类型名（如 `LWPOLYLINE`、`3DFACE`）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EntityType {
    Line,
    LwPolyline,
    Polyline,
    Circle,
    Arc,
    Ellipse,
    Point,
    Spline,
    Text,
    MText,
    Face,
    Solid,
    Trace,
    Hatch,
    Unsupported(String),
}

impl EntityType {
    /// DXF类型名
    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Line => "LINE",
            EntityType::LwPolyline => "LWPOLYLINE",
            EntityType::Polyline => "POLYLINE",
            EntityType::Circle => "CIRCLE",
            EntityType::Arc => "ARC",
            EntityType::Ellipse => "ELLIPSE",
            EntityType::Point => "POINT",
            EntityType::Spline => "SPLINE",
            EntityType::Text => "TEXT",
            EntityType::MText => "MTEXT",
            EntityType::Face => "3DFACE",
            EntityType::Solid => "SOLID",
            EntityType::Trace => "TRACE",
            EntityType::Hatch => "HATCH",
            EntityType::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, EntityType::Unsupported(_))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.as_str().to_string()
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "LINE" => EntityType::Line,
            "LWPOLYLINE" => EntityType::LwPolyline,
            "POLYLINE" => EntityType::Polyline,
            "CIRCLE" => EntityType::Circle,
            "ARC" => EntityType::Arc,
            "ELLIPSE" => EntityType::Ellipse,
            "POINT" => EntityType::Point,
            "SPLINE" => EntityType::Spline,
            "TEXT" => EntityType::Text,
            "MTEXT" => EntityType::MText,
            "3DFACE" => EntityType::Face,
            "SOLID" => EntityType::Solid,
            "TRACE" => EntityType::Trace,
            "HATCH" => EntityType::Hatch,
            _ => EntityType::Unsupported(value),
        }
    }
}

/// CAD实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadEntity {
    /// 所属图层名
    pub layer: String,

    /// 颜色索引（ACI），实体未显式设置颜色时为 `None`
    pub color: Option<i32>,

    /// 几何类型和数据
    pub geometry: Geometry,
}

impl CadEntity {
    /// 创建位于图层 "0" 的实体
    pub fn new(geometry: Geometry) -> Self {
        Self {
            layer: "0".to_string(),
            color: None,
            geometry,
        }
    }

    /// 使用指定的图层
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    /// 使用指定的颜色
    pub fn with_color(mut self, color: i32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn entity_type(&self) -> EntityType {
        self.geometry.entity_type()
    }

    /// 颜色，未设置时为0
    pub fn color_or_default(&self) -> i32 {
        self.color.unwrap_or(0)
    }
}
