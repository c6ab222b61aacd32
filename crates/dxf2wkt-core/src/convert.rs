//! 实体 → WKT 转换
//!
//! 每种实体类型有固定的几何规则：
//!
//! | 实体 | 输出 |
//! |---|---|
//! | LINE | 两点 LINESTRING |
//! | LWPOLYLINE / POLYLINE | 闭合且≥3个顶点时为 POLYGON，否则 LINESTRING |
//! | CIRCLE | 36 点采样闭合为 POLYGON |
//! | ARC | 按 5° 分段（至少 8 段）的 LINESTRING |
//! | ELLIPSE | 36 点采样闭合为 POLYGON |
//! | POINT / TEXT / MTEXT | POINT |
//! | SPLINE | 近似折线 LINESTRING |
//! | 3DFACE / SOLID / TRACE | POLYGON |
//! | HATCH | 一条路径为 POLYGON，多条为 MULTIPOLYGON |
//!
//! 所有坐标在输出前经过 [`CoordinateTransformer`] 转换；半径等距离量不转换。

use crate::config::ConversionConfig;
use crate::crs::CoordinateTransformer;
use crate::entity::{CadEntity, EntityType, Geometry};
use crate::error::ConversionError;
use crate::geometry::{Face, Hatch, Polyline};
use crate::math::{format_point, Point2};
use crate::wkt::{close_ring, WktGeometry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 附加数据的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl fmt::Display for ExtraValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraValue::Bool(v) => write!(f, "{}", v),
            ExtraValue::Integer(v) => write!(f, "{}", v),
            ExtraValue::Number(v) => write!(f, "{}", v),
            ExtraValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for ExtraValue {
    fn from(v: bool) -> Self {
        ExtraValue::Bool(v)
    }
}

impl From<usize> for ExtraValue {
    fn from(v: usize) -> Self {
        ExtraValue::Integer(v as i64)
    }
}

impl From<f64> for ExtraValue {
    fn from(v: f64) -> Self {
        ExtraValue::Number(v)
    }
}

impl From<String> for ExtraValue {
    fn from(v: String) -> Self {
        ExtraValue::Text(v)
    }
}

impl From<&str> for ExtraValue {
    fn from(v: &str) -> Self {
        ExtraValue::Text(v.to_string())
    }
}

/// 按类型记录的描述性字段（键有序，保证输出稳定）
pub type ExtraData = BTreeMap<String, ExtraValue>;

/// 单个实体的转换结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub layer: String,
    pub entity_type: EntityType,
    pub color: i32,
    /// 不支持的类型或没有可用边界的填充为 `None`
    pub wkt: Option<String>,
    pub extra_data: ExtraData,
}

impl ConversionResult {
    pub fn has_geometry(&self) -> bool {
        self.wkt.is_some()
    }
}

/// 实体转换器
///
/// 持有整批共享的坐标转换器引用，自身不保存可变状态。
#[derive(Debug, Clone)]
pub struct EntityConverter<'a> {
    transformer: &'a CoordinateTransformer,
    config: ConversionConfig,
}

impl<'a> EntityConverter<'a> {
    pub fn new(transformer: &'a CoordinateTransformer, config: ConversionConfig) -> Self {
        Self { transformer, config }
    }

    /// 转换一个实体
    pub fn convert(&self, entity: &CadEntity) -> Result<ConversionResult, ConversionError> {
        let geometry = self.to_geometry(&entity.geometry)?;

        Ok(ConversionResult {
            layer: entity.layer.clone(),
            entity_type: entity.entity_type(),
            color: entity.color_or_default(),
            wkt: geometry.map(|g| g.to_string()),
            extra_data: extra_data(&entity.geometry),
        })
    }

    /// 计算实体的 WKT 几何；不支持的类型返回 `Ok(None)`
    pub fn to_geometry(&self, geometry: &Geometry) -> Result<Option<WktGeometry>, ConversionError> {
        let wkt = match geometry {
            Geometry::Line(line) => WktGeometry::LineString(self.project(&[line.start, line.end])?),

            Geometry::LwPolyline(polyline) => self.polyline(polyline, EntityType::LwPolyline)?,
            Geometry::Polyline(polyline) => self.polyline(polyline, EntityType::Polyline)?,

            Geometry::Circle(circle) => {
                check_positive(circle.radius, "radius", EntityType::Circle)?;
                let samples = circle.sample_points(self.config.circle_segments);
                WktGeometry::Polygon(self.ring(&samples, EntityType::Circle)?)
            }

            Geometry::Arc(arc) => {
                check_positive(arc.radius, "radius", EntityType::Arc)?;
                if !arc.start_angle.is_finite() || !arc.end_angle.is_finite() {
                    return Err(invalid(EntityType::Arc, "angles must be finite"));
                }
                if arc.sweep_degrees() > 360.0 {
                    return Err(invalid(
                        EntityType::Arc,
                        format!("sweep must not exceed 360 degrees, got {}", arc.sweep_degrees()),
                    ));
                }
                let samples =
                    arc.sample_points(self.config.arc_step_degrees, self.config.arc_min_segments);
                WktGeometry::LineString(self.project(&samples)?)
            }

            Geometry::Ellipse(ellipse) => {
                check_positive(ellipse.major_radius(), "major axis", EntityType::Ellipse)?;
                check_positive(ellipse.ratio, "ratio", EntityType::Ellipse)?;
                let samples = ellipse.sample_points(self.config.ellipse_segments);
                WktGeometry::Polygon(self.ring(&samples, EntityType::Ellipse)?)
            }

            Geometry::Point(point) => WktGeometry::Point(self.transformer.transform_point(&point.position)?),

            Geometry::Spline(spline) => {
                let points = spline
                    .approximate(self.config.spline_segments)
                    .ok_or_else(|| ConversionError::TooFewVertices {
                        entity_type: EntityType::Spline.to_string(),
                        found: spline.control_points.len().max(spline.fit_points.len()),
                        required: 2,
                    })?;
                WktGeometry::LineString(self.project(&points)?)
            }

            Geometry::Text(text) | Geometry::MText(text) => {
                WktGeometry::Point(self.transformer.transform_point(&text.position)?)
            }

            Geometry::Face(face) => self.face(face, EntityType::Face)?,
            Geometry::Solid(face) => self.face(face, EntityType::Solid)?,
            Geometry::Trace(face) => self.face(face, EntityType::Trace)?,

            Geometry::Hatch(hatch) => return self.hatch(hatch),

            Geometry::Unsupported(_) => return Ok(None),
        };

        Ok(Some(wkt))
    }

    fn project(&self, points: &[Point2]) -> Result<Vec<Point2>, ConversionError> {
        Ok(self.transformer.transform_points(points)?)
    }

    /// 转换并闭合环，闭合后至少4个坐标
    fn ring(&self, points: &[Point2], entity_type: EntityType) -> Result<Vec<Point2>, ConversionError> {
        let mut ring = self.project(points)?;
        close_ring(&mut ring);
        if ring.len() < 4 {
            return Err(ConversionError::TooFewVertices {
                entity_type: entity_type.to_string(),
                found: points.len(),
                required: 3,
            });
        }
        Ok(ring)
    }

    fn polyline(&self, polyline: &Polyline, entity_type: EntityType) -> Result<WktGeometry, ConversionError> {
        if polyline.is_area() {
            return Ok(WktGeometry::Polygon(self.ring(&polyline.vertices, entity_type)?));
        }

        if polyline.vertex_count() < 2 {
            return Err(ConversionError::TooFewVertices {
                entity_type: entity_type.to_string(),
                found: polyline.vertex_count(),
                required: 2,
            });
        }
        Ok(WktGeometry::LineString(self.project(&polyline.vertices)?))
    }

    fn face(&self, face: &Face, entity_type: EntityType) -> Result<WktGeometry, ConversionError> {
        if face.vertices.len() < 3 {
            return Err(ConversionError::TooFewVertices {
                entity_type: entity_type.to_string(),
                found: face.vertices.len(),
                required: 3,
            });
        }
        Ok(WktGeometry::Polygon(self.ring(&face.vertices, entity_type)?))
    }

    /// 只使用带顶点的边界路径；由边组成的路径被忽略
    fn hatch(&self, hatch: &Hatch) -> Result<Option<WktGeometry>, ConversionError> {
        let mut rings = hatch
            .vertex_paths()
            .map(|vertices| self.ring(vertices, EntityType::Hatch))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match rings.len() {
            0 => None,
            1 => rings.pop().map(WktGeometry::Polygon),
            _ => Some(WktGeometry::MultiPolygon(rings)),
        })
    }
}

fn invalid(entity_type: EntityType, reason: impl Into<String>) -> ConversionError {
    ConversionError::InvalidParameter {
        entity_type: entity_type.to_string(),
        reason: reason.into(),
    }
}

fn check_positive(value: f64, name: &str, entity_type: EntityType) -> Result<(), ConversionError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(entity_type, format!("{} must be positive, got {}", name, value)))
    }
}

/// 按类型提取描述性字段（坐标为源坐标系原始值）
pub fn extra_data(geometry: &Geometry) -> ExtraData {
    let mut data = ExtraData::new();
    let mut put = |key: &str, value: ExtraValue| {
        data.insert(key.to_string(), value);
    };

    match geometry {
        Geometry::Line(line) => {
            put("start_point", format_point(&line.start).into());
            put("end_point", format_point(&line.end).into());
            put("length", line.length().into());
        }
        Geometry::LwPolyline(polyline) | Geometry::Polyline(polyline) => {
            put("point_count", polyline.vertex_count().into());
            put("closed", polyline.closed.into());
        }
        Geometry::Circle(circle) => {
            put("center", format_point(&circle.center).into());
            put("radius", circle.radius.into());
        }
        Geometry::Arc(arc) => {
            put("center", format_point(&arc.center).into());
            put("radius", arc.radius.into());
            put("start_angle", arc.start_angle.into());
            put("end_angle", arc.end_angle.into());
        }
        Geometry::Ellipse(ellipse) => {
            put("center", format_point(&ellipse.center).into());
            put(
                "major_axis",
                format!("{} {}", ellipse.major_axis.x, ellipse.major_axis.y).into(),
            );
            put("ratio", ellipse.ratio.into());
        }
        Geometry::Point(point) => {
            put("location", format_point(&point.position).into());
        }
        Geometry::Spline(spline) => {
            put("degree", (spline.degree as usize).into());
            put("control_point_count", spline.control_points.len().into());
            put("fit_point_count", spline.fit_points.len().into());
            put("closed", spline.closed.into());
        }
        Geometry::Text(text) | Geometry::MText(text) => {
            put("location", format_point(&text.position).into());
            put("text", text.content.as_str().into());
            put("height", text.height.into());
            put("rotation", text.rotation.into());
        }
        Geometry::Face(face) | Geometry::Solid(face) | Geometry::Trace(face) => {
            put("vertex_count", face.vertices.len().into());
        }
        Geometry::Hatch(hatch) => {
            put("path_count", hatch.paths.len().into());
            put("pattern_name", hatch.pattern_name.as_str().into());
            put("solid", hatch.solid.into());
        }
        Geometry::Unsupported(_) => {}
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Arc, Circle, Ellipse, HatchPath, Line, Point, Spline, Text};
    use crate::math::Vector2;

    fn converter(transformer: &CoordinateTransformer) -> EntityConverter<'_> {
        EntityConverter::new(transformer, ConversionConfig::default())
    }

    fn rd(x: f64, y: f64) -> Point2 {
        Point2::new(100_000.0 + x, 400_000.0 + y)
    }

    fn square(closed: bool) -> Polyline {
        Polyline::new(vec![rd(0.0, 0.0), rd(10.0, 0.0), rd(10.0, 10.0), rd(0.0, 10.0)], closed)
    }

    fn assert_rings_closed(geometry: &WktGeometry) {
        for ring in geometry.rings() {
            assert_eq!(ring.first(), ring.last());
        }
    }

    fn all_supported() -> Vec<Geometry> {
        vec![
            Geometry::Line(Line::new(rd(0.0, 0.0), rd(5.0, 5.0))),
            Geometry::LwPolyline(square(true)),
            Geometry::Polyline(square(false)),
            Geometry::Circle(Circle::new(rd(0.0, 0.0), 10.0)),
            Geometry::Arc(Arc::new(rd(0.0, 0.0), 10.0, 350.0, 10.0)),
            Geometry::Ellipse(Ellipse::new(rd(0.0, 0.0), Vector2::new(10.0, 10.0), 0.5)),
            Geometry::Point(Point::from_point2(rd(1.0, 1.0))),
            Geometry::Spline(Spline::from_control_points(
                vec![rd(0.0, 0.0), rd(1.0, 2.0), rd(3.0, 2.0), rd(4.0, 0.0)],
                3,
            )),
            Geometry::Text(Text::new(rd(2.0, 2.0), "label", 2.5)),
            Geometry::MText(Text::new(rd(2.0, 2.0), "note", 2.5)),
            Geometry::Face(Face::from_face_corners([rd(0.0, 0.0), rd(1.0, 0.0), rd(1.0, 1.0), rd(1.0, 1.0)])),
            Geometry::Solid(Face::from_solid_corners([rd(0.0, 0.0), rd(1.0, 0.0), rd(0.0, 1.0), rd(1.0, 1.0)])),
            Geometry::Trace(Face::from_solid_corners([rd(0.0, 0.0), rd(1.0, 0.0), rd(0.0, 1.0), rd(1.0, 1.0)])),
            Geometry::Hatch(Hatch::new(
                vec![HatchPath::Polyline {
                    vertices: square(true).vertices,
                    closed: true,
                }],
                "SOLID",
                true,
            )),
        ]
    }

    fn expected_type(entity_type: &EntityType) -> &'static str {
        match entity_type {
            EntityType::Line | EntityType::Arc | EntityType::Spline | EntityType::Polyline => "LINESTRING",
            EntityType::Point | EntityType::Text | EntityType::MText => "POINT",
            _ => "POLYGON",
        }
    }

    #[test]
    fn test_every_supported_kind_produces_parseable_wkt() {
        let transformer = CoordinateTransformer::default();
        let converter = converter(&transformer);

        for geometry in all_supported() {
            let entity = CadEntity::new(geometry).with_layer("A");
            let result = converter.convert(&entity).unwrap();
            let wkt = result.wkt.as_deref().expect("supported kind must have wkt");
            let parsed: WktGeometry = wkt.parse().unwrap();
            assert_eq!(parsed.type_name(), expected_type(&result.entity_type), "{}", wkt);
            assert_rings_closed(&parsed);
        }
    }

    #[test]
    fn test_circle_has_37_points() {
        let transformer = CoordinateTransformer::default();
        let circle = Geometry::Circle(Circle::new(Point2::origin(), 10.0));
        let geometry = converter(&transformer).to_geometry(&circle).unwrap().unwrap();

        assert_eq!(geometry.type_name(), "POLYGON");
        assert_eq!(geometry.coordinate_count(), 37);
        assert_rings_closed(&geometry);
    }

    #[test]
    fn test_arc_wrap_has_9_points() {
        let transformer = CoordinateTransformer::default();
        let arc = Geometry::Arc(Arc::new(rd(0.0, 0.0), 10.0, 350.0, 10.0));
        let geometry = converter(&transformer).to_geometry(&arc).unwrap().unwrap();

        let WktGeometry::LineString(points) = geometry else {
            panic!("arc must be a linestring");
        };
        assert_eq!(points.len(), 9);
        assert_ne!(points.first(), points.last());
    }

    #[test]
    fn test_polyline_closed_rules() {
        let transformer = CoordinateTransformer::default();
        let converter = converter(&transformer);

        let polygon = converter.to_geometry(&Geometry::LwPolyline(square(true))).unwrap().unwrap();
        assert_eq!(polygon.type_name(), "POLYGON");
        assert_eq!(polygon.coordinate_count(), 5);

        // 已经首尾相同的闭合多段线不再重复追加
        let mut repeated = square(true);
        repeated.vertices.push(repeated.vertices[0]);
        let polygon = converter.to_geometry(&Geometry::LwPolyline(repeated)).unwrap().unwrap();
        assert_eq!(polygon.coordinate_count(), 5);

        // 闭合标志但只有两个顶点：仍是线
        let two = Polyline::new(vec![rd(0.0, 0.0), rd(1.0, 0.0)], true);
        let line = converter.to_geometry(&Geometry::Polyline(two)).unwrap().unwrap();
        assert_eq!(line.type_name(), "LINESTRING");

        let open = converter.to_geometry(&Geometry::LwPolyline(square(false))).unwrap().unwrap();
        assert_eq!(open.coordinate_count(), 4);

        // 闭合且末点与首点重合的 [A, B, A]：只有两个不同顶点，输出为线
        let back_and_forth = Polyline::new(vec![rd(0.0, 0.0), rd(5.0, 0.0), rd(0.0, 0.0)], true);
        let line = converter.to_geometry(&Geometry::LwPolyline(back_and_forth)).unwrap().unwrap();
        assert_eq!(line.type_name(), "LINESTRING");
        assert_eq!(line.coordinate_count(), 3);
    }

    #[test]
    fn test_degenerate_polyline_is_an_error() {
        let transformer = CoordinateTransformer::default();
        let single = Polyline::new(vec![rd(0.0, 0.0)], false);
        let err = converter(&transformer)
            .to_geometry(&Geometry::LwPolyline(single))
            .unwrap_err();
        assert!(matches!(err, ConversionError::TooFewVertices { found: 1, .. }));
    }

    #[test]
    fn test_non_finite_coordinate_fails_entity() {
        let transformer = CoordinateTransformer::default();
        let point = Geometry::Point(Point::new(f64::NAN, 0.0));
        let err = converter(&transformer).to_geometry(&point).unwrap_err();
        assert!(matches!(err, ConversionError::Transform(_)));
    }

    #[test]
    fn test_circle_radius_stays_in_source_units() {
        let transformer = CoordinateTransformer::default();
        let entity = CadEntity::new(Geometry::Circle(Circle::new(rd(0.0, 0.0), 12.5)));
        let result = converter(&transformer).convert(&entity).unwrap();
        assert_eq!(result.extra_data["radius"], ExtraValue::Number(12.5));
        assert_eq!(result.extra_data["center"], ExtraValue::Text("100000 400000".to_string()));
    }

    #[test]
    fn test_arc_sweep_beyond_full_turn_rejected() {
        let transformer = CoordinateTransformer::default();
        let converter = converter(&transformer);

        let corrupt = Geometry::Arc(Arc::new(rd(0.0, 0.0), 10.0, 0.0, 1e20));
        assert!(matches!(
            converter.to_geometry(&corrupt),
            Err(ConversionError::InvalidParameter { .. })
        ));

        let full = Geometry::Arc(Arc::new(rd(0.0, 0.0), 10.0, 0.0, 360.0));
        let points = converter.to_geometry(&full).unwrap().unwrap();
        assert_eq!(points.coordinate_count(), 73);
    }

    #[test]
    fn test_invalid_radius_rejected() {
        let transformer = CoordinateTransformer::default();
        let circle = Geometry::Circle(Circle::new(rd(0.0, 0.0), 0.0));
        assert!(matches!(
            converter(&transformer).to_geometry(&circle),
            Err(ConversionError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_hatch_path_rules() {
        let transformer = CoordinateTransformer::default();
        let converter = converter(&transformer);
        let path = || HatchPath::Polyline {
            vertices: square(true).vertices,
            closed: true,
        };

        let two = Hatch::new(vec![path(), HatchPath::Edges { edge_count: 3 }, path()], "ANSI31", false);
        let multi = converter.to_geometry(&Geometry::Hatch(two)).unwrap().unwrap();
        assert_eq!(multi.type_name(), "MULTIPOLYGON");
        assert_eq!(multi.rings().len(), 2);
        assert_rings_closed(&multi);

        let edges_only = Hatch::new(vec![HatchPath::Edges { edge_count: 4 }], "SOLID", true);
        assert!(converter.to_geometry(&Geometry::Hatch(edges_only)).unwrap().is_none());

        let empty = Hatch::new(Vec::new(), "SOLID", true);
        let result = converter.convert(&CadEntity::new(Geometry::Hatch(empty))).unwrap();
        assert!(!result.has_geometry());
    }

    #[test]
    fn test_text_content_in_extra_data_only() {
        let transformer = CoordinateTransformer::default();
        let entity = CadEntity::new(Geometry::MText(Text::new(rd(0.0, 0.0), "Kade 12", 2.0)));
        let result = converter(&transformer).convert(&entity).unwrap();
        assert!(result.wkt.as_deref().unwrap().starts_with("POINT("));
        assert!(!result.wkt.as_deref().unwrap().contains("Kade"));
        assert_eq!(result.extra_data["text"], ExtraValue::from("Kade 12"));
    }

    #[test]
    fn test_unsupported_kind_yields_no_wkt() {
        let transformer = CoordinateTransformer::default();
        let entity = CadEntity::new(Geometry::Unsupported("INSERT".to_string())).with_color(5);
        let result = converter(&transformer).convert(&entity).unwrap();
        assert_eq!(result.wkt, None);
        assert_eq!(result.color, 5);
        assert!(result.extra_data.is_empty());
    }
}
