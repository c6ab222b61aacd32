//! DXF文件导入
//!
//! 使用 `dxf` crate 读取图层表和模型空间实体，再从原始组码流中
//! 补充 `dxf` crate 不支持的 HATCH 实体（追加在其他实体之后）。

use crate::dxf_raw::DxfRawParser;
use crate::error::FileError;
use dxf2wkt_core::drawing::{Drawing, LayerInfo};
use dxf2wkt_core::entity::{CadEntity, Geometry};
use dxf2wkt_core::geometry::{Arc, Circle, Ellipse, Face, Line, Point, Polyline, Spline, Text};
use dxf2wkt_core::math::{Point2, Vector2};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// 图层未设置颜色时使用的颜色（白/黑）
const DEFAULT_LAYER_COLOR: i32 = 7;

/// 从DXF文件导入
pub fn load(path: impl AsRef<Path>) -> Result<Drawing, FileError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let drawing = load_from_bytes(&bytes)?;
    info!(
        path = %path.display(),
        entities = drawing.entity_count(),
        layers = drawing.layers().len(),
        "Loaded DXF"
    );
    Ok(drawing)
}

/// 从内存中的DXF内容导入
pub fn load_from_bytes(bytes: &[u8]) -> Result<Drawing, FileError> {
    let source = dxf::Drawing::load(&mut &bytes[..])?;

    let mut drawing = Drawing::new();

    // 导入图层
    for layer in source.layers() {
        let color = layer.color.index().map(i32::from).unwrap_or(DEFAULT_LAYER_COLOR);
        drawing.add_layer(LayerInfo::new(layer.name.clone(), color));
    }

    // 导入模型空间实体
    for entity in source.entities() {
        if entity.common.is_in_paper_space {
            debug!(layer = %entity.common.layer, "Skipping paper space entity");
            continue;
        }
        drawing.add_entity(convert_dxf_entity(entity));
    }

    // 补充 HATCH；二进制DXF等无法按文本解析时只记录警告
    match DxfRawParser::parse(bytes) {
        Ok(parser) => {
            for hatch in parser.hatches() {
                drawing.add_entity(hatch);
            }
        }
        Err(e) => warn!("HATCH entities not recovered: {}", e),
    }

    Ok(drawing)
}

fn point2(p: &dxf::Point) -> Point2 {
    Point2::new(p.x, p.y)
}

/// 将DXF实体转换为CAD实体
pub fn convert_dxf_entity(entity: &dxf::entities::Entity) -> CadEntity {
    use dxf::entities::EntityType as Dxf;

    let geometry = match &entity.specific {
        Dxf::Line(line) => Geometry::Line(Line::new(point2(&line.p1), point2(&line.p2))),

        Dxf::Circle(circle) => Geometry::Circle(Circle::new(point2(&circle.center), circle.radius)),

        // DXF 中的圆弧角度为度
        Dxf::Arc(arc) => Geometry::Arc(Arc::new(
            point2(&arc.center),
            arc.radius,
            arc.start_angle,
            arc.end_angle,
        )),

        Dxf::LwPolyline(lwpoly) => {
            let vertices = lwpoly.vertices.iter().map(|v| Point2::new(v.x, v.y)).collect();
            Geometry::LwPolyline(Polyline::new(vertices, lwpoly.is_closed()))
        }

        // 多面网格和多边形网格的顶点记录不是折线顶点
        Dxf::Polyline(poly) if poly.is_polyface_mesh() => Geometry::Unsupported("POLYFACE_MESH".to_string()),
        Dxf::Polyline(poly) if poly.is_3d_polygon_mesh() => Geometry::Unsupported("POLYGON_MESH".to_string()),

        Dxf::Polyline(poly) => {
            let vertices = poly.vertices().map(|v| point2(&v.location)).collect();
            Geometry::Polyline(Polyline::new(vertices, poly.is_closed()))
        }

        Dxf::Text(text) => Geometry::Text(
            Text::new(point2(&text.location), text.value.clone(), text.text_height).with_rotation(text.rotation),
        ),

        Dxf::MText(mtext) => {
            let content = mtext.text.replace("\\P", "\n");
            Geometry::MText(
                Text::new(point2(&mtext.insertion_point), content, mtext.initial_text_height)
                    .with_rotation(mtext.rotation_angle),
            )
        }

        Dxf::ModelPoint(point) => Geometry::Point(Point::from_point2(point2(&point.location))),

        Dxf::Ellipse(ellipse) => Geometry::Ellipse(Ellipse::arc(
            point2(&ellipse.center),
            Vector2::new(ellipse.major_axis.x, ellipse.major_axis.y),
            ellipse.minor_axis_ratio,
            ellipse.start_parameter,
            ellipse.end_parameter,
        )),

        Dxf::Spline(spline) => {
            let mut result = Spline::new(spline.degree_of_curve.clamp(0, u8::MAX as i32) as u8);
            result.control_points = spline.control_points.iter().map(point2).collect();
            result.knots = spline.knot_values.clone();
            result.weights = spline.weight_values.clone();
            result.fit_points = spline.fit_points.iter().map(point2).collect();
            result.closed = spline.is_closed();
            Geometry::Spline(result)
        }

        Dxf::Face3D(face) => Geometry::Face(Face::from_face_corners([
            point2(&face.first_corner),
            point2(&face.second_corner),
            point2(&face.third_corner),
            point2(&face.fourth_corner),
        ])),

        Dxf::Solid(solid) => Geometry::Solid(Face::from_solid_corners([
            point2(&solid.first_corner),
            point2(&solid.second_corner),
            point2(&solid.third_corner),
            point2(&solid.fourth_corner),
        ])),

        Dxf::Trace(trace) => Geometry::Trace(Face::from_solid_corners([
            point2(&trace.first_corner),
            point2(&trace.second_corner),
            point2(&trace.third_corner),
            point2(&trace.fourth_corner),
        ])),

        other => Geometry::Unsupported(unsupported_type_name(other).to_string()),
    };

    CadEntity {
        layer: entity.common.layer.clone(),
        color: entity.common.color.index().map(i32::from),
        geometry,
    }
}

/// 不支持实体的DXF类型名
fn unsupported_type_name(specific: &dxf::entities::EntityType) -> &'static str {
    use dxf::entities::EntityType as Dxf;

    match specific {
        Dxf::Insert(_) => "INSERT",
        Dxf::Leader(_) => "LEADER",
        Dxf::RotatedDimension(_) | Dxf::RadialDimension(_) | Dxf::DiameterDimension(_) => "DIMENSION",
        Dxf::MLine(_) => "MLINE",
        Dxf::Ray(_) => "RAY",
        Dxf::XLine(_) => "XLINE",
        Dxf::Region(_) => "REGION",
        Dxf::Image(_) => "IMAGE",
        Dxf::Wipeout(_) => "WIPEOUT",
        Dxf::Attribute(_) => "ATTRIB",
        Dxf::AttributeDefinition(_) => "ATTDEF",
        Dxf::Tolerance(_) => "TOLERANCE",
        Dxf::Solid3D(_) => "3DSOLID",
        _ => "UNKNOWN",
    }
}
