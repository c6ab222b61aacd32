//! 用 `dxf` crate 写出图纸，再通过加载器读回

use dxf::entities::{Circle, Entity, EntityType as DxfType, Line, LwPolyline, ModelPoint};
use dxf::enums::AcadVersion;
use dxf::LwPolylineVertex;
use dxf2wkt_core::entity::{EntityType, Geometry};
use dxf2wkt_core::export::{BatchExporter, LayerSelection};
use dxf2wkt_file::{load, load_from_bytes};

const HATCH: &str = "0\nHATCH\n8\nPercelen\n2\nSOLID\n70\n1\n91\n1\n92\n2\n72\n0\n73\n1\n93\n3\n\
10\n100000.0\n20\n400000.0\n10\n100010.0\n20\n400000.0\n10\n100010.0\n20\n400010.0\n97\n0\n";

fn on_layer(specific: DxfType, layer: &str) -> Entity {
    let mut entity = Entity::new(specific);
    entity.common.layer = layer.to_string();
    entity
}

fn sample_drawing() -> dxf::Drawing {
    let mut drawing = dxf::Drawing::new();
    drawing.header.version = AcadVersion::R2000;

    let mut layer = dxf::tables::Layer::default();
    layer.name = "Kabels".to_string();
    layer.color = dxf::Color::from_index(1);
    drawing.add_layer(layer);

    let mut line = Line::default();
    line.p1 = dxf::Point::new(100_000.0, 400_000.0, 0.0);
    line.p2 = dxf::Point::new(100_050.0, 400_050.0, 0.0);
    drawing.add_entity(on_layer(DxfType::Line(line), "Kabels"));

    let mut circle = Circle::default();
    circle.center = dxf::Point::new(100_020.0, 400_020.0, 0.0);
    circle.radius = 3.0;
    drawing.add_entity(on_layer(DxfType::Circle(circle), "Putten"));

    let mut polyline = LwPolyline::default();
    for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
        let mut vertex = LwPolylineVertex::default();
        vertex.x = 100_000.0 + x;
        vertex.y = 400_000.0 + y;
        polyline.vertices.push(vertex);
    }
    polyline.set_is_closed(true);
    drawing.add_entity(on_layer(DxfType::LwPolyline(polyline), "Kabels"));

    let mut point = ModelPoint::default();
    point.location = dxf::Point::new(100_001.0, 400_001.0, 0.0);
    let mut paper = on_layer(DxfType::ModelPoint(point), "Kabels");
    paper.common.is_in_paper_space = true;
    drawing.add_entity(paper);

    drawing
}

fn save_to_bytes(drawing: &dxf::Drawing) -> Vec<u8> {
    let mut bytes = Vec::new();
    drawing.save(&mut bytes).unwrap();
    bytes
}

/// 在 ENTITIES 段开头插入 HATCH 文本
fn with_hatch(bytes: Vec<u8>) -> Vec<u8> {
    let text = String::from_utf8(bytes).unwrap();
    let section = text.find("ENTITIES").unwrap();
    let line_end = section + text[section..].find('\n').unwrap() + 1;
    format!("{}{}{}", &text[..line_end], HATCH, &text[line_end..]).into_bytes()
}

#[test]
fn test_load_model_space_entities() {
    let drawing = load_from_bytes(&save_to_bytes(&sample_drawing())).unwrap();

    let types: Vec<EntityType> = drawing.model_space().map(|e| e.entity_type()).collect();
    assert_eq!(types, vec![EntityType::Line, EntityType::Circle, EntityType::LwPolyline]);
    assert!(drawing.layer_names().contains(&"Kabels"));

    let Geometry::LwPolyline(polyline) = &drawing.entities()[2].geometry else {
        panic!("expected lwpolyline");
    };
    assert!(polyline.closed);
    assert_eq!(polyline.vertex_count(), 4);
}

#[test]
fn test_hatch_appended_after_other_entities() {
    let drawing = load_from_bytes(&with_hatch(save_to_bytes(&sample_drawing()))).unwrap();

    let last = drawing.entities().last().unwrap();
    assert_eq!(last.entity_type(), EntityType::Hatch);
    assert_eq!(last.layer, "Percelen");
    assert_eq!(drawing.entity_count(), 4);
}

#[test]
fn test_cp1252_layer_name_keeps_hatches() {
    let mut bytes = with_hatch(save_to_bytes(&sample_drawing()));
    let line_layer = bytes
        .windows(b"Kabels".len())
        .rposition(|w| w == b"Kabels")
        .unwrap();
    bytes[line_layer + 1] = 0xE9;

    let drawing = load_from_bytes(&bytes).unwrap();
    let last = drawing.entities().last().unwrap();
    assert_eq!(last.entity_type(), EntityType::Hatch);
    assert_eq!(last.layer, "Percelen");
}

#[test]
fn test_load_file_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tekening.dxf");
    std::fs::write(&path, with_hatch(save_to_bytes(&sample_drawing()))).unwrap();

    let drawing = load(&path).unwrap();
    let selection: LayerSelection = ["Kabels", "Percelen"].into_iter().collect();
    let records = BatchExporter::default().export(&drawing, &selection);

    let wkt: Vec<&str> = records.iter().map(|r| r.wkt.as_str()).collect();
    assert_eq!(wkt.len(), 3);
    assert!(wkt[0].starts_with("LINESTRING("));
    assert!(wkt[1].starts_with("POLYGON(("));
    assert!(wkt[2].starts_with("POLYGON(("));
    assert!(records.iter().all(|r| r.layer != "Putten"));
}

#[test]
fn test_missing_file_is_io_error() {
    let result = load("/nonexistent/tekening.dxf");
    assert!(matches!(result, Err(dxf2wkt_file::FileError::Io(_))));
}
