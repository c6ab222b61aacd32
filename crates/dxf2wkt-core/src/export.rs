//! 批量导出
//!
//! 遍历图纸模型空间，按图层过滤后逐个转换并生成 URI。
//! 单个实体的失败只记录日志并跳过，不会中断整批导出。

use crate::config::ExportConfig;
use crate::convert::{ConversionResult, EntityConverter, ExtraData};
use crate::crs::CoordinateTransformer;
use crate::drawing::Drawing;
use crate::entity::{CadEntity, EntityType};
use crate::error::UriError;
use crate::uri::generate_uri;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// 导出的一行记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub uri: String,
    pub layer: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub wkt: String,
    pub color: i32,
    pub extra_data: ExtraData,
}

/// 图层选择；为空表示全部图层
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSelection {
    layers: HashSet<String>,
}

impl LayerSelection {
    /// 选择全部图层
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, layer: &str) -> bool {
        self.is_all() || self.layers.contains(layer)
    }
}

impl<S: Into<String>> FromIterator<S> for LayerSelection {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            layers: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// 导出统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// 成功生成记录的实体数
    pub converted: usize,
    /// 因图层过滤跳过的实体数
    pub filtered: usize,
    /// 不支持或没有几何的实体数
    pub unsupported: usize,
    /// 转换失败的实体数
    pub failed: usize,
}

/// 导出结果及统计
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub records: Vec<EntityRecord>,
    pub stats: ExportStats,
}

/// 单个实体的处理结果
enum Outcome {
    Record(EntityRecord),
    Filtered,
    Unsupported,
    Failed,
}

/// 批量导出器
///
/// 构造时建立坐标转换器，整批导出期间复用。
#[derive(Debug, Clone)]
pub struct BatchExporter {
    config: ExportConfig,
    transformer: CoordinateTransformer,
}

impl BatchExporter {
    pub fn new(config: ExportConfig) -> Self {
        let transformer = CoordinateTransformer::new(config.source_crs);
        Self { config, transformer }
    }

    fn converter(&self) -> EntityConverter<'_> {
        EntityConverter::new(&self.transformer, self.config.conversion.clone())
    }

    /// 导出记录
    pub fn export(&self, drawing: &Drawing, selection: &LayerSelection) -> Vec<EntityRecord> {
        self.export_with_report(drawing, selection).records
    }

    /// 导出记录并返回统计
    pub fn export_with_report(&self, drawing: &Drawing, selection: &LayerSelection) -> ExportReport {
        let converter = self.converter();
        let outcomes: Vec<Outcome> = drawing
            .model_space()
            .enumerate()
            .map(|(index, entity)| self.process(&converter, index, entity, selection))
            .collect();
        self.collect(outcomes)
    }

    /// 在 rayon 线程池上并行转换，输出顺序与 [`export`](Self::export) 相同
    pub fn export_parallel(&self, drawing: &Drawing, selection: &LayerSelection) -> ExportReport {
        let converter = self.converter();
        let outcomes: Vec<Outcome> = drawing
            .entities()
            .par_iter()
            .enumerate()
            .map(|(index, entity)| self.process(&converter, index, entity, selection))
            .collect();
        self.collect(outcomes)
    }

    fn process(
        &self,
        converter: &EntityConverter<'_>,
        index: usize,
        entity: &CadEntity,
        selection: &LayerSelection,
    ) -> Outcome {
        if !selection.contains(&entity.layer) {
            return Outcome::Filtered;
        }

        let result = match converter.convert(entity) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    index,
                    layer = %entity.layer,
                    entity_type = %entity.entity_type(),
                    "Skipping entity: {}",
                    e
                );
                return Outcome::Failed;
            }
        };

        match self.to_record(result) {
            Ok(Some(record)) => Outcome::Record(record),
            Ok(None) => {
                debug!(index, entity_type = %entity.entity_type(), "No geometry for entity");
                Outcome::Unsupported
            }
            Err(e) => {
                warn!(index, layer = %entity.layer, "Skipping entity: {}", e);
                Outcome::Failed
            }
        }
    }

    /// 结果 → 记录；没有 WKT 的结果返回 `None`
    fn to_record(&self, result: ConversionResult) -> Result<Option<EntityRecord>, UriError> {
        if result.wkt.is_none() {
            return Ok(None);
        }

        let uri = generate_uri(&result, &self.config.base_uri)?;
        let ConversionResult {
            layer,
            entity_type,
            color,
            wkt,
            extra_data,
        } = result;

        Ok(wkt.map(|wkt| EntityRecord {
            uri,
            layer,
            entity_type,
            wkt,
            color,
            extra_data,
        }))
    }

    fn collect(&self, outcomes: Vec<Outcome>) -> ExportReport {
        let mut report = ExportReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Record(record) => {
                    report.stats.converted += 1;
                    report.records.push(record);
                }
                Outcome::Filtered => report.stats.filtered += 1,
                Outcome::Unsupported => report.stats.unsupported += 1,
                Outcome::Failed => report.stats.failed += 1,
            }
        }

        info!(
            converted = report.stats.converted,
            filtered = report.stats.filtered,
            unsupported = report.stats.unsupported,
            failed = report.stats.failed,
            "Export finished"
        );
        report
    }
}

impl Default for BatchExporter {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

/// 按顺序列出 WKT 文本
pub fn wkt_strings(records: &[EntityRecord]) -> Vec<&str> {
    records.iter().map(|r| r.wkt.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Geometry;
    use crate::geometry::{Circle, Line, Point, Polyline, Text};
    use crate::math::Point2;
    use crate::uri::decode_uri;

    fn rd(x: f64, y: f64) -> Point2 {
        Point2::new(100_000.0 + x, 400_000.0 + y)
    }

    fn point(layer: &str, x: f64) -> CadEntity {
        CadEntity::new(Geometry::Point(Point::from_point2(rd(x, 0.0)))).with_layer(layer)
    }

    fn mixed_drawing() -> Drawing {
        vec![
            point("A", 1.0),
            CadEntity::new(Geometry::Line(Line::new(rd(0.0, 0.0), rd(1.0, 1.0)))).with_layer("B"),
            CadEntity::new(Geometry::Circle(Circle::new(rd(5.0, 5.0), 2.0))).with_layer("A"),
            CadEntity::new(Geometry::Unsupported("INSERT".to_string())).with_layer("A"),
            point("B", 2.0),
            CadEntity::new(Geometry::Text(Text::new(rd(3.0, 3.0), "x", 1.0))).with_layer("A"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_empty_selection_exports_everything_supported() {
        let records = BatchExporter::default().export(&mixed_drawing(), &LayerSelection::all());
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].entity_type, EntityType::Point);
        assert_eq!(records[1].entity_type, EntityType::Line);
    }

    #[test]
    fn test_layer_filter() {
        let selection: LayerSelection = ["A"].into_iter().collect();
        let report = BatchExporter::default().export_with_report(&mixed_drawing(), &selection);

        // 图层A有4个实体，其中1个不支持
        assert_eq!(report.records.len(), 3);
        assert!(report.records.iter().all(|r| r.layer == "A"));
        assert_eq!(report.stats.filtered, 2);
        assert_eq!(report.stats.unsupported, 1);
    }

    #[test]
    fn test_partial_failure_does_not_abort() {
        let mut entities: Vec<CadEntity> = (0..5).map(|i| point("A", i as f64)).collect();
        entities.insert(2, CadEntity::new(Geometry::Unsupported("unsupported-dummy".to_string())));
        entities.push(CadEntity::new(Geometry::LwPolyline(Polyline::new(vec![], false))));
        entities.push(CadEntity::new(Geometry::Point(Point::new(f64::INFINITY, 0.0))));
        let drawing: Drawing = entities.into_iter().collect();

        let report = BatchExporter::default().export_with_report(&drawing, &LayerSelection::all());
        assert_eq!(report.records.len(), 5);
        assert_eq!(report.stats.unsupported, 1);
        assert_eq!(report.stats.failed, 2);
    }

    #[test]
    fn test_records_carry_decodable_uris() {
        let records = BatchExporter::default().export(&mixed_drawing(), &LayerSelection::all());
        let circle = records
            .iter()
            .find(|r| r.entity_type == EntityType::Circle)
            .unwrap();
        assert!(circle.uri.starts_with("http://wistor.nl/entities/a/circle/"));
        assert_eq!(decode_uri(&circle.uri).unwrap(), vec!["CIRCLE", "A", "0", "100005 400005"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let drawing: Drawing = (0..200)
            .map(|i| point(if i % 3 == 0 { "A" } else { "B" }, i as f64))
            .collect();
        let exporter = BatchExporter::default();
        let selection: LayerSelection = ["B"].into_iter().collect();

        let sequential = exporter.export_with_report(&drawing, &selection);
        let parallel = exporter.export_parallel(&drawing, &selection);
        assert_eq!(sequential.records, parallel.records);
        assert_eq!(sequential.stats, parallel.stats);
    }

    #[test]
    fn test_record_json_columns() {
        let records = BatchExporter::default().export(&mixed_drawing(), &LayerSelection::all());
        let json = serde_json::to_value(&records[0]).unwrap();
        for column in ["uri", "layer", "type", "wkt", "color", "extra_data"] {
            assert!(json.get(column).is_some(), "missing column {}", column);
        }
        assert_eq!(json["type"], "POINT");
        assert_eq!(wkt_strings(&records).len(), records.len());
    }

    #[test]
    fn test_empty_drawing() {
        let records = BatchExporter::default().export(&Drawing::new(), &LayerSelection::all());
        assert!(records.is_empty());
    }
}
