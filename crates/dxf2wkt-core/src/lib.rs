//! DXF2WKT 转换引擎
//!
//! 把解析后的 CAD 实体转换为 WGS84 下的 WKT 几何，并为每个实体生成确定性 URI。
//!
//! # 架构设计
//!
//! - `entity`: 解析后的实体（图层、颜色、几何）
//! - `crs`: RD New → WGS84 坐标转换
//! - `convert`: 按实体类型生成 WKT 和附加数据
//! - `uri`: 由标识键生成 URI
//! - `export`: 批量导出、图层过滤、单实体失败隔离
//!
//! # 示例
//!
//! ```rust
//! use dxf2wkt_core::prelude::*;
//!
//! let mut drawing = Drawing::new();
//! drawing.add_entity(
//!     CadEntity::new(Geometry::Circle(Circle::new(Point2::new(100_000.0, 400_000.0), 5.0)))
//!         .with_layer("Kabels"),
//! );
//!
//! let exporter = BatchExporter::new(ExportConfig::default());
//! let records = exporter.export(&drawing, &LayerSelection::all());
//! assert!(records[0].wkt.starts_with("POLYGON(("));
//! ```

pub mod config;
pub mod convert;
pub mod crs;
pub mod drawing;
pub mod entity;
pub mod error;
pub mod export;
pub mod geometry;
pub mod math;
pub mod repository;
pub mod uri;
pub mod wkt;

pub use error::{ConfigError, ConversionError, RepositoryError, TransformError, UriError};

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::config::{ConversionConfig, ExportConfig};
    pub use crate::convert::{ConversionResult, EntityConverter, ExtraData, ExtraValue};
    pub use crate::crs::{CoordinateTransformer, SourceCrs};
    pub use crate::drawing::{Drawing, LayerInfo};
    pub use crate::entity::{CadEntity, EntityType, Geometry};
    pub use crate::export::{BatchExporter, EntityRecord, ExportReport, LayerSelection};
    pub use crate::geometry::{Arc, Circle, Ellipse, Face, Hatch, HatchPath, Line, Point, Polyline, Spline, Text};
    pub use crate::math::{Point2, Vector2};
    pub use crate::uri::generate_uri;
    pub use crate::wkt::WktGeometry;
}
