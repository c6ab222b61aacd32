//! DXF2WKT 文件读取
//!
//! 支持：
//! - `.dxf` 图纸加载（图层表 + 模型空间实体）
//! - HATCH 原始组码解析

pub mod dxf_io;
pub mod dxf_raw;
pub mod error;

pub use dxf_io::{load, load_from_bytes};
pub use error::FileError;
