//! 转换与导出配置
//!
//! 所有字段都有默认值，JSON 配置文件中只需写出要覆盖的项。

use crate::crs::SourceCrs;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认实体 URI 前缀
pub const DEFAULT_BASE_URI: &str = "http://wistor.nl/entities/";

/// 默认实体类型 URI 前缀
pub const DEFAULT_TYPE_BASE_URI: &str = "http://wistor.nl/types/";

/// 曲线采样参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// 圆的采样点数（10° 一点）
    pub circle_segments: usize,
    /// 圆弧每段角度（度）
    pub arc_step_degrees: f64,
    /// 圆弧最少段数
    pub arc_min_segments: usize,
    /// 椭圆的采样点数
    pub ellipse_segments: usize,
    /// 样条近似段数
    pub spline_segments: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            circle_segments: 36,
            arc_step_degrees: 5.0,
            arc_min_segments: 8,
            ellipse_segments: 36,
            spline_segments: 20,
        }
    }
}

impl ConversionConfig {
    /// 检查采样参数能产生有效几何
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.circle_segments < 3 {
            return Err(ConfigError::Invalid(format!(
                "circle_segments must be at least 3, got {}",
                self.circle_segments
            )));
        }
        if self.ellipse_segments < 3 {
            return Err(ConfigError::Invalid(format!(
                "ellipse_segments must be at least 3, got {}",
                self.ellipse_segments
            )));
        }
        if !(self.arc_step_degrees > 0.0 && self.arc_step_degrees.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "arc_step_degrees must be positive, got {}",
                self.arc_step_degrees
            )));
        }
        if self.arc_min_segments == 0 || self.spline_segments == 0 {
            return Err(ConfigError::Invalid(
                "arc_min_segments and spline_segments must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// 批量导出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// 实体 URI 前缀
    pub base_uri: String,
    /// 类型 URI 前缀（用于三元组）
    pub type_base_uri: String,
    /// 源坐标系
    pub source_crs: SourceCrs,
    /// 采样参数
    pub conversion: ConversionConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            type_base_uri: DEFAULT_TYPE_BASE_URI.to_string(),
            source_crs: SourceCrs::default(),
            conversion: ConversionConfig::default(),
        }
    }
}

impl ExportConfig {
    /// 从 JSON 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.conversion.validate()
    }

    /// 设置实体 URI 前缀
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }
}
