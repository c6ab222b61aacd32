//! 转换引擎错误定义

use thiserror::Error;

/// 坐标转换错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Non-finite coordinate: ({0}, {1})")]
    NonFinite(f64, f64),
}

/// 单个实体的转换错误
///
/// 批量导出时由导出器捕获并跳过该实体，不会中断整批转换。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Coordinate transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("{entity_type} has too few vertices: {found} (need {required})")]
    TooFewVertices {
        entity_type: String,
        found: usize,
        required: usize,
    },

    #[error("Invalid {entity_type} parameter: {reason}")]
    InvalidParameter { entity_type: String, reason: String },
}

/// URI 生成/解码错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UriError {
    #[error("Key part contains the delimiter: {0:?}")]
    DelimiterInKey(String),

    #[error("URI has no identifier segment: {0}")]
    MissingIdentifier(String),

    #[error("Invalid base64 identifier: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Identifier is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// 远程仓库调用错误
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Repository transport error: {0}")]
    Transport(String),

    #[error("Rule {rule} rejected: {message}")]
    Rejected { rule: String, message: String },

    #[error("Nothing to import")]
    Empty,
}
