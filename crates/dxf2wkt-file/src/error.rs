//! 文件读取错误定义

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DXF error: {0}")]
    Dxf(String),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

impl From<dxf::DxfError> for FileError {
    fn from(e: dxf::DxfError) -> Self {
        FileError::Dxf(e.to_string())
    }
}
