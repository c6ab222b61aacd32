//! DXF 原始组码解析
//!
//! `dxf` crate 不解析 HATCH 实体，这里直接读取 ASCII DXF 的组码流，
//! 从 ENTITIES 段中提取填充的图层、颜色、图案和边界路径。
//!
//! # 组码 (Group Code)
//!
//! 每个数据项由两行组成：第一行是组码，第二行是值。HATCH 用到的组码：
//! - 0: 实体类型
//! - 8: 图层名
//! - 62: 颜色
//! - 67: 图纸空间标志
//! - 2: 图案名称
//! - 70: 实心填充标志
//! - 91: 边界路径数
//! - 92: 路径类型标志（位 2 表示多段线路径）
//! - 72 / 73: 多段线路径的凸度标志 / 闭合标志
//! - 93: 顶点数或边数
//! - 10, 20: 顶点坐标
//! - 97: 路径关联的源对象数（路径结束）

use std::io::BufRead;

use crate::error::FileError;
use dxf2wkt_core::entity::{CadEntity, Geometry};
use dxf2wkt_core::geometry::{Hatch, HatchPath};
use dxf2wkt_core::math::Point2;
use tracing::{debug, warn};

/// 多段线边界路径标志位
const POLYLINE_PATH_FLAG: i32 = 2;

/// DXF 组码-值对
#[derive(Debug, Clone, PartialEq)]
pub struct DxfPair {
    pub code: i32,
    pub value: String,
}

impl DxfPair {
    pub fn new(code: i32, value: impl Into<String>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }

    /// 去掉首尾空白的值
    pub fn text(&self) -> &str {
        self.value.trim()
    }

    /// 解析为浮点数
    pub fn as_f64(&self) -> Option<f64> {
        self.text().parse().ok()
    }

    /// 解析为整数
    pub fn as_i32(&self) -> Option<i32> {
        self.text().parse().ok()
    }

    fn is(&self, code: i32, value: &str) -> bool {
        self.code == code && self.text() == value
    }
}

/// DXF 原始解析器
pub struct DxfRawParser {
    pairs: Vec<DxfPair>,
}

impl DxfRawParser {
    /// 从文本解析
    ///
    /// 按字节分行，非 UTF-8 字节（如 cp1252 编码的图层名）替换为 U+FFFD，
    /// 不影响其余实体的解析。
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, FileError> {
        let mut pairs = Vec::new();
        let mut lines = reader.split(b'\n').map(|line| line.map(|bytes| decode_line(&bytes)));

        loop {
            // 读取组码
            let code_line = match lines.next() {
                Some(line) => line?,
                None => break,
            };

            // 读取值
            let value_line = match lines.next() {
                Some(line) => line?,
                None => break,
            };

            let code: i32 = code_line
                .trim()
                .parse()
                .map_err(|_| FileError::InvalidFormat(format!("Invalid group code: {}", code_line)))?;

            let pair = DxfPair::new(code, value_line);
            let at_eof = pair.is(0, "EOF");
            pairs.push(pair);

            // 检查是否到达文件末尾
            if at_eof {
                break;
            }
        }

        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[DxfPair] {
        &self.pairs
    }

    /// ENTITIES 段中的实体，每个实体是以组码 0 开头的一组对
    pub fn entities(&self) -> Vec<&[DxfPair]> {
        let Some(start) = self
            .pairs
            .windows(2)
            .position(|w| w[0].is(0, "SECTION") && w[1].is(2, "ENTITIES"))
        else {
            return Vec::new();
        };

        let body = &self.pairs[start + 2..];
        let end = body.iter().position(|p| p.is(0, "ENDSEC")).unwrap_or(body.len());
        let body = &body[..end];

        let mut result = Vec::new();
        let mut begin = None;
        for (i, pair) in body.iter().enumerate() {
            if pair.code == 0 {
                if let Some(b) = begin {
                    result.push(&body[b..i]);
                }
                begin = Some(i);
            }
        }
        if let Some(b) = begin {
            result.push(&body[b..]);
        }
        result
    }

    /// 模型空间中的全部 HATCH 实体
    ///
    /// 单个填充解析失败时记录警告并跳过。
    pub fn hatches(&self) -> Vec<CadEntity> {
        self.entities()
            .into_iter()
            .filter(|e| e.first().is_some_and(|p| p.is(0, "HATCH")))
            .filter_map(|pairs| match parse_hatch(pairs) {
                Ok(Some(entity)) => Some(entity),
                Ok(None) => None,
                Err(e) => {
                    warn!("Skipping malformed HATCH: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// 一行字节 → 文本，去掉行尾的 `\r`
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// 按顺序读取组码对的游标
struct Cursor<'a> {
    pairs: &'a [DxfPair],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(pairs: &'a [DxfPair]) -> Self {
        Self { pairs, position: 0 }
    }

    fn next(&mut self) -> Option<&'a DxfPair> {
        let pair = self.pairs.get(self.position)?;
        self.position += 1;
        Some(pair)
    }

    /// 前进到下一个指定组码
    fn skip_to(&mut self, code: i32) -> Result<&'a DxfPair, FileError> {
        while let Some(pair) = self.next() {
            if pair.code == code {
                return Ok(pair);
            }
        }
        Err(FileError::InvalidFormat(format!("HATCH ended before group code {}", code)))
    }

    fn int(&mut self, code: i32) -> Result<i32, FileError> {
        let pair = self.skip_to(code)?;
        pair.as_i32()
            .ok_or_else(|| FileError::InvalidFormat(format!("Group code {} is not an integer: {}", code, pair.text())))
    }

    fn float(&mut self, code: i32) -> Result<f64, FileError> {
        let pair = self.skip_to(code)?;
        pair.as_f64()
            .ok_or_else(|| FileError::InvalidFormat(format!("Group code {} is not a number: {}", code, pair.text())))
    }
}

/// 解析一个 HATCH；图纸空间中的填充返回 `None`
fn parse_hatch(pairs: &[DxfPair]) -> Result<Option<CadEntity>, FileError> {
    let mut layer = "0".to_string();
    let mut color = None;
    let mut pattern_name = String::new();
    let mut solid = false;
    let mut path_count = 0;

    // 头部：直到边界路径数（91）为止
    let mut cursor = Cursor::new(pairs);
    while let Some(pair) = cursor.next() {
        match pair.code {
            8 => layer = pair.text().to_string(),
            62 => color = pair.as_i32(),
            67 if pair.as_i32() == Some(1) => {
                debug!("Skipping paper space HATCH");
                return Ok(None);
            }
            2 => pattern_name = pair.text().to_string(),
            70 => solid = pair.as_i32() == Some(1),
            91 => {
                path_count = pair.as_i32().unwrap_or(0).max(0) as usize;
                break;
            }
            _ => {}
        }
    }

    let mut paths = Vec::with_capacity(path_count);
    for _ in 0..path_count {
        paths.push(parse_path(&mut cursor)?);
    }

    let mut entity = CadEntity::new(Geometry::Hatch(Hatch::new(paths, pattern_name, solid))).with_layer(layer);
    entity.color = color;
    Ok(Some(entity))
}

fn parse_path(cursor: &mut Cursor<'_>) -> Result<HatchPath, FileError> {
    let flags = cursor.int(92)?;

    let path = if flags & POLYLINE_PATH_FLAG != 0 {
        let closed = cursor.int(73)? != 0;
        let count = cursor.int(93)?.max(0) as usize;
        let mut vertices = Vec::with_capacity(count);
        for _ in 0..count {
            let x = cursor.float(10)?;
            let y = cursor.float(20)?;
            vertices.push(Point2::new(x, y));
        }
        HatchPath::Polyline { vertices, closed }
    } else {
        let edge_count = cursor.int(93)?.max(0) as usize;
        HatchPath::Edges { edge_count }
    };

    // 每条路径以源对象数结束
    cursor.skip_to(97)?;
    Ok(path)
}

/// 从 ASCII DXF 文本提取 HATCH 实体
pub fn parse_hatches<R: BufRead>(reader: R) -> Result<Vec<CadEntity>, FileError> {
    Ok(DxfRawParser::parse(reader)?.hatches())
}
