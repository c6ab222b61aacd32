//! 确定性实体 URI
//!
//! 标识键由 `[类型, 图层, 颜色]` 加一个区分字段组成，区分字段按
//! `center` > `location` > `start_point` 的优先级取第一个存在的值。
//! 键用 `||` 连接后做 URL 安全的 base64 编码，得到不透明标识：
//!
//! ```text
//! {base_uri}{图层小写，空格→_}/{类型小写}/{标识}
//! ```
//!
//! 类型、图层、颜色和区分字段都相同的实体得到同一个 URI（有意去重）。
//! 没有区分字段的实体（如样条）在同图层同颜色下会互相覆盖。

use crate::convert::ConversionResult;
use crate::error::UriError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;

/// 键各部分之间的分隔符
pub const KEY_DELIMITER: &str = "||";

/// 键部分中不允许出现的字符（分隔符的组成字符）
const RESERVED_CHAR: char = '|';

/// 区分字段的优先级
const DISCRIMINATORS: [&str; 3] = ["center", "location", "start_point"];

/// 构造标识键
pub fn key_parts(result: &ConversionResult) -> Vec<String> {
    let mut parts = vec![
        result.entity_type.to_string(),
        result.layer.clone(),
        result.color.to_string(),
    ];

    if let Some(value) = DISCRIMINATORS
        .iter()
        .find_map(|key| result.extra_data.get(*key))
    {
        parts.push(value.to_string());
    }

    parts
}

/// 生成实体 URI
///
/// 任何键部分包含 `|` 时返回 [`UriError::DelimiterInKey`]，保证可以无歧义解码。
pub fn generate_uri(result: &ConversionResult, base_uri: &str) -> Result<String, UriError> {
    let parts = key_parts(result);
    if let Some(bad) = parts.iter().find(|p| p.contains(RESERVED_CHAR)) {
        return Err(UriError::DelimiterInKey(bad.clone()));
    }

    let identifier = URL_SAFE.encode(parts.join(KEY_DELIMITER));
    let clean_layer = result.layer.replace(' ', "_").to_lowercase();
    let clean_type = result.entity_type.as_str().to_lowercase();

    Ok(format!("{}{}/{}/{}", base_uri, clean_layer, clean_type, identifier))
}

/// 从 URI 的最后一段还原键（仅用于调试和审计）
pub fn decode_uri(uri: &str) -> Result<Vec<String>, UriError> {
    let identifier = uri
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| UriError::MissingIdentifier(uri.to_string()))?;

    let decoded = String::from_utf8(URL_SAFE.decode(identifier)?)?;
    Ok(decoded.split(KEY_DELIMITER).map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASE_URI;
    use crate::convert::{ExtraData, ExtraValue};
    use crate::entity::EntityType;

    fn result(entity_type: EntityType, layer: &str, extra: &[(&str, &str)]) -> ConversionResult {
        let extra_data: ExtraData = extra
            .iter()
            .map(|(k, v)| (k.to_string(), ExtraValue::from(*v)))
            .collect();
        ConversionResult {
            layer: layer.to_string(),
            entity_type,
            color: 7,
            wkt: Some("POINT(1 2)".to_string()),
            extra_data,
        }
    }

    #[test]
    fn test_uri_layout() {
        let r = result(EntityType::Circle, "Kabels Laag", &[("center", "10 20")]);
        let uri = generate_uri(&r, DEFAULT_BASE_URI).unwrap();
        assert!(uri.starts_with("http://wistor.nl/entities/kabels_laag/circle/"));
    }

    #[test]
    fn test_uri_is_deterministic_and_decodable() {
        let a = result(EntityType::Point, "A", &[("location", "1 2")]);
        let b = a.clone();
        let uri = generate_uri(&a, DEFAULT_BASE_URI).unwrap();
        assert_eq!(uri, generate_uri(&b, DEFAULT_BASE_URI).unwrap());

        assert_eq!(decode_uri(&uri).unwrap(), key_parts(&a));
        assert_eq!(decode_uri(&uri).unwrap(), vec!["POINT", "A", "7", "1 2"]);
    }

    #[test]
    fn test_discriminator_priority() {
        let r = result(
            EntityType::Arc,
            "A",
            &[("start_point", "0 0"), ("location", "5 5"), ("center", "9 9")],
        );
        assert_eq!(key_parts(&r).last().map(String::as_str), Some("9 9"));

        let r = result(EntityType::Line, "A", &[("start_point", "0 0"), ("end_point", "1 1")]);
        assert_eq!(key_parts(&r).last().map(String::as_str), Some("0 0"));
    }

    #[test]
    fn test_entities_without_discriminator_collide() {
        let a = result(EntityType::Spline, "A", &[("degree", "3")]);
        let mut b = a.clone();
        b.wkt = Some("LINESTRING(0 0, 1 1)".to_string());
        assert_eq!(key_parts(&a).len(), 3);
        assert_eq!(
            generate_uri(&a, DEFAULT_BASE_URI).unwrap(),
            generate_uri(&b, DEFAULT_BASE_URI).unwrap()
        );
    }

    #[test]
    fn test_delimiter_in_key_rejected() {
        let r = result(EntityType::Point, "A||B", &[("location", "1 2")]);
        assert_eq!(
            generate_uri(&r, DEFAULT_BASE_URI),
            Err(UriError::DelimiterInKey("A||B".to_string()))
        );
    }

    #[test]
    fn test_single_pipe_at_part_edge_rejected() {
        for layer in ["A|", "|A", "A|B"] {
            let r = result(EntityType::Point, layer, &[("location", "1 2")]);
            assert_eq!(
                generate_uri(&r, DEFAULT_BASE_URI),
                Err(UriError::DelimiterInKey(layer.to_string()))
            );
        }

        let r = result(EntityType::Point, "A", &[("location", "1 2|")]);
        assert!(matches!(generate_uri(&r, DEFAULT_BASE_URI), Err(UriError::DelimiterInKey(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_uri("http://x/a/b/"), Err(UriError::MissingIdentifier(_))));
        assert!(matches!(decode_uri("http://x/a/b/@@@"), Err(UriError::Base64(_))));
    }
}
