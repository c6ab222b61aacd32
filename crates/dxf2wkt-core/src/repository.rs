//! 语义仓库导入
//!
//! 导出记录以 `(<uri> "wkt"^^geo:wktLiteral <typeURI>)` 的三元组形式
//! 作为规则参数 `triples` 提交给远程仓库。传输方式由调用方通过
//! [`RepositoryClient`] 提供。

use crate::export::EntityRecord;
use crate::error::RepositoryError;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// WKT 字面量的数据类型
pub const GEO_WKT_LITERAL: &str = "geo:wktLiteral";

/// 导入规则名
pub const IMPORT_RULE: &str = "importWktTriples";

/// 规则参数名
pub const TRIPLES_PARAMETER: &str = "triples";

/// 规则参数
pub type RuleParameters = BTreeMap<String, String>;

/// 规则执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOutcome {
    pub success: bool,
    pub errors: Option<Vec<String>>,
}

/// 远程仓库客户端
pub trait RepositoryClient {
    /// 执行命名规则
    fn execute_rule(
        &self,
        rule_name: &str,
        parameters: &RuleParameters,
        debug: bool,
    ) -> Result<RuleOutcome, RepositoryError>;
}

/// 实体类型 URI：`{type_base_uri}{类型小写}`
pub fn type_uri(record: &EntityRecord, type_base_uri: &str) -> String {
    format!("{}{}", type_base_uri, record.entity_type.as_str().to_lowercase())
}

/// 单条三元组
pub fn triple_line(record: &EntityRecord, type_base_uri: &str) -> String {
    format!(
        "(<{}> \"{}\"^^{} <{}>)",
        record.uri,
        record.wkt,
        GEO_WKT_LITERAL,
        type_uri(record, type_base_uri)
    )
}

/// 把全部记录拼成一个参数值，每行一条
pub fn build_triples_parameter(records: &[EntityRecord], type_base_uri: &str) -> String {
    records
        .iter()
        .map(|r| triple_line(r, type_base_uri))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 把记录导入远程仓库
///
/// 没有记录时返回 [`RepositoryError::Empty`]；规则返回失败时
/// 返回 [`RepositoryError::Rejected`]，消息为规则报告的错误。
pub fn import_records<C: RepositoryClient + ?Sized>(
    client: &C,
    records: &[EntityRecord],
    type_base_uri: &str,
    debug_rule: bool,
) -> Result<usize, RepositoryError> {
    if records.is_empty() {
        return Err(RepositoryError::Empty);
    }

    let mut parameters = RuleParameters::new();
    parameters.insert(
        TRIPLES_PARAMETER.to_string(),
        build_triples_parameter(records, type_base_uri),
    );
    debug!(count = records.len(), rule = IMPORT_RULE, "Submitting triples");

    let outcome = client.execute_rule(IMPORT_RULE, &parameters, debug_rule)?;
    if !outcome.success {
        let message = outcome
            .errors
            .map(|errors| errors.join("; "))
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(RepositoryError::Rejected {
            rule: IMPORT_RULE.to_string(),
            message,
        });
    }

    info!(count = records.len(), "Imported records");
    Ok(records.len())
}
