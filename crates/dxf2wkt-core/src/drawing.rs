//! 已加载的图纸
//!
//! 只包含模型空间实体和图层表，加载后只读。

use crate::entity::CadEntity;
use serde::{Deserialize, Serialize};

/// 图层表中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    /// 图层颜色索引（ACI）
    pub color: i32,
}

impl LayerInfo {
    pub fn new(name: impl Into<String>, color: i32) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// 图纸
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drawing {
    layers: Vec<LayerInfo>,
    entities: Vec<CadEntity>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: LayerInfo) {
        self.layers.push(layer);
    }

    pub fn add_entity(&mut self, entity: CadEntity) {
        self.entities.push(entity);
    }

    /// 模型空间实体（按图纸中的原始顺序）
    pub fn model_space(&self) -> impl ExactSizeIterator<Item = &CadEntity> {
        self.entities.iter()
    }

    pub fn entities(&self) -> &[CadEntity] {
        &self.entities
    }

    /// 图层表
    pub fn layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    /// 图层名（按图层表顺序）
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl FromIterator<CadEntity> for Drawing {
    fn from_iter<T: IntoIterator<Item = CadEntity>>(iter: T) -> Self {
        Self {
            layers: Vec::new(),
            entities: iter.into_iter().collect(),
        }
    }
}
