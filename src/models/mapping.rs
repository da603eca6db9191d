use crate::utils::error::InferenceError;
use crate::{Config, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 未映射簇id的兜底标签
pub const UNKNOWN_LABEL: &str = "unknown";

/// 簇id到皮肤状况名称的静态映射，来自训练导出的JSON边车文件
#[derive(Debug, Clone)]
pub struct ClusterLabelMap {
    map: HashMap<i64, String>,
}

impl ClusterLabelMap {
    pub fn load(config: &Config) -> Result<Self> {
        let path = config.cluster_mapping_path();
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InferenceError::ModelLoad(
                format!("Cluster label mapping not found: {}", path.display())
            ));
        }

        tracing::info!("Loading cluster label mapping from: {}", path.display());

        let content = fs::read_to_string(path)?;
        // JSON对象键总是字符串，簇id以数字字符串形式出现
        let raw: HashMap<String, String> = serde_json::from_str(&content)?;

        let mut map = HashMap::with_capacity(raw.len());
        for (key, label) in raw {
            match key.trim().parse::<i64>() {
                Ok(id) => {
                    map.insert(id, label);
                }
                Err(_) => {
                    // 非整数键视为导出损坏的条目，跳过但不中断加载
                    tracing::warn!("Skipping non-integer cluster id key: '{}'", key);
                }
            }
        }

        if map.is_empty() {
            return Err(InferenceError::LabelMapping(
                format!("Cluster label mapping is empty: {}", path.display())
            ));
        }

        tracing::info!("Loaded {} cluster labels", map.len());

        Ok(Self { map })
    }

    /// 查找簇id对应的标签，缺失时返回"unknown"
    pub fn label_for(&self, cluster_id: i64) -> &str {
        match self.map.get(&cluster_id) {
            Some(label) => label.as_str(),
            None => {
                // 映射未覆盖该簇id，可能是训练导出不完整
                tracing::warn!(
                    "Cluster id {} not present in label mapping, falling back to '{}'",
                    cluster_id,
                    UNKNOWN_LABEL
                );
                UNKNOWN_LABEL
            }
        }
    }

    /// 映射中的全部标签值
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.map.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[cfg(test)]
    pub fn from_entries(entries: Vec<(i64, String)>) -> Self {
        Self {
            map: entries.into_iter().collect(),
        }
    }
}
