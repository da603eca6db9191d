use crate::models::{ClusterLabelMap, ClusterModel, ExpressionModel, FeatureExtractor};
use crate::pipeline::{ExpressionClassifier, SkinClassifier};
use crate::utils::error::InferenceError;
use crate::{Config, Result};
use std::sync::Arc;

/// 推理上下文：进程启动时构建一次，持有全部已加载的模型构件。
///
/// 每个构件独立加载且软失败：加载出错只记录诊断并置为缺失，
/// 进程继续运行。依赖缺失构件的predict在构造分类器时即被拒绝。
pub struct InferenceContext {
    feature_extractor: Option<Arc<FeatureExtractor>>,
    cluster_model: Option<Arc<ClusterModel>>,
    cluster_labels: Option<Arc<ClusterLabelMap>>,
    expression_model: Option<Arc<ExpressionModel>>,
    config: Config,
}

impl InferenceContext {
    /// 加载全部构件，逐个容错
    pub fn load(config: Config) -> Self {
        tracing::info!("Loading inference context from: {}", config.models_dir.display());

        let feature_extractor = match FeatureExtractor::new(&config) {
            Ok(model) => Some(Arc::new(model)),
            Err(e) => {
                tracing::error!("Failed to load feature extraction model: {}", e);
                None
            }
        };

        let cluster_model = match ClusterModel::new(&config) {
            Ok(model) => Some(Arc::new(model)),
            Err(e) => {
                tracing::error!("Failed to load cluster model: {}", e);
                None
            }
        };

        let cluster_labels = match ClusterLabelMap::load(&config) {
            Ok(map) => Some(Arc::new(map)),
            Err(e) => {
                tracing::error!("Failed to load cluster label mapping: {}", e);
                None
            }
        };

        let expression_model = match ExpressionModel::new(&config) {
            Ok(model) => Some(Arc::new(model)),
            Err(e) => {
                tracing::error!("Failed to load expression model: {}", e);
                None
            }
        };

        Self {
            feature_extractor,
            cluster_model,
            cluster_labels,
            expression_model,
            config,
        }
    }

    /// 构造皮肤状况分类器。三个构件缺一不可，缺失即返回错误。
    pub fn skin_classifier(&self) -> Result<SkinClassifier> {
        let extractor = self.feature_extractor.clone().ok_or_else(|| {
            InferenceError::ModelLoad(
                "Feature extraction model not loaded, cannot predict".to_string(),
            )
        })?;
        let clusters = self.cluster_model.clone().ok_or_else(|| {
            InferenceError::ModelLoad("Cluster model not loaded, cannot predict".to_string())
        })?;
        let labels = self.cluster_labels.clone().ok_or_else(|| {
            InferenceError::ModelLoad(
                "Cluster label mapping not loaded, cannot predict".to_string(),
            )
        })?;

        Ok(SkinClassifier::new(
            extractor,
            clusters,
            labels,
            self.config.skin_input,
        ))
    }

    /// 构造表情分类器。类别名序列由调用方提供（数据集或默认词表）。
    pub fn expression_classifier(&self, class_names: Vec<String>) -> Result<ExpressionClassifier> {
        let model = self.expression_model.clone().ok_or_else(|| {
            InferenceError::ModelLoad("Expression model not loaded, cannot predict".to_string())
        })?;

        if class_names.is_empty() {
            return Err(InferenceError::InvalidInput(
                "Expression class name list is empty".to_string(),
            ));
        }

        Ok(ExpressionClassifier::new(
            model,
            class_names,
            self.config.expression_input,
        ))
    }

    /// 构件加载情况
    pub fn stats(&self) -> ContextStats {
        ContextStats {
            has_feature_extractor: self.feature_extractor.is_some(),
            has_cluster_model: self.cluster_model.is_some(),
            has_cluster_labels: self.cluster_labels.is_some(),
            has_expression_model: self.expression_model.is_some(),
            intra_threads: self.config.onnx_config.intra_threads,
        }
    }

}

/// 构件加载统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ContextStats {
    pub has_feature_extractor: bool,
    pub has_cluster_model: bool,
    pub has_cluster_labels: bool,
    pub has_expression_model: bool,
    pub intra_threads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_context() -> InferenceContext {
        // 指向空目录，四个构件全部加载失败
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().to_string_lossy().into_owned()).unwrap();
        InferenceContext::load(config)
    }

    #[test]
    fn test_missing_artifacts_do_not_crash_loading() {
        let ctx = empty_context();
        let stats = ctx.stats();

        assert!(!stats.has_feature_extractor);
        assert!(!stats.has_cluster_model);
        assert!(!stats.has_cluster_labels);
        assert!(!stats.has_expression_model);
    }

    #[test]
    fn test_skin_classifier_refuses_when_artifacts_absent() {
        let ctx = empty_context();

        assert!(ctx.skin_classifier().is_err());
    }

    #[test]
    fn test_expression_classifier_refuses_when_model_absent() {
        let ctx = empty_context();

        let result = ctx.expression_classifier(vec!["anger".to_string()]);
        assert!(result.is_err());
    }
}
