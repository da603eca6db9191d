use crate::utils::error::InferenceError;
use crate::{Config, Result};
use ndarray::{Array1, Axis};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
    inputs,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// 聚类模型（sklearn KMeans导出的ONNX），输出最近簇的整数id
pub struct ClusterModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
    output_name: String, // 第一个输出即簇标签
}

impl ClusterModel {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.cluster_model_path();

        if !model_path.exists() {
            return Err(InferenceError::ModelLoad(
                format!("Cluster model not found: {}", model_path.display())
            ));
        }

        tracing::info!("Loading cluster model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3).map_err(ort::Error::from)?
            .with_intra_threads(config.onnx_config.intra_threads).map_err(ort::Error::from)?
            .commit_from_file(&model_path)?;

        if session.inputs().is_empty() || session.outputs().is_empty() {
            return Err(InferenceError::ModelLoad(
                "Cluster model has no inputs or outputs".to_string()
            ));
        }

        let input_name = session.inputs()[0].name().to_string();
        let output_name = session.outputs()[0].name().to_string();
        tracing::info!("Cluster model io: '{}' -> '{}'", input_name, output_name);

        // 记录所有可用输出用于调试（通常是label与scores）
        for (i, output) in session.outputs().iter().enumerate() {
            tracing::debug!("Cluster output[{}]: '{}'", i, output.name());
        }

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
        })
    }

    /// 将特征向量整形为单样本 (1, N) 并返回最近簇id
    pub fn assign(&self, features: &Array1<f32>) -> Result<i64> {
        if features.is_empty() {
            return Err(InferenceError::InvalidInput(
                "Empty feature vector".to_string()
            ));
        }

        let sample = features.view().insert_axis(Axis(0)).to_owned();

        let input_tensor = Tensor::from_array(sample)?;
        let labels = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<i64>()?.into_owned(),
                None => {
                    let available: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(InferenceError::Inference(format!(
                        "Cluster label output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        labels.iter().next().copied().ok_or_else(|| {
            InferenceError::Inference("Cluster model returned no labels".to_string())
        })
    }
}
