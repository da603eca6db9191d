use crate::utils::error::InferenceError;
use crate::{Config, Result};
use ndarray::{Array1, Array3, Axis};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
    inputs,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// 卷积特征提取模型（预训练VGG16主干，NHWC输入）
pub struct FeatureExtractor {
    session: Arc<Mutex<Session>>,
    input_name: String, // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
}

impl FeatureExtractor {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.feature_model_path();

        if !model_path.exists() {
            return Err(InferenceError::ModelLoad(
                format!("Feature extraction model not found: {}", model_path.display())
            ));
        }

        tracing::info!("Loading feature extraction model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3).map_err(ort::Error::from)?
            .with_intra_threads(config.onnx_config.intra_threads).map_err(ort::Error::from)?
            .commit_from_file(&model_path)?;

        // 动态发现输入输出名称
        if session.inputs().is_empty() || session.outputs().is_empty() {
            return Err(InferenceError::ModelLoad(
                "Feature extraction model has no inputs or outputs".to_string()
            ));
        }

        let input_name = session.inputs()[0].name().to_string();
        let output_name = session.outputs()[0].name().to_string();
        tracing::info!(
            "Feature extraction model io: '{}' -> '{}'",
            input_name,
            output_name
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
        })
    }

    /// 提取特征向量：输入HWC图像，输出展平的一维特征
    pub fn extract(&self, image: Array3<f32>) -> Result<Array1<f32>> {
        // 添加batch维度 (1, H, W, C)
        let input_tensor = image.insert_axis(Axis(0));

        let input_tensor = Tensor::from_array(input_tensor)?;
        let features = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(InferenceError::Inference(format!(
                        "Feature output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        // 展平为一维特征向量
        Ok(features.iter().copied().collect())
    }
}
