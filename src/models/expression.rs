use crate::utils::error::InferenceError;
use crate::{Config, Result};
use ndarray::Array4;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
    inputs,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// 表情分类模型（预训练CNN，NHWC灰度输入，softmax输出）
pub struct ExpressionModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
    output_name: String,
}

impl ExpressionModel {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.expression_model_path();

        if !model_path.exists() {
            return Err(InferenceError::ModelLoad(
                format!("Expression model not found: {}", model_path.display())
            ));
        }

        tracing::info!("Loading expression model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3).map_err(ort::Error::from)?
            .with_intra_threads(config.onnx_config.intra_threads).map_err(ort::Error::from)?
            .commit_from_file(&model_path)?;

        if session.inputs().is_empty() || session.outputs().is_empty() {
            return Err(InferenceError::ModelLoad(
                "Expression model has no inputs or outputs".to_string()
            ));
        }

        let input_name = session.inputs()[0].name().to_string();
        let output_name = session.outputs()[0].name().to_string();
        tracing::info!("Expression model io: '{}' -> '{}'", input_name, output_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
        })
    }

    /// 单样本前向传播：输入 (1, H, W, 1)，输出各类别概率
    pub fn predict(&self, batch: Array4<f32>) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(batch)?;
        let predictions = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(InferenceError::Inference(format!(
                        "Expression output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        // 期望形状 (1, num_classes)
        let shape = predictions.shape().to_vec();
        if shape.len() != 2 || shape[0] != 1 {
            return Err(InferenceError::Inference(format!(
                "Expected probability tensor of shape (1, N), got {:?}",
                shape
            )));
        }

        Ok(predictions.iter().copied().collect())
    }
}
