use crate::config::InputSpec;
use crate::image::{ImageLoader, ImagePreprocessor};
use crate::models::ExpressionModel;
use crate::pipeline::ExpressionPrediction;
use crate::utils::error::InferenceError;
use crate::Result;
use ndarray::Array4;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// 表情识别流水线：灰度预处理 -> 前向传播 -> argmax标签解码
pub struct ExpressionClassifier {
    model: Arc<ExpressionModel>,
    class_names: Vec<String>,
    input_spec: InputSpec,
}

impl ExpressionClassifier {
    pub(crate) fn new(
        model: Arc<ExpressionModel>,
        class_names: Vec<String>,
        input_spec: InputSpec,
    ) -> Self {
        Self {
            model,
            class_names,
            input_spec,
        }
    }

    /// 预处理单张新图像为 (1, H, W, 1) 张量
    pub fn preprocess(image_path: &Path, input_spec: &InputSpec) -> Result<Array4<f32>> {
        let image = ImageLoader::from_path(image_path)?;
        ImagePreprocessor::prepare_expression_batch(&image, input_spec)
    }

    /// 单图预测：返回argmax类别及其概率与完整分布
    pub fn predict(&self, image_path: &Path) -> Result<ExpressionPrediction> {
        let start_time = Instant::now();

        let batch = Self::preprocess(image_path, &self.input_spec)?;
        let probabilities = self.model.predict(batch)?;

        if probabilities.len() != self.class_names.len() {
            return Err(InferenceError::Inference(format!(
                "Model returned {} probabilities but {} class names are known",
                probabilities.len(),
                self.class_names.len()
            )));
        }

        let predicted_index = argmax(&probabilities).ok_or_else(|| {
            InferenceError::Inference("Empty probability distribution".to_string())
        })?;

        let expression = self.class_names[predicted_index].clone();
        let probability = probabilities[predicted_index];

        tracing::info!(
            "Expression prediction for {}: '{}' ({:.4}), time={:.3}s",
            image_path.display(),
            expression,
            probability,
            start_time.elapsed().as_secs_f32()
        );

        Ok(ExpressionPrediction {
            expression,
            probability,
            class_names: self.class_names.clone(),
            probabilities,
        })
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }
}

/// 最大概率类别的索引
fn argmax(probabilities: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (i, &prob) in probabilities.iter().enumerate() {
        match best {
            Some((_, best_prob)) if prob <= best_prob => {}
            _ => best = Some((i, prob)),
        }
    }

    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    #[test]
    fn test_preprocess_upscales_tiny_image_to_batch_shape() {
        // 比目标尺寸还小的可读图像也必须得到 (1, 48, 48, 1)
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        ImageBuffer::from_pixel(4, 4, Luma([180u8]))
            .save(&path)
            .unwrap();

        let spec = InputSpec {
            height: 48,
            width: 48,
            channels: 1,
        };

        let batch = ExpressionClassifier::preprocess(&path, &spec).unwrap();

        assert_eq!(batch.dim(), (1, 48, 48, 1));
        assert!(batch.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
    }

    #[test]
    fn test_argmax_first_wins_on_tie() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), Some(0));
    }

    #[test]
    fn test_argmax_empty_is_none() {
        assert_eq!(argmax(&[]), None);
    }
}
