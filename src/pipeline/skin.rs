use crate::config::InputSpec;
use crate::image::{ImageLoader, ImagePreprocessor};
use crate::models::{ClusterLabelMap, ClusterModel, FeatureExtractor};
use crate::pipeline::SkinPrediction;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// 皮肤状况分类流水线：特征提取 -> 最近簇 -> 标签映射。
///
/// 只能通过InferenceContext构造，因此持有的构件必然已加载。
pub struct SkinClassifier {
    extractor: Arc<FeatureExtractor>,
    clusters: Arc<ClusterModel>,
    labels: Arc<ClusterLabelMap>,
    input_spec: InputSpec,
}

impl SkinClassifier {
    pub(crate) fn new(
        extractor: Arc<FeatureExtractor>,
        clusters: Arc<ClusterModel>,
        labels: Arc<ClusterLabelMap>,
        input_spec: InputSpec,
    ) -> Self {
        Self {
            extractor,
            clusters,
            labels,
            input_spec,
        }
    }

    /// 单图预测
    pub fn predict(&self, image_path: &Path) -> Result<SkinPrediction> {
        let start_time = Instant::now();

        // 加载并预处理图像
        let image = ImageLoader::from_path(image_path)?;
        let input = ImagePreprocessor::prepare_skin_input(&image, &self.input_spec)?;

        // 特征提取
        let features = self.extractor.extract(input)?;
        tracing::debug!("Extracted {} features from {}", features.len(), image_path.display());

        // 最近簇查找与标签解码
        let cluster_id = self.clusters.assign(&features)?;
        let condition = self.labels.label_for(cluster_id).to_string();

        tracing::info!(
            "Skin prediction for {}: cluster={}, condition='{}', time={:.3}s",
            image_path.display(),
            cluster_id,
            condition,
            start_time.elapsed().as_secs_f32()
        );

        Ok(SkinPrediction {
            cluster_id,
            condition,
        })
    }
}
