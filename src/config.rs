use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 模型文件目录
    pub models_dir: PathBuf,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 皮肤状况流水线的输入尺寸
    pub skin_input: InputSpec,

    /// 表情识别流水线的输入尺寸
    pub expression_input: InputSpec,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

/// 单个模型的固定输入尺寸 (H, W, C)
#[derive(Debug, Clone, Copy)]
pub struct InputSpec {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl Config {
    pub fn new(models_dir: String) -> Result<Self> {
        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3, // 最高优化级别
        };

        Ok(Self {
            models_dir: PathBuf::from(models_dir),
            onnx_config,
            // VGG16特征提取器的训练输入尺寸
            skin_input: InputSpec {
                height: 128,
                width: 128,
                channels: 3,
            },
            // JAFFE表情分类器的训练输入尺寸（灰度）
            expression_input: InputSpec {
                height: 48,
                width: 48,
                channels: 1,
            },
        })
    }

    /// 获取特征提取模型路径
    pub fn feature_model_path(&self) -> PathBuf {
        self.models_dir.join("skin/vgg16_feature_extractor.onnx")
    }

    /// 获取聚类模型路径
    pub fn cluster_model_path(&self) -> PathBuf {
        self.models_dir.join("skin/skin_condition_kmeans.onnx")
    }

    /// 获取聚类标签映射文件路径
    pub fn cluster_mapping_path(&self) -> PathBuf {
        self.models_dir.join("skin/cluster_label_mapping.json")
    }

    /// 获取表情分类模型路径
    pub fn expression_model_path(&self) -> PathBuf {
        self.models_dir.join("expression/jaffe_expression_model.onnx")
    }
}
