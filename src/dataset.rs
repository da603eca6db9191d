use crate::config::InputSpec;
use crate::image::{ImageLoader, ImagePreprocessor};
use crate::Result;
use ndarray::{Array2, Array3};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// 文件名中2字母表情代码到表情名称的固定词表
static EXPRESSION_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("AN", "anger"),
        ("DI", "disgust"),
        ("FE", "fear"),
        ("HA", "happiness"),
        ("NE", "neutral"),
        ("SA", "sadness"),
        ("SU", "surprise"),
    ]
    .into_iter()
    .collect()
});

/// 表情数据集：图像与one-hot标签按位对应
pub struct ExpressionDataset {
    /// 预处理后的灰度图像 (H, W, 1)，值域[0,1]
    pub images: Vec<Array3<f32>>,
    /// one-hot标签，宽度为完整词表大小
    pub labels: Array2<f32>,
    /// 观测到的类别名，升序排列（标签编码顺序）
    pub class_names: Vec<String>,
}

impl ExpressionDataset {
    /// 每个类别的样本数
    pub fn class_counts(&self) -> Vec<(String, usize)> {
        let mut counts = vec![0usize; self.class_names.len()];

        for row in self.labels.rows() {
            if let Some(index) = row.iter().position(|&v| v == 1.0) {
                if index < counts.len() {
                    counts[index] += 1;
                }
            }
        }

        self.class_names
            .iter()
            .cloned()
            .zip(counts)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// 从文件名解码表情名称。
///
/// 文件名形如 `KL.AN1.39.tiff`：第一个'.'之后的前两个字符是表情代码。
pub fn decode_expression_code(file_name: &str) -> Option<&'static str> {
    let code = file_name.split('.').nth(1)?.get(..2)?;
    EXPRESSION_CODES.get(code).copied()
}

/// 完整词表对应的默认类别名序列（升序，与标签编码一致）
pub fn default_class_names() -> Vec<String> {
    let mut names: Vec<String> = EXPRESSION_CODES
        .values()
        .map(|name| name.to_string())
        .collect();
    names.sort();
    names
}

/// 扫描目录中的*.tiff文件，加载图像并装配one-hot标签。
///
/// 未知表情代码告警并跳过；单个文件读取失败不影响其余文件。
pub fn load_dataset(data_dir: &Path, input_spec: &InputSpec) -> Result<ExpressionDataset> {
    let mut paths: Vec<_> = std::fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("tiff"))
                .unwrap_or(false)
        })
        .collect();

    // 固定处理顺序，保证标签与图像的对应关系可复现
    paths.sort();

    let mut images = Vec::new();
    let mut label_names: Vec<&'static str> = Vec::new();

    for path in &paths {
        let file_name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name,
            None => {
                tracing::warn!("Skipping non-UTF8 file name: {}", path.display());
                continue;
            }
        };

        let label = match decode_expression_code(file_name) {
            Some(label) => label,
            None => {
                tracing::warn!(
                    "Unknown expression code in '{}', skipping",
                    file_name
                );
                continue;
            }
        };

        // 灰度读入、缩放、归一化
        let image = match ImageLoader::from_path(path) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                continue;
            }
        };

        let array = ImageLoader::to_gray_array(&image);
        let resized = match ImagePreprocessor::resize_bilinear(&array, input_spec.height, input_spec.width) {
            Ok(resized) => resized,
            Err(e) => {
                tracing::warn!("Failed to preprocess {}: {}", path.display(), e);
                continue;
            }
        };

        images.push(ImagePreprocessor::normalize_unit(resized));
        label_names.push(label);
    }

    // 标签编码：观测类别升序排列
    let mut class_names: Vec<String> = label_names
        .iter()
        .map(|name| name.to_string())
        .collect();
    class_names.sort();
    class_names.dedup();

    // one-hot编码，宽度为完整词表大小
    let num_classes = EXPRESSION_CODES.len();
    let mut labels = Array2::<f32>::zeros((label_names.len(), num_classes));
    for (row, label) in label_names.iter().enumerate() {
        if let Some(index) = class_names.iter().position(|name| name == label) {
            labels[[row, index]] = 1.0;
        }
    }

    tracing::info!(
        "Loaded {} images across {} classes from {}",
        images.len(),
        class_names.len(),
        data_dir.display()
    );

    Ok(ExpressionDataset {
        images,
        labels,
        class_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn expression_spec() -> InputSpec {
        InputSpec {
            height: 48,
            width: 48,
            channels: 1,
        }
    }

    fn write_tiff(dir: &Path, name: &str) {
        let buffer = ImageBuffer::from_pixel(64, 64, Luma([200u8]));
        buffer.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_decode_known_code() {
        assert_eq!(decode_expression_code("KL.AN1.39.tiff"), Some("anger"));
        assert_eq!(decode_expression_code("KM.SU3.11.tiff"), Some("surprise"));
    }

    #[test]
    fn test_decode_unknown_code_is_none() {
        assert_eq!(decode_expression_code("KL.ZZ1.39.tiff"), None);
    }

    #[test]
    fn test_decode_malformed_name_is_none() {
        assert_eq!(decode_expression_code("no-dots-here"), None);
        assert_eq!(decode_expression_code("short."), None);
    }

    #[test]
    fn test_default_class_names_sorted_vocabulary() {
        let names = default_class_names();

        assert_eq!(
            names,
            vec![
                "anger",
                "disgust",
                "fear",
                "happiness",
                "neutral",
                "sadness",
                "surprise"
            ]
        );
    }

    #[test]
    fn test_load_dataset_decodes_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        write_tiff(dir.path(), "KL.AN1.39.tiff");
        write_tiff(dir.path(), "KL.HA2.40.tiff");
        // 未知代码必须被跳过，不出现在标签序列中
        write_tiff(dir.path(), "KL.ZZ1.39.tiff");
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let dataset = load_dataset(dir.path(), &expression_spec()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.class_names, vec!["anger", "happiness"]);
        assert_eq!(dataset.labels.dim(), (2, 7));

        // 路径升序处理：第0行是AN，第1行是HA
        assert_eq!(dataset.labels[[0, 0]], 1.0);
        assert_eq!(dataset.labels[[1, 1]], 1.0);
    }

    #[test]
    fn test_load_dataset_preprocesses_images() {
        let dir = tempfile::tempdir().unwrap();
        write_tiff(dir.path(), "KL.NE1.12.tiff");

        let dataset = load_dataset(dir.path(), &expression_spec()).unwrap();

        assert_eq!(dataset.images[0].dim(), (48, 48, 1));
        assert!(dataset.images[0].iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_class_counts() {
        let dir = tempfile::tempdir().unwrap();
        write_tiff(dir.path(), "KL.AN1.39.tiff");
        write_tiff(dir.path(), "KM.AN2.40.tiff");
        write_tiff(dir.path(), "KL.FE1.41.tiff");

        let dataset = load_dataset(dir.path(), &expression_spec()).unwrap();
        let counts = dataset.class_counts();

        assert_eq!(counts, vec![("anger".to_string(), 2), ("fear".to_string(), 1)]);
    }
}
