use crate::config::InputSpec;
use crate::utils::error::InferenceError;
use crate::Result;
use image::DynamicImage;
use ndarray::{Array3, Array4, Axis};

use super::ImageLoader;

/// ImageNet均值 (BGR顺序)，与VGG16训练时的预处理一致
const IMAGENET_MEAN_BGR: [f32; 3] = [103.939, 116.779, 123.68];

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 图像缩放到固定尺寸（双线性插值，不保持宽高比）
    pub fn resize_bilinear(
        image: &Array3<f32>,
        target_height: usize,
        target_width: usize,
    ) -> Result<Array3<f32>> {
        let (orig_h, orig_w, channels) = image.dim();

        if orig_h == 0 || orig_w == 0 {
            return Err(InferenceError::ImageProcessing(
                "Cannot resize empty image".to_string()
            ));
        }

        let scale_h = orig_h as f32 / target_height as f32;
        let scale_w = orig_w as f32 / target_width as f32;

        let mut resized = Array3::<f32>::zeros((target_height, target_width, channels));

        // 双线性插值
        for h in 0..target_height {
            for w in 0..target_width {
                let src_h = h as f32 * scale_h;
                let src_w = w as f32 * scale_w;

                let h1 = src_h.floor() as usize;
                let h2 = (h1 + 1).min(orig_h - 1);
                let w1 = src_w.floor() as usize;
                let w2 = (w1 + 1).min(orig_w - 1);

                let dh = src_h - h1 as f32;
                let dw = src_w - w1 as f32;

                for c in 0..channels {
                    let v11 = image[[h1, w1, c]];
                    let v12 = image[[h1, w2, c]];
                    let v21 = image[[h2, w1, c]];
                    let v22 = image[[h2, w2, c]];

                    let interpolated = v11 * (1.0 - dh) * (1.0 - dw)
                        + v12 * (1.0 - dh) * dw
                        + v21 * dh * (1.0 - dw)
                        + v22 * dh * dw;

                    resized[[h, w, c]] = interpolated;
                }
            }
        }

        Ok(resized)
    }

    /// 像素值归一化到[0,1]
    pub fn normalize_unit(mut image: Array3<f32>) -> Array3<f32> {
        image.mapv_inplace(|v| v / 255.0);
        image
    }

    /// VGG16输入预处理：RGB转BGR并减去ImageNet通道均值
    pub fn vgg_preprocess(image: &Array3<f32>) -> Result<Array3<f32>> {
        let (height, width, channels) = image.dim();

        if channels != 3 {
            return Err(InferenceError::ImageProcessing(
                format!("VGG preprocessing expects 3 channels, got {}", channels)
            ));
        }

        let mut processed = Array3::<f32>::zeros((height, width, 3));

        for h in 0..height {
            for w in 0..width {
                // 通道翻转 RGB -> BGR
                processed[[h, w, 0]] = image[[h, w, 2]] - IMAGENET_MEAN_BGR[0];
                processed[[h, w, 1]] = image[[h, w, 1]] - IMAGENET_MEAN_BGR[1];
                processed[[h, w, 2]] = image[[h, w, 0]] - IMAGENET_MEAN_BGR[2];
            }
        }

        Ok(processed)
    }

    /// 皮肤状况流水线输入：RGB读入、缩放到目标尺寸、VGG16预处理
    pub fn prepare_skin_input(image: &DynamicImage, spec: &InputSpec) -> Result<Array3<f32>> {
        let array = ImageLoader::to_rgb_array(image);
        let resized = Self::resize_bilinear(&array, spec.height, spec.width)?;
        Self::vgg_preprocess(&resized)
    }

    /// 表情识别流水线输入：灰度读入、缩放、归一化、扩展batch维度
    /// 返回形状 (1, H, W, 1) 的张量
    pub fn prepare_expression_batch(
        image: &DynamicImage,
        spec: &InputSpec,
    ) -> Result<Array4<f32>> {
        let array = ImageLoader::to_gray_array(image);
        let resized = Self::resize_bilinear(&array, spec.height, spec.width)?;
        let normalized = Self::normalize_unit(resized);

        Ok(normalized.insert_axis(Axis(0)))
    }
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

    #[test]
    fn test_normalize_unit_bounds() {
        // 255 -> 1.0, 0 -> 0.0
        let mut image = Array3::<f32>::zeros((2, 2, 1));
        image[[0, 0, 0]] = 255.0;
        image[[1, 1, 0]] = 0.0;

        let normalized = ImagePreprocessor::normalize_unit(image);

        assert_eq!(normalized[[0, 0, 0]], 1.0);
        assert_eq!(normalized[[1, 1, 0]], 0.0);
    }

    #[test]
    fn test_resize_bilinear_target_shape() {
        let image = Array3::<f32>::from_elem((100, 60, 3), 128.0);

        let resized = ImagePreprocessor::resize_bilinear(&image, 128, 128).unwrap();

        assert_eq!(resized.dim(), (128, 128, 3));
        // 常数图像缩放后仍为常数
        assert!((resized[[64, 64, 1]] - 128.0).abs() < 1e-4);
    }

    #[test]
    fn test_vgg_preprocess_swaps_channels_and_centers() {
        let mut image = Array3::<f32>::zeros((1, 1, 3));
        image[[0, 0, 0]] = 255.0; // R
        image[[0, 0, 1]] = 128.0; // G
        image[[0, 0, 2]] = 0.0; // B

        let processed = ImagePreprocessor::vgg_preprocess(&image).unwrap();

        assert!((processed[[0, 0, 0]] - (0.0 - 103.939)).abs() < 1e-4);
        assert!((processed[[0, 0, 1]] - (128.0 - 116.779)).abs() < 1e-4);
        assert!((processed[[0, 0, 2]] - (255.0 - 123.68)).abs() < 1e-4);
    }

    #[test]
    fn test_vgg_preprocess_rejects_gray_input() {
        let image = Array3::<f32>::zeros((4, 4, 1));

        assert!(ImagePreprocessor::vgg_preprocess(&image).is_err());
    }

    #[test]
    fn test_prepare_expression_batch_shape_and_range() {
        // 任意输入尺寸都必须得到 (1, 48, 48, 1)，值域[0,1]
        let buffer = ImageBuffer::from_fn(120, 90, |x, y| Luma([((x + y) % 256) as u8]));
        let image = DynamicImage::ImageLuma8(buffer);

        let batch =
            ImagePreprocessor::prepare_expression_batch(&image, &expression_spec()).unwrap();

        assert_eq!(batch.dim(), (1, 48, 48, 1));
        assert!(batch.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
