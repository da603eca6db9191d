use crate::utils::error::InferenceError;
use crate::Result;
use image::{DynamicImage, GenericImageView};
use ndarray::Array3;
use std::path::Path;

pub struct ImageLoader;

impl ImageLoader {
    /// 从文件路径加载图像
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let image = image::open(path)
            .map_err(InferenceError::ImageDecode)?;

        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// 转换DynamicImage为ndarray::Array3<f32> (HWC格式，RGB，0..255)
    pub fn to_rgb_array(image: &DynamicImage) -> Array3<f32> {
        let rgb_image = image.to_rgb8();
        let (width, height) = rgb_image.dimensions();
        let raw_data = rgb_image.into_raw();

        let mut array = Array3::<f32>::zeros((height as usize, width as usize, 3));

        for (i, pixel_value) in raw_data.iter().enumerate() {
            let h = (i / 3) / width as usize;
            let w = (i / 3) % width as usize;
            let c = i % 3;
            array[[h, w, c]] = *pixel_value as f32;
        }

        array
    }

    /// 转换DynamicImage为单通道灰度数组 (H, W, 1)，0..255
    pub fn to_gray_array(image: &DynamicImage) -> Array3<f32> {
        let gray_image = image.to_luma8();
        let (width, height) = gray_image.dimensions();
        let raw_data = gray_image.into_raw();

        let mut array = Array3::<f32>::zeros((height as usize, width as usize, 1));

        for (i, pixel_value) in raw_data.iter().enumerate() {
            let h = i / width as usize;
            let w = i % width as usize;
            array[[h, w, 0]] = *pixel_value as f32;
        }

        array
    }

    /// 验证图像尺寸。小图不拒绝，预处理会放大到目标尺寸。
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        // 检查最大尺寸
        if width > 8192 || height > 8192 {
            return Err(InferenceError::InvalidInput(
                format!("Image too large: {}x{}, maximum 8192x8192", width, height)
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};

    #[test]
    fn test_to_rgb_array_layout() {
        let buffer = ImageBuffer::from_fn(4, 2, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 255u8])
        });
        let image = DynamicImage::ImageRgb8(buffer);

        let array = ImageLoader::to_rgb_array(&image);

        assert_eq!(array.dim(), (2, 4, 3));
        assert_eq!(array[[1, 3, 0]], 30.0);
        assert_eq!(array[[1, 3, 1]], 10.0);
        assert_eq!(array[[1, 3, 2]], 255.0);
    }

    #[test]
    fn test_to_gray_array_layout() {
        let buffer = ImageBuffer::from_fn(3, 3, |x, y| Luma([(x + y * 3) as u8]));
        let image = DynamicImage::ImageLuma8(buffer);

        let array = ImageLoader::to_gray_array(&image);

        assert_eq!(array.dim(), (3, 3, 1));
        assert_eq!(array[[2, 1, 0]], 7.0);
    }

    #[test]
    fn test_validate_dimensions_accepts_tiny_image() {
        let buffer = ImageBuffer::from_pixel(4, 4, Luma([0u8]));
        let image = DynamicImage::ImageLuma8(buffer);

        assert!(ImageLoader::validate_dimensions(&image).is_ok());
    }

    #[test]
    fn test_validate_dimensions_rejects_oversized_image() {
        let buffer = ImageBuffer::from_pixel(8193, 8, Luma([0u8]));
        let image = DynamicImage::ImageLuma8(buffer);

        assert!(ImageLoader::validate_dimensions(&image).is_err());
    }
}
