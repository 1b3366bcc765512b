use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Shrink `image` so neither side exceeds `max_side`, keeping its aspect ratio.
pub fn fit_texture(image: &RgbaImage, max_side: u32) -> Cow<'_, RgbaImage> {
    let (w, h) = image.dimensions();
    if w <= max_side && h <= max_side {
        return Cow::Borrowed(image);
    }

    let ratio = max_side as f64 / w.max(h) as f64;
    let nw = ((w as f64 * ratio).round() as u32).clamp(1, max_side);
    let nh = ((h as f64 * ratio).round() as u32).clamp(1, max_side);
    log::warn!(
        "Texture {}x{} exceeds device limit {}, resizing to {}x{}",
        w,
        h,
        max_side,
        nw,
        nh
    );
    Cow::Owned(imageops::resize(image, nw, nh, FilterType::Triangle))
}

/// Upload an RGBA image as a sampled sRGB texture.
pub fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &RgbaImage,
    label: &str,
) -> wgpu::TextureView {
    let image = fit_texture(image, device.limits().max_texture_dimension_2d);
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// 1x1 white texture for layers without a colour map.
pub fn white_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
    let image = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
    create_texture(device, queue, &image, "White Texture")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_texture_untouched() {
        let image = RgbaImage::new(64, 32);
        assert!(matches!(fit_texture(&image, 64), Cow::Borrowed(_)));
    }

    #[test]
    fn test_large_texture_keeps_aspect() {
        let image = RgbaImage::new(400, 100);
        let fitted = fit_texture(&image, 200);
        assert_eq!(fitted.dimensions(), (200, 50));
    }

    #[test]
    fn test_thin_texture_never_zero() {
        let image = RgbaImage::new(1000, 1);
        let fitted = fit_texture(&image, 10);
        assert_eq!(fitted.dimensions(), (10, 1));
    }
}
