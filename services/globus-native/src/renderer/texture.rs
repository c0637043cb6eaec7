use anyhow::Context;
use globus_geo::TextureLoader;

use crate::assets::AssetSource;

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

fn build_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

impl Texture {
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        rgba: &[u8],
        label: &str,
    ) -> anyhow::Result<Self> {
        let expected_len = rgba_len(width, height, device.limits().max_texture_dimension_2d)
            .with_context(|| format!("texture {label}"))?;
        anyhow::ensure!(rgba.len() == expected_len, "rgba size mismatch for {label}");
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
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = build_sampler(device, label);
        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        let size = self.texture.size();
        (size.width, size.height)
    }

    /// 1x1 texture, used where a tile has no imagery.
    pub fn solid_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
    ) -> anyhow::Result<Self> {
        Self::from_rgba(device, queue, 1, 1, &rgba, "solid texture")
    }
}

/// Byte length of a `width`x`height` RGBA8 image the device can hold.
fn rgba_len(width: u32, height: u32, max_dimension: u32) -> anyhow::Result<usize> {
    anyhow::ensure!(width > 0 && height > 0, "empty image");
    anyhow::ensure!(
        width <= max_dimension && height <= max_dimension,
        "{width}x{height} exceeds the device limit of {max_dimension}"
    );
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .context("image byte size overflows")
}

/// Decodes to RGBA8 with the first row at the bottom, matching the tile UVs.
pub fn rgba_from_image(bytes: &[u8]) -> anyhow::Result<(Vec<u8>, u32, u32)> {
    let image = image::load_from_memory(bytes)?.flipv().to_rgba8();
    let (width, height) = image.dimensions();
    Ok((image.into_raw(), width, height))
}

/// Loads tile images from an asset source straight into GPU textures.
pub struct GpuTextureLoader {
    source: AssetSource,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuTextureLoader {
    pub fn new(source: AssetSource, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            source,
            device,
            queue,
        }
    }
}

impl TextureLoader for GpuTextureLoader {
    type Handle = Texture;
    type Error = anyhow::Error;

    fn load(&mut self, name: &str) -> anyhow::Result<Texture> {
        let bytes = self.source.fetch(name)?;
        let (rgba, width, height) = rgba_from_image(&bytes)?;
        let texture = Texture::from_rgba(&self.device, &self.queue, width, height, &rgba, name)?;
        tracing::trace!(texture = %name, size = ?texture.size(), "uploaded tile texture");
        Ok(texture)
    }
}
