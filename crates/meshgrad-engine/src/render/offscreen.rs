//! Offscreen rendering and texture readback.
//!
//! Used for still-frame export: render one frame of the gradient into a
//! texture, copy it to a mappable buffer, and strip the row padding wgpu
//! requires for texture-to-buffer copies.

use std::sync::mpsc::channel;

use anyhow::{Context, Result};

use crate::coords::Viewport;
use crate::device::HeadlessGpu;
use crate::paint::Color;
use crate::render::{MeshGradientParams, MeshGradientRenderer, RenderCtx, RenderTarget};

const BYTES_PER_PIXEL: u32 = 4;

/// Tightly packed RGBA8 pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// Returns the `[r, g, b, a]` bytes at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * BYTES_PER_PIXEL) as usize;
        let p = self.pixels.get(i..i + BYTES_PER_PIXEL as usize)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}

/// Row pitch for texture-to-buffer copies, rounded up to wgpu's 256-byte alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Removes per-row padding from a readback buffer.
pub(crate) fn unpad_rows(padded: &[u8], width: u32, height: u32) -> Vec<u8> {
    let row_bytes = (width * BYTES_PER_PIXEL) as usize;
    let pitch = padded_bytes_per_row(width) as usize;

    let mut out = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * pitch;
        out.extend_from_slice(&padded[start..start + row_bytes]);
    }
    out
}

/// A color texture usable as a render attachment and copy source.
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "offscreen target has zero size");
        let max = device.limits().max_texture_dimension_2d;
        anyhow::ensure!(
            width <= max && height <= max,
            "offscreen target {width}x{height} exceeds device limit {max}"
        );

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("meshgrad offscreen target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            format,
            width,
            height,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::from_physical(self.width, self.height)
    }

    /// Submits `encoder`, copies the texture out and blocks until it is readable.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mut encoder: wgpu::CommandEncoder,
    ) -> Result<RgbaImage> {
        let pitch = padded_bytes_per_row(self.width);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("meshgrad offscreen readback"),
            size: u64::from(pitch) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(pitch),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });

        device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed during readback")?;

        rx.recv()
            .context("readback callback dropped")?
            .context("failed to map readback buffer")?;

        let pixels = {
            let mapped = slice.get_mapped_range();
            unpad_rows(&mapped, self.width, self.height)
        };
        readback.unmap();

        Ok(RgbaImage {
            width: self.width,
            height: self.height,
            pixels,
        })
    }
}

/// Renders one gradient frame at `time` seconds and returns its pixels.
///
/// The target is `Rgba8Unorm`, so bytes are the shader's sRGB-encoded output
/// without any further conversion.
pub fn render_snapshot(
    gpu: &HeadlessGpu,
    params: &MeshGradientParams,
    time: f32,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    let target = OffscreenTarget::new(gpu.device(), width, height, wgpu::TextureFormat::Rgba8Unorm)?;
    let mut renderer = MeshGradientRenderer::new().with_clear(Some(Color::BLACK));

    let mut encoder = gpu
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("meshgrad snapshot encoder"),
        });

    {
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), target.format(), target.viewport());
        let mut rt = RenderTarget::new(&mut encoder, target.view());
        renderer.render(&ctx, &mut rt, params, time);
    }

    log::debug!("snapshot {width}x{height} at t={time}");
    target.read_back(gpu.device(), gpu.queue(), encoder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_pitch_is_aligned() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1920), 7680);
    }

    #[test]
    fn unpad_drops_row_tails() {
        let (w, h) = (3u32, 2u32);
        let pitch = padded_bytes_per_row(w) as usize;
        let mut padded = vec![0xEEu8; pitch * h as usize];
        for row in 0..h as usize {
            for b in 0..(w * 4) as usize {
                padded[row * pitch + b] = (row * 100 + b) as u8;
            }
        }

        let out = unpad_rows(&padded, w, h);
        assert_eq!(out.len(), (w * h * 4) as usize);
        assert_eq!(out[0], 0);
        assert_eq!(out[11], 11);
        assert_eq!(out[12], 100);
        assert!(!out.contains(&0xEE));
    }

    #[test]
    fn pixel_lookup() {
        let img = RgbaImage {
            width: 2,
            height: 1,
            pixels: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        assert_eq!(img.pixel(1, 0), Some([5, 6, 7, 8]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.pixel(0, 1), None);
    }
}
