use globus_geo::tile::TILE_INDICES;
use globus_geo::{TextureCache, Tile, TileEncoder, TileVertex};
use wgpu::util::DeviceExt;

use super::texture::{GpuTextureLoader, Texture};

pub fn vertex_layout<'a>() -> wgpu::VertexBufferLayout<'a> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<TileVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    }
}

pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("tile bind group layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform: &wgpu::Buffer,
    texture: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("tile bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

/// GPU resources for one tile index, reused across frames.
pub struct TileSlot {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture_key: String,
    textured: bool,
}

impl TileSlot {
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..TILE_INDICES.len() as u32, 0, 0..1);
    }

    pub fn textured(&self) -> bool {
        self.textured
    }
}

/// Writes a frame's tiles into the slot arena, growing it on first use.
pub struct TileUploader<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub layout: &'a wgpu::BindGroupLayout,
    pub blank: &'a Texture,
    pub textures: &'a mut TextureCache<GpuTextureLoader>,
    pub slots: &'a mut Vec<TileSlot>,
}

impl TileUploader<'_> {
    fn create_slot(&mut self, tile: &Tile, texture_key: String) -> TileSlot {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tile vertex buffer"),
                contents: bytemuck::cast_slice(tile.vertices()),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tile index buffer"),
                contents: bytemuck::cast_slice(tile.indices()),
                usage: wgpu::BufferUsages::INDEX,
            });
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tile camera buffer"),
                contents: bytemuck::bytes_of(&tile.camera_uniform()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let texture = self.textures.get(&texture_key);
        let textured = texture.is_some();
        let bind_group = create_bind_group(
            self.device,
            self.layout,
            &uniform_buffer,
            texture.unwrap_or(self.blank),
        );
        TileSlot {
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
            texture_key,
            textured,
        }
    }
}

impl TileEncoder for TileUploader<'_> {
    fn encode_tile(&mut self, index: usize, tile: &Tile) {
        let texture_key = tile.texture_key();
        if index >= self.slots.len() {
            let slot = self.create_slot(tile, texture_key);
            self.slots.push(slot);
            return;
        }

        let slot = &self.slots[index];
        self.queue
            .write_buffer(&slot.vertex_buffer, 0, bytemuck::cast_slice(tile.vertices()));
        self.queue
            .write_buffer(&slot.uniform_buffer, 0, bytemuck::bytes_of(&tile.camera_uniform()));
        if slot.texture_key == texture_key {
            return;
        }

        let texture = self.textures.get(&texture_key);
        let textured = texture.is_some();
        let bind_group = create_bind_group(
            self.device,
            self.layout,
            &self.slots[index].uniform_buffer,
            texture.unwrap_or(self.blank),
        );
        let slot = &mut self.slots[index];
        slot.bind_group = bind_group;
        slot.texture_key = texture_key;
        slot.textured = textured;
    }
}
