// Static geometry: vertex format, the quad mesh and its device-local buffers

use anyhow::{Context, Result};
use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::sync::Arc;
use super::gpu::{Gpu, VertexLayout};
use super::memory::{BufferAllocation, MemoryAllocator};
use super::staging::StagingUploader;

/// 2D position + RGB color, tightly packed (20 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: Vec2,
    pub color: Vec3,
}

impl Vertex {
    pub const fn new(pos: Vec2, color: Vec3) -> Self {
        Self { pos, color }
    }

    /// Binding 0, per-vertex: location 0 = position, location 1 = color
    pub fn layout() -> VertexLayout {
        let binding = vk::VertexInputBindingDescription::builder()
            .binding(0)
            .stride(std::mem::size_of::<Vertex>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX)
            .build();

        let position_attr = vk::VertexInputAttributeDescription::builder()
            .binding(0)
            .location(0)
            .format(vk::Format::R32G32_SFLOAT)
            .offset(0)
            .build();

        let color_attr = vk::VertexInputAttributeDescription::builder()
            .binding(0)
            .location(1)
            .format(vk::Format::R32G32B32_SFLOAT)
            .offset(std::mem::size_of::<Vec2>() as u32)
            .build();

        VertexLayout {
            bindings: vec![binding],
            attributes: vec![position_attr, color_attr],
        }
    }
}

/// Indexed triangle list
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Two triangles covering the middle of clip space
    pub fn quad() -> Self {
        Self {
            vertices: vec![
                Vertex::new(Vec2::new(-0.5, -0.5), Vec3::new(0.0, 0.0, 1.0)),
                Vertex::new(Vec2::new(0.5, 0.5), Vec3::new(0.0, 1.0, 0.0)),
                Vertex::new(Vec2::new(-0.5, 0.5), Vec3::new(1.0, 0.0, 0.0)),
                Vertex::new(Vec2::new(0.5, -0.5), Vec3::new(1.0, 1.0, 1.0)),
            ],
            indices: vec![0, 1, 2, 1, 0, 3],
        }
    }
}

/// Vertex and index buffers in device-local memory, filled once at startup
pub struct GeometryBuffers<G: Gpu> {
    gpu: Arc<G>,
    pub vertex: BufferAllocation,
    pub index: BufferAllocation,
    pub index_count: u32,
}

impl<G: Gpu> GeometryBuffers<G> {
    pub fn upload(allocator: &MemoryAllocator<G>, mesh: &Mesh) -> Result<Self> {
        anyhow::ensure!(!mesh.vertices.is_empty(), "Mesh has no vertices");
        anyhow::ensure!(!mesh.indices.is_empty(), "Mesh has no indices");

        let uploader = StagingUploader::new(allocator);

        let vertex = uploader
            .create_device_local(vk::BufferUsageFlags::VERTEX_BUFFER, &mesh.vertices)
            .context("Failed to create vertex buffer")?;

        let index = match uploader
            .create_device_local(vk::BufferUsageFlags::INDEX_BUFFER, &mesh.indices)
        {
            Ok(index) => index,
            Err(e) => {
                allocator.destroy_buffer(vertex);
                return Err(e.context("Failed to create index buffer"));
            }
        };

        log::info!(
            "Uploaded geometry: {} vertices ({} bytes), {} indices ({} bytes)",
            mesh.vertices.len(),
            vertex.size,
            mesh.indices.len(),
            index.size
        );

        Ok(Self {
            gpu: allocator.gpu().clone(),
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
        })
    }
}

impl<G: Gpu> Drop for GeometryBuffers<G> {
    fn drop(&mut self) {
        for allocation in [self.index, self.vertex] {
            self.gpu.destroy_buffer(allocation.buffer);
            self.gpu.free_memory(allocation.memory);
        }
    }
}
