// Shader module loading
//
// SPIR-V blobs are opaque here: read, word-align, hand to the driver.

use anyhow::{Context, Result};
use ash::vk;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use super::gpu::Gpu;

/// Read a SPIR-V file into properly aligned 32-bit words
pub fn read_spirv<P: AsRef<Path>>(path: P) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open shader {:?}", path))?;
    ash::util::read_spv(&mut file)
        .with_context(|| format!("Invalid SPIR-V in {:?}", path))
}

/// Vertex + fragment modules shared by every pipeline rebuild
pub struct ShaderSet<G: Gpu> {
    pub vertex: vk::ShaderModule,
    pub fragment: vk::ShaderModule,
    gpu: Arc<G>,
}

impl<G: Gpu> ShaderSet<G> {
    pub fn load<P: AsRef<Path>>(gpu: Arc<G>, vertex_path: P, fragment_path: P) -> Result<Self> {
        let vertex_code = read_spirv(vertex_path)?;
        let fragment_code = read_spirv(fragment_path)?;
        Self::from_code(gpu, &vertex_code, &fragment_code)
    }

    pub fn from_code(gpu: Arc<G>, vertex_code: &[u32], fragment_code: &[u32]) -> Result<Self> {
        let vertex = gpu
            .create_shader_module(vertex_code)
            .context("Failed to create vertex shader module")?;
        let fragment = match gpu.create_shader_module(fragment_code) {
            Ok(module) => module,
            Err(e) => {
                gpu.destroy_shader_module(vertex);
                return Err(e).context("Failed to create fragment shader module");
            }
        };

        Ok(Self { vertex, fragment, gpu })
    }
}

impl<G: Gpu> Drop for ShaderSet<G> {
    fn drop(&mut self) {
        self.gpu.destroy_shader_module(self.fragment);
        self.gpu.destroy_shader_module(self.vertex);
    }
}
