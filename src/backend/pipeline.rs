// Render pass + graphics pipeline
//
// Both embed swapchain properties (image format in the render pass, extent in
// the static viewport/scissor), so they are rebuilt on every swapchain
// recreation.

use anyhow::{Context, Result};
use ash::vk;
use std::ffi::CStr;
use std::sync::Arc;
use super::gpu::{Gpu, PipelineDesc, VertexLayout};
use super::shader::ShaderSet;

const SHADER_ENTRY: &CStr = c"main";

/// Render pass and the pipeline built against it
pub struct PipelineSet<G: Gpu> {
    pub render_pass: vk::RenderPass,
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    gpu: Arc<G>,
}

impl<G: Gpu> PipelineSet<G> {
    pub fn new(
        gpu: Arc<G>,
        shaders: &ShaderSet<G>,
        vertex_layout: &VertexLayout,
        format: vk::Format,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let render_pass = gpu
            .create_render_pass(format)
            .context("Failed to create render pass")?;

        let desc = PipelineDesc {
            render_pass,
            extent,
            vertex_shader: shaders.vertex,
            fragment_shader: shaders.fragment,
            vertex_layout,
        };
        let (pipeline, layout) = match gpu.create_graphics_pipeline(&desc) {
            Ok(created) => created,
            Err(e) => {
                gpu.destroy_render_pass(render_pass);
                return Err(e).context("Failed to create graphics pipeline");
            }
        };

        log::debug!("Built pipeline for {:?} at {}x{}", format, extent.width, extent.height);

        Ok(Self {
            render_pass,
            pipeline,
            layout,
            gpu,
        })
    }
}

impl<G: Gpu> Drop for PipelineSet<G> {
    fn drop(&mut self) {
        self.gpu.destroy_pipeline(self.pipeline, self.layout);
        self.gpu.destroy_render_pass(self.render_pass);
    }
}

// =============================================================================
// ASH BUILDERS (used by VulkanDevice)
// =============================================================================

/// Single color attachment, cleared on load, left in PRESENT_SRC for presentation
pub fn create_render_pass(device: &ash::Device, format: vk::Format) -> ash::prelude::VkResult<vk::RenderPass> {
    let color_attachment = vk::AttachmentDescription::builder()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
        .build();

    let color_attachment_ref = vk::AttachmentReference::builder()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        .build();

    let color_attachments = &[color_attachment_ref];
    let subpass = vk::SubpassDescription::builder()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(color_attachments)
        .build();

    // The layout transition must not start before the acquire semaphore,
    // which is waited at COLOR_ATTACHMENT_OUTPUT
    let dependency = vk::SubpassDependency::builder()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
        .build();

    let attachments = &[color_attachment];
    let subpasses = &[subpass];
    let dependencies = &[dependency];

    let render_pass_info = vk::RenderPassCreateInfo::builder()
        .attachments(attachments)
        .subpasses(subpasses)
        .dependencies(dependencies);

    unsafe { device.create_render_pass(&render_pass_info, None) }
}

/// Triangle list, back-face culling (clockwise front), no blending, static viewport
pub fn create_graphics_pipeline(
    device: &ash::Device,
    desc: &PipelineDesc<'_>,
) -> ash::prelude::VkResult<(vk::Pipeline, vk::PipelineLayout)> {
    let shader_stages = [
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(desc.vertex_shader)
            .name(SHADER_ENTRY)
            .build(),
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(desc.fragment_shader)
            .name(SHADER_ENTRY)
            .build(),
    ];

    let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::builder()
        .vertex_binding_descriptions(&desc.vertex_layout.bindings)
        .vertex_attribute_descriptions(&desc.vertex_layout.attributes);

    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
        .primitive_restart_enable(false);

    let viewport = vk::Viewport::builder()
        .x(0.0)
        .y(0.0)
        .width(desc.extent.width as f32)
        .height(desc.extent.height as f32)
        .min_depth(0.0)
        .max_depth(1.0)
        .build();

    let scissor = vk::Rect2D::builder()
        .offset(vk::Offset2D { x: 0, y: 0 })
        .extent(desc.extent)
        .build();

    let viewports = &[viewport];
    let scissors = &[scissor];
    let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
        .viewports(viewports)
        .scissors(scissors);

    let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::CLOCKWISE)
        .depth_bias_enable(false);

    let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
        .sample_shading_enable(false)
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
        .color_write_mask(vk::ColorComponentFlags::RGBA)
        .blend_enable(false)
        .build();

    let color_blend_attachments = &[color_blend_attachment];
    let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
        .logic_op_enable(false)
        .attachments(color_blend_attachments);

    // No descriptors, no push constants
    let layout_info = vk::PipelineLayoutCreateInfo::builder();
    let pipeline_layout = unsafe { device.create_pipeline_layout(&layout_info, None)? };

    let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
        .stages(&shader_stages)
        .vertex_input_state(&vertex_input_info)
        .input_assembly_state(&input_assembly)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterizer)
        .multisample_state(&multisampling)
        .color_blend_state(&color_blending)
        .layout(pipeline_layout)
        .render_pass(desc.render_pass)
        .subpass(0)
        .build();

    let result = unsafe {
        device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
    };

    match result {
        Ok(pipelines) => Ok((pipelines[0], pipeline_layout)),
        Err((_, e)) => {
            unsafe { device.destroy_pipeline_layout(pipeline_layout, None) };
            Err(e)
        }
    }
}
