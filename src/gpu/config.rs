//! Centralized graphics configuration for consistent wgpu settings

/// Global graphics configuration
pub struct GraphicsConfig {
    pub sample_count: u32,
    pub texture_format: wgpu::TextureFormat,
}

impl GraphicsConfig {
    /// Get the global graphics configuration
    pub fn global() -> Self {
        Self {
            sample_count: 1, // the frame target is sampled by the UI, no msaa
            texture_format: wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    /// Create multisample state from config
    pub fn multisample_state(&self) -> wgpu::MultisampleState {
        wgpu::MultisampleState {
            count: self.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        }
    }

    /// Create color target state from config
    pub fn color_target_state(&self) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format: self.texture_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        }
    }
}
