/// One acquired swapchain image plus the encoder recording into it.
///
/// Holding the surface texture blocks acquisition of the next one, so a frame
/// must be finished or dropped before the next `begin_frame`.
pub struct GpuFrame {
    surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    pub(crate) fn new(surface_texture: wgpu::SurfaceTexture, encoder: wgpu::CommandEncoder) -> Self {
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            surface_texture,
            view,
            encoder,
        }
    }

    /// Submits the recorded commands and queues the image for display.
    pub fn finish(self, queue: &wgpu::Queue) {
        let Self {
            surface_texture,
            view,
            encoder,
        } = self;
        queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }
}
