/// Surface module - attachments and the framebuffers that compose them

pub mod gpu_handle;
pub mod attachment;
pub mod renderbuffer;
pub mod render_texture;
pub mod texture_attachment;
pub mod render_surface;
pub mod framebuffer;

pub use gpu_handle::GpuHandle;
pub use attachment::{
    attachment_key, same_attachment, FramebufferAttachment, SharedAttachment, SurfaceAttachment,
};
pub use renderbuffer::Renderbuffer;
pub use render_texture::RenderTexture;
pub use texture_attachment::TextureAttachment;
pub use render_surface::RenderSurface;
pub use framebuffer::Framebuffer;
