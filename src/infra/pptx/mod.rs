pub mod pptx_parts;
pub mod pptx_renderer;

pub use pptx_renderer::PptxRenderer;
