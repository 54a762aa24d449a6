/// Texture trait, texture descriptor and CPU-side images

use bitflags::bitflags;

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8,
    Depth32,
    Depth24Stencil8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        4
    }

    pub fn is_depth(self) -> bool {
        !matches!(self, TextureFormat::Rgba8)
    }
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture2D,
    /// Multisampled 2D render target
    Texture2DMs { samples: u32 },
    Texture2DArray { layers: u32 },
    Cube,
    CubeArray { layers: u32 },
}

impl TextureKind {
    /// Number of 2D images addressable as attachments
    pub fn layer_count(self) -> u32 {
        match self {
            TextureKind::Texture2D | TextureKind::Texture2DMs { .. } => 1,
            TextureKind::Texture2DArray { layers } => layers,
            TextureKind::Cube => 6,
            TextureKind::CubeArray { layers } => layers * 6,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u32 {
        /// Usable as a render target attachment
        const RENDER_TARGET = 0x1;
        /// Linear min/mag filtering
        const LINEAR = 0x2;
        /// Depth comparison sampling (shadow maps)
        const COMPARE_DEPTH = 0x4;
        /// Allocate and generate a mip chain
        const MIPMAPS = 0x8;
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub kind: TextureKind,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub flags: TextureFlags,
    /// Initial pixels for layer 0, tightly packed
    pub data: Option<Vec<u8>>,
}

impl TextureDesc {
    /// Render target without initial data
    pub fn render_target(kind: TextureKind, format: TextureFormat, width: u32, height: u32, flags: TextureFlags) -> Self {
        Self {
            kind,
            format,
            width,
            height,
            flags: flags | TextureFlags::RENDER_TARGET,
            data: None,
        }
    }
}

/// CPU-side image queued for upload
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Self {
        Self { width, height, format, data }
    }

    /// Sampled 2D texture holding this image
    pub fn into_desc(self) -> TextureDesc {
        TextureDesc {
            kind: TextureKind::Texture2D,
            format: self.format,
            width: self.width,
            height: self.height,
            flags: TextureFlags::LINEAR,
            data: Some(self.data),
        }
    }
}

/// Texture resource trait
///
/// Implemented by device-specific texture types.
/// The texture is destroyed when the last reference is dropped.
pub trait Texture: Send + Sync {
    fn kind(&self) -> TextureKind;

    fn format(&self) -> TextureFormat;

    fn width(&self) -> u32;

    fn height(&self) -> u32;
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
