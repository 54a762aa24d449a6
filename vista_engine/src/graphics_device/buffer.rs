/// Buffer trait and buffer descriptor

use crate::error::Result;

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// 16-bit index buffer
    Index16,
    /// 32-bit index buffer
    Index32,
    /// Uniform/constant buffer, bound one element at a time
    Uniform,
    /// Storage buffer (light table)
    Storage,
}

impl BufferUsage {
    pub fn is_index(self) -> bool {
        matches!(self, BufferUsage::Index16 | BufferUsage::Index32)
    }
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    pub usage: BufferUsage,
    /// Size of one element in bytes
    pub stride: u32,
    /// Number of elements
    pub count: u32,
    /// Initial contents; `None` leaves the buffer uninitialized
    pub data: Option<Vec<u8>>,
}

impl BufferDesc {
    /// Element-typed descriptor without initial data
    pub fn new(usage: BufferUsage, stride: u32, count: u32) -> Self {
        Self { usage, stride, count, data: None }
    }

    /// Descriptor whose contents are `elements`
    pub fn with_data<T: bytemuck::Pod>(usage: BufferUsage, elements: &[T]) -> Self {
        Self {
            usage,
            stride: std::mem::size_of::<T>() as u32,
            count: elements.len() as u32,
            data: Some(bytemuck::cast_slice(elements).to_vec()),
        }
    }

    pub fn size(&self) -> u64 {
        self.stride as u64 * self.count as u64
    }
}

/// Buffer resource trait
///
/// Implemented by device-specific buffer types.
/// The buffer is destroyed when the last reference is dropped.
pub trait Buffer: Send + Sync {
    fn usage(&self) -> BufferUsage;

    /// Size of one element in bytes
    fn stride(&self) -> u32;

    /// Number of elements
    fn count(&self) -> u32;

    /// Update buffer data
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `data` - Data to write
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
