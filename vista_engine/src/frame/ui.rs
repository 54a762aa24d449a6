/// UI geometry buffer: triangle-list vertices grouped into per-texture batches.

use crate::engine_warn;
use crate::log::EngineLog;
use crate::vertex::UiVertex;

/// Maximum number of texture batches in one frame
pub const MAX_UI_BATCHES: usize = 256;

/// What a UI batch samples from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiTexture {
    /// Vertex color only
    Color,
    /// Texture id
    Texture(u32),
    /// Font atlas texture id
    Font(u32),
}

/// A run of consecutive vertices drawn with one texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiBatch {
    pub texture: UiTexture,
    pub offset: u32,
    pub count: u32,
}

pub struct UiFrame {
    vertices: Box<[UiVertex]>,
    vertex_count: usize,
    batches: Vec<UiBatch>,
    log: EngineLog,
}

impl UiFrame {
    pub fn new(capacity: usize, log: EngineLog) -> Self {
        Self {
            vertices: vec![UiVertex::default(); capacity].into_boxed_slice(),
            vertex_count: 0,
            batches: Vec::with_capacity(MAX_UI_BATCHES),
            log,
        }
    }

    pub fn reset(&mut self) {
        self.vertex_count = 0;
        self.batches.clear();
    }

    /// Append `vertices` drawn with `texture`.
    ///
    /// Merges into the last batch when the texture matches. Nothing is written
    /// when the vertex buffer or the batch list cannot hold the request.
    pub fn write(&mut self, texture: UiTexture, vertices: &[UiVertex]) -> bool {
        let end = self.vertex_count + vertices.len();
        if end > self.vertices.len() {
            engine_warn!(self.log, "vista::UiFrame", "UI vertex buffer exhausted ({} vertices)", self.vertices.len());
            return false;
        }

        match self.batches.last_mut() {
            Some(batch) if batch.texture == texture => batch.count += vertices.len() as u32,
            _ => {
                if self.batches.len() >= MAX_UI_BATCHES {
                    engine_warn!(self.log, "vista::UiFrame", "UI batch list exhausted ({} batches)", MAX_UI_BATCHES);
                    return false;
                }
                self.batches.push(UiBatch {
                    texture,
                    offset: self.vertex_count as u32,
                    count: vertices.len() as u32,
                });
            }
        }

        self.vertices[self.vertex_count..end].copy_from_slice(vertices);
        self.vertex_count = end;
        true
    }

    pub fn vertices(&self) -> &[UiVertex] {
        &self.vertices[..self.vertex_count]
    }

    pub fn batches(&self) -> &[UiBatch] {
        &self.batches
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn capacity(&self) -> usize {
        self.vertices.len()
    }
}

#[cfg(test)]
#[path = "ui_tests.rs"]
mod tests;
