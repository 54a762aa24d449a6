#![allow(dead_code)]
//! Shared helpers for the integration tests
//!
//! A recording graphics device (no GPU required) and a logger that captures
//! entries in memory.

use std::sync::{Arc, Mutex};

use vista_engine::vista::device::{
    Buffer, BufferDesc, BufferUsage, ClearValue, DrawCall, GraphicsDevice, PipelineKind, RenderTarget,
    Texture, TextureDesc, TextureFormat, TextureKind, Viewport,
};
use vista_engine::vista::log::{EngineLog, LogEntry, LogSeverity, Logger};
use vista_engine::vista::Result;

// ============================================================================
// RECORDING DEVICE
// ============================================================================

struct RecordedBuffer {
    usage: BufferUsage,
    stride: u32,
    count: u32,
}

impl Buffer for RecordedBuffer {
    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn stride(&self) -> u32 {
        self.stride
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn update(&self, _offset: u64, _data: &[u8]) -> Result<()> {
        Ok(())
    }
}

struct RecordedTexture {
    desc: TextureDesc,
}

impl Texture for RecordedTexture {
    fn kind(&self) -> TextureKind {
        self.desc.kind
    }

    fn format(&self) -> TextureFormat {
        self.desc.format
    }

    fn width(&self) -> u32 {
        self.desc.width
    }

    fn height(&self) -> u32 {
        self.desc.height
    }
}

/// What the device saw, shared with the test after the device is moved
#[derive(Debug, Default)]
pub struct Recording {
    pub ready: bool,
    pub buffers: usize,
    pub textures: Vec<(u32, u32)>,
    pub draws: Vec<(PipelineKind, u32)>,
    pub targets: usize,
    pub clears: usize,
    pub presents: usize,
}

impl Recording {
    pub fn draws_of(&self, kind: PipelineKind) -> usize {
        self.draws.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn reset(&mut self) {
        self.draws.clear();
        self.targets = 0;
        self.clears = 0;
        self.presents = 0;
    }
}

pub struct RecordingDevice {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingDevice {
    pub fn new() -> (Self, Arc<Mutex<Recording>>) {
        let recording = Arc::new(Mutex::new(Recording { ready: true, ..Default::default() }));
        (Self { recording: recording.clone() }, recording)
    }
}

impl GraphicsDevice for RecordingDevice {
    fn update(&mut self) -> bool {
        self.recording.lock().unwrap().ready
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        self.recording.lock().unwrap().buffers += 1;
        Ok(Arc::new(RecordedBuffer { usage: desc.usage, stride: desc.stride, count: desc.count }))
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        self.recording.lock().unwrap().textures.push((desc.width, desc.height));
        Ok(Arc::new(RecordedTexture { desc }))
    }

    fn set_render_target(&mut self, _target: Option<&RenderTarget<'_>>) -> Result<()> {
        self.recording.lock().unwrap().targets += 1;
        Ok(())
    }

    fn set_viewport(&mut self, _viewport: Viewport) -> Result<()> {
        Ok(())
    }

    fn clear(&mut self, _value: ClearValue) -> Result<()> {
        self.recording.lock().unwrap().clears += 1;
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        self.recording.lock().unwrap().draws.push((call.pipeline.kind, call.count));
        Ok(())
    }

    fn present(&mut self, _interval: u32) -> Result<()> {
        self.recording.lock().unwrap().presents += 1;
        Ok(())
    }
}

// ============================================================================
// TEST LOGGER
// ============================================================================

/// Test logger that captures log entries for verification
pub struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

pub fn capture_log(level: LogSeverity) -> (EngineLog, Arc<Mutex<Vec<LogEntry>>>) {
    let entries = Arc::new(Mutex::new(Vec::new()));
    let logger = TestLogger { entries: entries.clone() };
    (EngineLog::new(Arc::new(logger), level), entries)
}

pub fn count_severity(entries: &Arc<Mutex<Vec<LogEntry>>>, severity: LogSeverity) -> usize {
    entries.lock().unwrap().iter().filter(|e| e.severity == severity).count()
}
