//! Integration tests for the logging system
//!
//! A custom logger is handed to the renderer and every frame shares it.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

mod common;

use std::f32::consts::FRAC_PI_2;
use std::sync::{Arc, Mutex};

use common::{capture_log, count_severity, RecordingDevice};
use vista_engine::glam::Vec3;
use vista_engine::vista::camera::{Camera, CameraFlags};
use vista_engine::vista::config::{FrameCapacities, LogConfig, RendererConfig, MAIN_VIEW_BITS, MAIN_VIEW_PASS};
use vista_engine::vista::frame::{MaterialPipeline, ModelFlags, StaticMaterial};
use vista_engine::vista::log::{LogEntry, LogSeverity};
use vista_engine::vista::Renderer;

type Entries = Arc<Mutex<Vec<LogEntry>>>;

fn create_renderer(level: LogSeverity) -> (Renderer, Entries) {
    let (device, _) = RecordingDevice::new();
    let (log, entries) = capture_log(LogSeverity::Trace);
    let config = RendererConfig {
        capacities: FrameCapacities {
            models: 2,
            lights: 2,
            animations: 1,
            pass_elements: 8,
            particle_vertices: 8,
            ui_vertices: 6,
        },
        log: LogConfig { level },
        width: 64,
        height: 64,
        ..Default::default()
    };
    let renderer = Renderer::new(Box::new(device), config, log).unwrap();
    (renderer, entries)
}

fn camera() -> Camera {
    Camera::perspective(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z, Vec3::Y, 1.0, FRAC_PI_2, 0.1, 100.0, CameraFlags::empty())
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
fn test_integration_renderer_creation_is_logged() {
    let (_renderer, entries) = create_renderer(LogSeverity::Info);
    let entries = entries.lock().unwrap();
    assert!(entries
        .iter()
        .any(|e| e.severity == LogSeverity::Info && e.source == "vista::Renderer" && e.message.contains("Renderer created")));
    // Below the configured level nothing reaches the sink
    assert!(entries.iter().all(|e| e.severity >= LogSeverity::Info));
}

#[test]
fn test_integration_table_exhaustion_warns() {
    let (renderer, entries) = create_renderer(LogSeverity::Warn);
    let material = StaticMaterial::new(MaterialPipeline::Unlit);

    let mut frame = renderer.begin_frame().unwrap();
    frame.initialize_pass(MAIN_VIEW_PASS, &mut camera());
    for _ in 0..3 {
        frame.write_cube(MAIN_VIEW_BITS, Vec3::ZERO, Vec3::ONE, &material, ModelFlags::empty());
    }
    renderer.end_frame(frame);

    assert_eq!(count_severity(&entries, LogSeverity::Warn), 1);
    let entries = entries.lock().unwrap();
    let warning = entries.iter().find(|e| e.severity == LogSeverity::Warn).unwrap();
    assert_eq!(warning.source, "vista::Frame");
    assert!(warning.message.contains("Model table exhausted"));
    assert!(warning.file.is_none());
}

#[test]
fn test_integration_errors_carry_location() {
    let (renderer, entries) = create_renderer(LogSeverity::Warn);
    let mut frame = renderer.begin_frame().unwrap();
    assert_eq!(frame.initialize_pass(40, &mut camera()), 0);
    renderer.end_frame(frame);

    let entries = entries.lock().unwrap();
    let error = entries.iter().find(|e| e.severity == LogSeverity::Error).unwrap();
    assert!(error.message.contains("Pass id 40"));
    assert!(error.file.is_some_and(|f| f.ends_with("frame.rs")));
    assert!(error.line.is_some());
}

#[test]
fn test_integration_level_change_reaches_frames() {
    let (renderer, entries) = create_renderer(LogSeverity::Warn);
    renderer.log().set_level(LogSeverity::Error);
    let material = StaticMaterial::new(MaterialPipeline::Unlit);

    let mut frame = renderer.begin_frame().unwrap();
    frame.initialize_pass(MAIN_VIEW_PASS, &mut camera());
    for _ in 0..4 {
        frame.write_cube(MAIN_VIEW_BITS, Vec3::ZERO, Vec3::ONE, &material, ModelFlags::empty());
    }
    renderer.end_frame(frame);

    assert_eq!(count_severity(&entries, LogSeverity::Warn), 0);
}
