use glam::Vec4;
use super::*;
use crate::log::{capture_log, LogSeverity};

fn quad(x: f32) -> [UiVertex; 6] {
    [UiVertex::new(Vec4::new(x, 0.0, 0.0, 1.0), Vec4::ONE, Vec4::ZERO); 6]
}

// ============================================================================
// Batching
// ============================================================================

#[test]
fn test_same_texture_merges_into_one_batch() {
    let mut ui = UiFrame::new(64, EngineLog::console());
    assert!(ui.write(UiTexture::Texture(3), &quad(0.0)));
    assert!(ui.write(UiTexture::Texture(3), &quad(1.0)));

    assert_eq!(ui.batches(), &[UiBatch { texture: UiTexture::Texture(3), offset: 0, count: 12 }]);
    assert_eq!(ui.vertex_count(), 12);
    assert_eq!(ui.vertices()[6].position.x, 1.0);
}

#[test]
fn test_texture_change_starts_new_batch() {
    let mut ui = UiFrame::new(64, EngineLog::console());
    ui.write(UiTexture::Color, &quad(0.0));
    ui.write(UiTexture::Font(2), &quad(1.0));
    ui.write(UiTexture::Color, &quad(2.0));

    let batches = ui.batches();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[1], UiBatch { texture: UiTexture::Font(2), offset: 6, count: 6 });
    assert_eq!(batches[2].offset, 12);
}

#[test]
fn test_reset_clears_everything() {
    let mut ui = UiFrame::new(64, EngineLog::console());
    ui.write(UiTexture::Color, &quad(0.0));
    ui.reset();
    assert_eq!(ui.vertex_count(), 0);
    assert!(ui.batches().is_empty());
}

// ============================================================================
// Capacity
// ============================================================================

#[test]
fn test_vertex_overflow_writes_nothing() {
    let (log, entries) = capture_log(LogSeverity::Warn);
    let mut ui = UiFrame::new(10, log);
    assert!(ui.write(UiTexture::Color, &quad(0.0)));
    assert!(!ui.write(UiTexture::Color, &quad(1.0)));

    assert_eq!(ui.vertex_count(), 6);
    assert_eq!(ui.batches()[0].count, 6);
    assert_eq!(entries.lock().unwrap().len(), 1);
}

#[test]
fn test_batch_overflow_is_rejected() {
    let (log, entries) = capture_log(LogSeverity::Warn);
    let mut ui = UiFrame::new(MAX_UI_BATCHES + 8, log);
    let vertex = [UiVertex::default()];
    for i in 0..MAX_UI_BATCHES as u32 {
        assert!(ui.write(UiTexture::Texture(i), &vertex));
    }
    assert!(!ui.write(UiTexture::Texture(9999), &vertex));
    // Merging into the last batch still works
    assert!(ui.write(UiTexture::Texture(MAX_UI_BATCHES as u32 - 1), &vertex));

    assert_eq!(ui.batches().len(), MAX_UI_BATCHES);
    assert_eq!(entries.lock().unwrap().len(), 1);
}
