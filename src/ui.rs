//! Tap targets
//!
//! Only the geometry lives here: where the mute button and the game-over
//! dialog's retry button are, and what a tap means on the current screen.

use glam::Vec2;

/// Axis-aligned tap target (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl HitRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Edges count as inside
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

pub const MUTE_BUTTON_SIZE: f32 = 50.0;
pub const DIALOG_WIDTH: f32 = 340.0;
pub const DIALOG_HEIGHT: f32 = 440.0;

/// Mute toggle in the top-right corner
pub fn mute_button(playfield_width: f32) -> HitRegion {
    HitRegion::new(playfield_width - 60.0, 10.0, MUTE_BUTTON_SIZE, MUTE_BUTTON_SIZE)
}

/// Game-over dialog geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialogLayout {
    pub panel: HitRegion,
    pub retry: HitRegion,
}

impl DialogLayout {
    /// Dialog centered in the playfield
    pub fn centered(playfield_width: f32, playfield_height: f32) -> Self {
        let x = (playfield_width - DIALOG_WIDTH) / 2.0;
        let y = (playfield_height - DIALOG_HEIGHT) / 2.0;
        let button_y = y + DIALOG_HEIGHT - 85.0;
        Self {
            panel: HitRegion::new(x, y, DIALOG_WIDTH, DIALOG_HEIGHT),
            retry: HitRegion::new(x + 25.0, button_y, 230.0, 50.0),
        }
    }
}

/// What a tap asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    StartRound,
    ToggleMute,
    Retry,
}

/// Resolve a tap against the screen currently shown
pub fn hit_test(tap: Vec2, title: bool, dialog: bool, width: f32, height: f32) -> Option<UiAction> {
    if title {
        return Some(UiAction::StartRound);
    }
    if mute_button(width).contains(tap) {
        return Some(UiAction::ToggleMute);
    }
    if dialog && DialogLayout::centered(width, height).retry.contains(tap) {
        return Some(UiAction::Retry);
    }
    None
}
