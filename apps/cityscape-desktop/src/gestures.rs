use cityscape_camera::{AutocamMode, DeltaKind};
use winit::keyboard::KeyCode;

/// Radians of yaw per pixel of horizontal drag.
pub const YAW_PER_PIXEL: f32 = 0.01;
/// Look-at height change per pixel of vertical drag.
pub const PITCH_PER_PIXEL: f32 = 0.3;
/// Dolly distance per wheel line.
pub const DOLLY_PER_LINE: f32 = 4.0;
/// Held-key travel speed, units per second.
pub const MOVE_SPEED: f32 = 40.0;

/// What the host asks the renderer to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostAction {
    Delta(DeltaKind, f32),
    ToggleAutocam,
    SetMode(AutocamMode),
    Rebuild,
    RebuildInBackground,
    RegenerateTextures,
    /// Change the texture count by this many layers.
    AdjustTextures(i32),
    Quit,
}

/// Translates raw pointer and keyboard input into bounded relative deltas.
///
/// Only deltas between consecutive cursor samples of one drag are emitted;
/// the previous position is forgotten whenever a drag starts or ends, so a
/// new drag never jumps.
#[derive(Debug, Default)]
pub struct Gestures {
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    held: Vec<KeyCode>,
}

impl Gestures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
        self.last_cursor = None;
    }

    /// Cursor moved to `(x, y)`; yields yaw and pitch deltas while dragging.
    pub fn cursor_moved(&mut self, x: f64, y: f64) -> Vec<HostAction> {
        if !self.dragging {
            return Vec::new();
        }
        let Some((lx, ly)) = self.last_cursor.replace((x, y)) else {
            return Vec::new();
        };
        let (dx, dy) = ((x - lx) as f32, (y - ly) as f32);
        let mut out = Vec::new();
        if dx != 0.0 {
            out.push(HostAction::Delta(DeltaKind::Yaw, -dx * YAW_PER_PIXEL));
        }
        if dy != 0.0 {
            out.push(HostAction::Delta(DeltaKind::Pitch, -dy * PITCH_PER_PIXEL));
        }
        out
    }

    pub fn wheel(&self, lines: f32) -> HostAction {
        HostAction::Delta(DeltaKind::Dolly, lines * DOLLY_PER_LINE)
    }

    /// Key transition. Movement keys are tracked as held; the others map to
    /// one action on press.
    pub fn key(&mut self, key: KeyCode, pressed: bool) -> Option<HostAction> {
        if hold_delta(key).is_some() {
            if pressed {
                if !self.held.contains(&key) {
                    self.held.push(key);
                }
            } else {
                self.held.retain(|k| *k != key);
            }
            return None;
        }
        if !pressed {
            return None;
        }
        let digit = match key {
            KeyCode::Digit1 => Some(0),
            KeyCode::Digit2 => Some(1),
            KeyCode::Digit3 => Some(2),
            KeyCode::Digit4 => Some(3),
            KeyCode::Digit5 => Some(4),
            KeyCode::Digit6 => Some(5),
            _ => None,
        };
        if let Some(i) = digit {
            return AutocamMode::ALL.get(i).copied().map(HostAction::SetMode);
        }
        match key {
            KeyCode::Tab | KeyCode::Space => Some(HostAction::ToggleAutocam),
            KeyCode::KeyR => Some(HostAction::Rebuild),
            KeyCode::KeyB => Some(HostAction::RebuildInBackground),
            KeyCode::KeyT => Some(HostAction::RegenerateTextures),
            KeyCode::BracketLeft => Some(HostAction::AdjustTextures(-1)),
            KeyCode::BracketRight => Some(HostAction::AdjustTextures(1)),
            KeyCode::Escape => Some(HostAction::Quit),
            _ => None,
        }
    }

    /// Deltas from held movement keys over `dt` seconds.
    pub fn held_deltas(&self, dt: f32) -> Vec<HostAction> {
        self.held
            .iter()
            .filter_map(|k| hold_delta(*k))
            .map(|(kind, sign)| HostAction::Delta(kind, sign * MOVE_SPEED * dt))
            .collect()
    }
}

fn hold_delta(key: KeyCode) -> Option<(DeltaKind, f32)> {
    match key {
        KeyCode::KeyW => Some((DeltaKind::Dolly, 1.0)),
        KeyCode::KeyS => Some((DeltaKind::Dolly, -1.0)),
        KeyCode::KeyD => Some((DeltaKind::Strafe, 1.0)),
        KeyCode::KeyA => Some((DeltaKind::Strafe, -1.0)),
        KeyCode::KeyE => Some((DeltaKind::Raise, 1.0)),
        KeyCode::KeyQ => Some((DeltaKind::Raise, -1.0)),
        _ => None,
    }
}
