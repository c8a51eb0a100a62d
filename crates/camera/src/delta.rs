use serde::{Deserialize, Serialize};

/// Largest yaw change accepted in one call, radians.
pub const MAX_YAW_DELTA: f32 = 0.5;
/// Largest translation (or look-at height change) accepted in one call.
pub const MAX_LINEAR_DELTA: f32 = 50.0;

/// Manual camera control produced by gesture translation.
///
/// Every kind is a relative delta; the camera clamps it to a bounded step so
/// a burst of input can never teleport the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeltaKind {
    /// Turn the view about the vertical axis (radians, positive = left).
    Yaw,
    /// Move the look-at point up or down.
    Pitch,
    /// Move along the view direction.
    Dolly,
    /// Move straight up or down.
    Raise,
    /// Move sideways, perpendicular to view and up (positive = right).
    Strafe,
}

impl DeltaKind {
    pub const ALL: [DeltaKind; 5] = [
        Self::Yaw,
        Self::Pitch,
        Self::Dolly,
        Self::Raise,
        Self::Strafe,
    ];

    /// Clamp a raw value to this kind's per-call bound. Non-finite input
    /// yields `None`.
    pub fn bound(self, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let limit = match self {
            Self::Yaw => MAX_YAW_DELTA,
            Self::Pitch | Self::Dolly | Self::Raise | Self::Strafe => MAX_LINEAR_DELTA,
        };
        Some(value.clamp(-limit, limit))
    }
}
