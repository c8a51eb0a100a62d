//! Camera and autocam state machine.
//!
//! The camera is a look-at rig (position, look-at point, up). It moves either
//! by small bounded manual deltas or, while an autonomous mode is selected,
//! by [`advance`], a pure function of (mode, dt, previous state).
//!
//! # Invariants
//! - Position and look-at never coincide after any update.
//! - Autocam depends only on elapsed `dt`, never on wall-clock time.
//! - While an autonomous mode is active, manual deltas are ignored.

mod autocam;
mod camera;
mod delta;
mod mode;
mod projection;
mod state;

pub use autocam::{AutocamRig, advance};
pub use camera::Camera;
pub use delta::{DeltaKind, MAX_LINEAR_DELTA, MAX_YAW_DELTA};
pub use mode::{AutocamMode, UnknownMode};
pub use projection::Projection;
pub use state::{CameraState, MIN_ALTITUDE, MIN_LOOK_DISTANCE, MotionState};
