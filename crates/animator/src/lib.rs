//! Per-frame animation for the handheld phone scene.
//!
//! Every animated value eases toward its target by a fixed fraction per
//! frame. Nothing here fails: inputs are validated before the first frame.

pub mod lerp;
pub mod camera;
pub mod state;
pub mod animator;
pub mod float;

pub use self::animator::{Animator, AnimatorTuning, FrameInput};
pub use camera::OrthographicCamera;
pub use float::{FloatMotion, FloatParams};
pub use lerp::{lerp, lerp_vec3, FrameTiming};
pub use state::AnimationState;
