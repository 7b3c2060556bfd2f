pub mod camera;
pub mod config;
pub mod connectors;
pub mod curve;
pub mod dot_set;
pub mod driver;
pub mod hover;
pub mod lift;
pub mod picking;
pub mod render;
pub mod state;
pub mod sync;
pub mod tooltip;
pub mod tube;

pub use camera::{CameraRig, Ndc, OrbitControls, OrbitRig, OrthoCamera};
pub use config::{ConfigError, SceneConfig};
pub use driver::{FrameDriver, FrameReport};
pub use render::{NullSink, RenderSink};
pub use state::*;
pub use tooltip::{PointerKind, TooltipAction};
