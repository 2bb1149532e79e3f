pub mod backend;
pub mod camera;
pub mod factory;
pub mod hit;
pub mod paint;
pub mod scene;

pub use backend::{Axis, Backend, PrimitiveId, PrimitiveKind, TextExtent};
pub use camera::OrthoCamera;
pub use factory::{Instance, Visual, instantiate};
pub use hit::HitList;
pub use paint::VelloBackend;
pub use scene::RetainedScene;
