/// Trirast Core Library - host side of a software triangle rasterizer
///
/// This library owns everything around the scan-conversion kernel: the
/// math, the fly camera, framebuffer storage, mesh ingestion and the frame
/// loop that hands each frame to a kernel and a presenter.

pub mod camera;
pub mod config;
pub mod frame;
pub mod framebuffer;
pub mod geometry;
pub mod headless;
pub mod kernel;
pub mod math;
pub mod mesh;
pub mod obj;
pub mod platform;
pub mod projection;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use camera::{Camera, CameraController, CameraInput};
pub use config::{CameraConfig, FrameConfig, RenderConfig};
pub use frame::{FrameError, FrameLoop, FrameStats, RenderState};
pub use framebuffer::{Framebuffer, FramebufferError};
pub use geometry::{Triangle, Vertex, VertexStream, VERTEX_FLOATS};
pub use kernel::{KernelInvocation, RasterKernel};
pub use mesh::{MeshError, ParsedMesh};
pub use platform::{Action, PlatformError, Presenter, Window};
pub use transform::EulerAngles;
