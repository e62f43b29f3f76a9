/// Call contract between the frame loop and a rasterization kernel.
use crate::framebuffer::DepthSample;
use crate::geometry::VERTEX_FLOATS;
use crate::math::{Mat4, Vec3};

/// Everything one kernel call may touch.
///
/// The borrows end with the call, so a kernel cannot keep buffer pointers
/// across frames or across a framebuffer resize.
pub struct KernelInvocation<'a> {
    /// RGBA8 rows, `width * height * 4` bytes.
    pub color: &'a mut [u8],
    /// One sample per pixel.
    pub depth: &'a mut [DepthSample],
    pub width: u32,
    pub height: u32,
    /// Interleaved position/normal triangle list.
    pub vertices: &'a [f32],
    /// Column-major world-to-clip transform.
    pub view_projection: [f32; 16],
    pub camera_position: Vec3,
    pub wireframe: bool,
}

impl KernelInvocation<'_> {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_FLOATS
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        Mat4::from_column_slice(&self.view_projection)
    }
}

/// Scan-converts one frame.
///
/// An implementation must overwrite the whole colour buffer for the given
/// dimensions on every call. The call is synchronous and always completes.
pub trait RasterKernel {
    fn render(&mut self, frame: KernelInvocation<'_>);
}

/// Copies a matrix into the flat column-major layout kernels consume.
pub fn column_major(matrix: &Mat4) -> [f32; 16] {
    let mut flat = [0.0; 16];
    flat.copy_from_slice(matrix.as_slice());
    flat
}
