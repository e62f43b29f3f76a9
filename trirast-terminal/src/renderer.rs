/// CPU scanline rasterizer implementing the kernel contract
use nalgebra::Vector4;
use trirast_core::framebuffer::DepthSample;
use trirast_core::geometry::{triangles, Triangle};
use trirast_core::kernel::{KernelInvocation, RasterKernel};
use trirast_core::math::{Mat4, Vec3};

/// Vertices with clip-space w at or below this are behind the eye.
const MIN_CLIP_W: f32 = 1e-5;

/// Fraction of the base colour a surface facing away from the light keeps.
const AMBIENT: f32 = 0.15;

/// A vertex after the perspective divide, in pixel coordinates.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    /// Depth in [0, 1], 0 at the near plane.
    z: f32,
}

/// Single-threaded scan converter with a 16-bit depth test.
#[derive(Debug, Clone)]
pub struct ScanlineKernel {
    pub background: [u8; 4],
    pub surface: [u8; 3],
    pub wire: [u8; 3],
}

impl Default for ScanlineKernel {
    fn default() -> Self {
        Self {
            background: [16, 16, 24, 255],
            surface: [230, 200, 150],
            wire: [120, 255, 160],
        }
    }
}

impl RasterKernel for ScanlineKernel {
    fn render(&mut self, frame: KernelInvocation<'_>) {
        for pixel in frame.color.chunks_exact_mut(4) {
            pixel.copy_from_slice(&self.background);
        }
        frame.depth.fill(DepthSample::MAX);

        let view_projection = frame.view_projection_matrix();
        let mut target = Target {
            color: frame.color,
            depth: frame.depth,
            width: frame.width as usize,
            height: frame.height as usize,
        };

        for triangle in triangles(frame.vertices) {
            let mut screen = [ScreenVertex { x: 0.0, y: 0.0, z: 0.0 }; 3];
            let mut visible = true;
            for (slot, vertex) in screen.iter_mut().zip(&triangle.vertices) {
                match project(&view_projection, &vertex.position, target.width, target.height) {
                    Some(projected) => *slot = projected,
                    None => {
                        visible = false;
                        break;
                    }
                }
            }
            if !visible {
                continue;
            }

            if frame.wireframe {
                target.draw_outline(&screen, self.wire);
            } else {
                let color = self.shade(&triangle, &frame.camera_position);
                target.fill_triangle(&screen, color);
            }
        }
    }
}

impl ScanlineKernel {
    /// Lambert term against a light at the eye, two-sided.
    fn shade(&self, triangle: &Triangle, eye: &Vec3) -> [u8; 3] {
        let normal = triangle.shading_normal();
        let to_eye = (eye - triangle.centroid())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::zeros);
        let intensity = AMBIENT + (1.0 - AMBIENT) * normal.dot(&to_eye).abs().min(1.0);
        self.surface.map(|c| (c as f32 * intensity).round() as u8)
    }
}

fn project(view_projection: &Mat4, position: &Vec3, width: usize, height: usize) -> Option<ScreenVertex> {
    let clip = view_projection * Vector4::new(position.x, position.y, position.z, 1.0);
    if clip.w <= MIN_CLIP_W {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    Some(ScreenVertex {
        x: (ndc.x * 0.5 + 0.5) * width as f32,
        // row 0 is the top of the image
        y: (0.5 - ndc.y * 0.5) * height as f32,
        z: ndc.z * 0.5 + 0.5,
    })
}

struct Target<'a> {
    color: &'a mut [u8],
    depth: &'a mut [DepthSample],
    width: usize,
    height: usize,
}

impl Target<'_> {
    fn fill_triangle(&mut self, v: &[ScreenVertex; 3], color: [u8; 3]) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (v0, v1, v2) = (v[0], v[1], v[2]);

        // Bounding box clipped to the surface
        let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i64).max(0);
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i64).min(self.width as i64 - 1);
        let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i64).max(0);
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i64).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), p) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * v0.z + w1 * v1.z + w2 * v2.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                self.plot(x as usize, y as usize, quantize_depth(z), color);
            }
        }
    }

    fn draw_outline(&mut self, v: &[ScreenVertex; 3], color: [u8; 3]) {
        for (a, b) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])] {
            self.draw_line(a, b, color);
        }
    }

    fn draw_line(&mut self, a: ScreenVertex, b: ScreenVertex, color: [u8; 3]) {
        let Some((a, b)) = clip_segment(a, b, self.width as f32, self.height as f32) else {
            return;
        };
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let steps = line_steps(&a, &b);
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let (x, y) = ((a.x + dx * t).floor(), (a.y + dy * t).floor());
            if x < 0.0 || y < 0.0 || x >= self.width as f32 || y >= self.height as f32 {
                continue;
            }
            let z = (a.z + (b.z - a.z) * t).clamp(0.0, 1.0);
            self.plot(x as usize, y as usize, quantize_depth(z), color);
        }
    }

    fn plot(&mut self, x: usize, y: usize, depth: DepthSample, color: [u8; 3]) {
        let idx = y * self.width + x;
        if depth >= self.depth[idx] {
            return;
        }
        self.depth[idx] = depth;
        self.color[idx * 4..idx * 4 + 4].copy_from_slice(&[color[0], color[1], color[2], 255]);
    }
}

/// Liang-Barsky clip of a segment against `[0, width] x [0, height]`.
///
/// Vertices just in front of the eye project far outside the surface, so
/// stepping the unclipped segment could take millions of iterations.
fn clip_segment(
    a: ScreenVertex,
    b: ScreenVertex,
    width: f32,
    height: f32,
) -> Option<(ScreenVertex, ScreenVertex)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [(-dx, a.x), (dx, width - a.x), (-dy, a.y), (dy, height - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f32| ScreenVertex {
        x: a.x + dx * t,
        y: a.y + dy * t,
        z: a.z + (b.z - a.z) * t,
    };
    Some((at(t0), at(t1)))
}

fn line_steps(a: &ScreenVertex, b: &ScreenVertex) -> usize {
    (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0) as usize
}

fn quantize_depth(z: f32) -> DepthSample {
    (z * (DepthSample::MAX - 1) as f32) as DepthSample
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
