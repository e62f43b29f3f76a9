/// Interleaved vertex stream and the vertex/triangle views over it.
use crate::math::Vec3;

/// Floats per vertex in the stream: position xyz, then normal xyz.
pub const VERTEX_FLOATS: usize = 6;

/// A vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }

    /// Reads one vertex from a `VERTEX_FLOATS`-long chunk of the stream.
    pub fn from_floats(floats: &[f32]) -> Self {
        Self {
            position: Vec3::new(floats[0], floats[1], floats[2]),
            normal: Vec3::new(floats[3], floats[4], floats[5]),
        }
    }

    pub fn to_floats(&self) -> [f32; VERTEX_FLOATS] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
        ]
    }
}

/// Three consecutive vertices of a triangle-list stream.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Geometric face normal (counter-clockwise winding), or zero when degenerate.
    pub fn calculate_normal(&self) -> Vec3 {
        let v0 = self.vertices[0].position;
        let edge1 = self.vertices[1].position - v0;
        let edge2 = self.vertices[2].position - v0;
        edge1.cross(&edge2).try_normalize(1e-12).unwrap_or_else(Vec3::zeros)
    }

    /// Average of the vertex normals, falling back to the face normal.
    pub fn shading_normal(&self) -> Vec3 {
        let sum = self.vertices[0].normal + self.vertices[1].normal + self.vertices[2].normal;
        sum.try_normalize(1e-12)
            .unwrap_or_else(|| self.calculate_normal())
    }

    pub fn centroid(&self) -> Vec3 {
        (self.vertices[0].position + self.vertices[1].position + self.vertices[2].position) / 3.0
    }
}

/// Append-only vertex stream with a hard upper bound, in floats.
///
/// Appends that would pass the bound are refused whole, so the stream never
/// ends in a partial vertex.
#[derive(Debug, Clone)]
pub struct VertexStream {
    floats: Vec<f32>,
    capacity: usize,
}

impl VertexStream {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            floats: Vec::new(),
            capacity,
        }
    }

    /// Maximum number of floats the stream accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Length in floats.
    pub fn len(&self) -> usize {
        self.floats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floats.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.floats.len() / VERTEX_FLOATS
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.floats
    }

    /// Appends one vertex, or returns `Err(required_len)` if it would not fit.
    pub fn try_push(&mut self, vertex: &Vertex) -> Result<(), usize> {
        let required = self.floats.len() + VERTEX_FLOATS;
        if required > self.capacity {
            return Err(required);
        }
        self.floats.extend_from_slice(&vertex.to_floats());
        Ok(())
    }

    /// Consecutive vertex triples; a trailing partial triangle is ignored.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        triangles(&self.floats)
    }
}

/// Consecutive vertex triples of a raw stream slice.
pub fn triangles(floats: &[f32]) -> impl Iterator<Item = Triangle> + '_ {
    floats.chunks_exact(VERTEX_FLOATS * 3).map(|chunk| {
        Triangle::new(
            Vertex::from_floats(&chunk[..VERTEX_FLOATS]),
            Vertex::from_floats(&chunk[VERTEX_FLOATS..2 * VERTEX_FLOATS]),
            Vertex::from_floats(&chunk[2 * VERTEX_FLOATS..]),
        )
    })
}
