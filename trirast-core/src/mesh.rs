/// Parsed mesh model and its flattening into the vertex stream.
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::geometry::{Vertex, VertexStream};
use crate::math::Vec3;
use crate::{obj, stl};

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to read mesh file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("mesh file {0} is not valid UTF-8")]
    Encoding(PathBuf),
    #[error("OBJ line {line}: {message}")]
    Obj { line: usize, message: String },
    #[error("invalid STL data: {0}")]
    Stl(String),
    #[error("vertex stream capacity exceeded: need {required} floats, capacity is {capacity}")]
    CapacityExceeded { required: usize, capacity: usize },
}

/// One polygon corner: indices into the mesh's shared arrays.
///
/// `None` means the source gave no index for that attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Corner {
    pub position: Option<usize>,
    pub normal: Option<usize>,
}

impl Corner {
    pub fn new(position: usize, normal: usize) -> Self {
        Self {
            position: Some(position),
            normal: Some(normal),
        }
    }
}

/// A polygon with any number of corners, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Face {
    pub corners: Vec<Corner>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshGroup {
    pub name: String,
    pub faces: Vec<Face>,
}

/// A mesh as read from disk: shared attribute arrays plus grouped faces.
///
/// Only lives long enough to be flattened.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub groups: Vec<MeshGroup>,
}

impl ParsedMesh {
    pub fn face_count(&self) -> usize {
        self.groups.iter().map(|group| group.faces.len()).sum()
    }

    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.groups.iter().flat_map(|group| group.faces.iter())
    }

    /// A triangulated cube centred on the origin with outward normals.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let positions = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        let normals = vec![
            Vec3::z(),
            -Vec3::z(),
            Vec3::y(),
            -Vec3::y(),
            Vec3::x(),
            -Vec3::x(),
        ];
        // (normal, two counter-clockwise triangles)
        let sides: [(usize, [[usize; 3]; 2]); 6] = [
            (0, [[4, 5, 6], [4, 6, 7]]),
            (1, [[1, 0, 3], [1, 3, 2]]),
            (2, [[3, 7, 6], [3, 6, 2]]),
            (3, [[0, 1, 5], [0, 5, 4]]),
            (4, [[5, 1, 2], [5, 2, 6]]),
            (5, [[0, 4, 7], [0, 7, 3]]),
        ];

        let faces = sides
            .iter()
            .flat_map(|(normal, tris)| {
                tris.iter().map(move |tri| Face {
                    corners: tri.iter().map(|&p| Corner::new(p, *normal)).collect(),
                })
            })
            .collect();

        Self {
            positions,
            normals,
            groups: vec![MeshGroup {
                name: "cube".to_string(),
                faces,
            }],
        }
    }
}

/// Appends every face of `mesh` to `stream` as interleaved vertices.
///
/// Each corner with a valid position index becomes one vertex at
/// `offset + position * scale`; corners without one are skipped. A missing or
/// invalid normal index yields a zero normal. Corners are emitted in source
/// order without re-triangulation, so the result is a valid triangle list only
/// if every face already has three corners.
///
/// Returns the new stream length in floats. Running out of capacity is an
/// error; vertices appended before that point stay in the stream.
pub fn flatten(
    mesh: &ParsedMesh,
    stream: &mut VertexStream,
    offset: Vec3,
    scale: f32,
) -> Result<usize, MeshError> {
    let capacity = stream.capacity();
    let mut polygons = 0usize;
    for face in mesh.faces() {
        if face.corners.len() != 3 {
            polygons += 1;
        }
        for corner in &face.corners {
            let Some(position) = corner.position.and_then(|i| mesh.positions.get(i)) else {
                continue;
            };
            let normal = corner
                .normal
                .and_then(|i| mesh.normals.get(i))
                .copied()
                .unwrap_or_else(Vec3::zeros);

            let vertex = Vertex::new(offset + position * scale, normal);
            stream
                .try_push(&vertex)
                .map_err(|required| MeshError::CapacityExceeded { required, capacity })?;
        }
    }

    if polygons > 0 {
        tracing::warn!(polygons, "faces without exactly three corners are emitted untriangulated");
    }
    Ok(stream.len())
}

/// Reads a mesh file; `.stl` files go to the STL reader, everything else is OBJ.
pub fn load_mesh(path: &Path) -> Result<ParsedMesh, MeshError> {
    let data = std::fs::read(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_stl = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"));

    let mesh = if is_stl {
        stl::parse_stl(&data)?
    } else {
        let text =
            std::str::from_utf8(&data).map_err(|_| MeshError::Encoding(path.to_path_buf()))?;
        obj::parse_obj(text)?
    };

    tracing::info!(
        path = %path.display(),
        positions = mesh.positions.len(),
        faces = mesh.face_count(),
        "mesh loaded"
    );
    Ok(mesh)
}

/// Loads `path` and flattens it into `stream`; the parsed mesh is dropped afterwards.
pub fn load_into(
    path: &Path,
    stream: &mut VertexStream,
    offset: Vec3,
    scale: f32,
) -> Result<usize, MeshError> {
    let mesh = load_mesh(path)?;
    flatten(&mesh, stream, offset, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::VERTEX_FLOATS;
    use std::io::Write;

    fn triangle_mesh(corners: Vec<Corner>) -> ParsedMesh {
        ParsedMesh {
            positions: vec![
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
                Vec3::new(0.0, 0.0, 3.0),
            ],
            normals: vec![Vec3::new(0.0, 1.0, 0.0)],
            groups: vec![MeshGroup {
                name: "default".to_string(),
                faces: vec![Face { corners }],
            }],
        }
    }

    #[test]
    fn test_triangle_appends_eighteen_floats() {
        let mesh = triangle_mesh(vec![Corner::new(0, 0), Corner::new(1, 0), Corner::new(2, 0)]);
        let mut stream = VertexStream::with_capacity(1024);
        let offset = Vec3::new(10.0, 20.0, 30.0);

        let len = flatten(&mesh, &mut stream, offset, 0.5).unwrap();
        assert_eq!(len, 18);

        let floats = stream.as_slice();
        assert_eq!(&floats[0..6], &[10.5, 20.0, 30.0, 0.0, 1.0, 0.0]);
        assert_eq!(&floats[6..9], &[10.0, 21.0, 30.0]);
        assert_eq!(&floats[12..15], &[10.0, 20.0, 31.5]);
    }

    #[test]
    fn test_corner_without_position_is_skipped() {
        let mut corners = vec![Corner::new(0, 0), Corner::new(1, 0), Corner::new(2, 0)];
        corners[1].position = None;
        let mesh = triangle_mesh(corners);
        let mut stream = VertexStream::with_capacity(1024);

        let len = flatten(&mesh, &mut stream, Vec3::zeros(), 1.0).unwrap();
        assert!(len < 18);
        assert_eq!(len, 12);
    }

    #[test]
    fn test_out_of_range_position_is_skipped() {
        let mesh = triangle_mesh(vec![Corner::new(0, 0), Corner::new(9, 0), Corner::new(2, 0)]);
        let mut stream = VertexStream::with_capacity(1024);
        assert_eq!(flatten(&mesh, &mut stream, Vec3::zeros(), 1.0).unwrap(), 12);
    }

    #[test]
    fn test_missing_normal_is_zero() {
        let mut corners = vec![Corner::new(0, 0), Corner::new(1, 0), Corner::new(2, 0)];
        corners[0].normal = None;
        let mesh = triangle_mesh(corners);
        let mut stream = VertexStream::with_capacity(1024);
        flatten(&mesh, &mut stream, Vec3::zeros(), 1.0).unwrap();
        assert_eq!(&stream.as_slice()[3..6], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_flatten_appends_after_existing_content() {
        let mesh = ParsedMesh::cube(1.0);
        let mut stream = VertexStream::with_capacity(1024);
        flatten(&mesh, &mut stream, Vec3::zeros(), 1.0).unwrap();
        let len = flatten(&mesh, &mut stream, Vec3::new(3.0, 0.0, 0.0), 1.0).unwrap();
        assert_eq!(len, 2 * 36 * VERTEX_FLOATS);
        assert_eq!(stream.as_slice()[216], 2.5);
    }

    #[test]
    fn test_quad_is_not_retriangulated() {
        let mesh = triangle_mesh(vec![
            Corner::new(0, 0),
            Corner::new(1, 0),
            Corner::new(2, 0),
            Corner::new(0, 0),
        ]);
        let mut stream = VertexStream::with_capacity(1024);
        assert_eq!(flatten(&mesh, &mut stream, Vec3::zeros(), 1.0).unwrap(), 24);
    }

    #[test]
    fn test_capacity_exceeded_is_reported() {
        let mesh = ParsedMesh::cube(1.0);
        let mut stream = VertexStream::with_capacity(100);
        let err = flatten(&mesh, &mut stream, Vec3::zeros(), 1.0).unwrap_err();
        assert!(matches!(
            err,
            MeshError::CapacityExceeded {
                required: 102,
                capacity: 100
            }
        ));
        assert_eq!(stream.len(), 96);
    }

    #[test]
    fn test_cube_normals_face_outward() {
        let cube = ParsedMesh::cube(2.0);
        assert_eq!(cube.face_count(), 12);
        let mut stream = VertexStream::with_capacity(1024);
        flatten(&cube, &mut stream, Vec3::zeros(), 1.0).unwrap();
        for tri in stream.triangles() {
            let geometric = tri.calculate_normal();
            assert!((geometric - tri.vertices[0].normal).norm() < 1e-5);
            assert!(geometric.dot(&tri.centroid()) > 0.0);
        }
    }

    #[test]
    fn test_load_obj_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1").unwrap();

        let mut stream = VertexStream::with_capacity(1024);
        let len = load_into(file.path(), &mut stream, Vec3::zeros(), 2.0).unwrap();
        assert_eq!(len, 18);
        assert_eq!(&stream.as_slice()[6..12], &[2.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_mesh(&dir.path().join("missing.obj")).unwrap_err();
        assert!(matches!(err, MeshError::Io { .. }));
    }

    #[test]
    fn test_load_dispatches_stl_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".STL").tempfile().unwrap();
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&0u32.to_le_bytes());
        file.write_all(&data).unwrap();

        let mesh = load_mesh(file.path()).unwrap();
        assert_eq!(mesh.face_count(), 0);
    }
}
