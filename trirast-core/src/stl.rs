/// STL reader for binary and ASCII files
///
/// Every facet becomes a three-corner face that shares one normal.
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::math::Vec3;
use crate::mesh::{Corner, Face, MeshError, MeshGroup, ParsedMesh};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

struct Facet {
    normal: Vec3,
    vertices: [Vec3; 3],
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<ParsedMesh, MeshError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(MeshError::Stl("file too small to be a valid STL".to_string()));
    }

    let (body, triangle_count) = binary_header(data)
        .map_err(|e| MeshError::Stl(format!("bad header: {e:?}")))?;
    let triangle_count = triangle_count as usize;
    if body.len() < triangle_count * FACET_LEN {
        return Err(MeshError::Stl(format!(
            "header declares {triangle_count} facets but only {} bytes follow",
            body.len()
        )));
    }

    let (_, facets) = count(binary_facet, triangle_count)(body)
        .map_err(|e| MeshError::Stl(format!("bad facet: {e:?}")))?;
    Ok(mesh_from_facets(facets))
}

fn binary_header(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(take(HEADER_LEN), le_u32)(input)
}

fn binary_vec3(input: &[u8]) -> IResult<&[u8], Vec3> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    let (input, normal) = binary_vec3(input)?;
    let (input, (a, b, c)) = tuple((binary_vec3, binary_vec3, binary_vec3))(input)?;
    // attribute byte count
    let (input, _) = take(2usize)(input)?;
    Ok((
        input,
        Facet {
            normal,
            vertices: [a, b, c],
        },
    ))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<ParsedMesh, MeshError> {
    match ascii_solid(input) {
        Ok((_, facets)) => Ok(mesh_from_facets(facets)),
        Err(e) => Err(MeshError::Stl(format!("failed to parse ASCII STL: {e:?}"))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // optional name
    let (input, facets) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, facets))
}

fn ascii_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vec3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((
        input,
        Facet {
            normal,
            vertices: [a, b, c],
        },
    ))
}

fn ascii_vertex(input: &str) -> IResult<&str, Vec3> {
    preceded(preceded(multispace0, tag("vertex")), ascii_vec3)(input)
}

fn ascii_vec3(input: &str) -> IResult<&str, Vec3> {
    let (input, (x, y, z)) = tuple((
        preceded(multispace1, float),
        preceded(multispace1, float),
        preceded(multispace1, float),
    ))(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

fn mesh_from_facets(facets: Vec<Facet>) -> ParsedMesh {
    let mut mesh = ParsedMesh {
        positions: Vec::with_capacity(facets.len() * 3),
        normals: Vec::with_capacity(facets.len()),
        groups: Vec::new(),
    };
    let mut faces = Vec::with_capacity(facets.len());

    for facet in facets {
        let normal = mesh.normals.len();
        mesh.normals.push(facet.normal);
        let corners = facet
            .vertices
            .iter()
            .map(|v| {
                mesh.positions.push(*v);
                Corner::new(mesh.positions.len() - 1, normal)
            })
            .collect();
        faces.push(Face { corners });
    }

    mesh.groups.push(MeshGroup {
        name: "solid".to_string(),
        faces,
    });
    mesh
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<ParsedMesh, MeshError> {
    // Binary files may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}
