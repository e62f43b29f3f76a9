/// Wavefront OBJ reader.
///
/// Understands the statements the renderer needs: `v`, `vn`, `vt`, `f`, `g`
/// and `o`. Everything else (materials, smoothing groups, lines, points) is
/// skipped.
use nom::{
    branch::alt,
    bytes::complete::take_till1,
    character::complete::{char, i64 as integer, space0, space1},
    combinator::{all_consuming, map, opt, rest, value},
    multi::many1,
    number::complete::float,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::math::Vec3;
use crate::mesh::{Corner, Face, MeshError, MeshGroup, ParsedMesh};

#[derive(Debug, Clone, PartialEq)]
enum Statement<'a> {
    Position(Vec3),
    Normal(Vec3),
    TexCoord,
    Face(Vec<RawCorner>),
    Group(&'a str),
    Ignored,
}

/// Corner indices as written: 1-based, negative means relative to the end.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RawCorner {
    position: i64,
    normal: Option<i64>,
}

/// Parses OBJ text into a [`ParsedMesh`].
///
/// Faces before the first `g`/`o` land in a group named `default`; empty
/// groups are dropped.
pub fn parse_obj(input: &str) -> Result<ParsedMesh, MeshError> {
    let mut mesh = ParsedMesh::default();
    let mut texcoords = 0usize;
    let mut current = MeshGroup {
        name: "default".to_string(),
        faces: Vec::new(),
    };

    for (index, raw_line) in input.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let statement = match all_consuming(statement)(line) {
            Ok((_, statement)) => statement,
            Err(e) => {
                return Err(MeshError::Obj {
                    line: index + 1,
                    message: format!("malformed statement {line:?}: {e:?}"),
                })
            }
        };

        match statement {
            Statement::Position(p) => mesh.positions.push(p),
            Statement::Normal(n) => mesh.normals.push(n),
            Statement::TexCoord => texcoords += 1,
            Statement::Face(corners) => {
                let corners = corners
                    .iter()
                    .map(|c| Corner {
                        position: resolve_index(c.position, mesh.positions.len()),
                        normal: c.normal.and_then(|n| resolve_index(n, mesh.normals.len())),
                    })
                    .collect();
                current.faces.push(Face { corners });
            }
            Statement::Group(name) => {
                let next = MeshGroup {
                    name: name.to_string(),
                    faces: Vec::new(),
                };
                let finished = std::mem::replace(&mut current, next);
                if !finished.faces.is_empty() {
                    mesh.groups.push(finished);
                }
            }
            Statement::Ignored => {}
        }
    }

    if !current.faces.is_empty() {
        mesh.groups.push(current);
    }

    tracing::debug!(
        positions = mesh.positions.len(),
        normals = mesh.normals.len(),
        texcoords,
        groups = mesh.groups.len(),
        "parsed OBJ"
    );
    Ok(mesh)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(at) => &line[..at],
        None => line,
    }
}

/// Turns a written index into a 0-based one. `0` and indices that point
/// before the first element resolve to `None`.
fn resolve_index(written: i64, count: usize) -> Option<usize> {
    if written > 0 {
        usize::try_from(written - 1).ok()
    } else if written < 0 {
        let back = usize::try_from(-written).ok()?;
        count.checked_sub(back)
    } else {
        None
    }
}

fn statement(input: &str) -> IResult<&str, Statement<'_>> {
    let (body, keyword) = take_till1(|c: char| c.is_ascii_whitespace())(input)?;
    match keyword {
        // trailing w or vertex colours are ignored
        "v" => map(terminated(vector3, rest), Statement::Position)(body),
        "vn" => map(terminated(vector3, rest), Statement::Normal)(body),
        "vt" => value(Statement::TexCoord, preceded(space1, rest))(body),
        "f" => map(many1(preceded(space1, corner)), Statement::Face)(body),
        "g" | "o" => map(group_name, Statement::Group)(body),
        // materials, smoothing, free-form geometry and the like
        _ => value(Statement::Ignored, rest)(body),
    }
}

fn group_name(input: &str) -> IResult<&str, &str> {
    alt((preceded(space1, rest), map(space0, |_| "default")))(input)
}

fn vector3(input: &str) -> IResult<&str, Vec3> {
    let (input, (x, y, z)) = tuple((
        preceded(space1, float),
        preceded(space1, float),
        preceded(space1, float),
    ))(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

/// `p`, `p/t`, `p//n` or `p/t/n`.
fn corner(input: &str) -> IResult<&str, RawCorner> {
    let (input, position) = integer(input)?;
    let (input, tail) = opt(preceded(
        char('/'),
        pair(opt(integer), opt(preceded(char('/'), opt(integer)))),
    ))(input)?;

    let normal = tail.and_then(|(_texcoord, normal)| normal.flatten());
    Ok((input, RawCorner { position, normal }))
}
