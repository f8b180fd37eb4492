//! STL (Stereolithography) reading and writing.
//!
//! Both encodings are supported and told apart automatically:
//!
//! - A file whose length is exactly `84 + 50 * n`, where `n` is the
//!   little-endian count stored at byte 80, is binary.
//! - Otherwise a file starting with `solid` is ASCII.
//! - Anything else is treated as binary and rejected if truncated.
//!
//! The size check comes first because plenty of exporters write binary
//! files whose 80-byte header starts with `solid`.
//!
//! # Binary layout
//!
//! ```text
//! UINT8[80]    header
//! UINT32       triangle count
//! per triangle
//!     REAL32[3]  facet normal (ignored on load)
//!     REAL32[3]  vertex 1
//!     REAL32[3]  vertex 2
//!     REAL32[3]  vertex 3
//!     UINT16     attribute byte count
//! ```
//!
//! Loaded meshes are triangle soup: every facet gets three private vertices.
//! Use [`IndexedMesh::welded`] to recover shared topology.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use mesh_types::{IndexedMesh, Point3, Vertex};
use tracing::debug;

use crate::error::{IoError, IoResult};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// On-disk STL encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StlEncoding {
    /// Human-readable `solid ... endsolid` text.
    Ascii,
    /// Compact little-endian binary.
    #[default]
    Binary,
}

/// Load a mesh from an STL file, detecting the encoding.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] if `path` does not exist.
/// - [`IoError::InvalidContent`] for malformed ASCII facets.
/// - [`IoError::InvalidHeader`] / [`IoError::InvalidFaceCount`] for
///   truncated binary files.
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_stl;
///
/// let mesh = load_stl("part.stl")?;
/// println!("{} facets", mesh.faces.len());
/// # Ok::<(), mesh_io::IoError>(())
/// ```
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })?;

    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes)?;

    let mesh = parse_stl(&bytes)?;
    debug!(
        path = %path.display(),
        faces = mesh.faces.len(),
        "loaded STL"
    );
    Ok(mesh)
}

/// Parse an in-memory STL buffer, detecting the encoding.
///
/// # Errors
///
/// Same as [`load_stl`], minus the file-system errors.
pub fn parse_stl(bytes: &[u8]) -> IoResult<IndexedMesh> {
    match detect_encoding(bytes) {
        StlEncoding::Ascii => read_ascii(bytes),
        StlEncoding::Binary => read_binary(bytes),
    }
}

fn detect_encoding(bytes: &[u8]) -> StlEncoding {
    if let Some(count) = binary_face_count(bytes) {
        if HEADER_SIZE + 4 + count as usize * TRIANGLE_SIZE == bytes.len() {
            return StlEncoding::Binary;
        }
    }

    let head = &bytes[..bytes.len().min(HEADER_SIZE)];
    if String::from_utf8_lossy(head).trim_start().starts_with("solid") {
        StlEncoding::Ascii
    } else {
        StlEncoding::Binary
    }
}

fn binary_face_count(bytes: &[u8]) -> Option<u32> {
    let count: [u8; 4] = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(count))
}

fn read_binary(bytes: &[u8]) -> IoResult<IndexedMesh> {
    let face_count = binary_face_count(bytes).ok_or(IoError::InvalidHeader {
        expected: HEADER_SIZE + 4,
        got: bytes.len(),
    })?;

    // The header count is untrusted until the records are known to exist.
    let records = &bytes[HEADER_SIZE + 4..];
    let available = records.len() / TRIANGLE_SIZE;
    if face_count as usize > available {
        return Err(IoError::InvalidFaceCount {
            expected: face_count,
            got: u32::try_from(available).unwrap_or(u32::MAX),
        });
    }

    let mut mesh = IndexedMesh::with_capacity(face_count as usize * 3, face_count as usize);
    for record in records.chunks_exact(TRIANGLE_SIZE).take(face_count as usize) {
        // Bytes 0..12 hold the stored normal, which is recomputed on demand.
        let corners = [
            decode_vertex(&record[12..24]),
            decode_vertex(&record[24..36]),
            decode_vertex(&record[36..48]),
        ];
        push_facet(&mut mesh, corners);
    }

    Ok(mesh)
}

fn decode_vertex(chunk: &[u8]) -> Vertex {
    let mut coords = [0.0_f64; 3];
    for (coord, raw) in coords.iter_mut().zip(chunk.chunks_exact(4)) {
        let raw = [raw[0], raw[1], raw[2], raw[3]];
        *coord = f64::from(f32::from_le_bytes(raw));
    }
    Vertex::from(coords)
}

#[allow(clippy::cast_possible_truncation)]
// Truncation: mesh indices are u32, meshes with >4B vertices are unsupported
fn push_facet(mesh: &mut IndexedMesh, corners: [Vertex; 3]) {
    let base = mesh.vertices.len() as u32;
    mesh.vertices.extend(corners);
    mesh.faces.push([base, base + 1, base + 2]);
}

fn read_ascii<R: BufRead>(reader: R) -> IoResult<IndexedMesh> {
    let mut mesh = IndexedMesh::new();
    let mut corners: Vec<Vertex> = Vec::with_capacity(3);
    let mut in_facet = false;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "facet" => {
                in_facet = true;
                corners.clear();
            }
            "vertex" => {
                if !in_facet {
                    return Err(IoError::invalid_content(format!(
                        "line {line_no}: vertex outside of a facet"
                    )));
                }
                let mut coords = [0.0_f64; 3];
                for coord in &mut coords {
                    let token = tokens.next().ok_or_else(|| {
                        IoError::invalid_content(format!(
                            "line {line_no}: vertex needs three coordinates"
                        ))
                    })?;
                    *coord = token.parse()?;
                }
                corners.push(Vertex::from(coords));
            }
            "endfacet" => {
                let facet: [Vertex; 3] = corners.as_slice().try_into().map_err(|_| {
                    IoError::invalid_content(format!(
                        "line {line_no}: facet has {} vertices, expected 3",
                        corners.len()
                    ))
                })?;
                push_facet(&mut mesh, facet);
                in_facet = false;
            }
            "endsolid" => break,
            // solid, outer loop, endloop
            _ => {}
        }
    }

    Ok(mesh)
}

/// Save a mesh as STL.
///
/// Facet normals are recomputed from the winding; degenerate faces get a
/// zero normal.
///
/// # Errors
///
/// - [`IoError::InvalidContent`] if a face references a missing vertex.
/// - [`IoError::Io`] if the file cannot be written.
pub fn save_stl<P: AsRef<Path>>(
    mesh: &IndexedMesh,
    path: P,
    encoding: StlEncoding,
) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    match encoding {
        StlEncoding::Binary => write_binary(mesh, &mut writer)?,
        StlEncoding::Ascii => write_ascii(mesh, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

fn facets(mesh: &IndexedMesh) -> impl Iterator<Item = IoResult<[Point3<f64>; 3]>> + '_ {
    (0..mesh.faces.len()).map(|i| {
        mesh.face_positions(i).ok_or_else(|| {
            IoError::invalid_content(format!("face {i} references a missing vertex"))
        })
    })
}

fn facet_normal([a, b, c]: &[Point3<f64>; 3]) -> [f64; 3] {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    if len > f64::EPSILON {
        [n.x / len, n.y / len, n.z / len]
    } else {
        [0.0; 3]
    }
}

fn write_binary<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    let face_count = u32::try_from(mesh.faces.len())
        .map_err(|_| IoError::invalid_content("too many faces for binary STL"))?;

    let mut header = [b' '; HEADER_SIZE];
    let banner = b"binary STL written by mesh-io";
    header[..banner.len()].copy_from_slice(banner);
    writer.write_all(&header)?;
    writer.write_all(&face_count.to_le_bytes())?;

    for facet in facets(mesh) {
        let facet = facet?;
        write_f32_triple(writer, facet_normal(&facet))?;
        for p in &facet {
            write_f32_triple(writer, [p.x, p.y, p.z])?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
// Truncation: binary STL stores single precision
fn write_f32_triple<W: Write>(writer: &mut W, values: [f64; 3]) -> IoResult<()> {
    for v in values {
        writer.write_all(&(v as f32).to_le_bytes())?;
    }
    Ok(())
}

fn write_ascii<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "solid mesh")?;
    for facet in facets(mesh) {
        let facet = facet?;
        let [nx, ny, nz] = facet_normal(&facet);
        writeln!(writer, "  facet normal {nx:e} {ny:e} {nz:e}")?;
        writeln!(writer, "    outer loop")?;
        for p in &facet {
            // `{:e}` prints the shortest representation that round-trips.
            writeln!(writer, "      vertex {:e} {:e} {:e}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid mesh")?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use mesh_types::{MeshTopology, unit_cube};

    const ONE_FACET: &[u8] = b"solid test
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid test
";

    #[test]
    fn parse_ascii_facet() {
        let mesh = parse_stl(ONE_FACET).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertices[1].position, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn ascii_facet_with_two_vertices_is_rejected() {
        let broken = b"solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid t\n";
        let err = parse_stl(broken).unwrap_err();
        assert!(matches!(err, IoError::InvalidContent { .. }));
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn ascii_bad_coordinate_is_parse_error() {
        let broken = b"solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 zero 0\n";
        assert!(matches!(parse_stl(broken), Err(IoError::ParseFloat(_))));
    }

    #[test]
    fn binary_header_starting_with_solid_is_binary() {
        let cube = unit_cube();
        let mut bytes = Vec::new();
        write_binary(&cube, &mut bytes).unwrap();
        bytes[..5].copy_from_slice(b"solid");

        let mesh = parse_stl(&bytes).unwrap();
        assert_eq!(mesh.face_count(), 12);
    }

    #[test]
    fn truncated_binary_reports_faces_read() {
        let cube = unit_cube();
        let mut bytes = Vec::new();
        write_binary(&cube, &mut bytes).unwrap();
        bytes.truncate(HEADER_SIZE + 4 + 3 * TRIANGLE_SIZE + 10);

        match parse_stl(&bytes) {
            Err(IoError::InvalidFaceCount { expected, got }) => {
                assert_eq!(expected, 12);
                assert_eq!(got, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn oversized_face_count_is_rejected_before_allocating() {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&[0u8; TRIANGLE_SIZE]);

        match parse_stl(&bytes) {
            Err(IoError::InvalidFaceCount { expected, got }) => {
                assert_eq!(expected, u32::MAX);
                assert_eq!(got, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn tiny_binary_is_invalid_header() {
        assert!(matches!(
            parse_stl(&[0u8; 20]),
            Err(IoError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn roundtrip_both_encodings() {
        let cube = unit_cube();
        let dir = tempfile::tempdir().unwrap();

        for encoding in [StlEncoding::Binary, StlEncoding::Ascii] {
            let path = dir.path().join(format!("cube_{encoding:?}.stl"));
            save_stl(&cube, &path, encoding).unwrap();
            let loaded = load_stl(&path).unwrap();

            assert_eq!(loaded.face_count(), 12);
            assert_eq!(loaded.vertex_count(), 36);
            for face in 0..12 {
                assert_eq!(loaded.face_positions(face), cube.face_positions(face));
            }
        }
    }

    #[test]
    fn save_rejects_dangling_index() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.faces.push([0, 1, 2]);

        let dir = tempfile::tempdir().unwrap();
        let result = save_stl(&mesh, dir.path().join("bad.stl"), StlEncoding::Ascii);
        assert!(matches!(result, Err(IoError::InvalidContent { .. })));
    }

    #[test]
    fn load_missing_file() {
        let err = load_stl("definitely_missing_7f3a.stl").unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
