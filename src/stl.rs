//! Binary STL decoding into deduplicated meshes.
//!
//! The decoder is deliberately independent of whatever tool produced the
//! bytes; any conforming buffer works. Layout: 80-byte header, u32-LE
//! triangle count, then `count` 50-byte records (normal 3xf32, three
//! vertices 3xf32 each, u16 attribute count). Normals and attributes are
//! ignored; vertex winding is kept as-is.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::mesh::{Mesh, Triangle, Triangles, Vertex, Vertices};

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

/// Decimal digits kept when quantizing coordinates for deduplication.
const COORD_DECIMALS: i32 = 6;

/// Deduplication index: rounded coordinate triple -> stable vertex index.
///
/// Indices are assigned in first-seen order, so the resulting vertex list is
/// deterministic for a given triangle stream. Each mesh owns its own pool;
/// indices are never shared across meshes.
#[derive(Debug, Default)]
pub struct VertexPool {
    lookup: HashMap<[u64; 3], usize>,
    vertices: Vec<Vertex>,
}

impl VertexPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantize a coordinate triple and return its index, inserting the
    /// vertex if this rounded position has not been seen before.
    pub fn insert(&mut self, x: f64, y: f64, z: f64) -> usize {
        let (x, y, z) = (round_coord(x), round_coord(y), round_coord(z));
        let key = [x.to_bits(), y.to_bits(), z.to_bits()];
        match self.lookup.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.vertices.len();
                self.lookup.insert(key, idx);
                self.vertices.push(Vertex::new(x, y, z));
                idx
            }
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}

fn round_coord(v: f64) -> f64 {
    let scale = 10f64.powi(COORD_DECIMALS);
    let r = (v * scale).round() / scale;
    // -0.0 must key the same as 0.0
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Decode a binary STL buffer into a deduplicated [`Mesh`].
///
/// Any short read is a hard [`Error::Format`]; the decoder never truncates
/// silently.
pub fn decode_stl(data: &[u8]) -> Result<Mesh> {
    if data.len() < HEADER_LEN + 4 {
        return Err(Error::format(format!(
            "buffer of {} bytes is too short for an STL header",
            data.len()
        )));
    }

    let count = u32::from_le_bytes(data[HEADER_LEN..HEADER_LEN + 4].try_into().unwrap()) as usize;
    let expected = HEADER_LEN + 4 + count * RECORD_LEN;
    if data.len() < expected {
        return Err(Error::format(format!(
            "truncated STL: header declares {} triangles ({} bytes), got {} bytes",
            count,
            expected,
            data.len()
        )));
    }

    let mut pool = VertexPool::new();
    let mut triangles = Vec::with_capacity(count);

    let mut offset = HEADER_LEN + 4;
    for _ in 0..count {
        // skip the 3xf32 normal; slicers recompute facet normals anyway
        let mut idx = [0usize; 3];
        for (vi, slot) in idx.iter_mut().enumerate() {
            let base = offset + 12 + vi * 12;
            let x = read_f32(data, base) as f64;
            let y = read_f32(data, base + 4) as f64;
            let z = read_f32(data, base + 8) as f64;
            *slot = pool.insert(x, y, z);
        }
        triangles.push(Triangle {
            v1: idx[0],
            v2: idx[1],
            v3: idx[2],
        });
        offset += RECORD_LEN;
    }

    trace!(
        "decoded {} triangles into {} unique vertices",
        triangles.len(),
        pool.len()
    );

    Ok(Mesh {
        vertices: Vertices {
            vertex: pool.into_vertices(),
        },
        triangles: Triangles { triangle: triangles },
    })
}

/// Decode, logging the dedup ratio. Convenience for the packaging pipeline.
pub fn decode_stl_named(name: &str, data: &[u8]) -> Result<Mesh> {
    let mesh = decode_stl(data)?;
    debug!(
        "{}: {} vertices, {} triangles",
        name,
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

#[cfg(test)]
pub(crate) mod test_stl {
    /// Build a binary STL buffer from raw triangles, f32 coords.
    pub fn encode(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut buf = vec![0u8; 80];
        buf.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for tri in triangles {
            // zero normal; the decoder ignores it
            for _ in 0..3 {
                buf.extend_from_slice(&0f32.to_le_bytes());
            }
            for v in tri {
                for c in v {
                    buf.extend_from_slice(&c.to_le_bytes());
                }
            }
            buf.extend_from_slice(&0u16.to_le_bytes());
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::test_stl::encode;
    use super::*;

    #[test]
    fn shared_vertices_dedup_to_one_entry() {
        // two triangles of a quad share the diagonal (0,0,0)-(1,1,0)
        let data = encode(&[
            [[0., 0., 0.], [1., 0., 0.], [1., 1., 0.]],
            [[0., 0., 0.], [1., 1., 0.], [0., 1., 0.]],
        ]);
        let mesh = decode_stl(&data).unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);

        // both triangles reference the same entries for the shared corners
        let t = &mesh.triangles.triangle;
        assert_eq!(t[0].v1, t[1].v1);
        assert_eq!(t[0].v3, t[1].v2);
        // winding preserved from the records
        assert_eq!((t[0].v1, t[0].v2, t[0].v3), (0, 1, 2));
        assert_eq!((t[1].v1, t[1].v2, t[1].v3), (0, 2, 3));
    }

    #[test]
    fn nearby_coordinates_merge_after_rounding() {
        // two corners differ only past the sixth decimal; both round onto
        // 0.123457 and must share one vertex entry
        let data = encode(&[[
            [0.12345674, 1., 0.],
            [0.12345666, 1., 0.],
            [1., 0., 0.],
        ]]);
        let mesh = decode_stl(&data).unwrap();
        assert_eq!(mesh.vertex_count(), 2);
        let t = mesh.triangles.triangle[0];
        assert_eq!(t.v1, t.v2);
        assert_eq!(mesh.vertices.vertex[t.v1].x, 0.123457);
    }

    #[test]
    fn negative_zero_keys_with_zero() {
        let data = encode(&[[
            [-0.0, 0., 0.],
            [0.0, 0., 0.],
            [1., 0., 0.],
        ]]);
        let mesh = decode_stl(&data).unwrap();
        assert_eq!(mesh.vertex_count(), 2);
    }

    #[test]
    fn short_header_is_a_format_error() {
        let err = decode_stl(&[0u8; 50]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn truncated_body_is_a_format_error() {
        let mut data = encode(&[
            [[0., 0., 0.], [1., 0., 0.], [1., 1., 0.]],
            [[0., 0., 0.], [1., 1., 0.], [0., 1., 0.]],
        ]);
        data.truncate(data.len() - 10);
        let err = decode_stl(&data).unwrap_err();
        match err {
            Error::Format(msg) => assert!(msg.contains("truncated")),
            other => panic!("expected Format error, got {other:?}"),
        }
    }

    #[test]
    fn declared_count_beyond_buffer_fails() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&100u32.to_le_bytes());
        assert!(decode_stl(&data).is_err());
    }
}
