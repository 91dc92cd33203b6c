use serde::{Deserialize, Serialize};

use nalgebra as na;

/// A triangle mesh, already deduplicated.
///
/// The field layout mirrors the `<mesh>` element of a 3MF model document, so
/// the same type serializes directly into `3D/3dmodel.model`. Construction
/// goes through [`crate::stl::decode_stl`] or [`crate::stl::VertexPool`];
/// this type itself offers no amenities for building meshes.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Mesh {
    pub vertices: Vertices,

    /// Triangles index into `vertices`. Winding order is whatever the source
    /// mesh had; it encodes outward normals and must not be altered.
    pub triangles: Triangles,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.vertex.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.vertex.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.triangle.len()
    }

    /// Axis-aligned bounds over all vertices. `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.vertices.vertex.first()?;
        let mut min = na::Point3::new(first.x, first.y, first.z);
        let mut max = min;
        for v in self.vertices.vertex.iter().skip(1) {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }
        Some(BoundingBox { min, max })
    }
}

/// A list of vertices, as a struct mainly to comply with easier serde xml
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Vertices {
    #[serde(default)]
    pub vertex: Vec<Vertex>,
}

/// A list of triangles, as a struct mainly to comply with easier serde xml
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Triangles {
    #[serde(default)]
    pub triangle: Vec<Triangle>,
}

/// A vertex in a triangle mesh.
///
/// Coordinates serialize as attributes with fixed 6-decimal formatting,
/// matching the rounding the decoder applied when deduplicating.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct Vertex {
    #[serde(rename = "@x", serialize_with = "ser_coord")]
    pub x: f64,
    #[serde(rename = "@y", serialize_with = "ser_coord")]
    pub y: f64,
    #[serde(rename = "@z", serialize_with = "ser_coord")]
    pub z: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

fn ser_coord<S: serde::Serializer>(v: &f64, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(&format!("{:.6}", v))
}

/// A triangle in a triangle mesh, as indices into the vertex list.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct Triangle {
    #[serde(rename = "@v1")]
    pub v1: usize,
    #[serde(rename = "@v2")]
    pub v2: usize,
    #[serde(rename = "@v3")]
    pub v3: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: na::Point3<f64>,
    pub max: na::Point3<f64>,
}

impl BoundingBox {
    pub fn xlen(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn ylen(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn zlen(&self) -> f64 {
        self.max.z - self.min.z
    }

    pub fn dims(&self) -> [f64; 3] {
        [self.xlen(), self.ylen(), self.zlen()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> Mesh {
        Mesh {
            vertices: Vertices {
                vertex: vec![
                    Vertex::new(0., 0., 0.),
                    Vertex::new(10., 0., 0.),
                    Vertex::new(10., 5., 2.),
                    Vertex::new(0., 5., 2.),
                ],
            },
            triangles: Triangles {
                triangle: vec![
                    Triangle { v1: 0, v2: 1, v3: 2 },
                    Triangle { v1: 0, v2: 2, v3: 3 },
                ],
            },
        }
    }

    #[test]
    fn bounding_box_spans_all_vertices() {
        let bb = quad_mesh().bounding_box().unwrap();
        assert_eq!(bb.min, nalgebra::Point3::new(0., 0., 0.));
        assert_eq!(bb.max, nalgebra::Point3::new(10., 5., 2.));
        assert_eq!(bb.dims(), [10., 5., 2.]);
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        let mesh = Mesh {
            vertices: Vertices::default(),
            triangles: Triangles::default(),
        };
        assert!(mesh.is_empty());
        assert!(mesh.bounding_box().is_none());
    }
}
