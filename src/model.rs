//! Serde types for the `3D/3dmodel.model` document.
//!
//! Attribute fields are declared before element fields in every struct;
//! quick-xml serialization requires it. Element order equals declaration
//! order, which keeps output byte-stable for identical input.

use serde::{Deserialize, Serialize};

use super::mesh::Mesh;

pub const CORE_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";
pub const MATERIAL_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/material/2015/02";

/// Resource id reserved for the material table when one is present.
pub const MATERIALS_RESOURCE_ID: usize = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "@xmlns", default)]
    pub xmlns: String,
    #[serde(rename = "@xmlns:m", default, skip_serializing_if = "String::is_empty")]
    pub xmlns_m: String,
    #[serde(rename = "@unit", default)]
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<Metadata>,
    pub resources: Resources,
    pub build: Build,
}

impl Model {
    /// An empty model carrying `Title` and `Application` metadata.
    pub fn new(title: &str, application: &str) -> Self {
        Self {
            xmlns: CORE_NS.to_owned(),
            xmlns_m: String::new(),
            unit: Unit::default(),
            metadata: vec![
                Metadata::new("Title", title),
                Metadata::new("Application", application),
            ],
            resources: Resources::default(),
            build: Build::default(),
        }
    }

    pub fn push_metadata(&mut self, name: &str, value: &str) {
        self.metadata.push(Metadata::new(name, value));
    }
}

impl Default for Model {
    fn default() -> Self {
        Self {
            xmlns: CORE_NS.to_owned(),
            xmlns_m: String::new(),
            unit: Unit::default(),
            metadata: Vec::new(),
            resources: Resources::default(),
            build: Build::default(),
        }
    }
}

/// Model measurement unit, default is millimeter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Micron,
    Millimeter,
    Centimeter,
    Inch,
    Foot,
    Meter,
}

impl Default for Unit {
    fn default() -> Self {
        Self::Millimeter
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "$value")]
    pub value: Option<String>,
}

impl Metadata {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_owned(),
            value: Some(value.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Resources {
    #[serde(rename = "m:basematerials", default, skip_serializing_if = "Option::is_none")]
    pub basematerials: Option<BaseMaterials>,
    #[serde(default)]
    pub object: Vec<Object>,
}

/// The shared color/material table, `m:basematerials` id 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseMaterials {
    #[serde(rename = "@id")]
    pub id: usize,
    #[serde(rename = "m:base", default)]
    pub base: Vec<BaseMaterial>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseMaterial {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@displaycolor")]
    pub displaycolor: String,
}

/// One mesh resource. `pid`/`pindex` point into the material table when the
/// package carries one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    #[serde(rename = "@id")]
    pub id: usize,
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(rename = "@name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "@pid", skip_serializing_if = "Option::is_none")]
    pub pid: Option<usize>,
    #[serde(rename = "@pindex", skip_serializing_if = "Option::is_none")]
    pub pindex: Option<usize>,
    pub mesh: Mesh,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Build {
    #[serde(default)]
    pub item: Vec<Item>,
}

impl Build {
    pub fn get_item_by_id(&self, id: usize) -> Option<&Item> {
        self.item.iter().find(|i| i.objectid == id)
    }
}

/// A placed object. The transform is the 3MF 3x4 row-major affine matrix;
/// we only ever emit identity rotation with a translation column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "@objectid")]
    pub objectid: usize,
    #[serde(rename = "@transform", skip_serializing_if = "Option::is_none")]
    pub transform: Option<[f64; 12]>,
}

impl Item {
    /// Reference an object at its modeled position (co-located bodies).
    pub fn in_place(objectid: usize) -> Self {
        Self {
            objectid,
            transform: None,
        }
    }

    /// Reference an object translated by `(tx, ty, tz)`.
    pub fn translated(objectid: usize, t: nalgebra::Translation3<f64>) -> Self {
        Self {
            objectid,
            transform: Some([
                1., 0., 0., //
                0., 1., 0., //
                0., 0., 1., //
                t.x, t.y, t.z,
            ]),
        }
    }

    pub fn translation(&self) -> Option<[f64; 3]> {
        self.transform.map(|t| [t[9], t[10], t[11]])
    }
}
