//! Package assembly: object ids, material resolution, plate layout.
//!
//! Pure in-memory transform from tagged mesh bodies to the 3MF object graph
//! plus the per-object data the config documents need. No file I/O here.

use nalgebra as na;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::mesh::Mesh;
use crate::model::{
    BaseMaterial, BaseMaterials, Item, Model, Object, MATERIALS_RESOURCE_ID, MATERIAL_NS,
};
use crate::palette::{MaterialLookup, MaterialTable};
use crate::stl::decode_stl_named;

/// Application string QIDIStudio expects to find in its own projects.
pub const QIDI_APPLICATION: &str = "QIDIStudio-01.05.00.69";

/// One input body: a mesh source tagged with a palette key and a
/// human-readable part name.
#[derive(Debug, Clone)]
pub struct ColorBody {
    pub tag: String,
    pub name: String,
    pub source: MeshSource,
}

impl ColorBody {
    pub fn from_stl(tag: &str, name: &str, data: Vec<u8>) -> Self {
        Self {
            tag: tag.to_owned(),
            name: name.to_owned(),
            source: MeshSource::Stl(data),
        }
    }

    pub fn from_mesh(tag: &str, name: &str, mesh: Mesh) -> Self {
        Self {
            tag: tag.to_owned(),
            name: name.to_owned(),
            source: MeshSource::Mesh(mesh),
        }
    }
}

/// Raw binary STL bytes, or an already-tessellated mesh.
#[derive(Debug, Clone)]
pub enum MeshSource {
    Stl(Vec<u8>),
    Mesh(Mesh),
}

/// Which consumer the archive targets. Decides the settings payload format
/// and the auxiliary document set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Orca,
    Qidi,
}

/// How build items are placed.
///
/// Multi-color bodies of one part are co-located; separate parts get rowed
/// out along X with a gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layout {
    InPlace,
    SideBySide { spacing: f64 },
}

/// Printable volume, millimeters. Default is the Qidi Q2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateSize {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for PlateSize {
    fn default() -> Self {
        Self {
            x: 270.,
            y: 270.,
            z: 256.,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackageConfig {
    pub flavor: Flavor,
    pub title: String,
    /// `Some` reserves resource id 1 for the table and starts object ids at
    /// 2; `None` starts object ids at 1.
    pub materials: Option<MaterialTable>,
    pub lookup: MaterialLookup,
    pub layout: Layout,
    pub plate: PlateSize,
}

impl PackageConfig {
    /// Multi-color AMS package: palette resource, strict tag lookup,
    /// co-located bodies.
    pub fn multi_color(title: &str) -> Self {
        Self {
            flavor: Flavor::Orca,
            title: title.to_owned(),
            materials: Some(MaterialTable::petg_translucent()),
            lookup: MaterialLookup::Strict,
            layout: Layout::InPlace,
            plate: PlateSize::default(),
        }
    }

    /// Several independent parts rowed out on one plate, no material table.
    pub fn combined_plate(title: &str, spacing: f64) -> Self {
        Self {
            flavor: Flavor::Orca,
            title: title.to_owned(),
            materials: None,
            lookup: MaterialLookup::FallbackFirst,
            layout: Layout::SideBySide { spacing },
            plate: PlateSize::default(),
        }
    }

    /// QIDIStudio-native project layout.
    pub fn qidi_project(title: &str, spacing: f64) -> Self {
        Self {
            flavor: Flavor::Qidi,
            ..Self::combined_plate(title, spacing)
        }
    }

    fn first_object_id(&self) -> usize {
        if self.materials.is_some() {
            MATERIALS_RESOURCE_ID + 1
        } else {
            1
        }
    }
}

/// Per-object facts carried alongside the model for the config documents
/// and the summary report.
#[derive(Debug, Clone)]
pub struct PackedObject {
    pub id: usize,
    pub name: String,
    pub tag: String,
    /// One-based extruder number for the per-object config documents.
    pub extruder: usize,
    pub dims: [f64; 3],
}

/// Non-fatal: the combined layout is wider than the plate. The caller may
/// split into multiple packages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateOverflow {
    pub total_width: f64,
    pub max_width: f64,
}

#[derive(Debug, Clone)]
pub struct BuiltPackage {
    pub config: PackageConfig,
    pub model: Model,
    pub objects: Vec<PackedObject>,
    pub overflow: Option<PlateOverflow>,
}

impl BuiltPackage {
    pub fn fits_plate(&self) -> bool {
        self.overflow.is_none()
    }
}

/// Assemble the model document and placement for a list of bodies.
pub fn build_package(bodies: Vec<ColorBody>, config: PackageConfig) -> Result<BuiltPackage> {
    let application = match config.flavor {
        Flavor::Orca => format!("platepack-{}", env!("CARGO_PKG_VERSION")),
        Flavor::Qidi => QIDI_APPLICATION.to_owned(),
    };
    let mut model = Model::new(&config.title, &application);
    if config.flavor == Flavor::Qidi {
        model.push_metadata("QIDIStudio:3mfVersion", "1");
    }

    if let Some(table) = &config.materials {
        model.xmlns_m = MATERIAL_NS.to_owned();
        model.resources.basematerials = Some(BaseMaterials {
            id: MATERIALS_RESOURCE_ID,
            base: table
                .entries()
                .iter()
                .map(|e| BaseMaterial {
                    name: e.display_name.clone(),
                    displaycolor: e.display_color.clone(),
                })
                .collect(),
        });
    }

    let mut objects = Vec::with_capacity(bodies.len());
    let mut cursor_x = 0.0;
    let mut placed_any = false;

    for (i, body) in bodies.into_iter().enumerate() {
        let id = config.first_object_id() + i;

        let mesh = match body.source {
            MeshSource::Stl(data) => decode_stl_named(&body.name, &data)?,
            MeshSource::Mesh(mesh) => mesh,
        };

        let (pid, pindex, extruder) = match &config.materials {
            Some(table) => {
                let idx = table.resolve(&body.tag, &body.name, config.lookup)?;
                // config documents number extruders from 1
                let slot = table.get(idx).map(|e| e.filament_slot).unwrap_or(0);
                (Some(MATERIALS_RESOURCE_ID), Some(idx), slot + 1)
            }
            None => (None, None, 1),
        };

        let bb = mesh.bounding_box();
        let dims = bb.map(|b| b.dims()).unwrap_or_default();

        let item = match (config.layout, bb) {
            (Layout::SideBySide { spacing }, Some(bb)) => {
                // min-x lands on the cursor, min-y/min-z on the plate origin;
                // written as 0.0 - min so a part already at the origin gets
                // +0 rather than -0 in the transform attribute
                let offset =
                    na::Translation3::new(cursor_x - bb.min.x, 0.0 - bb.min.y, 0.0 - bb.min.z);
                cursor_x += bb.xlen() + spacing;
                placed_any = true;
                debug!("{}: plate position x offset {:.1}", body.name, offset.x);
                Item::translated(id, offset)
            }
            _ => Item::in_place(id),
        };

        model.resources.object.push(Object {
            id,
            ty: Some("model".to_owned()),
            name: Some(body.name.clone()),
            pid,
            pindex,
            mesh,
        });
        model.build.item.push(item);

        objects.push(PackedObject {
            id,
            name: body.name,
            tag: body.tag,
            extruder,
            dims,
        });
    }

    let overflow = check_plate(&config, &model, cursor_x, placed_any);

    Ok(BuiltPackage {
        config,
        model,
        objects,
        overflow,
    })
}

fn check_plate(
    config: &PackageConfig,
    model: &Model,
    cursor_x: f64,
    placed_any: bool,
) -> Option<PlateOverflow> {
    let total_width = match config.layout {
        Layout::SideBySide { spacing } if placed_any => cursor_x - spacing,
        _ => {
            // co-located bodies: the union of all meshes is what lands on
            // the plate
            let mut width: f64 = 0.0;
            for object in &model.resources.object {
                if let Some(bb) = object.mesh.bounding_box() {
                    width = width.max(bb.xlen());
                }
            }
            width
        }
    };

    info!("combined plate width: {:.1} mm (max {})", total_width, config.plate.x);
    if total_width > config.plate.x {
        warn!(
            "combined width {:.1} mm exceeds the {} mm build plate",
            total_width, config.plate.x
        );
        Some(PlateOverflow {
            total_width,
            max_width: config.plate.x,
        })
    } else {
        None
    }
}
