//! ZIP serialization of a built package.
//!
//! The archive is written to a sibling temp path and renamed into place, so
//! a failed build never leaves a partial archive at the destination.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, Event};
use quick_xml::se::Serializer;
use quick_xml::Writer;
use serde::Serialize;
use tracing::{debug, info};
use zip::{write::SimpleFileOptions, ZipWriter};

use crate::builder::{build_package, BuiltPackage, ColorBody, Flavor, PackageConfig, PackedObject};
use crate::error::{Error, Result};
use crate::metadata::{cut_info, plate_config, slice_info};
use crate::settings::SettingsProfile;

/// Client version written into the Qidi slice-info header and the project
/// settings document.
pub const QIDI_CLIENT_VERSION: &str = "02.04.01.11";

/// Human-readable report for the caller; not part of the archive contract.
#[derive(Debug, Clone)]
pub struct PackageSummary {
    pub path: PathBuf,
    pub file_size: u64,
    pub profile: String,
    pub fits_plate: bool,
    pub objects: Vec<PackedObject>,
}

/// Build and save in one call.
pub fn export_package<P: AsRef<Path>>(
    bodies: Vec<ColorBody>,
    config: PackageConfig,
    profile: &SettingsProfile,
    path: P,
) -> Result<PackageSummary> {
    let built = build_package(bodies, config)?;
    save_3mf(&built, profile, path)
}

/// Serialize a built package plus its flattened settings profile.
pub fn save_3mf<P: AsRef<Path>>(
    built: &BuiltPackage,
    profile: &SettingsProfile,
    path: P,
) -> Result<PackageSummary> {
    let path = path.as_ref();

    // structural invariants are checked before any bytes are written
    validate(built)?;

    let tmp = path.with_extension("3mf.tmp");
    match write_archive(built, profile, &tmp) {
        Ok(()) => {
            std::fs::rename(&tmp, path)?;
        }
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
    }

    let file_size = std::fs::metadata(path)?.len();
    info!(
        "wrote {}: {} objects, profile {:?}, {:.1} KB",
        path.display(),
        built.objects.len(),
        profile.name(),
        file_size as f64 / 1024.
    );
    for o in &built.objects {
        info!(
            "  [{}] {}: {:.1} x {:.1} x {:.1} mm",
            o.id, o.name, o.dims[0], o.dims[1], o.dims[2]
        );
    }

    Ok(PackageSummary {
        path: path.to_owned(),
        file_size,
        profile: profile.name().to_owned(),
        fits_plate: built.fits_plate(),
        objects: built.objects.clone(),
    })
}

fn validate(built: &BuiltPackage) -> Result<()> {
    let material_count = built
        .model
        .resources
        .basematerials
        .as_ref()
        .map(|b| b.base.len());

    for object in &built.model.resources.object {
        if object.mesh.is_empty() {
            return Err(Error::serialization(format!(
                "object {} has an empty mesh",
                object.id
            )));
        }
        let vertex_count = object.mesh.vertex_count();
        for t in &object.mesh.triangles.triangle {
            if t.v1 >= vertex_count || t.v2 >= vertex_count || t.v3 >= vertex_count {
                return Err(Error::serialization(format!(
                    "object {} references vertex beyond {} entries",
                    object.id, vertex_count
                )));
            }
        }
        if let (Some(pindex), Some(count)) = (object.pindex, material_count) {
            if pindex >= count {
                return Err(Error::serialization(format!(
                    "object {} material index {} out of range ({} materials)",
                    object.id, pindex, count
                )));
            }
        }
    }
    Ok(())
}

fn write_archive(built: &BuiltPackage, profile: &SettingsProfile, path: &Path) -> Result<()> {
    let writer = File::create(path)?;
    let mut archive = ZipWriter::new(writer);

    match built.config.flavor {
        Flavor::Orca => {
            archive.start_file("[Content_Types].xml", SimpleFileOptions::default())?;
            archive.write_all(include_bytes!("../assets/content_types.xml"))?;
        }
        Flavor::Qidi => {
            archive.start_file("[Content_Types].xml", SimpleFileOptions::default())?;
            archive.write_all(include_bytes!("../assets/content_types_qidi.xml"))?;
        }
    }

    archive.start_file("_rels/.rels", SimpleFileOptions::default())?;
    archive.write_all(include_bytes!("../assets/rels.xml"))?;

    write_xml_entry(&mut archive, "3D/3dmodel.model", "model", &built.model)?;

    match built.config.flavor {
        Flavor::Orca => {
            archive.start_file("Metadata/project_settings.config", SimpleFileOptions::default())?;
            archive.write_all(profile.to_lines().as_bytes())?;

            write_xml_entry(&mut archive, "Metadata/plate_1.config", "config", &orca_plate_config(built))?;
        }
        Flavor::Qidi => {
            archive.start_file("Metadata/project_settings.config", SimpleFileOptions::default())?;
            archive.write_all(profile.to_project_json(QIDI_CLIENT_VERSION)?.as_bytes())?;

            write_xml_entry(
                &mut archive,
                "Metadata/model_settings.config",
                "config",
                &qidi_model_settings(built),
            )?;

            write_xml_entry(
                &mut archive,
                "Metadata/slice_info.config",
                "config",
                &slice_info::Config::for_client(QIDI_CLIENT_VERSION),
            )?;

            write_xml_entry(
                &mut archive,
                "Metadata/cut_information.xml",
                "objects",
                &cut_info::Objects::placeholder(built.objects.iter().map(|o| o.id)),
            )?;

            archive.start_file("Metadata/filament_sequence.json", SimpleFileOptions::default())?;
            let sequence = serde_json::json!({ "plate_1": { "sequence": [] } });
            archive.write_all(sequence.to_string().as_bytes())?;
        }
    }

    archive.finish()?;
    Ok(())
}

/// Serialize one XML document entry the same way for every config file:
/// explicit declaration, 2-space indent, element order as declared.
fn write_xml_entry<T: Serialize>(
    archive: &mut ZipWriter<File>,
    entry: &str,
    root: &str,
    value: &T,
) -> Result<()> {
    archive.start_file(entry, SimpleFileOptions::default())?;

    let mut xml = String::new();
    let mut ser = Serializer::with_root(&mut xml, Some(root))?;
    ser.indent(' ', 2);
    value.serialize(ser)?;

    let mut xml_writer = Writer::new_with_indent(&mut *archive, b' ', 2);
    xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    xml_writer.write_indent()?;
    xml_writer.into_inner().write_all(xml.as_bytes())?;

    debug!("{}: {} bytes", entry, xml.len());
    Ok(())
}

/// Orca per-object config: extruder + name per object, plate block listing
/// the object ids.
fn orca_plate_config(built: &BuiltPackage) -> plate_config::Config {
    let mut plate = plate_config::Plate {
        metadata: vec![
            plate_config::Metadata::new("plater_id", "1"),
            plate_config::Metadata::new("plater_name", "Plate 1"),
        ],
        model_instance: vec![],
    };
    for o in &built.objects {
        plate
            .metadata
            .push(plate_config::Metadata::new("object_id", &o.id.to_string()));
    }

    plate_config::Config {
        object: built
            .objects
            .iter()
            .map(|o| plate_config::Object::new(o.id, o.extruder, &o.name))
            .collect(),
        plate: Some(plate),
    }
}

/// Qidi model settings: name + extruder per object, plate block with one
/// `model_instance` per object. `identify_id` follows the 70-offset scheme
/// QIDIStudio uses for fresh projects.
fn qidi_model_settings(built: &BuiltPackage) -> plate_config::Config {
    plate_config::Config {
        object: built
            .objects
            .iter()
            .map(|o| plate_config::Object {
                id: o.id,
                metadata: vec![
                    plate_config::Metadata::new("name", &o.name),
                    plate_config::Metadata::new("extruder", &o.extruder.to_string()),
                ],
            })
            .collect(),
        plate: Some(plate_config::Plate {
            metadata: vec![
                plate_config::Metadata::new("plater_id", "1"),
                plate_config::Metadata::new("plater_name", ""),
                plate_config::Metadata::new("locked", "false"),
                plate_config::Metadata::new("filament_map_mode", "Auto For Flush"),
            ],
            model_instance: built
                .objects
                .iter()
                .map(|o| plate_config::ModelInstance::new(o.id, 0, 70 + o.id))
                .collect(),
        }),
    }
}
