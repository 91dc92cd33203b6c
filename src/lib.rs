//! platepack: package tagged triangle meshes into slicer-ready 3MF archives
//! with embedded print settings (Orca multi-color and QIDIStudio-native
//! project flavors).

pub mod builder;
pub mod error;
pub mod logging;
pub mod mesh;
pub mod metadata;
pub mod model;
pub mod palette;
pub mod save;
pub mod settings;
pub mod stl;

pub use builder::{build_package, ColorBody, Flavor, Layout, PackageConfig, PlateSize};
pub use error::{Error, Result};
pub use palette::{MaterialLookup, MaterialTable};
pub use save::{export_package, save_3mf, PackageSummary};
pub use settings::SettingsProfile;
pub use stl::decode_stl;
