//! Serde types for the auxiliary `Metadata/*` config documents.
//!
//! Orca reads a `plate_1.config`; QIDIStudio reads `model_settings.config`
//! plus the slice-info and cut-information documents. All of them are small
//! `config`-rooted XML files of `key`/`value` metadata pairs.

pub mod plate_config {
    use serde::{Deserialize, Serialize};

    /// Root of `plate_1.config` / `model_settings.config`.
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    #[serde(rename = "config")]
    pub struct Config {
        #[serde(default)]
        pub object: Vec<Object>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub plate: Option<Plate>,
    }

    impl Config {
        pub fn get_object_by_id(&self, id: usize) -> Option<&Object> {
            self.object.iter().find(|o| o.id == id)
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Object {
        #[serde(rename = "@id")]
        pub id: usize,
        #[serde(default)]
        pub metadata: Vec<Metadata>,
    }

    impl Object {
        /// The standard per-object pair: which extruder prints it, and the
        /// human-readable part name.
        pub fn new(id: usize, extruder: usize, name: &str) -> Self {
            Self {
                id,
                metadata: vec![
                    Metadata::new("extruder", &extruder.to_string()),
                    Metadata::new("name", name),
                ],
            }
        }

        pub fn get(&self, key: &str) -> Option<&str> {
            self.metadata
                .iter()
                .find(|m| m.key == key)
                .map(|m| m.value.as_str())
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Metadata {
        #[serde(rename = "@key")]
        pub key: String,
        #[serde(rename = "@value")]
        pub value: String,
    }

    impl Metadata {
        pub fn new(key: &str, value: &str) -> Self {
            Self {
                key: key.to_owned(),
                value: value.to_owned(),
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    pub struct Plate {
        #[serde(default)]
        pub metadata: Vec<Metadata>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub model_instance: Vec<ModelInstance>,
    }

    /// QIDIStudio per-instance block inside the plate.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelInstance {
        #[serde(default)]
        pub metadata: Vec<Metadata>,
    }

    impl ModelInstance {
        pub fn new(object_id: usize, instance_id: usize, identify_id: usize) -> Self {
            Self {
                metadata: vec![
                    Metadata::new("object_id", &object_id.to_string()),
                    Metadata::new("instance_id", &instance_id.to_string()),
                    Metadata::new("identify_id", &identify_id.to_string()),
                ],
            }
        }
    }
}

pub mod slice_info {
    use serde::{Deserialize, Serialize};

    /// `Metadata/slice_info.config` — client version header QIDIStudio
    /// checks before accepting a project as its own.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename = "config")]
    pub struct Config {
        pub header: Header,
    }

    impl Config {
        pub fn for_client(version: &str) -> Self {
            Self {
                header: Header {
                    header_item: vec![
                        HeaderItem::new("X-QDT-Client-Type", "slicer"),
                        HeaderItem::new("X-QDT-Client-Version", version),
                    ],
                },
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Header {
        #[serde(default)]
        pub header_item: Vec<HeaderItem>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct HeaderItem {
        #[serde(rename = "@key")]
        pub key: String,
        #[serde(rename = "@value")]
        pub value: String,
    }

    impl HeaderItem {
        pub fn new(key: &str, value: &str) -> Self {
            Self {
                key: key.to_owned(),
                value: value.to_owned(),
            }
        }
    }
}

pub mod cut_info {
    use serde::{Deserialize, Serialize};

    /// `Metadata/cut_information.xml` — placeholder document, one entry per
    /// object, no cuts.
    #[derive(Debug, Clone, Serialize, Deserialize, Default)]
    #[serde(rename = "objects")]
    pub struct Objects {
        #[serde(default)]
        pub object: Vec<Object>,
    }

    impl Objects {
        pub fn placeholder(object_ids: impl IntoIterator<Item = usize>) -> Self {
            Self {
                object: object_ids.into_iter().map(Object::uncut).collect(),
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Object {
        #[serde(rename = "@id")]
        pub id: usize,
        pub cut_id: CutId,
    }

    impl Object {
        pub fn uncut(id: usize) -> Self {
            Self {
                id,
                cut_id: CutId {
                    id: 0,
                    check_sum: 1,
                    connectors_cnt: 0,
                },
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CutId {
        #[serde(rename = "@id")]
        pub id: usize,
        #[serde(rename = "@check_sum")]
        pub check_sum: usize,
        #[serde(rename = "@connectors_cnt")]
        pub connectors_cnt: usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    fn to_xml<T: Serialize>(root: &str, value: &T) -> String {
        let mut xml = String::new();
        let mut ser = quick_xml::se::Serializer::with_root(&mut xml, Some(root)).unwrap();
        ser.indent(' ', 2);
        value.serialize(ser).unwrap();
        xml
    }

    #[test]
    fn object_config_writes_extruder_and_name_pairs() {
        let cfg = plate_config::Config {
            object: vec![plate_config::Object::new(2, 4, "lid")],
            plate: None,
        };
        let xml = to_xml("config", &cfg);
        assert!(xml.contains(r#"<object id="2">"#));
        assert!(xml.contains(r#"<metadata key="extruder" value="4"/>"#));
        assert!(xml.contains(r#"<metadata key="name" value="lid"/>"#));
    }

    #[test]
    fn model_instance_block_nests_under_plate() {
        let cfg = plate_config::Config {
            object: vec![plate_config::Object::new(1, 1, "x-axis")],
            plate: Some(plate_config::Plate {
                metadata: vec![
                    plate_config::Metadata::new("plater_id", "1"),
                    plate_config::Metadata::new("plater_name", ""),
                ],
                model_instance: vec![plate_config::ModelInstance::new(1, 0, 71)],
            }),
        };
        let xml = to_xml("config", &cfg);
        assert!(xml.contains("<model_instance>"));
        assert!(xml.contains(r#"<metadata key="identify_id" value="71"/>"#));
        // objects come before the plate block
        assert!(xml.find("<object").unwrap() < xml.find("<plate>").unwrap());
    }

    #[test]
    fn object_config_round_trips() {
        let cfg = plate_config::Config {
            object: vec![
                plate_config::Object::new(2, 2, "knob"),
                plate_config::Object::new(3, 5, "panel"),
            ],
            plate: None,
        };
        let xml = to_xml("config", &cfg);
        let parsed: plate_config::Config = quick_xml::de::from_str(&xml).unwrap();
        let panel = parsed.get_object_by_id(3).unwrap();
        assert_eq!(panel.get("extruder"), Some("5"));
        assert_eq!(panel.get("name"), Some("panel"));
    }

    #[test]
    fn slice_info_carries_client_header() {
        let xml = to_xml("config", &slice_info::Config::for_client("02.04.01.11"));
        assert!(xml.contains(r#"<header_item key="X-QDT-Client-Type" value="slicer"/>"#));
        assert!(xml.contains(r#"value="02.04.01.11""#));
    }

    #[test]
    fn cut_info_placeholder_lists_every_object() {
        let xml = to_xml("objects", &cut_info::Objects::placeholder([1, 2]));
        assert!(xml.contains(r#"<object id="1">"#));
        assert!(xml.contains(r#"<object id="2">"#));
        assert!(xml.contains(r#"<cut_id id="0" check_sum="1" connectors_cnt="0"/>"#));
    }
}
