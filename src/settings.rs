//! Slicer settings profiles and the override merge.
//!
//! A profile is an insertion-ordered map of setting key to value (string, or
//! list of strings for per-extruder keys). Baselines ship as JSON assets and
//! get overlaid with caller overrides, key-wise, whole-value replacement.
//! Nothing here validates value semantics; that is the slicer's business.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

pub type SettingsMap = Map<String, Value>;

/// Keys the Qidi project document writes itself; they are stripped from
/// baselines so a profile asset cannot override the header.
const HEADER_KEYS: [&str; 3] = ["version", "name", "from"];

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsProfile {
    name: String,
    values: SettingsMap,
}

impl SettingsProfile {
    /// Load a named baseline profile.
    ///
    /// - `petg`: translucent PETG, multi-color AMS keys included
    /// - `asagf`: ASA-GF structural profile
    /// - `asagf-qidi`: ASA-GF plus QIDIStudio printer-identification and
    ///   machine-limit keys
    pub fn baseline(name: &str) -> Result<Self> {
        let json = match name {
            "petg" => include_str!("../assets/profile_petg.json"),
            "asagf" => include_str!("../assets/profile_asagf.json"),
            "asagf-qidi" => include_str!("../assets/profile_asagf_qidi.json"),
            _ => return Err(Error::UnknownProfile(name.to_owned())),
        };
        let mut values: SettingsMap = serde_json::from_str(json)?;
        for key in HEADER_KEYS {
            values.remove(key);
        }
        Ok(Self {
            name: name.to_owned(),
            values,
        })
    }

    pub fn from_values(name: &str, values: SettingsMap) -> Self {
        Self {
            name: name.to_owned(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &SettingsMap {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Overlay one override map. Keys already present are replaced in place
    /// (keeping their baseline position); new keys append after.
    pub fn merge(&mut self, overrides: &SettingsMap) {
        for (key, value) in overrides {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Apply a list of override maps in order and return the flattened
    /// profile.
    pub fn merged(mut self, overrides: &[SettingsMap]) -> Self {
        for map in overrides {
            self.merge(map);
        }
        debug!("profile {:?}: {} settings after merge", self.name, self.values.len());
        self
    }

    /// Line-oriented `key = value` text, one setting per line, in map order.
    /// Non-string values render as compact JSON.
    pub fn to_lines(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.values {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(&rendered);
            out.push('\n');
        }
        out
    }

    /// The QIDIStudio project document: `version`/`name`/`from` header keys
    /// first, then every setting, pretty-printed JSON.
    pub fn to_project_json(&self, app_version: &str) -> Result<String> {
        let mut doc = SettingsMap::new();
        doc.insert("version".into(), Value::String(app_version.to_owned()));
        doc.insert("name".into(), Value::String("project_settings".into()));
        doc.insert("from".into(), Value::String("project".into()));
        for (key, value) in &self.values {
            doc.insert(key.clone(), value.clone());
        }
        Ok(serde_json::to_string_pretty(&Value::Object(doc))?)
    }
}

/// Parse `key=value` override arguments into a settings map.
pub fn overrides_from_args<'a, I: IntoIterator<Item = &'a str>>(args: I) -> Option<SettingsMap> {
    let mut map = SettingsMap::new();
    for arg in args {
        let (key, value) = arg.split_once('=')?;
        map.insert(key.trim().to_owned(), Value::String(value.trim().to_owned()));
    }
    Some(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> SettingsMap {
        let mut m = SettingsMap::new();
        for (k, v) in pairs {
            m.insert((*k).to_owned(), Value::String((*v).to_owned()));
        }
        m
    }

    #[test]
    fn merge_replaces_in_place_and_appends_new_keys() {
        let base = map(&[("a", "1"), ("b", "2")]);
        let profile = SettingsProfile::from_values("test", base)
            .merged(&[map(&[("b", "9"), ("c", "7")])]);

        let got: Vec<(&str, &str)> = profile
            .values()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str().unwrap()))
            .collect();
        assert_eq!(got, [("a", "1"), ("b", "9"), ("c", "7")]);
    }

    #[test]
    fn later_overrides_win() {
        let profile = SettingsProfile::from_values("test", map(&[("a", "1")]))
            .merged(&[map(&[("a", "2")]), map(&[("a", "3")])]);
        assert_eq!(profile.get("a").unwrap(), "3");
    }

    #[test]
    fn lines_render_in_map_order() {
        let profile = SettingsProfile::from_values("test", map(&[("layer_height", "0.16"), ("wall_loops", "3")]));
        assert_eq!(profile.to_lines(), "layer_height = 0.16\nwall_loops = 3\n");
    }

    #[test]
    fn baselines_load_and_keep_known_keys() {
        let petg = SettingsProfile::baseline("petg").unwrap();
        assert_eq!(petg.get("layer_height").unwrap(), "0.16");
        assert_eq!(petg.get("filament_type").unwrap(), "PETG");

        let asagf = SettingsProfile::baseline("asagf").unwrap();
        assert_eq!(asagf.get("nozzle_temperature").unwrap(), "270");

        let qidi = SettingsProfile::baseline("asagf-qidi").unwrap();
        assert_eq!(qidi.get("printer_model").unwrap(), "Q2");
        // list-valued per-extruder key survives as a list
        assert!(qidi.get("nozzle_diameter").unwrap().is_array());
    }

    #[test]
    fn unknown_baseline_name_fails() {
        assert!(matches!(
            SettingsProfile::baseline("nylon"),
            Err(Error::UnknownProfile(_))
        ));
    }

    #[test]
    fn project_json_leads_with_header_keys() {
        let profile = SettingsProfile::from_values("test", map(&[("layer_height", "0.2")]));
        let json = profile.to_project_json("02.04.01.11").unwrap();
        let head = json.find("\"version\"").unwrap();
        let lh = json.find("\"layer_height\"").unwrap();
        assert!(head < lh);
        assert!(json.contains("\"from\": \"project\""));
    }

    #[test]
    fn override_args_parse() {
        let m = overrides_from_args(["brim_width=10", "seam_position=aligned"]).unwrap();
        assert_eq!(m.get("brim_width").unwrap(), "10");
        assert!(overrides_from_args(["missing-equals"]).is_none());
    }
}
