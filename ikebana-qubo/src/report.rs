//! JSON wire shapes shared by the CLI and the HTTP server.

use crate::arrangement::BaseSolution;
use crate::decoder::BranchChoice;
use crate::error::Result;
use crate::extension::{BaseArrangement, ExtensionSolution};
use crate::role::Role;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

fn ordered_map<S: Serializer>(
    pairs: &[(String, f64)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(pairs.iter().map(|(k, v)| (k, v)))
}

/// Base pass result in the flat camelCase layout the viewer consumes.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseReport {
    pub energy: f64,
    pub assignments: BTreeMap<Role, Option<String>>,
    pub main_len: Option<f64>,
    pub guest_len: Option<f64>,
    pub middle1_len: Option<f64>,
    pub middle2_len: Option<f64>,
    pub main_azimuth: Option<f64>,
    pub main_elevation: Option<f64>,
    pub guest_azimuth: Option<f64>,
    pub guest_elevation: Option<f64>,
    pub middle1_azimuth: Option<f64>,
    pub middle1_elevation: Option<f64>,
    pub middle2_azimuth: Option<f64>,
    pub middle2_elevation: Option<f64>,
    #[serde(serialize_with = "ordered_map")]
    pub flowers: Vec<(String, f64)>,
    #[serde(rename = "Q")]
    pub q: BTreeMap<String, f64>,
}

impl From<&BaseSolution> for BaseReport {
    fn from(s: &BaseSolution) -> Self {
        let assignments = Role::BASE
            .iter()
            .filter_map(|&r| s.branch(r).map(|c| (r, c.flower.clone())))
            .collect();
        Self {
            energy: s.energy,
            assignments,
            main_len: s.main.length,
            guest_len: s.guest.length,
            middle1_len: s.middle1.length,
            middle2_len: s.middle2.length,
            main_azimuth: s.main.azimuth,
            main_elevation: s.main.elevation,
            guest_azimuth: s.guest.azimuth,
            guest_elevation: s.guest.elevation,
            middle1_azimuth: s.middle1.azimuth,
            middle1_elevation: s.middle1.elevation,
            middle2_azimuth: s.middle2.azimuth,
            middle2_elevation: s.middle2.elevation,
            flowers: s.flowers.clone(),
            q: s.qubo.to_keyed_map(),
        }
    }
}

/// Extension pass result: `assignments`, `lengths` keyed by role and
/// `angles` keyed by `{role}Azimuth` / `{role}Elevation`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtensionReport {
    pub assignments: BTreeMap<Role, Option<String>>,
    pub lengths: BTreeMap<Role, Option<f64>>,
    pub angles: BTreeMap<String, Option<f64>>,
}

impl From<&ExtensionSolution> for ExtensionReport {
    fn from(s: &ExtensionSolution) -> Self {
        let mut report = Self {
            assignments: BTreeMap::new(),
            lengths: BTreeMap::new(),
            angles: BTreeMap::new(),
        };
        for role in Role::EXTENSION {
            let Some(choice) = s.branch(role) else { continue };
            report.assignments.insert(role, choice.flower.clone());
            report.lengths.insert(role, choice.length);
            report.angles.insert(angle_key(role, "Azimuth"), choice.azimuth);
            report.angles.insert(angle_key(role, "Elevation"), choice.elevation);
        }
        report
    }
}

fn angle_key(role: Role, axis: &str) -> String {
    format!("{role}{axis}")
}

/// Base pass values as a client sends them back for the extension pass.
///
/// Keys are role names; unknown keys are ignored and `null` reads the same
/// as a missing key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseInputs {
    #[serde(default)]
    pub base_assignments: HashMap<String, Option<String>>,
    #[serde(default)]
    pub base_lengths: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub base_angles: HashMap<String, Option<f64>>,
}

impl BaseInputs {
    pub fn to_arrangement(&self) -> Result<BaseArrangement> {
        BaseArrangement::from_choices(|role| {
            let name = role.as_str();
            Some(BranchChoice {
                flower: self.base_assignments.get(name).cloned().flatten(),
                length: self.base_lengths.get(name).copied().flatten(),
                azimuth: self.base_angles.get(&angle_key(role, "Azimuth")).copied().flatten(),
                elevation: self.base_angles.get(&angle_key(role, "Elevation")).copied().flatten(),
            })
        })
    }
}

impl From<&BaseReport> for BaseInputs {
    fn from(r: &BaseReport) -> Self {
        let base_assignments = r
            .assignments
            .iter()
            .map(|(role, flower)| (role.to_string(), flower.clone()))
            .collect();
        let base_lengths = [
            (Role::Main, r.main_len),
            (Role::Guest, r.guest_len),
            (Role::Middle1, r.middle1_len),
            (Role::Middle2, r.middle2_len),
        ]
        .into_iter()
        .map(|(role, len)| (role.to_string(), len))
        .collect();
        let base_angles = [
            (Role::Main, r.main_azimuth, r.main_elevation),
            (Role::Guest, r.guest_azimuth, r.guest_elevation),
            (Role::Middle1, r.middle1_azimuth, r.middle1_elevation),
            (Role::Middle2, r.middle2_azimuth, r.middle2_elevation),
        ]
        .into_iter()
        .flat_map(|(role, az, el)| {
            [
                (angle_key(role, "Azimuth"), az),
                (angle_key(role, "Elevation"), el),
            ]
        })
        .collect();
        Self {
            base_assignments,
            base_lengths,
            base_angles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArrangementError;
    use crate::qubo::Qubo;
    use crate::role::Side;
    use serde_json::{Value, json};

    fn choice(flower: &str, length: f64, azimuth: f64, elevation: f64) -> BranchChoice {
        BranchChoice {
            flower: Some(flower.into()),
            length: Some(length),
            azimuth: Some(azimuth),
            elevation: Some(elevation),
        }
    }

    fn solution() -> BaseSolution {
        let mut qubo = Qubo::new();
        qubo.add(1, 0, -2.5);
        qubo.add(3, 3, 4.0);
        BaseSolution {
            energy: -12.5,
            side: Side::Right,
            main: choice("sakura", 60.0, 0.0, 10.0),
            guest: BranchChoice {
                azimuth: Some(0.0),
                elevation: Some(45.0),
                ..Default::default()
            },
            middle1: choice("rose", 23.0, 40.0, 30.0),
            middle2: choice("lily", 17.0, -40.0, 30.0),
            flowers: vec![("sakura".into(), 0.4), ("rose".into(), 0.25), ("lily".into(), 0.25)],
            qubo,
        }
    }

    #[test]
    fn base_report_uses_flat_camel_case_layout() {
        let value = serde_json::to_value(BaseReport::from(&solution())).unwrap();
        assert_eq!(value["energy"], json!(-12.5));
        assert_eq!(value["assignments"]["main"], json!("sakura"));
        assert_eq!(value["assignments"]["guest"], Value::Null);
        assert_eq!(value["mainLen"], json!(60.0));
        assert_eq!(value["guestLen"], Value::Null);
        assert_eq!(value["middle2Azimuth"], json!(-40.0));
        assert_eq!(value["middle1Elevation"], json!(30.0));
        assert_eq!(value["Q"]["(0, 1)"], json!(-2.5));
        assert_eq!(value["Q"]["(3, 3)"], json!(4.0));
    }

    #[test]
    fn flowers_keep_catalog_order() {
        let text = serde_json::to_string(&BaseReport::from(&solution())).unwrap();
        let sakura = text.find("\"sakura\":0.4").unwrap();
        let rose = text.find("\"rose\":0.25").unwrap();
        let lily = text.find("\"lily\":0.25").unwrap();
        assert!(sakura < rose && rose < lily);
    }

    #[test]
    fn report_feeds_back_into_extension_inputs() {
        let report = BaseReport::from(&solution());
        let base = BaseInputs::from(&report).to_arrangement().unwrap();
        assert_eq!(base.main_length().unwrap(), 60.0);
        assert_eq!(base.middle2.azimuth, -40.0);
        assert_eq!(base.guest.flower, None);
        assert_eq!(base.guest.elevation, 45.0);
    }

    #[test]
    fn inputs_parse_client_payload() {
        let payload = json!({
            "base_assignments": {
                "main": "dill", "guest": null, "middle1": "rose", "middle2": "lily"
            },
            "base_lengths": {"main": 50, "guest": null, "middle1": 20, "middle2": 15},
            "base_angles": {
                "mainAzimuth": 0, "mainElevation": 0,
                "guestAzimuth": 0, "guestElevation": 45,
                "middle1Azimuth": 50, "middle1Elevation": 40,
                "middle2Azimuth": -50, "middle2Elevation": 40
            }
        });
        let inputs: BaseInputs = serde_json::from_value(payload).unwrap();
        let base = inputs.to_arrangement().unwrap();
        assert_eq!(base.main.length, Some(50.0));
        assert_eq!(base.middle1.azimuth, 50.0);
    }

    #[test]
    fn inputs_without_main_length_are_rejected() {
        let payload = json!({
            "base_angles": {
                "mainAzimuth": 0, "mainElevation": 0,
                "guestAzimuth": 0, "guestElevation": 45,
                "middle1Azimuth": 50, "middle1Elevation": 40,
                "middle2Azimuth": -50, "middle2Elevation": 40
            }
        });
        let inputs: BaseInputs = serde_json::from_value(payload).unwrap();
        assert!(matches!(
            inputs.to_arrangement(),
            Err(ArrangementError::MissingBaseValue { role: Role::Main, field: "length" })
        ));
    }

    #[test]
    fn extension_report_keys_angles_by_role() {
        let s = ExtensionSolution {
            energy: -900.0,
            side: Side::Left,
            middle3: choice("kobai", 35.0, -60.0, 15.0),
            middle4: BranchChoice {
                flower: Some("liatris".into()),
                length: Some(30.0),
                azimuth: Some(50.0),
                elevation: None,
            },
            qubo: Qubo::new(),
        };
        let report = ExtensionReport::from(&s);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["assignments"]["middle3"], json!("kobai"));
        assert_eq!(value["lengths"]["middle4"], json!(30.0));
        assert_eq!(value["angles"]["middle3Azimuth"], json!(-60.0));
        assert_eq!(value["angles"]["middle4Elevation"], Value::Null);
        assert_eq!(report.angles["middle4Azimuth"], Some(50.0));
        assert_eq!(report.angles["middle4Elevation"], None);
    }
}
