//! Validated decode of the MITRE ATT&CK enterprise bundle.
//!
//! The bundle is a STIX document; histmap only reads the subset it needs:
//! `attack-pattern` objects with their external id, name, tactic, and
//! description. Decoding fails fast with `DataFormat` on shape mismatch
//! instead of reaching into possibly-absent fields at use time.

use serde::Deserialize;
use std::collections::HashMap;

use crate::{HistmapError, HistmapResult};

/// Metadata for one technique, keyed by technique id in [`TechniqueCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueMeta {
    pub name: String,
    pub tactic: String,
    pub description: String,
}

pub type TechniqueCatalog = HashMap<String, TechniqueMeta>;

// ---------------------------------------------------------------------------
// Wire model
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Bundle {
    objects: Vec<BundleObject>,
}

#[derive(Debug, Deserialize)]
struct BundleObject {
    #[serde(rename = "type")]
    object_type: String,

    name: Option<String>,

    description: Option<String>,

    #[serde(default)]
    external_references: Vec<ExternalReference>,

    #[serde(default)]
    kill_chain_phases: Vec<KillChainPhase>,

    #[serde(default)]
    revoked: bool,

    #[serde(default, rename = "x_mitre_deprecated")]
    deprecated: bool,
}

#[derive(Debug, Deserialize)]
struct ExternalReference {
    source_name: Option<String>,
    external_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KillChainPhase {
    phase_name: String,
}

// ---------------------------------------------------------------------------
// Decode + validate
// ---------------------------------------------------------------------------

/// Parse a raw bundle into a technique catalog.
///
/// Revoked and deprecated techniques are dropped (they are absent from the
/// live framework). Every remaining `attack-pattern` must carry a
/// well-formed technique id and a name; a single malformed entry fails the
/// whole load.
pub fn parse_bundle(raw: &str) -> HistmapResult<TechniqueCatalog> {
    let bundle: Bundle = serde_json::from_str(raw)
        .map_err(|e| HistmapError::DataFormat(format!("ATT&CK bundle is not valid JSON: {}", e)))?;

    let mut catalog = TechniqueCatalog::new();

    for (index, object) in bundle.objects.iter().enumerate() {
        if object.object_type != "attack-pattern" || object.revoked || object.deprecated {
            continue;
        }

        let technique_id = mitre_external_id(object).ok_or_else(|| {
            HistmapError::DataFormat(format!(
                "attack-pattern at objects[{}] has no external technique id",
                index
            ))
        })?;

        if !super::is_valid_technique_id(technique_id) {
            return Err(HistmapError::DataFormat(format!(
                "attack-pattern at objects[{}] has malformed technique id {:?}",
                index, technique_id
            )));
        }

        let name = match object.name.as_deref() {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => {
                return Err(HistmapError::DataFormat(format!(
                    "attack-pattern {} has no name",
                    technique_id
                )))
            }
        };

        let tactic = object
            .kill_chain_phases
            .first()
            .map(|phase| tactic_display_name(&phase.phase_name))
            .unwrap_or_else(|| "Unknown".to_string());

        let description = object
            .description
            .clone()
            .unwrap_or_else(|| "No description available.".to_string());

        catalog.insert(
            technique_id.to_string(),
            TechniqueMeta {
                name,
                tactic,
                description,
            },
        );
    }

    if catalog.is_empty() {
        return Err(HistmapError::DataFormat(
            "ATT&CK bundle contains no attack-pattern objects".to_string(),
        ));
    }

    Ok(catalog)
}

/// The technique id from the `mitre-attack` external reference, falling
/// back to the first reference carrying an id.
fn mitre_external_id(object: &BundleObject) -> Option<&str> {
    object
        .external_references
        .iter()
        .find(|r| r.source_name.as_deref() == Some("mitre-attack"))
        .and_then(|r| r.external_id.as_deref())
        .or_else(|| {
            object
                .external_references
                .iter()
                .find_map(|r| r.external_id.as_deref())
        })
}

/// "credential-access" -> "Credential Access".
fn tactic_display_name(phase_name: &str) -> String {
    phase_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle_json(objects: &str) -> String {
        format!(r#"{{"type":"bundle","objects":[{}]}}"#, objects)
    }

    const VALID_PATTERN: &str = r#"{
        "type": "attack-pattern",
        "name": "OS Credential Dumping",
        "description": "Adversaries may attempt to dump credentials.",
        "external_references": [
            {"source_name": "mitre-attack", "external_id": "T1003"}
        ],
        "kill_chain_phases": [
            {"kill_chain_name": "mitre-attack", "phase_name": "credential-access"}
        ]
    }"#;

    #[test]
    fn test_parse_valid_bundle() {
        let catalog = parse_bundle(&bundle_json(VALID_PATTERN)).unwrap();
        let meta = catalog.get("T1003").unwrap();
        assert_eq!(meta.name, "OS Credential Dumping");
        assert_eq!(meta.tactic, "Credential Access");
    }

    #[test]
    fn test_missing_technique_id_is_data_format_error() {
        let object = r#"{
            "type": "attack-pattern",
            "name": "Nameless",
            "external_references": [{"source_name": "mitre-attack"}]
        }"#;
        let err = parse_bundle(&bundle_json(object)).unwrap_err();
        assert!(matches!(err, HistmapError::DataFormat(_)));
    }

    #[test]
    fn test_malformed_technique_id_is_data_format_error() {
        let object = r#"{
            "type": "attack-pattern",
            "name": "Bad id",
            "external_references": [
                {"source_name": "mitre-attack", "external_id": "G0016"}
            ]
        }"#;
        let err = parse_bundle(&bundle_json(object)).unwrap_err();
        assert!(matches!(err, HistmapError::DataFormat(_)));
    }

    #[test]
    fn test_missing_name_is_data_format_error() {
        let object = r#"{
            "type": "attack-pattern",
            "external_references": [
                {"source_name": "mitre-attack", "external_id": "T1003"}
            ]
        }"#;
        let err = parse_bundle(&bundle_json(object)).unwrap_err();
        assert!(matches!(err, HistmapError::DataFormat(_)));
    }

    #[test]
    fn test_revoked_patterns_are_skipped() {
        let revoked = r#"{
            "type": "attack-pattern",
            "name": "Old Technique",
            "revoked": true,
            "external_references": []
        }"#;
        let objects = format!("{},{}", VALID_PATTERN, revoked);
        let catalog = parse_bundle(&bundle_json(&objects)).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_non_attack_pattern_objects_ignored() {
        let relationship = r#"{"type": "relationship"}"#;
        let objects = format!("{},{}", VALID_PATTERN, relationship);
        let catalog = parse_bundle(&bundle_json(&objects)).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_invalid_json_is_data_format_error() {
        let err = parse_bundle("{not json").unwrap_err();
        assert!(matches!(err, HistmapError::DataFormat(_)));
    }

    #[test]
    fn test_empty_bundle_is_data_format_error() {
        let err = parse_bundle(&bundle_json("")).unwrap_err();
        assert!(matches!(err, HistmapError::DataFormat(_)));
    }

    #[test]
    fn test_tactic_display_name() {
        assert_eq!(tactic_display_name("credential-access"), "Credential Access");
        assert_eq!(tactic_display_name("execution"), "Execution");
    }
}
