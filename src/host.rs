//! Host-facing glue: plugin registration, pick-image endpoint and the wire
//! shapes of the manifest and exclusion lists.
//!
//! Registration is an explicit call the host makes at startup with a
//! [`PluginDescriptor`]; nothing is registered implicitly.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PickerError, Result};
use crate::raster::codec::{PackedColorId, MAX_ID};
use crate::selection::registry::Manifest;

pub const SKIP_OBJECT_CARD_TYPE: &str = "ha-bambulab-skipobject-card";

/// Describes a picker card to the hosting dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    #[serde(rename = "type")]
    pub card_type: String,
    pub name: String,
    pub description: String,
    pub preview: bool,
    #[serde(rename = "documentationURL")]
    pub documentation_url: String,
}

impl PluginDescriptor {
    pub fn new(card_type: &str, name: &str, description: &str, repository_url: &str) -> Self {
        let page = card_type.replace("-card", "").replace("ha-bambulab-", "");
        Self {
            card_type: card_type.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            preview: true,
            documentation_url: format!(
                "{}/blob/main/docs/cards/{}.md",
                repository_url.trim_end_matches('/'),
                page
            ),
        }
    }

    /// Descriptor of the skip-object picker card.
    pub fn skip_object(repository_url: &str) -> Self {
        Self::new(
            SKIP_OBJECT_CARD_TYPE,
            "Bambu Lab Skip Object Card",
            "Card for Skip Object",
            repository_url,
        )
    }
}

/// Cards the host has registered, in registration order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    cards: Vec<PluginDescriptor>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a card. Re-registering a type replaces the earlier entry.
    pub fn register(&mut self, descriptor: PluginDescriptor) {
        if let Some(existing) = self
            .cards
            .iter_mut()
            .find(|c| c.card_type == descriptor.card_type)
        {
            log::debug!("replacing card registration {}", descriptor.card_type);
            *existing = descriptor;
        } else {
            log::debug!("registered card {}", descriptor.card_type);
            self.cards.push(descriptor);
        }
    }

    pub fn get(&self, card_type: &str) -> Option<&PluginDescriptor> {
        self.cards.iter().find(|c| c.card_type == card_type)
    }

    pub fn cards(&self) -> &[PluginDescriptor] {
        &self.cards
    }

    /// JSON array in the shape dashboard card pickers read.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.cards)?)
    }
}

/// Location of a device's pick image behind the dashboard's image proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickImageEndpoint {
    pub entity_id: String,
    pub access_token: String,
    /// Last-updated stamp of the image entity, used to bust caches.
    pub timestamp: String,
}

impl PickImageEndpoint {
    pub fn url(&self) -> String {
        format!(
            "/api/image_proxy/{}?token={}&time={}",
            self.entity_id, self.access_token, self.timestamp
        )
    }
}

/// Parse the printable-object manifest: a JSON object of id → label.
///
/// Ids may be numbers or numeric strings. Entries with unusable ids are
/// skipped.
pub fn parse_manifest_json(text: &str) -> Result<Manifest> {
    let value: Value =
        serde_json::from_str(text).map_err(|_| PickerError::ManifestMissing)?;
    let Value::Object(entries) = value else {
        return Err(PickerError::ManifestMissing);
    };

    let mut manifest = Manifest::new();
    for (key, label) in entries {
        let Some(id) = parse_id(&Value::String(key.clone())) else {
            log::warn!("ignoring manifest entry with id {:?}", key);
            continue;
        };
        let label = match label {
            Value::String(s) => s,
            other => other.to_string(),
        };
        manifest.insert(id, label);
    }
    Ok(manifest)
}

/// Parse an id list: a JSON array of numbers/numeric strings, or a
/// comma-separated string such as `"12,394"`. An empty string is an empty
/// list.
pub fn parse_id_list(text: &str) -> Result<BTreeSet<PackedColorId>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(BTreeSet::new());
    }

    let items: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        trimmed
            .split(',')
            .map(|s| Value::String(s.trim().to_string()))
            .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
            .collect()
    };

    items
        .iter()
        .map(|item| {
            parse_id(item).ok_or_else(|| PickerError::Config(format!("invalid object id {item}")))
        })
        .collect()
}

/// Parse the textual `open` arguments a script host passes.
///
/// `None` stays `None` so the controller can report the manifest as
/// missing; text that fails to parse is an error in its own right.
pub fn parse_open_args(
    manifest: Option<&str>,
    excluded: Option<&str>,
) -> Result<(Option<Manifest>, Option<BTreeSet<PackedColorId>>)> {
    let manifest = manifest.map(parse_manifest_json).transpose()?;
    let excluded = excluded.map(parse_id_list).transpose()?;
    Ok((manifest, excluded))
}

fn parse_id(value: &Value) -> Option<PackedColorId> {
    let id = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    if id > MAX_ID as u64 {
        return None;
    }
    Some(id as PackedColorId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_object_descriptor() {
        let d = PluginDescriptor::skip_object("https://github.com/example/ha-bambulab-cards/");
        assert_eq!(d.card_type, "ha-bambulab-skipobject-card");
        assert!(d.preview);
        assert_eq!(
            d.documentation_url,
            "https://github.com/example/ha-bambulab-cards/blob/main/docs/cards/skipobject.md"
        );
    }

    #[test]
    fn test_registry_replaces_same_type() {
        let mut registry = PluginRegistry::new();
        registry.register(PluginDescriptor::skip_object("https://a"));
        registry.register(PluginDescriptor::new("ha-bambulab-ams-card", "AMS", "", "https://a"));
        registry.register(PluginDescriptor::skip_object("https://b"));

        assert_eq!(registry.cards().len(), 2);
        let card = registry.get(SKIP_OBJECT_CARD_TYPE).unwrap();
        assert!(card.documentation_url.starts_with("https://b/"));

        let json = registry.to_json().unwrap();
        assert!(json.contains("\"type\":\"ha-bambulab-skipobject-card\""));
        assert!(json.contains("\"documentationURL\""));
    }

    #[test]
    fn test_pick_image_url() {
        let endpoint = PickImageEndpoint {
            entity_id: "image.x1c_pick_image".into(),
            access_token: "abc123".into(),
            timestamp: "2024-05-01T10:00:00".into(),
        };
        assert_eq!(
            endpoint.url(),
            "/api/image_proxy/image.x1c_pick_image?token=abc123&time=2024-05-01T10:00:00"
        );
    }

    #[test]
    fn test_parse_manifest() {
        let manifest =
            parse_manifest_json(r#"{"123": "ModelObjectOne.stl", "394": "ModelObjectTwo.stl", "bad": "x"}"#)
                .unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[&394], "ModelObjectTwo.stl");

        assert_eq!(parse_manifest_json("[1, 2]"), Err(PickerError::ManifestMissing));
        assert_eq!(parse_manifest_json("{"), Err(PickerError::ManifestMissing));
    }

    #[test]
    fn test_parse_id_lists() {
        assert_eq!(parse_id_list("").unwrap(), BTreeSet::new());
        assert_eq!(parse_id_list("394, 123").unwrap(), BTreeSet::from([123, 394]));
        assert_eq!(parse_id_list("[394, \"7\"]").unwrap(), BTreeSet::from([7, 394]));
        assert!(matches!(parse_id_list("1,x"), Err(PickerError::Config(_))));
        assert!(matches!(parse_id_list("[16777216]"), Err(PickerError::Config(_))));
        assert!(matches!(parse_id_list("[1,"), Err(PickerError::Config(_))));
    }

    #[test]
    fn test_open_args_keep_parse_errors() {
        let (manifest, excluded) = parse_open_args(Some(r#"{"1": "Cube"}"#), Some("1")).unwrap();
        assert_eq!(manifest.unwrap().len(), 1);
        assert_eq!(excluded, Some(BTreeSet::from([1])));

        assert_eq!(parse_open_args(None, None).unwrap(), (None, None));
        assert!(matches!(parse_open_args(Some("{}"), Some("1,x")), Err(PickerError::Config(_))));
        assert_eq!(parse_open_args(Some("[]"), None), Err(PickerError::ManifestMissing));
    }
}
