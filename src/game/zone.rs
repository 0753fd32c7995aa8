//! Interactable Zones
//!
//! The map's object layer is parsed once at scene setup into a closed
//! catalog of typed interactable zones. The catalog persists for the
//! scene's lifetime; overlap tracking references zones by their object id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;

/// Map-object identifier, as assigned by the map editor.
pub type ZoneId = u32;

/// Name of the object-layer entry marking the local player's spawn.
pub const SPAWN_POINT_NAME: &str = "Spawn Point";

/// Raw object-layer record as authored in the map editor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapObject {
    /// Object id, unique within the map.
    pub id: ZoneId,
    /// Object name ("Spawn Point", a zone label, ...).
    pub name: String,
    /// Object type tag; empty for plain markers and labels.
    #[serde(rename = "type", default)]
    pub object_type: String,
    /// Left edge in map pixels.
    pub x: f32,
    /// Top edge in map pixels.
    pub y: f32,
    /// Width in map pixels (zero for point objects).
    #[serde(default)]
    pub width: f32,
    /// Height in map pixels (zero for point objects).
    #[serde(default)]
    pub height: f32,
    /// Free-form editor properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl MapObject {
    /// Bounds rectangle of this object.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Behavior of an interactable region.
///
/// A closed set: every recognized map type maps to exactly one variant
/// carrying its own configuration, and dispatch is exhaustive matching.
/// An unrecognized type tag is a configuration error, not a silent skip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    /// A conversation area players chat in while inside.
    Conversation {
        /// Topic shown to occupants, if one was authored.
        topic: Option<String>,
    },
    /// A shared video viewing area.
    Viewing {
        /// Video to resume when a player enters, if one was authored.
        video_url: Option<String>,
    },
    /// A teleporter to another named region of the map.
    Transporter {
        /// Name of the destination marker.
        target: Option<String>,
    },
}

impl ZoneKind {
    /// Map a raw object type tag and its properties to a zone kind.
    ///
    /// Returns `Ok(None)` for untyped objects (labels, markers) and an
    /// error for a non-empty tag outside the known set.
    fn from_object(object: &MapObject) -> Result<Option<Self>, ZoneError> {
        match object.object_type.as_str() {
            "" => Ok(None),
            "ConversationArea" => Ok(Some(ZoneKind::Conversation {
                topic: object.properties.get("topic").cloned(),
            })),
            "ViewingArea" => Ok(Some(ZoneKind::Viewing {
                video_url: object.properties.get("video").cloned(),
            })),
            "Transporter" => Ok(Some(ZoneKind::Transporter {
                target: object.properties.get("target").cloned(),
            })),
            other => Err(ZoneError::UnknownKind {
                object_type: other.to_string(),
                object_id: object.id,
            }),
        }
    }
}

/// A proximity-triggered region of the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractableZone {
    /// Map-object id.
    pub id: ZoneId,
    /// Authored zone name.
    pub name: String,
    /// Region the zone occupies.
    pub bounds: Rect,
    /// What the zone does.
    pub kind: ZoneKind,
}

/// Object-layer configuration errors. These abort scene setup.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// An object carried a type tag outside the known interactable set.
    #[error("unknown interactable type '{object_type}' on map object {object_id}")]
    UnknownKind {
        /// The unrecognized tag.
        object_type: String,
        /// The offending object id.
        object_id: ZoneId,
    },

    /// The object layer has no spawn point marker.
    #[error("map object layer has no '{SPAWN_POINT_NAME}' marker")]
    MissingSpawnPoint,
}

/// Parse the object layer into the interactable-zone catalog.
///
/// Untyped objects are skipped; an unknown non-empty type aborts setup.
pub fn parse_interactables(objects: &[MapObject]) -> Result<Vec<InteractableZone>, ZoneError> {
    let mut zones = Vec::new();
    for object in objects {
        if let Some(kind) = ZoneKind::from_object(object)? {
            zones.push(InteractableZone {
                id: object.id,
                name: object.name.clone(),
                bounds: object.bounds(),
                kind,
            });
        }
    }
    Ok(zones)
}

/// Locate the spawn point marker in the object layer.
pub fn find_spawn_point(objects: &[MapObject]) -> Result<Vec2, ZoneError> {
    objects
        .iter()
        .find(|object| object.name == SPAWN_POINT_NAME)
        .map(|object| Vec2::new(object.x, object.y))
        .ok_or(ZoneError::MissingSpawnPoint)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: ZoneId, name: &str, object_type: &str) -> MapObject {
        MapObject {
            id,
            name: name.to_string(),
            object_type: object_type.to_string(),
            x: 10.0 * id as f32,
            y: 20.0,
            width: 100.0,
            height: 80.0,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn test_parse_known_kinds() {
        let objects = vec![
            object(1, "Lobby Chat", "ConversationArea"),
            object(2, "Cinema", "ViewingArea"),
            object(3, "North Door", "Transporter"),
        ];

        let zones = parse_interactables(&objects).unwrap();
        assert_eq!(zones.len(), 3);
        assert!(matches!(zones[0].kind, ZoneKind::Conversation { .. }));
        assert!(matches!(zones[1].kind, ZoneKind::Viewing { .. }));
        assert!(matches!(zones[2].kind, ZoneKind::Transporter { .. }));
    }

    #[test]
    fn test_parse_reads_typed_configuration() {
        let mut conversation = object(1, "Lobby Chat", "ConversationArea");
        conversation
            .properties
            .insert("topic".to_string(), "rust".to_string());
        let mut transporter = object(2, "North Door", "Transporter");
        transporter
            .properties
            .insert("target".to_string(), "Plaza".to_string());

        let zones = parse_interactables(&[conversation, transporter]).unwrap();
        assert_eq!(
            zones[0].kind,
            ZoneKind::Conversation {
                topic: Some("rust".to_string())
            }
        );
        assert_eq!(
            zones[1].kind,
            ZoneKind::Transporter {
                target: Some("Plaza".to_string())
            }
        );
    }

    #[test]
    fn test_parse_skips_untyped_objects() {
        let objects = vec![
            object(1, "label", ""),
            object(2, SPAWN_POINT_NAME, ""),
            object(3, "Lobby Chat", "ConversationArea"),
        ];
        let zones = parse_interactables(&objects).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, 3);
    }

    #[test]
    fn test_parse_unknown_kind_aborts() {
        let objects = vec![
            object(1, "Lobby Chat", "ConversationArea"),
            object(2, "Mystery", "VendingMachine"),
        ];
        let err = parse_interactables(&objects).unwrap_err();
        assert!(matches!(
            err,
            ZoneError::UnknownKind { ref object_type, object_id: 2 } if object_type == "VendingMachine"
        ));
    }

    #[test]
    fn test_find_spawn_point() {
        let objects = vec![object(1, "label", ""), object(7, SPAWN_POINT_NAME, "")];
        let spawn = find_spawn_point(&objects).unwrap();
        assert_eq!(spawn, Vec2::new(70.0, 20.0));

        let err = find_spawn_point(&[object(1, "label", "")]).unwrap_err();
        assert!(matches!(err, ZoneError::MissingSpawnPoint));
    }
}
