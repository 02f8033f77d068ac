//! Versioned scene-code serialization.
//!
//! A scene code is the only persisted artifact: a JSON body
//! `{version, nodes, edges, zoom, pan, stickyNotes}` wrapped in base64 over
//! its UTF-8 bytes, opaque to the user and reversible without loss.

use crate::scene::{Edge, Node, Scene, StickyNote};
use crate::viewport::Viewport;
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::Vec2;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Version stamp written into every generated code.
pub const SCENE_CODE_VERSION: u32 = 1;

/// Codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The pasted code is not a scene code (bad encoding, bad JSON, or
    /// missing required collections).
    #[error("invalid scene code: {0}")]
    InvalidCode(&'static str),
    /// Scene state failed to serialize.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneCodeBody<'a> {
    version: u32,
    nodes: &'a [Node],
    edges: &'a [Edge],
    zoom: f64,
    pan: Vec2,
    sticky_notes: &'a [StickyNote],
}

/// Result of a successful decode, ready to be applied atomically.
///
/// `zoom` and `pan` are `None` when the code predates those fields; the
/// caller keeps its current values in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedScene {
    pub scene: Scene,
    pub zoom: Option<f64>,
    pub pan: Option<Vec2>,
}

/// Encode the scene plus viewport into a portable code string.
pub fn encode(scene: &Scene, viewport: &Viewport) -> Result<String, CodecError> {
    let body = SceneCodeBody {
        version: SCENE_CODE_VERSION,
        nodes: &scene.nodes,
        edges: &scene.edges,
        zoom: viewport.zoom,
        pan: viewport.pan,
        sticky_notes: &scene.sticky_notes,
    };
    let json = serde_json::to_string(&body)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Decode a scene code.
///
/// `nodes` and `edges` must be present and array-typed; every other field is
/// optional and individually type-checked, defaulting when absent or
/// mistyped, so codes from older versions still load. Unknown fields are
/// ignored. Nothing observable is mutated here; the caller applies the
/// returned value atomically or not at all.
pub fn decode(code: &str) -> Result<DecodedScene, CodecError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(CodecError::InvalidCode("empty code"));
    }

    let bytes = STANDARD
        .decode(trimmed)
        .map_err(|_| CodecError::InvalidCode("not base64"))?;
    let json = String::from_utf8(bytes).map_err(|_| CodecError::InvalidCode("not utf-8"))?;
    let value: Value =
        serde_json::from_str(&json).map_err(|_| CodecError::InvalidCode("not json"))?;

    let Value::Object(obj) = &value else {
        return Err(CodecError::InvalidCode("not an object"));
    };

    let nodes = obj
        .get("nodes")
        .filter(|v| v.is_array())
        .ok_or(CodecError::InvalidCode("missing nodes array"))?;
    let edges = obj
        .get("edges")
        .filter(|v| v.is_array())
        .ok_or(CodecError::InvalidCode("missing edges array"))?;

    let nodes: Vec<Node> = serde_json::from_value(nodes.clone())
        .map_err(|_| CodecError::InvalidCode("malformed nodes"))?;
    let mut edges: Vec<Edge> = serde_json::from_value(edges.clone())
        .map_err(|_| CodecError::InvalidCode("malformed edges"))?;

    // Edges are never carried with a dangling endpoint
    let before = edges.len();
    edges.retain(|e| {
        nodes.iter().any(|n| n.id == e.source_id) && nodes.iter().any(|n| n.id == e.target_id)
    });
    if edges.len() < before {
        log::warn!("decode: dropped {} dangling edge(s)", before - edges.len());
    }

    let zoom = obj.get("zoom").and_then(Value::as_f64);
    let pan = obj.get("pan").and_then(|v| {
        let x = v.get("x")?.as_f64()?;
        let y = v.get("y")?.as_f64()?;
        Some(Vec2::new(x, y))
    });
    let sticky_notes: Vec<StickyNote> = obj
        .get("stickyNotes")
        .filter(|v| v.is_array())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    Ok(DecodedScene {
        scene: Scene {
            nodes,
            edges,
            sticky_notes,
        },
        zoom,
        pan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Color, EdgeDirection, Keyword};
    use kurbo::Point;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new(Point::new(0.0, 0.0), Color::default(), "Ünïcode ☃"));
        let b = scene.add_node(Node::new(Point::new(300.0, 100.0), Color::black(), "b"));
        scene.node_mut(a).unwrap().tags = vec!["backend".into(), "backend".into(), "db".into()];
        let edge_id = scene.link(a, b).unwrap();
        {
            let edge = scene.edge_mut(edge_id).unwrap();
            edge.direction = EdgeDirection::SourceToTarget;
            edge.keywords.push(Keyword::Increases);
            edge.note = "scales with".into();
            edge.control = Some(Point::new(150.0, -40.0));
        }
        let sticky = scene.add_sticky(StickyNote::at(Point::new(500.0, 500.0)));
        scene.sticky_mut(sticky).unwrap().content = "# heading\nsome *notes*".into();
        scene
    }

    #[test]
    fn test_roundtrip() {
        let scene = sample_scene();
        let mut viewport = Viewport::new();
        viewport.zoom = 1.3;
        viewport.pan = Vec2::new(12.5, -80.0);

        let code = encode(&scene, &viewport).unwrap();
        let decoded = decode(&code).unwrap();

        assert_eq!(decoded.scene, scene);
        assert_eq!(decoded.zoom, Some(1.3));
        assert_eq!(decoded.pan, Some(Vec2::new(12.5, -80.0)));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{"nodes":[],"edges":[]}"#;
        let code = STANDARD.encode(json);
        let decoded = decode(&code).unwrap();
        assert!(decoded.scene.is_empty());
        assert_eq!(decoded.zoom, None);
        assert_eq!(decoded.pan, None);
    }

    #[test]
    fn test_mistyped_optional_fields_default() {
        let json = r#"{"nodes":[],"edges":[],"zoom":"big","pan":[1,2],"stickyNotes":7}"#;
        let code = STANDARD.encode(json);
        let decoded = decode(&code).unwrap();
        assert_eq!(decoded.zoom, None);
        assert_eq!(decoded.pan, None);
        assert!(decoded.scene.sticky_notes.is_empty());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{"version":9,"nodes":[],"edges":[],"futureFeature":{"x":1}}"#;
        let code = STANDARD.encode(json);
        assert!(decode(&code).is_ok());
    }

    #[test]
    fn test_missing_required_fields_rejected() {
        for json in [
            r#"{"edges":[]}"#,
            r#"{"nodes":[]}"#,
            r#"{"nodes":{},"edges":[]}"#,
            r#"{"nodes":[],"edges":"nope"}"#,
            r#"[1,2,3]"#,
        ] {
            let code = STANDARD.encode(json);
            assert!(matches!(decode(&code), Err(CodecError::InvalidCode(_))), "{json}");
        }
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode("").is_err());
        assert!(decode("   ").is_err());
        assert!(decode("!!not base64!!").is_err());
        assert!(decode(&STANDARD.encode([0xff, 0xfe, 0x00])).is_err());
        assert!(decode(&STANDARD.encode("just text")).is_err());
    }

    #[test]
    fn test_dangling_edges_dropped() {
        let scene = sample_scene();
        let code = encode(&scene, &Viewport::new()).unwrap();

        // Rebuild the body with one node removed but the edge left behind
        let json = String::from_utf8(STANDARD.decode(code).unwrap()).unwrap();
        let mut value: Value = serde_json::from_str(&json).unwrap();
        value["nodes"].as_array_mut().unwrap().pop();
        let tampered = STANDARD.encode(serde_json::to_string(&value).unwrap());

        let decoded = decode(&tampered).unwrap();
        assert_eq!(decoded.scene.nodes.len(), 1);
        assert!(decoded.scene.edges.is_empty());
    }

    #[test]
    fn test_decode_never_panics_on_malformed_entries() {
        // A node with the wrong field types must reject, not default
        let json = r#"{"nodes":[{"id":"x","position":5}],"edges":[]}"#;
        let code = STANDARD.encode(json);
        assert!(matches!(
            decode(&code),
            Err(CodecError::InvalidCode("malformed nodes"))
        ));
    }
}
