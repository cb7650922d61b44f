// src/annotation.rs
use serde::{Deserialize, Serialize};

/// The geometric kind of an annotation region.
///
/// The wire format carries the kind as a free-form string so that records
/// with a type this client does not know about can still be deserialized
/// (and skipped with a warning instead of failing the whole batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Rect,
    Polygon,
    Circle,
}

impl RegionKind {
    pub fn parse(tag: &str) -> Option<RegionKind> {
        match tag {
            "rect" => Some(RegionKind::Rect),
            "polygon" => Some(RegionKind::Polygon),
            "circle" => Some(RegionKind::Circle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Rect => "rect",
            RegionKind::Polygon => "polygon",
            RegionKind::Circle => "circle",
        }
    }
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometric extent of one annotation as persisted by the backend.
///
/// `coords` is a comma-separated flat list of numbers whose arity depends on
/// the kind: rect = 4 (two corners), circle = 3 (center + stored radius),
/// polygon = even count, consecutive pairs forming vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(rename = "type")]
    pub kind: String,
    pub coords: String,
}

/// One persisted annotation: a region plus the transcribed content shown in
/// its tooltip. Immutable value object; a fresh record is built from the
/// overlay when the user saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub region: Region,
    pub content: String,
}

impl AnnotationRecord {
    pub fn new(kind: RegionKind, coords: String, content: String) -> Self {
        Self {
            region: Region {
                kind: kind.as_str().to_string(),
                coords,
            },
            content,
        }
    }
}

/// A speech-part record as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speechpart {
    pub id: u32,
    pub type_id: u32,
    pub content: String,
}

/// Envelope used by the backend for list responses: `{ "data": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}

/// One entry of the update/delete payload. The backend expects the
/// authenticated username repeated inside each entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechpartData {
    pub username: String,
    pub id: u32,
    pub type_id: u32,
    pub content: String,
}

/// Body of PUT/DELETE `/speechparts` requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechpartPayload {
    pub data: Vec<SpeechpartData>,
}

impl SpeechpartPayload {
    pub fn single(username: &str, sp: &Speechpart) -> Self {
        Self {
            data: vec![SpeechpartData {
                username: username.to_string(),
                id: sp.id,
                type_id: sp.type_id,
                content: sp.content.clone(),
            }],
        }
    }
}
