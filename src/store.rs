// src/store.rs
//
// Speech-part records: an in-memory repository owned by the viewer plus the
// REST collaborator that loads and persists them. The repository is only
// mutated after a request succeeds, so a failed call leaves state untouched.
// There is no retry and no cancellation; if two calls race, the state
// reflects whichever response lands last.

use gloo_net::http::Request;
use serde::Deserialize;

use crate::annotation::{AnnotationRecord, DataEnvelope, Speechpart, SpeechpartPayload};

/// Authenticated identity attached to update/delete requests.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthIdentity {
    pub username: String,
    pub token: String,
}

/// Single-object response envelope: `{ "data": {...} }`.
#[derive(Debug, Deserialize)]
struct ItemEnvelope<T> {
    data: T,
}

/// In-memory collection of speech-parts, refreshed or appended under caller
/// control.
#[derive(Debug, Default)]
pub struct SpeechpartStore {
    speechparts: Vec<Speechpart>,
}

impl SpeechpartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speechparts(&self) -> &[Speechpart] {
        &self.speechparts
    }

    pub fn get(&self, id: u32) -> Option<&Speechpart> {
        self.speechparts.iter().find(|sp| sp.id == id)
    }

    /// Replace the whole collection, e.g. after a fetch.
    pub fn replace_all(&mut self, speechparts: Vec<Speechpart>) {
        self.speechparts = speechparts;
    }

    /// Insert a new speech-part or replace the one with the same id.
    pub fn upsert_one(&mut self, speechpart: Speechpart) {
        match self.speechparts.iter_mut().find(|sp| sp.id == speechpart.id) {
            Some(existing) => *existing = speechpart,
            None => self.speechparts.push(speechpart),
        }
    }

    /// Remove by id; returns the removed record if it was present.
    pub fn remove_one(&mut self, id: u32) -> Option<Speechpart> {
        let index = self.speechparts.iter().position(|sp| sp.id == id)?;
        Some(self.speechparts.remove(index))
    }
}

fn basic_auth_header(auth: &AuthIdentity) -> Result<String, String> {
    // Same credentials shape as the original client: the token is the
    // username part, the password is empty.
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let encoded = window
        .btoa(&format!("{}:", auth.token))
        .map_err(|e| format!("Failed to encode credentials: {:?}", e))?;
    Ok(format!("Basic {}", encoded))
}

/// Load the annotation records of a document page for one user.
pub async fn fetch_annotations(
    base_url: &str,
    doc_id: u32,
    user_id: u32,
) -> Result<Vec<AnnotationRecord>, String> {
    let cache_bust = js_sys::Date::now() as u64;
    let url = format!(
        "{}/documents/{}/annotations/from-user/{}?v={}",
        base_url, doc_id, user_id, cache_bust
    );
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch annotations: {:?}", e))?;
    if !resp.ok() {
        return Err(format!("Annotation fetch returned {}", resp.status()));
    }
    let envelope: DataEnvelope<AnnotationRecord> = resp
        .json()
        .await
        .map_err(|e| format!("Failed to parse annotations: {:?}", e))?;
    Ok(envelope.data)
}

/// Load every speech-part of a document for one user.
pub async fn fetch_speechparts(
    base_url: &str,
    doc_id: u32,
    user_id: u32,
) -> Result<Vec<Speechpart>, String> {
    let cache_bust = js_sys::Date::now() as u64;
    let url = format!(
        "{}/documents/{}/transcriptions/alignments/discours/from-user/{}?v={}",
        base_url, doc_id, user_id, cache_bust
    );
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch speechparts: {:?}", e))?;
    if !resp.ok() {
        return Err(format!("Speechpart fetch returned {}", resp.status()));
    }
    let envelope: DataEnvelope<Speechpart> = resp
        .json()
        .await
        .map_err(|e| format!("Failed to parse speechparts: {:?}", e))?;
    Ok(envelope.data)
}

/// Persist one updated speech-part; returns the record as stored.
pub async fn update_speechpart(
    base_url: &str,
    auth: &AuthIdentity,
    speechpart: &Speechpart,
) -> Result<Speechpart, String> {
    let payload = SpeechpartPayload::single(&auth.username, speechpart);
    let resp = Request::put(&format!("{}/speechparts", base_url))
        .header("Authorization", &basic_auth_header(auth)?)
        .json(&payload)
        .map_err(|e| format!("Failed to encode speechpart: {:?}", e))?
        .send()
        .await
        .map_err(|e| format!("Failed to update speechpart: {:?}", e))?;
    if !resp.ok() {
        return Err(format!("Speechpart update returned {}", resp.status()));
    }
    let envelope: ItemEnvelope<Speechpart> = resp
        .json()
        .await
        .map_err(|e| format!("Failed to parse update response: {:?}", e))?;
    Ok(envelope.data)
}

/// Delete one speech-part; returns the deleted record as reported by the
/// backend.
pub async fn delete_speechpart(
    base_url: &str,
    auth: &AuthIdentity,
    speechpart: &Speechpart,
) -> Result<Speechpart, String> {
    let payload = SpeechpartPayload::single(&auth.username, speechpart);
    let resp = Request::delete(&format!("{}/speechparts", base_url))
        .header("Authorization", &basic_auth_header(auth)?)
        .json(&payload)
        .map_err(|e| format!("Failed to encode speechpart: {:?}", e))?
        .send()
        .await
        .map_err(|e| format!("Failed to delete speechpart: {:?}", e))?;
    if !resp.ok() {
        return Err(format!("Speechpart delete returned {}", resp.status()));
    }
    let envelope: ItemEnvelope<Speechpart> = resp
        .json()
        .await
        .map_err(|e| format!("Failed to parse delete response: {:?}", e))?;
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(id: u32, content: &str) -> Speechpart {
        Speechpart {
            id,
            type_id: 1,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_replace_all() {
        let mut store = SpeechpartStore::new();
        store.upsert_one(sp(1, "old"));
        store.replace_all(vec![sp(2, "a"), sp(3, "b")]);
        assert_eq!(store.speechparts().len(), 2);
        assert!(store.get(1).is_none());
        assert_eq!(store.get(3).unwrap().content, "b");
    }

    #[test]
    fn test_upsert_inserts_then_replaces() {
        let mut store = SpeechpartStore::new();
        store.upsert_one(sp(5, "first"));
        assert_eq!(store.speechparts().len(), 1);

        store.upsert_one(sp(5, "second"));
        assert_eq!(store.speechparts().len(), 1);
        assert_eq!(store.get(5).unwrap().content, "second");
    }

    #[test]
    fn test_remove_one() {
        let mut store = SpeechpartStore::new();
        store.replace_all(vec![sp(1, "a"), sp(2, "b")]);
        let removed = store.remove_one(1);
        assert_eq!(removed.unwrap().content, "a");
        assert!(store.remove_one(1).is_none());
        assert_eq!(store.speechparts().len(), 1);
    }
}
