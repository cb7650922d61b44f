// src/document_config.rs
use serde::{Deserialize, Serialize};

/// One annotatable document as listed in the application manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub id: u32,
    pub title: String,
    pub image_url: String,
    /// Full-resolution dimensions of the facsimile image.
    pub image_width: u32,
    pub image_height: u32,
    /// Deepest zoom level of the image pyramid.
    pub max_zoom: u8,
}

/// Identity used for authenticated speech-part updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: u32,
    pub username: String,
    pub token: String,
}

/// Application manifest: the current user and the documents they can open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppManifest {
    pub user: UserConfig,
    pub documents: Vec<DocumentConfig>,
}

impl AppManifest {
    pub fn get_document(&self, id: u32) -> Option<&DocumentConfig> {
        self.documents.iter().find(|d| d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parse_and_lookup() {
        let json = r#"{
            "user": {"id": 4, "username": "editor1", "token": "tok"},
            "documents": [
                {"id": 21, "title": "Charter fol. 3r", "image_url": "public/docs/21.jpg",
                 "image_width": 4000, "image_height": 6000, "max_zoom": 4}
            ]
        }"#;
        let manifest: AppManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.user.username, "editor1");
        assert_eq!(manifest.get_document(21).unwrap().max_zoom, 4);
        assert!(manifest.get_document(99).is_none());
    }
}
