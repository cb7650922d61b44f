// src/utils.rs
#[cfg(target_arch = "wasm32")]
use web_sys::window;

/// Get the base URL for the application
/// This handles both local development and a sub-path deployment
pub fn get_base_url() -> String {
    // `web_sys::window()` is only callable on wasm32; elsewhere there is no
    // window, so fall through to the default below.
    #[cfg(target_arch = "wasm32")]
    if let Some(window) = window() {
        if let Some(location) = window.location().pathname().ok() {
            // Check if we're deployed under a sub-path
            if location.starts_with("/facsimile-annotator/") {
                return "/facsimile-annotator".to_string();
            }
        }
    }
    // Local development - no base path needed
    String::new()
}

/// Build a resource URL with the correct base path
pub fn resource_url(path: &str) -> String {
    let base = get_base_url();
    let clean_path = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", clean_path)
    } else {
        format!("{}/{}", base, clean_path)
    }
}

/// Base of the annotation REST API.
pub fn api_url() -> String {
    format!("{}/adele/api/1.0", get_base_url())
}
