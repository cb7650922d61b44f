// src/main.rs
mod annotation;
mod components;
mod document_config;
mod overlay;
mod region_codec;
mod speechpart_format;
mod store;
mod utils;

use components::annotation_viewer::AnnotationViewer;
use document_config::AppManifest;
use gloo_net::http::Request;
use utils::resource_url;
use yew::prelude::*;

pub enum AppMsg {
    ManifestLoaded(AppManifest),
    ManifestLoadFailed(String),
    ChangeDocument(u32),
}

pub struct App {
    manifest: Option<AppManifest>,
    current_document: u32,
    loading: bool,
}

impl Component for App {
    type Message = AppMsg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        ctx.link().send_future(async {
            match load_manifest().await {
                Ok(manifest) => AppMsg::ManifestLoaded(manifest),
                Err(e) => AppMsg::ManifestLoadFailed(e),
            }
        });

        Self {
            manifest: None,
            current_document: 0,
            loading: true,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AppMsg::ManifestLoaded(manifest) => {
                // Open the first document by default
                if let Some(first) = manifest.documents.first() {
                    self.current_document = first.id;
                }
                self.manifest = Some(manifest);
                self.loading = false;
                true
            }
            AppMsg::ManifestLoadFailed(error) => {
                log::error!("Failed to load manifest: {}", error);
                self.loading = false;
                true
            }
            AppMsg::ChangeDocument(id) => {
                self.current_document = id;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        if self.loading {
            return html! {
                <div class="app-container">
                    <header class="app-header">
                        <h1>{"Facsimile Annotator"}</h1>
                    </header>
                    <main class="app-main">
                        <div class="loading">{"Loading documents..."}</div>
                    </main>
                </div>
            };
        }

        let Some(manifest) = &self.manifest else {
            return html! {
                <div class="app-container">
                    <header class="app-header">
                        <h1>{"Facsimile Annotator"}</h1>
                    </header>
                    <main class="app-main">
                        <div class="error">{"No document manifest could be loaded. Please make sure public/manifest.json is present."}</div>
                    </main>
                </div>
            };
        };

        let on_document_change = ctx.link().callback(AppMsg::ChangeDocument);
        let current = manifest.get_document(self.current_document).cloned();

        html! {
            <div class="app-container">
                <header class="app-header">
                    <h1>{"Facsimile Annotator"}</h1>
                    <p class="subtitle">{format!("Signed in as {}", manifest.user.username)}</p>
                </header>

                <main class="app-main">
                    <div class="document-selector">
                        <label for="document-select">{"Document: "}</label>
                        <select
                            id="document-select"
                            onchange={
                                let on_change = on_document_change.clone();
                                Callback::from(move |e: Event| {
                                    let target = e.target_dyn_into::<web_sys::HtmlSelectElement>();
                                    if let Some(select) = target {
                                        if let Ok(id) = select.value().parse::<u32>() {
                                            on_change.emit(id);
                                        }
                                    }
                                })
                            }
                        >
                            {for manifest.documents.iter().map(|doc| {
                                html! {
                                    <option
                                        value={doc.id.to_string()}
                                        selected={self.current_document == doc.id}
                                    >
                                        {doc.title.clone()}
                                    </option>
                                }
                            })}
                        </select>
                    </div>

                    if let Some(doc) = current {
                        <AnnotationViewer
                            doc_id={doc.id}
                            user_id={manifest.user.id}
                            username={manifest.user.username.clone()}
                            auth_token={manifest.user.token.clone()}
                            image_url={resource_url(&doc.image_url)}
                            image_width={doc.image_width}
                            image_height={doc.image_height}
                            max_zoom={doc.max_zoom}
                        />
                    }
                </main>

                <footer class="app-footer">
                    <p>{"Facsimile Annotator © 2024"}</p>
                </footer>
            </div>
        }
    }
}

async fn load_manifest() -> Result<AppManifest, String> {
    let url = resource_url("public/manifest.json");
    match Request::get(&url).send().await {
        Ok(resp) => {
            if resp.ok() {
                resp.json::<AppManifest>()
                    .await
                    .map_err(|e| format!("Failed to parse manifest: {:?}", e))
            } else {
                Err(format!("Manifest request returned {}", resp.status()))
            }
        }
        Err(e) => Err(format!("Failed to fetch manifest: {:?}", e)),
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
