// src/components/annotation_viewer.rs
use gloo::events::EventListener;
use gloo::utils::document;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::KeyboardEvent;
use yew::events::WheelEvent;
use yew::prelude::*;
use yew::MouseEvent;

use crate::annotation::{AnnotationRecord, Speechpart};
use crate::overlay::{OverlayGroup, RenderReport};
use crate::region_codec::{ImagePoint, Projector, RegionGeometry, TiledImageProjector, REFERENCE_ZOOM};
use crate::speechpart_format::{self, TranscriptionSpan};
use crate::store::{self, AuthIdentity, SpeechpartStore};
use crate::utils::api_url;

#[derive(Properties, PartialEq)]
pub struct AnnotationViewerProps {
    pub doc_id: u32,
    pub user_id: u32,
    pub username: String,
    pub auth_token: String,
    pub image_url: String,
    /// Full-resolution dimensions of the facsimile image.
    pub image_width: u32,
    pub image_height: u32,
    /// Deepest level of the image pyramid.
    pub max_zoom: u8,
}

pub enum AnnotationViewerMsg {
    AnnotationsLoaded(Result<Vec<AnnotationRecord>, String>),
    SpeechpartsLoaded(Result<Vec<Speechpart>, String>),
    PointerEnter(usize),
    PointerLeave(usize),
    ToggleEditSession,
    SaveSpeechpart(u32),
    SpeechpartSaved(Result<Speechpart, String>),
    DeleteSpeechpart(u32),
    SpeechpartDeleted(Result<Speechpart, String>),
    Wheel(WheelEvent),
    StartDrag(MouseEvent),
    Drag(MouseEvent),
    EndDrag,
    ResetView,
}

pub struct AnnotationViewer {
    overlay: OverlayGroup,
    store: SpeechpartStore,
    report: Option<RenderReport>,
    loading: bool,
    error: Option<String>,
    // zoom and pan
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    dragging: bool,
    last_mouse_x: f32,
    last_mouse_y: f32,
    current_doc: u32,
    current_user: u32,
    _keyboard: Option<EventListener>,
}

impl AnnotationViewer {
    fn projector(ctx: &Context<Self>) -> TiledImageProjector {
        TiledImageProjector::new(ctx.props().max_zoom)
    }

    fn auth(ctx: &Context<Self>) -> AuthIdentity {
        AuthIdentity {
            username: ctx.props().username.clone(),
            token: ctx.props().auth_token.clone(),
        }
    }

    fn load(ctx: &Context<Self>) {
        let doc_id = ctx.props().doc_id;
        let user_id = ctx.props().user_id;
        let base = api_url();

        let link = ctx.link().clone();
        let annotations_base = base.clone();
        spawn_local(async move {
            let result = store::fetch_annotations(&annotations_base, doc_id, user_id).await;
            link.send_message(AnnotationViewerMsg::AnnotationsLoaded(result));
        });

        let link = ctx.link().clone();
        spawn_local(async move {
            let result = store::fetch_speechparts(&base, doc_id, user_id).await;
            link.send_message(AnnotationViewerMsg::SpeechpartsLoaded(result));
        });
    }

    /// Dimensions of the map plane the overlay is drawn in, i.e. the image
    /// projected at the reference zoom.
    fn overlay_size(&self, ctx: &Context<Self>) -> (f64, f64) {
        let projector = Self::projector(ctx);
        let corner = projector.project(
            ImagePoint::new(
                f64::from(ctx.props().image_width),
                f64::from(ctx.props().image_height),
            ),
            REFERENCE_ZOOM,
        );
        (corner.x, corner.y)
    }

    fn view_shape(&self, ctx: &Context<Self>, index: usize) -> Html {
        let handle = &self.overlay.handles()[index];
        let style = handle.style();
        let css = format!(
            "opacity:{};cursor:{};",
            style.opacity / 100.0,
            style.cursor
        );

        let onmouseover = style.hover_armed.then(|| {
            ctx.link()
                .callback(move |_: MouseEvent| AnnotationViewerMsg::PointerEnter(index))
        });
        let onmouseout = style.hover_armed.then(|| {
            ctx.link()
                .callback(move |_: MouseEvent| AnnotationViewerMsg::PointerLeave(index))
        });

        let tooltip = html! { <title>{handle.shape.tooltip_text()}</title> };

        match &handle.shape.geometry {
            RegionGeometry::Rect { a, b } => {
                let x = a.x.min(b.x);
                let y = a.y.min(b.y);
                let width = (b.x - a.x).abs();
                let height = (b.y - a.y).abs();
                html! {
                    <rect class="annotation-region" x={x.to_string()} y={y.to_string()}
                        width={width.to_string()} height={height.to_string()}
                        style={css} {onmouseover} {onmouseout}>
                        {tooltip}
                    </rect>
                }
            }
            RegionGeometry::Polygon(points) => {
                let point_list = points
                    .iter()
                    .map(|p| format!("{},{}", p.x, p.y))
                    .collect::<Vec<_>>()
                    .join(" ");
                html! {
                    <polygon class="annotation-region" points={point_list}
                        style={css} {onmouseover} {onmouseout}>
                        {tooltip}
                    </polygon>
                }
            }
            RegionGeometry::Circle { center, radius } => {
                html! {
                    <circle class="annotation-region" cx={center.x.to_string()}
                        cy={center.y.to_string()} r={radius.to_string()}
                        style={css} {onmouseover} {onmouseout}>
                        {tooltip}
                    </circle>
                }
            }
        }
    }

    fn view_speechpart_content(content: &str) -> Html {
        match speechpart_format::parse_spans(content) {
            Ok(spans) => html! {
                <>
                    {for spans.iter().map(|span| match span {
                        TranscriptionSpan::Text(text) => html! { <span>{text.clone()}</span> },
                        TranscriptionSpan::Speechpart { id, text } => html! {
                            <mark class="speechpart" data-speechpart-id={id.clone().unwrap_or_default()}>
                                {text.clone()}
                            </mark>
                        },
                    })}
                </>
            },
            Err(e) => {
                log::warn!("Unparseable speechpart content: {}", e);
                html! { <span>{content.to_string()}</span> }
            }
        }
    }
}

impl Component for AnnotationViewer {
    type Message = AnnotationViewerMsg;
    type Properties = AnnotationViewerProps;

    fn create(ctx: &Context<Self>) -> Self {
        Self::load(ctx);

        Self {
            overlay: OverlayGroup::new(),
            store: SpeechpartStore::new(),
            report: None,
            loading: true,
            error: None,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            dragging: false,
            last_mouse_x: 0.0,
            last_mouse_y: 0.0,
            current_doc: ctx.props().doc_id,
            current_user: ctx.props().user_id,
            _keyboard: None,
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            let link = ctx.link().clone();
            self._keyboard = Some(EventListener::new(&document(), "keydown", move |event| {
                let keyboard_event = event.dyn_ref::<KeyboardEvent>().unwrap();
                match keyboard_event.key().as_str() {
                    "e" | "E" => link.send_message(AnnotationViewerMsg::ToggleEditSession),
                    "r" | "R" => link.send_message(AnnotationViewerMsg::ResetView),
                    _ => {}
                }
            }));
        }
    }

    fn changed(&mut self, ctx: &Context<Self>, _old: &Self::Properties) -> bool {
        let new_doc = ctx.props().doc_id;
        let new_user = ctx.props().user_id;

        if new_doc != self.current_doc || new_user != self.current_user {
            self.current_doc = new_doc;
            self.current_user = new_user;
            self.overlay.clear();
            self.store.replace_all(Vec::new());
            self.report = None;
            self.loading = true;
            self.error = None;
            self.scale = 1.0;
            self.offset_x = 0.0;
            self.offset_y = 0.0;
            Self::load(ctx);
            true
        } else {
            false
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AnnotationViewerMsg::AnnotationsLoaded(Ok(records)) => {
                self.loading = false;
                let projector = Self::projector(ctx);
                let report = self.overlay.render_records(&records, &projector);
                if !report.skipped_unknown.is_empty() || !report.malformed.is_empty() {
                    log::warn!(
                        "{} annotation(s) rendered, {} unknown type(s), {} malformed",
                        report.rendered,
                        report.skipped_unknown.len(),
                        report.malformed.len()
                    );
                }
                self.report = Some(report);
                true
            }
            AnnotationViewerMsg::AnnotationsLoaded(Err(e)) => {
                log::error!("Failed to load annotations: {}", e);
                self.loading = false;
                self.error = Some(e);
                true
            }
            AnnotationViewerMsg::SpeechpartsLoaded(Ok(speechparts)) => {
                self.store.replace_all(speechparts);
                true
            }
            AnnotationViewerMsg::SpeechpartsLoaded(Err(e)) => {
                // The speech-part panel just stays empty.
                log::error!("Failed to load speechparts: {}", e);
                true
            }
            AnnotationViewerMsg::PointerEnter(index) => {
                self.overlay.pointer_enter(index);
                true
            }
            AnnotationViewerMsg::PointerLeave(index) => {
                self.overlay.pointer_leave(index);
                true
            }
            AnnotationViewerMsg::ToggleEditSession => {
                if self.overlay.is_editing() {
                    self.overlay.end_edit_session();
                } else {
                    self.overlay.begin_edit_session();
                }
                true
            }
            AnnotationViewerMsg::SaveSpeechpart(id) => {
                if let Some(sp) = self.store.get(id).cloned() {
                    let auth = Self::auth(ctx);
                    let base = api_url();
                    let link = ctx.link().clone();
                    spawn_local(async move {
                        let result = store::update_speechpart(&base, &auth, &sp).await;
                        link.send_message(AnnotationViewerMsg::SpeechpartSaved(result));
                    });
                }
                false
            }
            AnnotationViewerMsg::SpeechpartSaved(Ok(sp)) => {
                self.store.upsert_one(sp);
                true
            }
            AnnotationViewerMsg::SpeechpartSaved(Err(e)) => {
                // Store untouched; the record keeps its previous state.
                log::error!("Failed to save speechpart: {}", e);
                true
            }
            AnnotationViewerMsg::DeleteSpeechpart(id) => {
                if let Some(sp) = self.store.get(id).cloned() {
                    let auth = Self::auth(ctx);
                    let base = api_url();
                    let link = ctx.link().clone();
                    spawn_local(async move {
                        let result = store::delete_speechpart(&base, &auth, &sp).await;
                        link.send_message(AnnotationViewerMsg::SpeechpartDeleted(result));
                    });
                }
                false
            }
            AnnotationViewerMsg::SpeechpartDeleted(Ok(sp)) => {
                self.store.remove_one(sp.id);
                true
            }
            AnnotationViewerMsg::SpeechpartDeleted(Err(e)) => {
                log::error!("Failed to delete speechpart: {}", e);
                true
            }
            AnnotationViewerMsg::Wheel(e) => {
                e.prevent_default();
                let delta = -e.delta_y() as f32 / 500.0;
                self.scale = (self.scale + delta).clamp(0.3, 6.0);
                true
            }
            AnnotationViewerMsg::StartDrag(e) => {
                self.dragging = true;
                self.last_mouse_x = e.client_x() as f32;
                self.last_mouse_y = e.client_y() as f32;
                false
            }
            AnnotationViewerMsg::Drag(e) => {
                if self.dragging {
                    let cx = e.client_x() as f32;
                    let cy = e.client_y() as f32;
                    self.offset_x += cx - self.last_mouse_x;
                    self.offset_y += cy - self.last_mouse_y;
                    self.last_mouse_x = cx;
                    self.last_mouse_y = cy;
                    true
                } else {
                    false
                }
            }
            AnnotationViewerMsg::EndDrag => {
                self.dragging = false;
                false
            }
            AnnotationViewerMsg::ResetView => {
                self.scale = 1.0;
                self.offset_x = 0.0;
                self.offset_y = 0.0;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let (overlay_w, overlay_h) = self.overlay_size(ctx);

        let onwheel = ctx.link().callback(AnnotationViewerMsg::Wheel);
        let onmousedown = ctx.link().callback(AnnotationViewerMsg::StartDrag);
        let onmousemove = ctx.link().callback(AnnotationViewerMsg::Drag);
        let onmouseup = ctx.link().callback(|_| AnnotationViewerMsg::EndDrag);
        let toggle_edit = ctx.link().callback(|_| AnnotationViewerMsg::ToggleEditSession);
        let reset_view = ctx.link().callback(|_| AnnotationViewerMsg::ResetView);

        let status = if self.loading {
            "Loading annotations...".to_string()
        } else if let Some(report) = &self.report {
            let mut s = format!("{} region(s)", report.rendered);
            if !report.skipped_unknown.is_empty() {
                s.push_str(&format!(", {} unknown", report.skipped_unknown.len()));
            }
            if !report.malformed.is_empty() {
                s.push_str(&format!(", {} malformed", report.malformed.len()));
            }
            s
        } else {
            String::new()
        };

        html! {
            <div class="annotation-viewer" style="user-select:none; outline:none;" tabindex="0">
                <div style="margin-bottom:10px; display:flex; gap:8px; align-items:center; flex-wrap:wrap;">
                    <button onclick={toggle_edit} title="Toggle edit session (E)">
                        { if self.overlay.is_editing() { "✓ Stop editing" } else { "✎ Edit regions" } }
                    </button>
                    <button onclick={reset_view} title="Reset View (R)">{"⟲ Reset"}</button>
                    <div style="margin-left:auto; font-family:monospace; background:#f0f0f0; border-radius:4px; padding:4px 8px;">
                        { status }
                    </div>
                </div>

                if let Some(error) = &self.error {
                    <div class="error">{format!("Could not load annotations: {}", error)}</div>
                }

                <div
                    {onwheel}
                    {onmousedown}
                    {onmouseup}
                    {onmousemove}
                    style="width:100%; height:75vh; overflow:hidden; border:1px solid #bbb;
                           position:relative; cursor:grab; background:#fafafa;"
                >
                    <div style={format!(
                        "position:absolute; transform: translate({}px, {}px) scale({}); transform-origin: top left;",
                        self.offset_x, self.offset_y, self.scale
                    )}>
                        <img
                            src={ctx.props().image_url.clone()}
                            style={format!("width:{}px; height:{}px; max-width:none; pointer-events:none;", overlay_w, overlay_h)}
                        />
                        <svg
                            viewBox={format!("0 0 {} {}", overlay_w, overlay_h)}
                            style={format!("position:absolute; top:0; left:0; width:{}px; height:{}px;", overlay_w, overlay_h)}
                        >
                            {for (0..self.overlay.len()).map(|i| self.view_shape(ctx, i))}
                        </svg>
                    </div>
                </div>

                <div class="speechpart-panel" style="margin-top:10px;">
                    {for self.store.speechparts().iter().map(|sp| {
                        let id = sp.id;
                        let save = ctx.link().callback(move |_| AnnotationViewerMsg::SaveSpeechpart(id));
                        let delete = ctx.link().callback(move |_| AnnotationViewerMsg::DeleteSpeechpart(id));
                        html! {
                            <div class="speechpart-row" style="display:flex; gap:8px; align-items:baseline;">
                                <span style="font-family:monospace;">{format!("#{}", sp.id)}</span>
                                <div style="flex:1;">{Self::view_speechpart_content(&sp.content)}</div>
                                <button onclick={save} title="Save">{"💾"}</button>
                                <button onclick={delete} title="Delete">{"🗑"}</button>
                            </div>
                        }
                    })}
                </div>

                <div style="margin-top:10px; font-size:12px; color:#666;">
                    <p>{"Hover a region to reveal it. Keyboard: E (edit session), R (reset view)"}</p>
                </div>
            </div>
        }
    }
}
