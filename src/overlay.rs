// src/overlay.rs
//
// The overlay group owns every interactive shape rendered atop the facsimile
// image. Interaction styling is driven by an explicit per-handle state
// machine instead of document-wide element queries, so other components on
// the page are never touched.

use crate::annotation::AnnotationRecord;
use crate::region_codec::{self, MalformedRegion, Projector, Shape};

/// Interaction state of one rendered shape.
///
/// `Idle` shapes are invisible until hovered; an edit session makes every
/// shape visible and disarms hover so the drawing tool gets the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Hovered,
    Editing,
}

/// Presentation derived from the interaction state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub opacity: f64,
    pub cursor: &'static str,
    pub hover_armed: bool,
}

impl InteractionState {
    pub fn style(&self) -> ShapeStyle {
        match self {
            InteractionState::Idle => ShapeStyle {
                opacity: 0.0,
                cursor: "pointer",
                hover_armed: true,
            },
            InteractionState::Hovered => ShapeStyle {
                opacity: 100.0,
                cursor: "pointer",
                hover_armed: true,
            },
            InteractionState::Editing => ShapeStyle {
                opacity: 100.0,
                cursor: "pointer",
                hover_armed: false,
            },
        }
    }
}

/// One shape owned by the overlay: projected geometry, bound tooltip and its
/// current interaction state.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeHandle {
    pub shape: Shape,
    pub state: InteractionState,
}

impl ShapeHandle {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            state: InteractionState::Idle,
        }
    }

    pub fn style(&self) -> ShapeStyle {
        self.state.style()
    }
}

/// Outcome of rendering one batch of records onto the overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub rendered: usize,
    /// Region type tags this client does not know about, skipped with a
    /// warning.
    pub skipped_unknown: Vec<String>,
    /// Records whose coordinate list did not match their kind.
    pub malformed: Vec<MalformedRegion>,
}

/// Collection of interactive shapes rendered atop the base image.
#[derive(Debug, Default)]
pub struct OverlayGroup {
    handles: Vec<ShapeHandle>,
    editing: bool,
}

impl OverlayGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handles(&self) -> &[ShapeHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Decode a batch of records and add the resulting shapes, in record
    /// order. Unknown region kinds and malformed records are reported and
    /// skipped; the rest of the batch still renders.
    pub fn render_records(
        &mut self,
        records: &[AnnotationRecord],
        projector: &dyn Projector,
    ) -> RenderReport {
        let mut report = RenderReport::default();
        for record in records {
            match region_codec::decode(record, projector) {
                Ok(Some(shape)) => {
                    self.add_shape(shape);
                    report.rendered += 1;
                }
                Ok(None) => {
                    log::warn!(
                        "skipping annotation with unknown region type \"{}\"",
                        record.region.kind
                    );
                    report.skipped_unknown.push(record.region.kind.clone());
                }
                Err(err) => {
                    log::warn!("skipping annotation: {}", err);
                    report.malformed.push(err);
                }
            }
        }
        report
    }

    /// Add a single shape (e.g. freshly drawn). New shapes pick up the
    /// group-wide edit state.
    pub fn add_shape(&mut self, shape: Shape) {
        let mut handle = ShapeHandle::new(shape);
        if self.editing {
            handle.state = InteractionState::Editing;
        }
        self.handles.push(handle);
    }

    /// Encode every shape back into persisted records, in insertion order.
    pub fn to_records(&self) -> Vec<AnnotationRecord> {
        region_codec::encode(self.handles.iter().map(|h| &h.shape))
    }

    /// Entering a draw/edit session makes every shape visible and disarms
    /// hover, group-wide.
    pub fn begin_edit_session(&mut self) {
        self.editing = true;
        for handle in &mut self.handles {
            handle.state = InteractionState::Editing;
        }
    }

    /// Leaving the session returns every shape to the idle hover-armed style.
    pub fn end_edit_session(&mut self) {
        self.editing = false;
        for handle in &mut self.handles {
            handle.state = InteractionState::Idle;
        }
    }

    pub fn pointer_enter(&mut self, index: usize) {
        if let Some(handle) = self.handles.get_mut(index) {
            if handle.state == InteractionState::Idle {
                handle.state = InteractionState::Hovered;
            }
        }
    }

    pub fn pointer_leave(&mut self, index: usize) {
        if let Some(handle) = self.handles.get_mut(index) {
            if handle.state == InteractionState::Hovered {
                handle.state = InteractionState::Idle;
            }
        }
    }

    /// Drop every shape; their rendered lifetime ends with the group.
    pub fn clear(&mut self) {
        self.handles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationRecord, Region};
    use crate::region_codec::{ImagePoint, MapPoint};

    struct Identity;

    impl Projector for Identity {
        fn project(&self, p: ImagePoint, _zoom: u8) -> MapPoint {
            MapPoint::new(p.x, p.y)
        }

        fn unproject(&self, p: MapPoint, _zoom: u8) -> ImagePoint {
            ImagePoint::new(p.x, p.y)
        }
    }

    fn record(kind: &str, coords: &str) -> AnnotationRecord {
        AnnotationRecord {
            region: Region {
                kind: kind.to_string(),
                coords: coords.to_string(),
            },
            content: String::new(),
        }
    }

    fn three_shapes() -> OverlayGroup {
        let mut group = OverlayGroup::new();
        let records = vec![
            record("rect", "0,0,10,10"),
            record("circle", "5,5,3"),
            record("polygon", "0,0,4,0,4,4"),
        ];
        let report = group.render_records(&records, &Identity);
        assert_eq!(report.rendered, 3);
        group
    }

    #[test]
    fn test_render_batch_skips_unknown_and_malformed() {
        let mut group = OverlayGroup::new();
        let records = vec![
            record("rect", "0,0,10,10"),
            record("star", "1,2,3"),
            record("circle", "5,5"),
            record("polygon", "0,0,4,0,4,4"),
        ];
        let report = group.render_records(&records, &Identity);
        assert_eq!(report.rendered, 2);
        assert_eq!(report.skipped_unknown, vec!["star".to_string()]);
        assert_eq!(report.malformed.len(), 1);
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_idle_style_is_invisible_and_armed() {
        let group = three_shapes();
        for handle in group.handles() {
            let style = handle.style();
            assert_eq!(style.opacity, 0.0);
            assert_eq!(style.cursor, "pointer");
            assert!(style.hover_armed);
        }
    }

    #[test]
    fn test_edit_session_is_group_wide() {
        let mut group = three_shapes();
        group.pointer_enter(1); // a hovered shape joins the session too

        group.begin_edit_session();
        for handle in group.handles() {
            let style = handle.style();
            assert_eq!(style.opacity, 100.0);
            assert!(!style.hover_armed);
        }

        group.end_edit_session();
        for handle in group.handles() {
            let style = handle.style();
            assert_eq!(style.opacity, 0.0);
            assert!(style.hover_armed);
        }
    }

    #[test]
    fn test_hover_transitions() {
        let mut group = three_shapes();
        group.pointer_enter(0);
        assert_eq!(group.handles()[0].state, InteractionState::Hovered);
        assert_eq!(group.handles()[1].state, InteractionState::Idle);

        group.pointer_leave(0);
        assert_eq!(group.handles()[0].state, InteractionState::Idle);
    }

    #[test]
    fn test_hover_disarmed_while_editing() {
        let mut group = three_shapes();
        group.begin_edit_session();
        group.pointer_enter(0);
        group.pointer_leave(0);
        assert_eq!(group.handles()[0].state, InteractionState::Editing);
    }

    #[test]
    fn test_shape_added_during_edit_session_is_editing() {
        let mut group = three_shapes();
        group.begin_edit_session();
        let records = vec![record("rect", "1,1,2,2")];
        group.render_records(&records, &Identity);
        assert_eq!(group.handles()[3].state, InteractionState::Editing);
    }

    #[test]
    fn test_to_records_keeps_insertion_order() {
        let group = three_shapes();
        let records = group.to_records();
        assert_eq!(records[0].region.kind, "rect");
        assert_eq!(records[1].region.kind, "circle");
        assert_eq!(records[2].region.kind, "polygon");
        assert_eq!(records[2].region.coords, "0,0,4,0,4,4");
    }

    #[test]
    fn test_clear_drops_handles() {
        let mut group = three_shapes();
        group.clear();
        assert!(group.is_empty());
    }
}
