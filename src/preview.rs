//! Hover preview controller.
//!
//! ## Visibility
//!
//! ```text
//! Hidden --on_hover_start--> Loading --apply(Ok, current)--> Visible
//! Loading --on_hover_end / apply(Err, current)--> Hidden
//! Visible --on_hover_end / hover another id--> Hidden (then Loading)
//! ```
//!
//! ## Last hover wins
//!
//! Every hover start bumps a generation counter and stamps its load request
//! with it. An outcome is applied only if its generation is still the current
//! one, so a slow load for an item the pointer already left can never show up
//! over the item it is on now.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, PatternId};
use crate::loader::{LoadOutcome, LoadRequest, ResourceLoadError};
use crate::placement::{PanelGeometry, PlacementRect, Point, Size, place};

/// What the hover panel shows. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewData {
    pub id: PatternId,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub code_preview: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Loading,
    Visible,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PointerState {
    pub position: Point,
    pub hovered: Option<PatternId>,
}

pub struct HoverPreviewController {
    geometry: PanelGeometry,
    viewport: Size,
    pointer: PointerState,
    generation: u64,
    visibility: Visibility,
    preview: Option<PreviewData>,
    placement: Option<PlacementRect>,
}

impl HoverPreviewController {
    pub fn new(geometry: PanelGeometry, viewport: Size) -> Self {
        Self {
            geometry,
            viewport,
            pointer: PointerState::default(),
            generation: 0,
            visibility: Visibility::Hidden,
            preview: None,
            placement: None,
        }
    }

    /// Start hovering `id`. Returns the preview load to run, or `None` when
    /// `id` is already the hovered item.
    pub fn on_hover_start(&mut self, id: &PatternId) -> Option<LoadRequest> {
        if self.pointer.hovered.as_ref() == Some(id) && self.visibility != Visibility::Hidden {
            return None;
        }
        self.generation += 1;
        self.pointer.hovered = Some(id.clone());
        self.visibility = Visibility::Loading;
        self.preview = None;
        self.placement = None;
        debug!("preview: hover start {id} (generation {})", self.generation);
        Some(LoadRequest::Preview {
            id: id.clone(),
            generation: self.generation,
        })
    }

    /// Hide immediately. Any load still in flight becomes stale.
    pub fn on_hover_end(&mut self) {
        if let Some(id) = self.pointer.hovered.take() {
            debug!("preview: hover end {id}");
        }
        self.generation += 1;
        self.visibility = Visibility::Hidden;
        self.preview = None;
        self.placement = None;
    }

    pub fn on_pointer_move(&mut self, x: i32, y: i32) {
        self.pointer.position = Point::new(x, y);
        if self.visibility == Visibility::Visible {
            self.placement = Some(self.compute_placement());
        }
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        if self.visibility == Visibility::Visible {
            self.placement = Some(self.compute_placement());
        }
    }

    /// Apply a finished preview load. Returns true when what is displayed
    /// changed; stale and non-preview outcomes are ignored.
    pub fn apply(&mut self, outcome: LoadOutcome) -> bool {
        let LoadOutcome::Preview { id, generation, result } = outcome else {
            return false;
        };
        self.apply_preview(&id, generation, result)
    }

    pub fn apply_preview(
        &mut self,
        id: &PatternId,
        generation: u64,
        result: Result<PreviewData, ResourceLoadError>,
    ) -> bool {
        if !self.is_current(id, generation) {
            debug!(
                "preview: dropping stale result for {id} (generation {generation}, current {})",
                self.generation
            );
            return false;
        }
        match result {
            Ok(data) => {
                debug!("preview: showing {id}");
                self.preview = Some(data);
                self.visibility = Visibility::Visible;
                self.placement = Some(self.compute_placement());
            }
            Err(e) => {
                warn!("preview: {e}");
                self.visibility = Visibility::Hidden;
                self.preview = None;
                self.placement = None;
            }
        }
        true
    }

    fn is_current(&self, id: &PatternId, generation: u64) -> bool {
        generation == self.generation
            && self.visibility == Visibility::Loading
            && self.pointer.hovered.as_ref() == Some(id)
    }

    fn compute_placement(&self) -> PlacementRect {
        place(self.pointer.position, self.viewport, &self.geometry)
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn preview(&self) -> Option<&PreviewData> {
        self.preview.as_ref()
    }

    pub fn placement(&self) -> Option<PlacementRect> {
        self.placement
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn hovered(&self) -> Option<&PatternId> {
        self.pointer.hovered.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }
}
