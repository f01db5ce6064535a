//! Render batch assembly.
//!
//! One pass over the render queue produces one `RenderBatch`: the edit
//! scripts of every component that rendered during the pass, each paired
//! with the frame array those edits index into, plus the ids of components
//! disposed during the pass. Batch ids are strictly increasing over the
//! lifetime of the assembler, including batches that were abandoned after
//! a failed pass.

use crate::diff::Edit;
use crate::tree::FrameArray;
use crate::types::{BatchId, ComponentId};

/// Everything the display side needs to apply one render pass atomically.
#[derive(Debug, Clone)]
pub struct RenderBatch {
    pub id: BatchId,
    /// Per-component edit scripts, in the order the components rendered.
    pub updates: Vec<ComponentEdits>,
    /// Components whose state the display side should forget.
    pub disposed: Vec<ComponentId>,
}

/// Edit script for a single component within a batch.
///
/// `frames` is the component's current frame array. Every `frame_index`
/// in `edits` points into it.
#[derive(Debug, Clone)]
pub struct ComponentEdits {
    pub component_id: ComponentId,
    pub edits: Vec<Edit>,
    pub frames: FrameArray,
}

/// Accumulates one in-flight batch at a time.
#[derive(Debug, Default)]
pub struct RenderBatchAssembler {
    next_id: u64,
    open: Option<RenderBatch>,
}

impl RenderBatchAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new batch and returns its id.
    pub fn begin_batch(&mut self) -> BatchId {
        debug_assert!(self.open.is_none(), "previous batch neither completed nor abandoned");
        let id = BatchId(self.next_id);
        self.next_id += 1;
        self.open = Some(RenderBatch { id, updates: Vec::new(), disposed: Vec::new() });
        id
    }

    /// Records one component's output. A component that rendered without
    /// producing edits still gets an entry, so the display side always sees
    /// which components participated.
    pub fn add_component_edits(
        &mut self,
        component_id: ComponentId,
        edits: Vec<Edit>,
        frames: FrameArray,
    ) {
        debug_assert!(self.open.is_some(), "no open batch");
        if let Some(batch) = self.open.as_mut() {
            batch.updates.push(ComponentEdits { component_id, edits, frames });
        }
    }

    pub fn add_disposal(&mut self, component_id: ComponentId) {
        debug_assert!(self.open.is_some(), "no open batch");
        if let Some(batch) = self.open.as_mut() {
            batch.disposed.push(component_id);
        }
    }

    /// Finishes the open batch, or `None` when no batch is open.
    pub fn complete(&mut self) -> Option<RenderBatch> {
        self.open.take()
    }

    /// Drops the open batch. Its id is not reused.
    pub fn abandon(&mut self) {
        self.open = None;
    }
}
