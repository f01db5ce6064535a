//! Edit instructions - the mutation protocol a batch carries.
//!
//! Edits are positional, not path-based: the display side walks its own
//! materialized tree in lockstep with a cursor. `StepIn`/`StepOut` move the
//! cursor between levels, and every other edit addresses a sibling slot under
//! the cursor's current parent. This keeps batches compact because a deep
//! subtree never repeats its full path.
//!
//! # Cursor protocol
//!
//! - Edits apply strictly in array order.
//! - `StepIn { sibling_index }` enters the element at that slot; `StepOut`
//!   returns to the parent. The engine emits them lazily, so an unchanged
//!   subtree contributes no cursor movement at all.
//! - `frame_index` fields point into the new frame array shipped alongside
//!   the edits in the same batch.
//! - A permutation list (`PermutationListEntry* PermutationListEnd`) reorders
//!   already-present keyed children before subsequent edits address them.
//! - Inserting a frame whose subtree contains region frames materializes the
//!   regions transparently: they contribute their children and no node.

use serde::{Deserialize, Serialize};

/// One DOM-applicable mutation instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Edit {
    /// Materialize the subtree rooted at `frame_index` at `sibling_index`,
    /// shifting later siblings right.
    InsertFrame { sibling_index: u32, frame_index: u32 },

    /// Remove the node at `sibling_index`, shifting later siblings left.
    RemoveFrame { sibling_index: u32 },

    /// Set or overwrite one attribute on the element at `sibling_index`;
    /// name and value come from the attribute frame at `frame_index`.
    SetAttribute { sibling_index: u32, frame_index: u32 },

    /// Remove the named attribute from the element at `sibling_index`.
    RemoveAttribute { sibling_index: u32, name: String },

    /// Replace the text content of the text node at `sibling_index` with the
    /// content of the text frame at `frame_index`.
    UpdateText { sibling_index: u32, frame_index: u32 },

    /// Move the cursor into the element at `sibling_index`.
    StepIn { sibling_index: u32 },

    /// Move the cursor back to the parent.
    StepOut,

    /// One move in a keyed reordering of the current parent's children.
    PermutationListEntry {
        from_sibling_index: u32,
        to_sibling_index: u32,
    },

    /// Terminates a run of permutation entries; the display side applies the
    /// accumulated moves as one reordering.
    PermutationListEnd,
}
