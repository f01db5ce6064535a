//! Diff engine - computes the minimal edit script between two frame arrays.
//!
//! The engine walks the old and the new array with twin cursors, comparing
//! sibling lists level by level:
//!
//! 1. Frames at the same position compare by kind first; a kind mismatch is
//!    always remove + insert, never a morph.
//! 2. When both sibling lists carry strictly increasing sequence numbers, a
//!    two-pointer walk resolves branches: a lower sequence on the new side
//!    means the new render entered a branch the old one skipped (insert), a
//!    lower sequence on the old side means the opposite (remove), and equal
//!    sequences diff in place.
//! 3. Otherwise the list came from loops or keyed reordering and the walk
//!    hands over to the sequence-keyed fallback in [`super::keyed`].
//!
//! Regions are transparent throughout: a matched region pair recurses with
//! the parent's running sibling counter, and inserting or removing a region
//! acts on its children, so region frames never appear in an edit.
//!
//! The engine itself performs no side effects. Component lifecycle work it
//! discovers (children to instantiate, retain or dispose) is reported as
//! [`DiffEffect`]s for the renderer to apply before the batch is published.

use std::ops::Range;

use tracing::trace;

use crate::diff::edit::Edit;
use crate::error::{RenderError, RenderResult};
use crate::tree::arena::FrameArray;
use crate::tree::frame::{AttributeValue, Frame, FrameContent, FrameKind};

/// Outcome of diffing one component's previous output against its new one.
#[derive(Debug, Default)]
pub struct DiffResult {
    /// Ordered edit script for the display side.
    pub edits: Vec<Edit>,
    /// Component lifecycle work for the renderer.
    pub effects: Vec<DiffEffect>,
}

/// Component lifecycle consequence discovered during a diff.
///
/// Frame indices point into the new array; the renderer binds component ids
/// into those frames while the array is still unshared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEffect {
    /// A component frame with no old counterpart: instantiate and attach.
    InitComponent { frame_index: usize },

    /// Same component type in both arrays: carry the instance over, and
    /// re-render it if its parameters changed.
    RetainComponent {
        id: crate::types::ComponentId,
        frame_index: usize,
        parameters_changed: bool,
    },

    /// The old subtree containing this component was removed.
    DisposeComponent { id: crate::types::ComponentId },
}

/// Compare `old` against `new` and produce the edit script and effects.
///
/// Structurally identical arrays yield an empty script. Both arrays are
/// checked against the subtree-length invariant first; a violation means a
/// builder bug and surfaces as `DiffInconsistencyError`.
pub fn diff(old: &FrameArray, new: &FrameArray) -> RenderResult<DiffResult> {
    old.validate()?;
    new.validate()?;

    let mut ctx = DiffContext {
        old,
        new,
        edits: Vec::new(),
        effects: Vec::new(),
        cursor: Vec::new(),
    };
    let mut sibling = 0;
    ctx.diff_children(0..old.len(), 0..new.len(), &mut sibling)?;
    debug_assert!(ctx.cursor.is_empty());
    trace!(
        edits = ctx.edits.len(),
        effects = ctx.effects.len(),
        "diff complete"
    );
    Ok(DiffResult {
        edits: ctx.edits,
        effects: ctx.effects,
    })
}

/// Shared state of one diff run. The keyed fallback in [`super::keyed`]
/// extends this type with the out-of-order matching path.
pub(super) struct DiffContext<'a> {
    pub(super) old: &'a FrameArray,
    pub(super) new: &'a FrameArray,
    pub(super) edits: Vec<Edit>,
    pub(super) effects: Vec<DiffEffect>,
    /// Lazy StepIn stack: a level only materializes cursor movement once a
    /// descendant edit exists, so unchanged subtrees cost nothing.
    cursor: Vec<CursorLevel>,
}

struct CursorLevel {
    sibling_index: u32,
    emitted: bool,
}

impl<'a> DiffContext<'a> {
    // =========================================================================
    // Sibling lists
    // =========================================================================

    /// Diff two sibling ranges. `sibling` is the running slot counter in the
    /// display-side parent; region recursion shares it with the caller.
    pub(super) fn diff_children(
        &mut self,
        old_range: Range<usize>,
        new_range: Range<usize>,
        sibling: &mut u32,
    ) -> RenderResult<()> {
        let old_children: Vec<usize> = self.old.child_indices(old_range).collect();
        let new_children: Vec<usize> = self.new.child_indices(new_range).collect();

        if !self.sequences_in_order(&old_children, &new_children) {
            return self.diff_children_keyed(&old_children, &new_children, sibling);
        }

        let (mut oi, mut ni) = (0, 0);
        while oi < old_children.len() && ni < new_children.len() {
            let o = old_children[oi];
            let n = new_children[ni];
            let old_seq = self.old.frames()[o].sequence;
            let new_seq = self.new.frames()[n].sequence;
            if old_seq == new_seq {
                self.diff_pair(o, n, sibling)?;
                oi += 1;
                ni += 1;
            } else if new_seq < old_seq {
                // New render took a branch the old output skipped.
                self.insert_frame(n, sibling);
                ni += 1;
            } else {
                // Old output came from a branch the new render skipped.
                self.remove_frame(o, *sibling);
                oi += 1;
            }
        }
        while ni < new_children.len() {
            self.insert_frame(new_children[ni], sibling);
            ni += 1;
        }
        while oi < old_children.len() {
            self.remove_frame(old_children[oi], *sibling);
            oi += 1;
        }
        Ok(())
    }

    fn sequences_in_order(&self, old_children: &[usize], new_children: &[usize]) -> bool {
        let increasing = |frames: &[Frame], children: &[usize]| {
            children
                .windows(2)
                .all(|w| frames[w[0]].sequence < frames[w[1]].sequence)
        };
        increasing(self.old.frames(), old_children)
            && increasing(self.new.frames(), new_children)
    }

    // =========================================================================
    // Same-sequence pairs
    // =========================================================================

    /// Diff a positionally matched pair. Advances `sibling` by the new
    /// frame's slot count.
    pub(super) fn diff_pair(
        &mut self,
        o: usize,
        n: usize,
        sibling: &mut u32,
    ) -> RenderResult<()> {
        let old_frame = &self.old.frames()[o];
        let new_frame = &self.new.frames()[n];

        if old_frame.kind() != new_frame.kind() {
            // Never morph one kind into another.
            self.remove_frame(o, *sibling);
            self.insert_frame(n, sibling);
            return Ok(());
        }

        match (&old_frame.content, &new_frame.content) {
            (
                FrameContent::Element { tag: old_tag, .. },
                FrameContent::Element { tag: new_tag, .. },
            ) => {
                if old_tag != new_tag {
                    self.remove_frame(o, *sibling);
                    self.insert_frame(n, sibling);
                    return Ok(());
                }
                self.diff_attributes(o, n, *sibling);
                self.cursor.push(CursorLevel {
                    sibling_index: *sibling,
                    emitted: false,
                });
                let mut child_sibling = 0;
                let result = self.diff_children(
                    self.old.content_range(o),
                    self.new.content_range(n),
                    &mut child_sibling,
                );
                let level = self.cursor.pop().filter(|level| level.emitted);
                if level.is_some() {
                    self.edits.push(Edit::StepOut);
                }
                result?;
                *sibling += 1;
            }
            (
                FrameContent::Text { text: old_text, .. },
                FrameContent::Text { text: new_text, .. },
            ) => {
                // Exact byte equality; a content change is always an update,
                // never a remove + insert.
                if old_text != new_text {
                    self.emit(Edit::UpdateText {
                        sibling_index: *sibling,
                        frame_index: n as u32,
                    });
                }
                *sibling += 1;
            }
            (
                FrameContent::Component { ty: old_ty, id, .. },
                FrameContent::Component { ty: new_ty, .. },
            ) => {
                if old_ty != new_ty {
                    self.remove_frame(o, *sibling);
                    self.insert_frame(n, sibling);
                    return Ok(());
                }
                let id = (*id).ok_or_else(|| {
                    RenderError::DiffInconsistency(format!(
                        "old component frame at {o} was never bound to an instance"
                    ))
                })?;
                let parameters_changed = !self.same_parameters(o, n);
                self.effects.push(DiffEffect::RetainComponent {
                    id,
                    frame_index: n,
                    parameters_changed,
                });
                *sibling += 1;
            }
            (FrameContent::Region { .. }, FrameContent::Region { .. }) => {
                // Transparent: children diff as if spliced into the parent's
                // sibling list, same counter, no cursor movement.
                self.diff_children(
                    self.old.subtree_range(o),
                    self.new.subtree_range(n),
                    sibling,
                )?;
            }
            _ => {
                return Err(RenderError::DiffInconsistency(format!(
                    "{:?} frame in a sibling position",
                    old_frame.kind()
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Name-set diff of two attribute regions. Only values that affect the
    /// DOM generate edits; object bags are carried, never rendered, and a
    /// value that stops affecting the DOM removes the attribute. Capture
    /// frames are identity-stable and skipped.
    fn diff_attributes(&mut self, o: usize, n: usize, element_sibling: u32) {
        let old_attrs = self.attribute_entries(self.old, o);
        let new_attrs = self.attribute_entries(self.new, n);

        // Fast path: same names in the same order (the overwhelmingly common
        // case, since authoring code emits attributes in declaration order).
        let same_names = old_attrs.len() == new_attrs.len()
            && old_attrs
                .iter()
                .zip(&new_attrs)
                .all(|(&a, &b)| self.attr_name(self.old, a) == self.attr_name(self.new, b));

        if same_names {
            for (&oa, &na) in old_attrs.iter().zip(&new_attrs) {
                let old_value = self.attr_value(self.old, oa);
                let new_value = self.attr_value(self.new, na);
                if old_value.same_rendered_value(new_value) {
                    continue;
                }
                if new_value.affects_dom() {
                    self.emit(Edit::SetAttribute {
                        sibling_index: element_sibling,
                        frame_index: na as u32,
                    });
                } else if old_value.affects_dom() {
                    // The rendered value went away even though the name stayed.
                    self.emit(Edit::RemoveAttribute {
                        sibling_index: element_sibling,
                        name: self.attr_name(self.new, na).to_owned(),
                    });
                }
            }
            return;
        }

        // Slow path: match by name.
        let mut unmatched_old: Vec<usize> = old_attrs;
        for &na in &new_attrs {
            let name = self.attr_name(self.new, na);
            let new_value = self.attr_value(self.new, na);
            match unmatched_old
                .iter()
                .position(|&oa| self.attr_name(self.old, oa) == name)
            {
                Some(pos) => {
                    let oa = unmatched_old.swap_remove(pos);
                    let old_value = self.attr_value(self.old, oa);
                    if old_value.same_rendered_value(new_value) {
                        continue;
                    }
                    if new_value.affects_dom() {
                        self.emit(Edit::SetAttribute {
                            sibling_index: element_sibling,
                            frame_index: na as u32,
                        });
                    } else if old_value.affects_dom() {
                        self.emit(Edit::RemoveAttribute {
                            sibling_index: element_sibling,
                            name: name.to_owned(),
                        });
                    }
                }
                None => {
                    if new_value.affects_dom() {
                        self.emit(Edit::SetAttribute {
                            sibling_index: element_sibling,
                            frame_index: na as u32,
                        });
                    }
                }
            }
        }
        for oa in unmatched_old {
            if self.attr_value(self.old, oa).affects_dom() {
                self.emit(Edit::RemoveAttribute {
                    sibling_index: element_sibling,
                    name: self.attr_name(self.old, oa).to_owned(),
                });
            }
        }
    }

    /// Component parameter comparison: text/bool/object by value, handlers
    /// always unequal (a fresh closure may capture fresh state).
    fn same_parameters(&self, o: usize, n: usize) -> bool {
        let old_attrs = self.attribute_entries(self.old, o);
        let new_attrs = self.attribute_entries(self.new, n);
        old_attrs.len() == new_attrs.len()
            && old_attrs.iter().zip(&new_attrs).all(|(&oa, &na)| {
                self.attr_name(self.old, oa) == self.attr_name(self.new, na)
                    && self
                        .attr_value(self.old, oa)
                        .same_parameter_value(self.attr_value(self.new, na))
            })
    }

    fn attribute_entries(&self, arr: &'a FrameArray, container: usize) -> Vec<usize> {
        arr.attribute_range(container)
            .filter(|&i| arr.frames()[i].kind() == FrameKind::Attribute)
            .collect()
    }

    fn attr_name(&self, arr: &'a FrameArray, index: usize) -> &'a str {
        match &arr.frames()[index].content {
            FrameContent::Attribute { name, .. } => name,
            _ => unreachable!("attribute_entries only yields attribute frames"),
        }
    }

    fn attr_value(&self, arr: &'a FrameArray, index: usize) -> &'a AttributeValue {
        match &arr.frames()[index].content {
            FrameContent::Attribute { value, .. } => value,
            _ => unreachable!("attribute_entries only yields attribute frames"),
        }
    }

    // =========================================================================
    // Pure inserts / removes
    // =========================================================================

    /// Insert the frame at new index `n` at the current slot, advancing
    /// `sibling` by its slot count. Regions insert their children instead of
    /// themselves.
    pub(super) fn insert_frame(&mut self, n: usize, sibling: &mut u32) {
        match &self.new.frames()[n].content {
            FrameContent::Region { .. } => {
                let children: Vec<usize> =
                    self.new.child_indices(self.new.subtree_range(n)).collect();
                for child in children {
                    self.insert_frame(child, sibling);
                }
            }
            _ => {
                self.emit(Edit::InsertFrame {
                    sibling_index: *sibling,
                    frame_index: n as u32,
                });
                // Component frames anywhere in the inserted subtree (self
                // included) need instances before the batch ships.
                let subtree = n..n + self.new.frames()[n].span();
                for i in subtree {
                    if matches!(self.new.frames()[i].content, FrameContent::Component { .. }) {
                        self.effects.push(DiffEffect::InitComponent { frame_index: i });
                    }
                }
                *sibling += 1;
            }
        }
    }

    /// Remove the old frame at index `o` from the current slot. Removals do
    /// not advance the counter: the next sibling shifts into the same slot.
    pub(super) fn remove_frame(&mut self, o: usize, sibling: u32) {
        match &self.old.frames()[o].content {
            FrameContent::Region { .. } => {
                let children: Vec<usize> =
                    self.old.child_indices(self.old.subtree_range(o)).collect();
                for child in children {
                    self.remove_frame(child, sibling);
                }
            }
            _ => {
                self.emit(Edit::RemoveFrame {
                    sibling_index: sibling,
                });
                // Disposal cascades to every component in the removed subtree.
                let subtree = o..o + self.old.frames()[o].span();
                for i in subtree {
                    if let FrameContent::Component { id: Some(id), .. } =
                        &self.old.frames()[i].content
                    {
                        self.effects.push(DiffEffect::DisposeComponent { id: *id });
                    }
                }
            }
        }
    }

    // =========================================================================
    // Edit emission
    // =========================================================================

    /// Append an edit, materializing any pending StepIn levels first.
    pub(super) fn emit(&mut self, edit: Edit) {
        for level in &mut self.cursor {
            if !level.emitted {
                self.edits.push(Edit::StepIn {
                    sibling_index: level.sibling_index,
                });
                level.emitted = true;
            }
        }
        self.edits.push(edit);
    }
}
