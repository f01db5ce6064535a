//! Frame array - flat arena storage for one render output.
//!
//! A [`FrameArray`] is an immutable snapshot of a component's render output:
//! a depth-first preorder sequence of frames in which every container frame
//! carries a subtree length. No parent or child pointers exist anywhere;
//! navigation is pure index arithmetic over spans.
//!
//! # Structural invariant
//!
//! For a container frame at index `i` with subtree length `L`, the frames at
//! `i+1 ..= i+L` are exactly its descendants: ranges nest, never dangle and
//! never overlap. Attribute frames appear only in the attribute region
//! immediately after their owning container, and attribute frames have no
//! children. [`FrameArray::validate`] checks all of this and is the assertion
//! behind `DiffInconsistencyError`.

use std::ops::Range;
use std::rc::Rc;

use crate::error::{RenderError, RenderResult};
use crate::tree::frame::{Frame, FrameContent, FrameKind};

/// Immutable snapshot of one render output. Cheap to clone (shared storage).
#[derive(Debug, Clone, Default)]
pub struct FrameArray {
    frames: Rc<Vec<Frame>>,
}

impl FrameArray {
    /// The empty array: what every component diffs against on first render.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames: Rc::new(frames),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Index range of the container's descendants (attribute region included).
    pub fn subtree_range(&self, index: usize) -> Range<usize> {
        let end = index + self.frames[index].span();
        index + 1..end
    }

    /// Index range of the attribute region directly after a container frame.
    pub fn attribute_range(&self, container: usize) -> Range<usize> {
        let subtree = self.subtree_range(container);
        let mut i = subtree.start;
        while i < subtree.end && self.frames[i].is_attribute_region() {
            i += 1;
        }
        subtree.start..i
    }

    /// Index range of the container's child content, attribute region skipped.
    pub fn content_range(&self, container: usize) -> Range<usize> {
        let subtree = self.subtree_range(container);
        self.attribute_range(container).end..subtree.end
    }

    /// Top-level frame indices within a sibling range, stepping over subtrees.
    pub fn child_indices(&self, range: Range<usize>) -> ChildIndices<'_> {
        ChildIndices {
            frames: &self.frames,
            next: range.start,
            end: range.end,
        }
    }

    /// Sibling slots the frame at `index` occupies in its parent's child list.
    ///
    /// Elements, text and components each occupy one slot. A region is
    /// transparent: its slot count is the sum over its children, recursively.
    pub fn sibling_span(&self, index: usize) -> usize {
        match &self.frames[index].content {
            FrameContent::Region { .. } => {
                let range = self.subtree_range(index);
                self.child_indices(range).map(|i| self.sibling_span(i)).sum()
            }
            _ => 1,
        }
    }

    /// Mutable access while the snapshot is still unshared. The renderer uses
    /// this window to bind component ids before the array is published into a
    /// batch.
    pub(crate) fn frames_mut(&mut self) -> Option<&mut [Frame]> {
        Rc::get_mut(&mut self.frames).map(|v| v.as_mut_slice())
    }

    /// Check the structural invariant over the whole array.
    pub fn validate(&self) -> RenderResult<()> {
        self.validate_siblings(0..self.frames.len())
    }

    fn validate_siblings(&self, range: Range<usize>) -> RenderResult<()> {
        let mut i = range.start;
        while i < range.end {
            let frame = &self.frames[i];
            let end = i + frame.span();
            if end > range.end {
                return Err(RenderError::DiffInconsistency(format!(
                    "subtree at {i} (len {}) overruns its parent range {range:?}",
                    frame.subtree_len(),
                )));
            }
            match frame.kind() {
                FrameKind::Attribute | FrameKind::ElementReferenceCapture => {
                    return Err(RenderError::DiffInconsistency(format!(
                        "attribute frame at {i} outside any attribute region"
                    )));
                }
                FrameKind::Element | FrameKind::Component => {
                    let content = self.content_range(i);
                    self.validate_siblings(content)?;
                }
                FrameKind::Region => {
                    // Regions own no attribute region.
                    self.validate_siblings(self.subtree_range(i))?;
                }
                FrameKind::Text => {}
            }
            i = end;
        }
        Ok(())
    }
}

/// Iterator over top-level sibling indices in a range.
pub struct ChildIndices<'a> {
    frames: &'a [Frame],
    next: usize,
    end: usize,
}

impl Iterator for ChildIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += self.frames[index].span();
        Some(index)
    }
}
