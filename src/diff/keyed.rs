//! Sequence-keyed fallback matching for out-of-order child lists.
//!
//! The positional walk in [`super::engine`] covers sibling lists whose
//! sequence numbers are strictly increasing on both sides - the output of a
//! single authoring path. Loops and keyed reordering break that monotonicity;
//! this module matches such lists by sequence *value* so that a moved child
//! becomes a permutation instead of a remove + insert pair.
//!
//! # Matching rules
//!
//! - Children pair up by sequence value. Ties (duplicate sequences, as loop
//!   bodies produce) break by stable position order: the n-th occurrence on
//!   the old side pairs with the n-th occurrence on the new side.
//! - Unmatched old children are removed first, unmatched new children are
//!   inserted during the final walk.
//! - If the matched pairs changed relative order, the move is expressed as a
//!   permutation list - but only when every matched entry occupies exactly
//!   one sibling slot. A moved region (multi-slot) degrades to a full
//!   remove + reinsert of the list, which is always correct, just not minimal.

use std::collections::HashMap;

use tracing::trace;

use crate::error::RenderResult;
use crate::diff::edit::Edit;
use crate::diff::engine::DiffContext;
use crate::types::Sequence;

impl DiffContext<'_> {
    pub(super) fn diff_children_keyed(
        &mut self,
        old_children: &[usize],
        new_children: &[usize],
        sibling: &mut u32,
    ) -> RenderResult<()> {
        let base = *sibling;

        // Pair new children with old ones by sequence value, ties broken by
        // position order.
        let mut occurrences: HashMap<Sequence, Vec<usize>> = HashMap::new();
        for (pos, &frame_index) in old_children.iter().enumerate().rev() {
            occurrences
                .entry(self.old.frames()[frame_index].sequence)
                .or_default()
                .push(pos);
        }
        let mut new_match: Vec<Option<usize>> = new_children
            .iter()
            .map(|&frame_index| {
                occurrences
                    .get_mut(&self.new.frames()[frame_index].sequence)
                    .and_then(Vec::pop)
            })
            .collect();

        let mut old_to_new: Vec<Option<usize>> = vec![None; old_children.len()];
        for (new_pos, matched) in new_match.iter().enumerate() {
            if let Some(old_pos) = matched {
                old_to_new[*old_pos] = Some(new_pos);
            }
        }

        // Decide between permutation and full replacement before any edit.
        let matched_new_order: Vec<usize> = old_to_new.iter().flatten().copied().collect();
        let order_changed = matched_new_order.windows(2).any(|w| w[0] > w[1]);
        let single_slot = old_to_new.iter().enumerate().all(|(pos, matched)| {
            matched.is_none_or(|new_pos| {
                self.old.sibling_span(old_children[pos]) == 1
                    && self.new.sibling_span(new_children[new_pos]) == 1
            })
        });
        if order_changed && !single_slot {
            trace!("keyed reorder involves multi-slot entries; replacing list");
            old_to_new.fill(None);
            new_match.fill(None);
        }

        // Remove unmatched old children, in old order, at indices adjusted
        // for the slots freed by earlier removals.
        let mut offset = 0;
        let mut removed = 0;
        for (pos, &frame_index) in old_children.iter().enumerate() {
            let span = self.old.sibling_span(frame_index) as u32;
            if old_to_new[pos].is_none() {
                self.remove_frame(frame_index, base + offset - removed);
                removed += span;
            }
            offset += span;
        }

        if order_changed && single_slot {
            // After removals the matched entries are contiguous single-slot
            // children; from/to are their ranks in old and new order.
            let mut to_rank: Vec<usize> = (0..matched_new_order.len()).collect();
            to_rank.sort_by_key(|&rank| matched_new_order[rank]);
            // to_rank inverse: matched old rank -> rank in new order.
            let mut rank_of = vec![0; to_rank.len()];
            for (new_rank, &old_rank) in to_rank.iter().enumerate() {
                rank_of[old_rank] = new_rank;
            }
            for (old_rank, &new_rank) in rank_of.iter().enumerate() {
                if old_rank != new_rank {
                    self.emit(Edit::PermutationListEntry {
                        from_sibling_index: base + old_rank as u32,
                        to_sibling_index: base + new_rank as u32,
                    });
                }
            }
            self.emit(Edit::PermutationListEnd);
        }

        // Final walk in new order: matched pairs diff in place (the display
        // side already reordered them), unmatched children are inserted.
        for (new_pos, &frame_index) in new_children.iter().enumerate() {
            match new_match[new_pos] {
                Some(old_pos) => self.diff_pair(old_children[old_pos], frame_index, sibling)?,
                None => self.insert_frame(frame_index, sibling),
            }
        }
        Ok(())
    }
}
