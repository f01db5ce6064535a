//! Tree diffing.
//!
//! Compares a component's previous frame array against its freshly built one
//! and emits the ordered edit script plus component lifecycle effects:
//!
//! ```text
//! old FrameArray ─┐
//!                 ├─ diff() ──► edits (wire) + effects (renderer)
//! new FrameArray ─┘
//! ```
//!
//! - [`edit`] - the positional, cursor-based mutation protocol
//! - [`engine`] - twin-cursor walk over sibling lists
//! - [`keyed`] - sequence-keyed fallback with permutation output

pub mod edit;
pub mod engine;
mod keyed;

pub use edit::Edit;
pub use engine::{diff, DiffEffect, DiffResult};

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::{RenderError, RenderResult};
    use crate::renderer::{Component, RenderTreeBuilder};
    use crate::tree::arena::FrameArray;
    use crate::tree::frame::{EventHandler, Frame, FrameContent};
    use crate::types::ComponentId;

    #[derive(Default)]
    struct Widget;
    #[derive(Default)]
    struct OtherWidget;

    impl Component for Widget {
        fn build_render_tree(&mut self, _tree: &mut RenderTreeBuilder) -> RenderResult<()> {
            Ok(())
        }
    }
    impl Component for OtherWidget {
        fn build_render_tree(&mut self, _tree: &mut RenderTreeBuilder) -> RenderResult<()> {
            Ok(())
        }
    }

    fn build(f: impl FnOnce(&mut RenderTreeBuilder)) -> FrameArray {
        let mut builder = RenderTreeBuilder::new();
        f(&mut builder);
        builder.finish().unwrap()
    }

    /// Bind sequential component ids starting at `first`, the way the
    /// renderer does before publishing an array.
    fn bind_ids(arr: &mut FrameArray, first: u32) {
        let mut next = first;
        for frame in arr.frames_mut().expect("unshared") {
            if let FrameContent::Component { id, .. } = &mut frame.content {
                *id = Some(ComponentId(next));
                next += 1;
            }
        }
    }

    #[test]
    fn test_identical_trees_yield_no_edits() {
        let tree = |b: &mut RenderTreeBuilder| {
            b.open_element(0, "div");
            b.add_attribute(1, "class", "panel").unwrap();
            b.open_element(2, "span");
            b.add_content(3, "hi");
            b.close_element().unwrap();
            b.add_content(4, "tail");
            b.close_element().unwrap();
        };
        let result = diff(&build(tree), &build(tree)).unwrap();
        assert_eq!(result.edits, vec![]);
        assert_eq!(result.effects, vec![]);
    }

    #[test]
    fn test_empty_old_yields_inserts_in_order() {
        let new = build(|b| {
            b.open_element(0, "div");
            b.close_element().unwrap();
            b.add_content(1, "x");
            b.open_element(2, "p");
            b.close_element().unwrap();
        });
        let result = diff(&FrameArray::empty(), &new).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::InsertFrame { sibling_index: 0, frame_index: 0 },
                Edit::InsertFrame { sibling_index: 1, frame_index: 1 },
                Edit::InsertFrame { sibling_index: 2, frame_index: 2 },
            ]
        );
    }

    #[test]
    fn test_root_text_change_is_single_update() {
        let old = build(|b| b.add_content(0, "hi"));
        let new = build(|b| b.add_content(0, "bye"));
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![Edit::UpdateText { sibling_index: 0, frame_index: 0 }]
        );
    }

    #[test]
    fn test_nested_text_change_updates_under_cursor() {
        // div > "hi"  →  div > "bye"
        let old = build(|b| {
            b.open_element(0, "div");
            b.add_content(1, "hi");
            b.close_element().unwrap();
        });
        let new = build(|b| {
            b.open_element(0, "div");
            b.add_content(1, "bye");
            b.close_element().unwrap();
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::StepIn { sibling_index: 0 },
                Edit::UpdateText { sibling_index: 0, frame_index: 1 },
                Edit::StepOut,
            ]
        );
    }

    #[test]
    fn test_unchanged_subtree_moves_no_cursor() {
        // Only the second top-level element changes; the first contributes
        // neither edits nor cursor movement.
        let old = build(|b| {
            b.open_element(0, "div");
            b.add_content(1, "stable");
            b.close_element().unwrap();
            b.open_element(2, "div");
            b.add_content(3, "old");
            b.close_element().unwrap();
        });
        let new = build(|b| {
            b.open_element(0, "div");
            b.add_content(1, "stable");
            b.close_element().unwrap();
            b.open_element(2, "div");
            b.add_content(3, "new");
            b.close_element().unwrap();
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::StepIn { sibling_index: 1 },
                Edit::UpdateText { sibling_index: 0, frame_index: 3 },
                Edit::StepOut,
            ]
        );
    }

    #[test]
    fn test_kind_mismatch_is_remove_insert() {
        let old = build(|b| {
            b.open_element(0, "div");
            b.close_element().unwrap();
        });
        let new = build(|b| b.add_content(0, "now text"));
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::RemoveFrame { sibling_index: 0 },
                Edit::InsertFrame { sibling_index: 0, frame_index: 0 },
            ]
        );
    }

    #[test]
    fn test_tag_change_is_remove_insert() {
        let old = build(|b| {
            b.open_element(0, "div");
            b.close_element().unwrap();
        });
        let new = build(|b| {
            b.open_element(0, "section");
            b.close_element().unwrap();
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::RemoveFrame { sibling_index: 0 },
                Edit::InsertFrame { sibling_index: 0, frame_index: 0 },
            ]
        );
    }

    #[test]
    fn test_attribute_set_and_remove() {
        let old = build(|b| {
            b.open_element(0, "input");
            b.add_attribute(1, "class", "a").unwrap();
            b.add_attribute(2, "disabled", true).unwrap();
            b.close_element().unwrap();
        });
        let new = build(|b| {
            b.open_element(0, "input");
            b.add_attribute(1, "class", "b").unwrap();
            b.add_attribute(3, "placeholder", "type here").unwrap();
            b.close_element().unwrap();
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::SetAttribute { sibling_index: 0, frame_index: 1 },
                Edit::SetAttribute { sibling_index: 0, frame_index: 2 },
                Edit::RemoveAttribute { sibling_index: 0, name: "disabled".into() },
            ]
        );
    }

    #[test]
    fn test_object_bag_attribute_never_reaches_the_dom() {
        let old = build(|b| {
            b.open_element(0, "div");
            b.add_attribute(1, "data-bag", serde_json::json!({ "n": 1 }))
                .unwrap();
            b.close_element().unwrap();
        });
        let new = build(|b| {
            b.open_element(0, "div");
            b.add_attribute(1, "data-bag", serde_json::json!({ "n": 2 }))
                .unwrap();
            b.close_element().unwrap();
        });
        assert_eq!(diff(&old, &new).unwrap().edits, vec![]);
    }

    #[test]
    fn test_attribute_leaving_the_dom_is_removed() {
        // Same name, but the value changes from rendered text to an object
        // bag: the stale DOM attribute must be removed, not kept.
        let rendered = build(|b| {
            b.open_element(0, "div");
            b.add_attribute(1, "data-x", "visible").unwrap();
            b.close_element().unwrap();
        });
        let carried = build(|b| {
            b.open_element(0, "div");
            b.add_attribute(1, "data-x", serde_json::json!({ "n": 1 })).unwrap();
            b.close_element().unwrap();
        });
        assert_eq!(
            diff(&rendered, &carried).unwrap().edits,
            vec![Edit::RemoveAttribute { sibling_index: 0, name: "data-x".into() }]
        );
        // The reverse direction materializes the attribute again.
        assert_eq!(
            diff(&carried, &rendered).unwrap().edits,
            vec![Edit::SetAttribute { sibling_index: 0, frame_index: 1 }]
        );
    }

    #[test]
    fn test_fresh_handler_closures_do_not_dirty() {
        let tree = |b: &mut RenderTreeBuilder| {
            b.open_element(0, "button");
            b.add_attribute(1, "onclick", EventHandler::new(|_| {})).unwrap();
            b.close_element().unwrap();
        };
        assert_eq!(diff(&build(tree), &build(tree)).unwrap().edits, vec![]);
    }

    #[test]
    fn test_branch_entry_inserts_in_the_middle() {
        // Old render skipped the seq-1 branch; new render takes it.
        let old = build(|b| {
            b.add_content(0, "head");
            b.add_content(2, "tail");
        });
        let new = build(|b| {
            b.add_content(0, "head");
            b.add_content(1, "branch");
            b.add_content(2, "tail");
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![Edit::InsertFrame { sibling_index: 1, frame_index: 1 }]
        );
    }

    #[test]
    fn test_branch_exit_removes_in_the_middle() {
        let old = build(|b| {
            b.add_content(0, "head");
            b.add_content(1, "branch");
            b.add_content(2, "tail");
        });
        let new = build(|b| {
            b.add_content(0, "head");
            b.add_content(2, "tail");
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![Edit::RemoveFrame { sibling_index: 1 }]
        );
    }

    #[test]
    fn test_keyed_swap_is_permutation_not_churn() {
        let old = build(|b| {
            b.open_element(5, "li");
            b.add_content(6, "first");
            b.close_element().unwrap();
            b.open_element(7, "li");
            b.add_content(8, "second");
            b.close_element().unwrap();
        });
        let new = build(|b| {
            b.open_element(7, "li");
            b.add_content(8, "second");
            b.close_element().unwrap();
            b.open_element(5, "li");
            b.add_content(6, "first");
            b.close_element().unwrap();
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::PermutationListEntry { from_sibling_index: 0, to_sibling_index: 1 },
                Edit::PermutationListEntry { from_sibling_index: 1, to_sibling_index: 0 },
                Edit::PermutationListEnd,
            ]
        );
    }

    #[test]
    fn test_duplicate_sequences_match_in_stable_order() {
        // Loop output: three items from one source line, one removed.
        let item = |b: &mut RenderTreeBuilder, label: &str| {
            b.open_element(1, "li");
            b.add_content(2, label);
            b.close_element().unwrap();
        };
        let old = build(|b| {
            item(b, "a");
            item(b, "b");
            item(b, "c");
        });
        let new = build(|b| {
            item(b, "a");
            item(b, "b");
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![Edit::RemoveFrame { sibling_index: 2 }]
        );
    }

    #[test]
    fn test_region_children_splice_into_parent() {
        // div > [ "head", region("a", "b"), "tail" ] with "b" changing:
        // region contents occupy parent slots 1 and 2, so "b" sits at slot 2
        // and "tail" at slot 3. The region frame itself appears in no edit.
        let tree = |middle: &'static str| {
            build(move |b| {
                b.open_element(0, "div");
                b.add_content(1, "head");
                b.open_region(2);
                b.add_content(0, "a");
                b.add_content(1, middle);
                b.close_region().unwrap();
                b.add_content(3, "tail");
                b.close_element().unwrap();
            })
        };
        let result = diff(&tree("b"), &tree("B")).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::StepIn { sibling_index: 0 },
                Edit::UpdateText { sibling_index: 2, frame_index: 4 },
                Edit::StepOut,
            ]
        );
    }

    #[test]
    fn test_region_appearing_inserts_only_children() {
        let old = build(|b| {
            b.add_content(0, "head");
        });
        let new = build(|b| {
            b.add_content(0, "head");
            b.open_region(1);
            b.add_content(0, "x");
            b.add_content(1, "y");
            b.close_region().unwrap();
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::InsertFrame { sibling_index: 1, frame_index: 2 },
                Edit::InsertFrame { sibling_index: 2, frame_index: 3 },
            ]
        );
    }

    #[test]
    fn test_component_retained_when_type_matches() {
        let mut old = build(|b| {
            b.open_component::<Widget>(0);
            b.add_attribute(1, "label", "before").unwrap();
            b.close_component().unwrap();
        });
        bind_ids(&mut old, 7);
        let new = build(|b| {
            b.open_component::<Widget>(0);
            b.add_attribute(1, "label", "after").unwrap();
            b.close_component().unwrap();
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(result.edits, vec![]);
        assert_eq!(
            result.effects,
            vec![DiffEffect::RetainComponent {
                id: ComponentId(7),
                frame_index: 0,
                parameters_changed: true,
            }]
        );

        // Unchanged parameters retain without a re-render request.
        let unchanged = diff(&old, &{
            build(|b| {
                b.open_component::<Widget>(0);
                b.add_attribute(1, "label", "before").unwrap();
                b.close_component().unwrap();
            })
        })
        .unwrap();
        assert_eq!(
            unchanged.effects,
            vec![DiffEffect::RetainComponent {
                id: ComponentId(7),
                frame_index: 0,
                parameters_changed: false,
            }]
        );
    }

    #[test]
    fn test_component_type_change_replaces() {
        let mut old = build(|b| {
            b.open_component::<Widget>(0);
            b.close_component().unwrap();
        });
        bind_ids(&mut old, 3);
        let new = build(|b| {
            b.open_component::<OtherWidget>(0);
            b.close_component().unwrap();
        });
        let result = diff(&old, &new).unwrap();
        assert_eq!(
            result.edits,
            vec![
                Edit::RemoveFrame { sibling_index: 0 },
                Edit::InsertFrame { sibling_index: 0, frame_index: 0 },
            ]
        );
        assert_eq!(
            result.effects,
            vec![
                DiffEffect::DisposeComponent { id: ComponentId(3) },
                DiffEffect::InitComponent { frame_index: 0 },
            ]
        );
    }

    #[test]
    fn test_inserted_subtree_initializes_nested_components() {
        let new = build(|b| {
            b.open_element(0, "div");
            b.open_component::<Widget>(1);
            b.close_component().unwrap();
            b.open_component::<OtherWidget>(2);
            b.close_component().unwrap();
            b.close_element().unwrap();
        });
        let result = diff(&FrameArray::empty(), &new).unwrap();
        assert_eq!(
            result.effects,
            vec![
                DiffEffect::InitComponent { frame_index: 1 },
                DiffEffect::InitComponent { frame_index: 2 },
            ]
        );
    }

    #[test]
    fn test_removed_subtree_disposes_nested_components() {
        let mut old = build(|b| {
            b.open_element(0, "div");
            b.open_component::<Widget>(1);
            b.close_component().unwrap();
            b.close_element().unwrap();
        });
        bind_ids(&mut old, 11);
        let result = diff(&old, &FrameArray::empty()).unwrap();
        assert_eq!(result.edits, vec![Edit::RemoveFrame { sibling_index: 0 }]);
        assert_eq!(
            result.effects,
            vec![DiffEffect::DisposeComponent { id: ComponentId(11) }]
        );
    }

    #[test]
    fn test_malformed_subtree_length_is_inconsistency() {
        let bad = FrameArray::from_frames(vec![Frame {
            sequence: 0,
            content: FrameContent::Element {
                tag: "div".into(),
                subtree_len: 9,
            },
        }]);
        assert!(matches!(
            diff(&bad, &FrameArray::empty()),
            Err(RenderError::DiffInconsistency(_))
        ));
    }
}
