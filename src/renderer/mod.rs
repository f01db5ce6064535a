//! Component renderer: owns component instances, drives render passes and
//! turns diff output into display batches.
//!
//! The flow for one pass:
//!
//!   trigger -> queue -> build render tree -> diff -> effects + edits
//!                                                      |
//!                                  attach / retain / dispose components
//!                                                      |
//!                                        RenderBatch -> DisplaySink
//!
//! Every pass is atomic: component frame arrays, newly attached children
//! and disposals are staged while the pass runs and committed only once
//! every queued component rendered successfully. A failed pass abandons
//! its batch, rolls the staging back and reports the error, leaving the
//! previously committed state intact.
//!
//! Render requests arriving while a pass runs are honored: a component not
//! yet rendered joins the current pass, one that already rendered is
//! deferred to a follow-up pass with its own batch. At most one render per
//! component lands in each batch.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::diff::{diff, DiffEffect, DiffResult};
use crate::error::{RenderError, RenderResult};
use crate::tree::{AttributeValue, FrameArray, FrameContent};
use crate::types::{ComponentId, Sequence};

pub mod batch;
pub mod events;

pub use crate::tree::RenderTreeBuilder;
pub use batch::{ComponentEdits, RenderBatch, RenderBatchAssembler};
pub use events::{
    ChangeEventArgs, EventArgs, EventDescriptor, KeyboardEventArgs, MouseEventArgs,
    PointerEventArgs,
};

// ============================================================================
// Component contract
// ============================================================================

/// A unit of UI that renders itself into a [`RenderTreeBuilder`].
///
/// Implementations hold their own state and describe their entire output on
/// every render. Child components are declared with
/// [`RenderTreeBuilder::open_component`]; the renderer instantiates them,
/// feeds them parameters and manages their lifetime.
pub trait Component {
    /// Produce the component's current output. Called once per render.
    fn build_render_tree(&mut self, tree: &mut RenderTreeBuilder) -> RenderResult<()>;

    /// Called once, before the first render, with the component's identity
    /// and a handle for requesting renders later.
    fn attach(&mut self, context: ComponentContext) {
        let _ = context;
    }

    /// Receive parameters from the parent's frame array. Called before the
    /// first render and again whenever the parent supplies changed values.
    fn set_parameters(&mut self, parameters: &ParameterView<'_>) -> RenderResult<()> {
        let _ = parameters;
        Ok(())
    }
}

/// Identity and render access handed to a component on attach.
#[derive(Clone)]
pub struct ComponentContext {
    pub id: ComponentId,
    pub trigger: TriggerHandle,
}

/// Cheap cloneable handle a component keeps to request its own re-render.
///
/// Safe to call at any time, including from inside a render: a request for
/// a component that already rendered in the current pass is deferred to a
/// follow-up pass rather than dropped or rendered twice.
#[derive(Clone)]
pub struct TriggerHandle {
    id: ComponentId,
    queue: Rc<RefCell<RenderQueue>>,
}

impl TriggerHandle {
    pub fn request_render(&self) {
        self.queue.borrow_mut().push(self.id);
    }
}

/// Read access to the attribute frames a parent rendered for a child
/// component.
pub struct ParameterView<'a> {
    frames: &'a [crate::tree::Frame],
}

impl<'a> ParameterView<'a> {
    pub(crate) fn new(frames: &'a [crate::tree::Frame]) -> Self {
        Self { frames }
    }

    pub fn get(&self, name: &str) -> Option<&'a AttributeValue> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a AttributeValue)> {
        self.frames.iter().filter_map(|frame| match &frame.content {
            FrameContent::Attribute { name, value } => Some((name.as_str(), value)),
            _ => None,
        })
    }
}

// ============================================================================
// Display sink
// ============================================================================

/// Consumer of completed render batches.
///
/// Called once per successful pass, in batch id order. The interop layer
/// provides an implementation that serializes batches onto the wire; tests
/// record them.
pub trait DisplaySink {
    fn update_display(&mut self, batch: &RenderBatch);
}

// ============================================================================
// Render queue
// ============================================================================

/// FIFO of components awaiting a render, deduplicated: a second request for
/// an already queued component is a no-op.
#[derive(Default)]
struct RenderQueue {
    pending: VecDeque<ComponentId>,
    queued: HashSet<ComponentId>,
}

impl RenderQueue {
    fn push(&mut self, id: ComponentId) {
        if self.queued.insert(id) {
            self.pending.push_back(id);
        }
    }

    fn pop(&mut self) -> Option<ComponentId> {
        let id = self.pending.pop_front()?;
        self.queued.remove(&id);
        Some(id)
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.queued.clear();
    }
}

// ============================================================================
// Renderer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotStatus {
    Idle,
    Rendering,
}

struct ComponentSlot {
    component: Box<dyn Component>,
    /// Last committed output. Empty until the first successful render.
    frames: FrameArray,
    status: SlotStatus,
}

/// Owns all live components and the single render queue.
pub struct Renderer {
    slots: HashMap<ComponentId, ComponentSlot>,
    disposed: HashSet<ComponentId>,
    next_component_id: u32,
    queue: Rc<RefCell<RenderQueue>>,
    builder: RenderTreeBuilder,
    assembler: RenderBatchAssembler,
    sink: Box<dyn DisplaySink>,
    on_error: Box<dyn FnMut(&RenderError)>,
    /// Disposals from explicit [`Renderer::dispose_component`] calls,
    /// reported in the next batch.
    pending_disposals: Vec<ComponentId>,
    in_pass: bool,
}

impl Renderer {
    pub fn new(sink: impl DisplaySink + 'static) -> Self {
        Self {
            slots: HashMap::new(),
            disposed: HashSet::new(),
            next_component_id: 0,
            queue: Rc::new(RefCell::new(RenderQueue::default())),
            builder: RenderTreeBuilder::new(),
            assembler: RenderBatchAssembler::new(),
            sink: Box::new(sink),
            on_error: Box::new(|error| tracing::error!(%error, "render pass failed")),
            pending_disposals: Vec::new(),
            in_pass: false,
        }
    }

    /// Replace the default error handler (which logs at error level).
    /// Non-fatal dispatch errors are returned to the caller instead and
    /// never reach this handler.
    pub fn set_error_handler(&mut self, handler: impl FnMut(&RenderError) + 'static) {
        self.on_error = Box::new(handler);
    }

    /// Registers a root component and returns its id. The component does
    /// not render until [`Renderer::render_root`] or its own trigger handle
    /// asks for it.
    pub fn attach_component(&mut self, component: Box<dyn Component>) -> ComponentId {
        let id = self.attach_slot(component);
        tracing::debug!(component = %id, "root component attached");
        id
    }

    /// Renders `id` now, along with anything else the render cascades into.
    pub fn render_root(&mut self, id: ComponentId) -> RenderResult<()> {
        self.ensure_live(id)?;
        self.queue.borrow_mut().push(id);
        if !self.in_pass {
            self.process_queue();
        }
        Ok(())
    }

    /// Invokes the handler bound at `sequence` in the component's current
    /// frame array, then runs any render passes the handler requested.
    ///
    /// A (component id, sequence) pair is the wire address of a handler.
    /// Loop output repeats sequence numbers; dispatch resolves to the first
    /// frame in array order carrying the sequence, so handlers that must
    /// tell iterations apart capture the per-iteration state themselves.
    pub fn dispatch_event(
        &mut self,
        id: ComponentId,
        sequence: Sequence,
        args: &EventArgs,
    ) -> RenderResult<()> {
        self.ensure_live(id)?;
        let handler = self.slots[&id].frames.frames().iter().find_map(|frame| {
            match &frame.content {
                FrameContent::Attribute { value: AttributeValue::Handler(h), .. }
                    if frame.sequence == sequence =>
                {
                    Some(h.clone())
                }
                _ => None,
            }
        });
        let Some(handler) = handler else {
            return Err(RenderError::EventHandlerNotFound { component: id, sequence });
        };
        tracing::debug!(component = %id, sequence, event = args.event_type(), "dispatching event");
        handler.invoke(args);
        if !self.in_pass {
            self.process_queue();
        }
        Ok(())
    }

    /// Removes a component and every component nested in its output. The
    /// disposals are reported in the next batch. Pending render requests
    /// for disposed components are discarded silently.
    pub fn dispose_component(&mut self, id: ComponentId) -> RenderResult<()> {
        self.ensure_live(id)?;
        let mut worklist = vec![id];
        while let Some(current) = worklist.pop() {
            let Some(slot) = self.slots.remove(&current) else { continue };
            self.disposed.insert(current);
            self.pending_disposals.push(current);
            for frame in slot.frames.frames() {
                if let FrameContent::Component { id: Some(child), .. } = &frame.content {
                    worklist.push(*child);
                }
            }
            tracing::debug!(component = %current, "component disposed");
        }
        Ok(())
    }

    pub fn is_live(&self, id: ComponentId) -> bool {
        self.slots.contains_key(&id)
    }

    fn ensure_live(&self, id: ComponentId) -> RenderResult<()> {
        if self.slots.contains_key(&id) {
            Ok(())
        } else {
            Err(RenderError::ComponentDisposed(id))
        }
    }

    fn attach_slot(&mut self, mut component: Box<dyn Component>) -> ComponentId {
        let id = ComponentId(self.next_component_id);
        self.next_component_id += 1;
        component.attach(ComponentContext {
            id,
            trigger: TriggerHandle { id, queue: Rc::clone(&self.queue) },
        });
        self.slots.insert(
            id,
            ComponentSlot { component, frames: FrameArray::empty(), status: SlotStatus::Idle },
        );
        id
    }

    // ------------------------------------------------------------------------
    // Pass driver
    // ------------------------------------------------------------------------

    fn process_queue(&mut self) {
        self.in_pass = true;
        while !self.queue.borrow().is_empty() {
            self.render_pass();
        }
        self.in_pass = false;
    }

    /// Drains the queue once, producing at most one batch. Requests made
    /// for already-rendered components during the pass are re-queued for
    /// the next one.
    fn render_pass(&mut self) {
        let batch_id = self.assembler.begin_batch();
        let span = tracing::debug_span!("render_pass", batch = %batch_id);
        let _guard = span.enter();

        let mut rendered: HashSet<ComponentId> = HashSet::new();
        let mut deferred: Vec<ComponentId> = Vec::new();
        let mut staged: Vec<(ComponentId, FrameArray)> = Vec::new();
        let mut attached: Vec<ComponentId> = Vec::new();
        // Disposals discovered by diffs this pass; explicit ones were
        // already applied and only need reporting.
        let mut disposals: Vec<ComponentId> = Vec::new();
        let mut failure: Option<RenderError> = None;

        loop {
            let next = self.queue.borrow_mut().pop();
            let Some(id) = next else { break };
            if !self.slots.contains_key(&id) || disposals.contains(&id) {
                continue;
            }
            if rendered.contains(&id) {
                deferred.push(id);
                continue;
            }
            rendered.insert(id);
            if let Err(error) = self.render_component(id, &mut staged, &mut attached, &mut disposals)
            {
                failure = Some(error);
                break;
            }
        }

        match failure {
            None => {
                self.commit_pass(staged, disposals);
                if let Some(batch) = self.assembler.complete() {
                    tracing::debug!(
                        batch = %batch.id,
                        components = batch.updates.len(),
                        disposed = batch.disposed.len(),
                        "batch complete"
                    );
                    self.sink.update_display(&batch);
                }
                let mut queue = self.queue.borrow_mut();
                for id in deferred {
                    queue.push(id);
                }
            }
            Some(error) => {
                self.assembler.abandon();
                for id in attached {
                    self.slots.remove(&id);
                }
                for id in &rendered {
                    if let Some(slot) = self.slots.get_mut(id) {
                        slot.status = SlotStatus::Idle;
                    }
                }
                self.queue.borrow_mut().clear();
                (self.on_error)(&error);
            }
        }
    }

    fn commit_pass(&mut self, staged: Vec<(ComponentId, FrameArray)>, mut disposals: Vec<ComponentId>) {
        // Expand diff-driven disposals to the components nested in the
        // disposed components' own output. A component that rendered earlier
        // in this same pass has its current children in the staged array,
        // not the committed one.
        let mut index = 0;
        while index < disposals.len() {
            let id = disposals[index];
            index += 1;
            let frames = staged
                .iter()
                .find(|(staged_id, _)| *staged_id == id)
                .map(|(_, frames)| frames)
                .or_else(|| self.slots.get(&id).map(|slot| &slot.frames));
            let Some(frames) = frames else { continue };
            for frame in frames.frames() {
                if let FrameContent::Component { id: Some(child), .. } = &frame.content {
                    disposals.push(*child);
                }
            }
        }
        for &id in &disposals {
            self.slots.remove(&id);
            self.disposed.insert(id);
        }
        // Explicit disposals recorded between passes ride this batch.
        disposals.extend(self.pending_disposals.drain(..));
        let mut seen = HashSet::new();
        disposals.retain(|id| seen.insert(*id));
        for id in disposals {
            self.assembler.add_disposal(id);
        }
        for (id, frames) in staged {
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.frames = frames;
                slot.status = SlotStatus::Idle;
            }
        }
    }

    /// Renders one component and stages the outcome. Nothing observable
    /// changes on error except components attached earlier in the pass,
    /// which the caller rolls back.
    fn render_component(
        &mut self,
        id: ComponentId,
        staged: &mut Vec<(ComponentId, FrameArray)>,
        attached: &mut Vec<ComponentId>,
        disposals: &mut Vec<ComponentId>,
    ) -> RenderResult<()> {
        let old_frames = {
            let slot = self.slots.get_mut(&id).ok_or(RenderError::ComponentDisposed(id))?;
            slot.status = SlotStatus::Rendering;
            tracing::trace!(component = %id, "rendering");
            let built = slot.component.build_render_tree(&mut self.builder);
            slot.status = SlotStatus::Idle;
            if let Err(error) = built {
                self.builder.reset();
                return Err(error);
            }
            slot.frames.clone()
        };
        let mut new_frames = self.builder.finish()?;
        let DiffResult { edits, effects } = diff(&old_frames, &new_frames)?;

        for effect in effects {
            match effect {
                DiffEffect::InitComponent { frame_index } => {
                    let ty = match new_frames.get(frame_index).map(|f| &f.content) {
                        Some(FrameContent::Component { ty, .. }) => *ty,
                        _ => {
                            return Err(RenderError::DiffInconsistency(format!(
                                "init effect targets non-component frame {frame_index}"
                            )));
                        }
                    };
                    let child_id = self.attach_slot(ty.instantiate());
                    attached.push(child_id);
                    bind_component_id(&mut new_frames, frame_index, child_id)?;
                    self.set_child_parameters(child_id, &new_frames, frame_index)?;
                    self.queue.borrow_mut().push(child_id);
                    tracing::debug!(
                        component = %child_id,
                        parent = %id,
                        ty = ty.name(),
                        "component initialized"
                    );
                }
                DiffEffect::RetainComponent { id: child, frame_index, parameters_changed } => {
                    bind_component_id(&mut new_frames, frame_index, child)?;
                    if parameters_changed {
                        self.set_child_parameters(child, &new_frames, frame_index)?;
                        self.queue.borrow_mut().push(child);
                    }
                }
                DiffEffect::DisposeComponent { id: child } => {
                    disposals.push(child);
                }
            }
        }

        self.assembler.add_component_edits(id, edits, new_frames.clone());
        staged.push((id, new_frames));
        Ok(())
    }

    fn set_child_parameters(
        &mut self,
        child: ComponentId,
        frames: &FrameArray,
        component_frame: usize,
    ) -> RenderResult<()> {
        let range = frames.attribute_range(component_frame);
        let view = ParameterView::new(&frames.frames()[range]);
        let slot = self.slots.get_mut(&child).ok_or(RenderError::ComponentDisposed(child))?;
        slot.component.set_parameters(&view)
    }
}

/// Writes a component id into a freshly built, still unshared frame array.
fn bind_component_id(
    frames: &mut FrameArray,
    frame_index: usize,
    id: ComponentId,
) -> RenderResult<()> {
    let slice = frames.frames_mut().ok_or_else(|| {
        RenderError::DiffInconsistency("frame array already shared during id binding".into())
    })?;
    match slice.get_mut(frame_index).map(|f| &mut f.content) {
        Some(FrameContent::Component { id: bound, .. }) => {
            *bound = Some(id);
            Ok(())
        }
        _ => Err(RenderError::DiffInconsistency(format!(
            "effect targets non-component frame {frame_index}"
        ))),
    }
}
