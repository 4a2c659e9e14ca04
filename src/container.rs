//! Component tree: ownership, nesting and lifecycle propagation.
//!
//! Every node lives in one arena slot. Containers hold an ordered list of child
//! handles (render and z-order), and each child records its container as a plain
//! index. That back-link is only used to navigate upward and is set and cleared
//! exclusively by [`ComponentTree::add_component`] and the internal removal path.
//!
//! Batch operations (`detach_all`, container `remove`) walk a snapshot of the
//! children, because detaching a child re-enters `remove_component` on the same
//! container and mutates the live list.

use tracing::{debug, trace};

use crate::component::{AttachState, Component, ComponentId, Surface};
use crate::rendering::DrawExecutor;

enum NodeKind {
    Leaf(Box<dyn Component>),
    Container { children: Vec<ComponentId> },
}

struct Node {
    kind: NodeKind,
    parent: Option<ComponentId>,
    /// `Some` while anchored.
    surface: Option<Surface>,
    layout_invalid: bool,
}

#[derive(Default)]
pub struct ComponentTree {
    slots: Vec<Option<Node>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    pending_layouts: Vec<ComponentId>,
}

impl ComponentTree {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Allocation --

    /// Inserts a leaf component. It starts detached, with no parent.
    pub fn insert<C: Component>(&mut self, component: C) -> ComponentId {
        self.insert_boxed(Box::new(component))
    }

    pub fn insert_boxed(&mut self, component: Box<dyn Component>) -> ComponentId {
        self.alloc(NodeKind::Leaf(component))
    }

    /// Creates an empty container.
    pub fn create_container(&mut self) -> ComponentId {
        self.alloc(NodeKind::Container {
            children: Vec::new(),
        })
    }

    fn alloc(&mut self, kind: NodeKind) -> ComponentId {
        let node = Node {
            kind,
            parent: None,
            surface: None,
            layout_invalid: false,
        };
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some(node);
            idx
        } else {
            self.slots.push(Some(node));
            self.generation.push(0);
            (self.slots.len() - 1) as u32
        };
        ComponentId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn node(&self, id: ComponentId) -> Option<&Node> {
        if self.generation.get(id.idx as usize) != Some(&id.generation) {
            return None;
        }
        self.slots.get(id.idx as usize)?.as_ref()
    }

    fn node_mut(&mut self, id: ComponentId) -> Option<&mut Node> {
        if self.generation.get(id.idx as usize) != Some(&id.generation) {
            return None;
        }
        self.slots.get_mut(id.idx as usize)?.as_mut()
    }

    fn children_mut(&mut self, id: ComponentId) -> Option<&mut Vec<ComponentId>> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Container { children } => Some(children),
            NodeKind::Leaf(_) => None,
        }
    }

    // -- Queries --

    /// Whether the handle refers to a live node.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.node(id).is_some()
    }

    pub fn is_container(&self, id: ComponentId) -> bool {
        matches!(
            self.node(id).map(|n| &n.kind),
            Some(NodeKind::Container { .. })
        )
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.node(id)?.parent
    }

    pub fn state(&self, id: ComponentId) -> AttachState {
        match self.node(id).and_then(|n| n.surface.as_ref()) {
            Some(_) => AttachState::Anchored,
            None => AttachState::Detached,
        }
    }

    pub fn is_anchored(&self, id: ComponentId) -> bool {
        self.state(id) == AttachState::Anchored
    }

    pub fn surface(&self, id: ComponentId) -> Option<&Surface> {
        self.node(id)?.surface.as_ref()
    }

    /// Surface handed to the children of an anchored container.
    pub fn content_surface(&self, id: ComponentId) -> Option<Surface> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Container { .. } => node.surface.as_ref().map(|s| s.content(id)),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Copy of a container's children. Empty for leaves and dead handles.
    pub fn components(&self, container: ComponentId) -> Vec<ComponentId> {
        match self.node(container).map(|n| &n.kind) {
            Some(NodeKind::Container { children }) => children.clone(),
            _ => Vec::new(),
        }
    }

    /// True iff the container has no children.
    pub fn empty(&self, container: ComponentId) -> bool {
        match self.node(container).map(|n| &n.kind) {
            Some(NodeKind::Container { children }) => children.is_empty(),
            _ => true,
        }
    }

    /// Whether `ancestor` is `id` or one of its parents.
    pub fn is_ancestor(&self, ancestor: ComponentId, id: ComponentId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn get<T: Component>(&self, id: ComponentId) -> Option<&T> {
        match &self.node(id)?.kind {
            NodeKind::Leaf(c) => c.as_any().downcast_ref(),
            NodeKind::Container { .. } => None,
        }
    }

    pub fn get_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Leaf(c) => c.as_any_mut().downcast_mut(),
            NodeKind::Container { .. } => None,
        }
    }

    // -- Container operations --

    /// Adds `child` to `container`, at the front when `prepend` is set.
    ///
    /// Returns false, changing nothing, if either handle is dead, `container` is
    /// not a container, `child` is already one of its children, or `child` is
    /// `container` itself or one of its ancestors. A child owned by another
    /// container, or anchored on its own, is detached first.
    pub fn add_component(&mut self, container: ComponentId, child: ComponentId, prepend: bool) -> bool {
        if !self.is_container(container) || !self.contains(child) {
            trace!(?container, ?child, "add_component: dead or non-container handle");
            return false;
        }
        if self.components(container).contains(&child) {
            trace!(?container, ?child, "add_component: already present");
            return false;
        }
        if self.is_ancestor(child, container) {
            trace!(?container, ?child, "add_component: would create a cycle");
            return false;
        }
        if self.parent(child).is_some() || self.is_anchored(child) {
            self.detach(child);
        }

        if let Some(children) = self.children_mut(container) {
            if prepend {
                children.insert(0, child);
            } else {
                children.push(child);
            }
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(container);
        }
        self.pending_layouts.retain(|p| *p != child);
        if let Some(content) = self.content_surface(container) {
            self.anchor(child, content);
        }
        debug!(?container, ?child, prepend, "component added");
        self.invalidate_layout(container);
        true
    }

    /// Splices `child` out of `container`, keeping the order of the rest.
    ///
    /// Only the child's own detach path calls this; the parent link is cleared there.
    pub(crate) fn remove_component(&mut self, container: ComponentId, child: ComponentId) {
        let Some(children) = self.children_mut(container) else {
            return;
        };
        let Some(pos) = children.iter().position(|c| *c == child) else {
            return;
        };
        children.remove(pos);
        debug!(?container, ?child, "component removed");
        self.invalidate_layout(container);
    }

    /// Detaches every child. The container ends up empty.
    pub fn detach_all(&mut self, container: ComponentId) {
        for child in self.components(container) {
            self.detach(child);
        }
    }

    // -- Lifecycle --

    /// Anchors a node to `surface`; containers then anchor every child to their content surface.
    pub fn anchor(&mut self, id: ComponentId, surface: Surface) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.surface = Some(surface.clone());
        let children = match &mut node.kind {
            NodeKind::Leaf(component) => {
                component.anchored(&surface);
                return;
            }
            NodeKind::Container { children } => children.clone(),
        };
        let content = surface.content(id);
        for child in children {
            self.anchor(child, content.clone());
        }
    }

    /// Renders an anchored node. Containers render their children in order and draw nothing themselves.
    pub fn render(&mut self, id: ComponentId, executor: &mut dyn DrawExecutor) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let Some(surface) = node.surface.clone() else {
            return;
        };
        let children = match &mut node.kind {
            NodeKind::Leaf(component) => {
                trace!(?id, "render leaf");
                component.render(&surface, executor);
                return;
            }
            NodeKind::Container { children } => children.clone(),
        };
        for child in children {
            self.render(child, executor);
        }
    }

    /// Removes the node from its container and from its surface.
    ///
    /// A detached container keeps its children; they are unanchored with it and
    /// re-anchored when the container is anchored again.
    pub fn detach(&mut self, id: ComponentId) {
        let Some(parent) = self.node(id).map(|n| n.parent) else {
            return;
        };
        if let Some(parent) = parent {
            self.remove_component(parent, id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
        self.unanchor_subtree(id);
        self.pending_layouts.retain(|p| *p != id);
        debug!(?id, "component detached");
    }

    fn unanchor_subtree(&mut self, id: ComponentId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let was_anchored = node.surface.take().is_some();
        let children = match &mut node.kind {
            NodeKind::Leaf(component) => {
                if was_anchored {
                    component.detached();
                }
                return;
            }
            NodeKind::Container { children } => children.clone(),
        };
        for child in children {
            self.unanchor_subtree(child);
        }
    }

    /// Detaches the node and frees it. Containers remove every child as well.
    ///
    /// Returns the leaf component, if the node was a leaf.
    pub fn remove(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        if !self.contains(id) {
            return None;
        }
        self.detach(id);
        for child in self.components(id) {
            self.remove(child);
        }
        let node = self.slots[id.idx as usize].take()?;
        self.generation[id.idx as usize] += 1;
        self.free_list.push(id.idx);
        match node.kind {
            NodeKind::Leaf(component) => Some(component),
            NodeKind::Container { .. } => None,
        }
    }

    // -- Invalidation --

    /// Marks the node and its ancestors as needing layout.
    ///
    /// When the chain is anchored its root is queued for the external scheduler;
    /// nothing is laid out here.
    pub fn invalidate_layout(&mut self, id: ComponentId) {
        let mut cursor = Some(id);
        let mut root = id;
        while let Some(current) = cursor {
            let Some(node) = self.node_mut(current) else {
                break;
            };
            node.layout_invalid = true;
            root = current;
            cursor = node.parent;
        }
        if self.is_anchored(root) && !self.pending_layouts.contains(&root) {
            self.pending_layouts.push(root);
        }
    }

    pub fn needs_layout(&self, id: ComponentId) -> bool {
        self.node(id).map(|n| n.layout_invalid).unwrap_or(false)
    }

    pub fn pending_layouts(&self) -> &[ComponentId] {
        &self.pending_layouts
    }

    /// Hands the queued layout roots to the scheduler and clears their subtrees' marks.
    pub fn take_pending_layouts(&mut self) -> Vec<ComponentId> {
        let roots = std::mem::take(&mut self.pending_layouts);
        for root in &roots {
            self.clear_layout_marks(*root);
        }
        roots
    }

    fn clear_layout_marks(&mut self, id: ComponentId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.layout_invalid = false;
        if let NodeKind::Container { children } = &node.kind {
            for child in children.clone() {
                self.clear_layout_marks(child);
            }
        }
    }

    /// Anchored leaves whose component asked for a repaint.
    pub fn pending_renders(&self) -> Vec<ComponentId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let node = slot.as_ref()?;
                match &node.kind {
                    NodeKind::Leaf(c) if node.surface.is_some() && c.needs_render() => {
                        Some(ComponentId {
                            idx: idx as u32,
                            generation: self.generation[idx],
                        })
                    }
                    _ => None,
                }
            })
            .collect()
    }
}
