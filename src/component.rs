//! The capability every node in a chart layout shares.
//!
//! Structure (parent links, children, attachment) lives in
//! [`ComponentTree`](crate::container::ComponentTree); a [`Component`] only
//! supplies the per-node behaviour the tree dispatches to.

use std::any::Any;

use crate::rendering::DrawExecutor;

/// Generational handle to a node in a [`ComponentTree`](crate::container::ComponentTree).
///
/// Handles to removed nodes never resolve again, even when the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

/// Opaque handle to the drawing surface a node is anchored to.
///
/// Containers hand their children a content surface scoped to themselves, so the
/// scope lists the containers between the root surface and the node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Surface {
    root: u64,
    scope: Vec<ComponentId>,
}

impl Surface {
    pub fn new(root: u64) -> Self {
        Self {
            root,
            scope: Vec::new(),
        }
    }

    pub fn root(&self) -> u64 {
        self.root
    }

    pub fn scope(&self) -> &[ComponentId] {
        &self.scope
    }

    /// The surface children of `owner` draw into.
    pub fn content(&self, owner: ComponentId) -> Surface {
        let mut scope = self.scope.clone();
        scope.push(owner);
        Surface {
            root: self.root,
            scope,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttachState {
    #[default]
    Detached,
    Anchored,
}

/// Leaf behaviour dispatched by the tree.
pub trait Component: Any {
    /// Called once the node is bound to `surface`.
    fn anchored(&mut self, _surface: &Surface) {}

    /// Emits the node's draw commands.
    fn render(&mut self, surface: &Surface, executor: &mut dyn DrawExecutor);

    /// Called after the node has been detached from its surface.
    fn detached(&mut self) {}

    /// True when a mutation since the last render requires a repaint.
    fn needs_render(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
