use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

/// Handle returned by [`Dataset::on_update`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<R> = Rc<dyn Fn(&Dataset<R>)>;

/// Ordered rows shared between plots, with a change-notification hook.
///
/// Rows are opaque to the dataset; plots read them through accessors.
/// Datasets are compared by identity (`Rc::ptr_eq`), never by content.
pub struct Dataset<R> {
    data: RefCell<Vec<R>>,
    listeners: RefCell<Vec<(ListenerId, Listener<R>)>>,
    next_listener: Cell<u64>,
}

impl<R> Dataset<R> {
    pub fn new(data: Vec<R>) -> Self {
        Self {
            data: RefCell::new(data),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        }
    }

    /// Convenience constructor for the usual shared form.
    pub fn shared(data: Vec<R>) -> Rc<Self> {
        Rc::new(Self::new(data))
    }

    pub fn data(&self) -> Ref<'_, [R]> {
        Ref::map(self.data.borrow(), |d| d.as_slice())
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces all rows and notifies subscribers.
    pub fn set_data(&self, data: Vec<R>) {
        *self.data.borrow_mut() = data;
        self.notify();
    }

    /// Appends a single row and notifies subscribers.
    pub fn push(&self, row: R) {
        self.data.borrow_mut().push(row);
        self.notify();
    }

    pub fn on_update(&self, callback: impl Fn(&Dataset<R>) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    /// Returns false if the listener was not registered.
    pub fn off_update(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|(l, _)| *l == id) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&self) {
        // Listeners may subscribe or unsubscribe while being called.
        let snapshot: Vec<Listener<R>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in snapshot {
            listener(self);
        }
    }
}

impl<R> Default for Dataset<R> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<R: std::fmt::Debug> std::fmt::Debug for Dataset<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("data", &self.data.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
