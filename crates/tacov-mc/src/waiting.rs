//! Waiting containers for the search frontier.

use std::collections::VecDeque;
use tracing::debug;

/// A container of elements waiting to be explored.
///
/// `is_empty` and `first` take `&mut self` so that filtering containers can
/// drop stale elements lazily.
pub trait Waiting<T> {
    fn is_empty(&mut self) -> bool;

    fn insert(&mut self, t: T);

    fn first(&mut self) -> Option<&T>;

    fn remove_first(&mut self) -> Option<T>;

    /// Number of stored elements, stale ones included.
    fn len(&self) -> usize;

    /// Move the element out of `slot` into the container.
    fn swap_insert(&mut self, slot: &mut Option<T>) {
        if let Some(t) = slot.take() {
            self.insert(t);
        }
    }

    /// Move the first element into `slot`, leaving `None` when empty.
    fn swap_first_and_remove(&mut self, slot: &mut Option<T>) {
        *slot = self.remove_first();
    }
}

impl<T, W: Waiting<T> + ?Sized> Waiting<T> for Box<W> {
    fn is_empty(&mut self) -> bool {
        (**self).is_empty()
    }

    fn insert(&mut self, t: T) {
        (**self).insert(t)
    }

    fn first(&mut self) -> Option<&T> {
        (**self).first()
    }

    fn remove_first(&mut self) -> Option<T> {
        (**self).remove_first()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Stack: the last inserted element comes out first.
#[derive(Debug, Clone)]
pub struct Lifo<T>(Vec<T>);

impl<T> Lifo<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }
}

impl<T> Default for Lifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Waiting<T> for Lifo<T> {
    fn is_empty(&mut self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, t: T) {
        self.0.push(t);
    }

    fn first(&mut self) -> Option<&T> {
        self.0.last()
    }

    fn remove_first(&mut self) -> Option<T> {
        self.0.pop()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Queue: elements come out in insertion order.
#[derive(Debug, Clone)]
pub struct Fifo<T>(VecDeque<T>);

impl<T> Fifo<T> {
    pub fn new() -> Self {
        Self(VecDeque::new())
    }
}

impl<T> Default for Fifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Waiting<T> for Fifo<T> {
    fn is_empty(&mut self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, t: T) {
        self.0.push_back(t);
    }

    fn first(&mut self) -> Option<&T> {
        self.0.front()
    }

    fn remove_first(&mut self) -> Option<T> {
        self.0.pop_front()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Decorator that hides elements failing `keep`.
///
/// Elements may start failing the predicate while stored (a node covered by
/// another worker); they are dropped lazily when they reach the front.
pub struct Filter<W, F> {
    base: W,
    keep: F,
}

impl<W, F> Filter<W, F> {
    pub fn new(base: W, keep: F) -> Self {
        Self { base, keep }
    }

    pub fn into_inner(self) -> W {
        self.base
    }
}

/// Drop elements at the front of `base` until one passes `keep`.
fn skip_bad<T, W, F>(base: &mut W, keep: &F)
where
    W: Waiting<T>,
    F: Fn(&T) -> bool,
{
    loop {
        let good = match base.first() {
            None => return,
            Some(t) => keep(t),
        };
        if good {
            return;
        }
        base.remove_first();
    }
}

impl<T, W, F> Waiting<T> for Filter<W, F>
where
    W: Waiting<T>,
    F: Fn(&T) -> bool,
{
    fn is_empty(&mut self) -> bool {
        skip_bad(&mut self.base, &self.keep);
        self.base.is_empty()
    }

    fn insert(&mut self, t: T) {
        if (self.keep)(&t) {
            self.base.insert(t);
        }
    }

    fn first(&mut self) -> Option<&T> {
        skip_bad(&mut self.base, &self.keep);
        self.base.first()
    }

    /// Removes the front of the base container as is. Callers normally go
    /// through `is_empty` or `first` first; a front that went bad since then
    /// is still returned.
    fn remove_first(&mut self) -> Option<T> {
        let t = self.base.remove_first()?;
        if !(self.keep)(&t) {
            debug!("node has gone inactive");
        }
        Some(t)
    }

    fn len(&self) -> usize {
        self.base.len()
    }
}
