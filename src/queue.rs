//! Indexed binary heap.
//!
//! Every element stores its own heap position (through [`HeapContext`]),
//! so an element already in the queue can be removed or re-prioritized in
//! O(log n) without searching for it.
//!
//! Positions are 1-based: the root is position 1, the children of `i` are
//! `2i` and `2i + 1`. Position 0 means "not in the queue".

/// Caller-supplied ordering and position storage for queue elements
///
/// Elements are small handles (typically indices into an arena owned by
/// the context); the context holds whatever the ordering depends on.
pub trait HeapContext<T> {
    /// Returns true when `a` should sink below `b`
    fn lower_priority(&self, a: T, b: T) -> bool;

    /// Current heap position of `item` (0 if not queued)
    fn position(&self, item: T) -> usize;

    fn set_position(&mut self, item: T, pos: usize);
}

/// Priority queue with position-indexed removal and re-prioritization
///
/// When both children of a node compare as equal priority, the left child
/// is preferred while sifting down; the right child is only chosen when
/// the left one has strictly lower priority. With a fixed insertion order
/// this makes the pop sequence for equal-priority elements reproducible.
#[derive(Clone, Debug)]
pub struct IndexedPriorityQueue<T> {
    /// Heap storage; position `p` lives at index `p - 1`
    heap: Vec<T>,
}

#[inline]
fn parent(i: usize) -> usize {
    i >> 1
}

#[inline]
fn left(i: usize) -> usize {
    i << 1
}

impl<T: Copy + PartialEq> IndexedPriorityQueue<T> {
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { heap: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    fn at(&self, pos: usize) -> T {
        self.heap[pos - 1]
    }

    #[inline]
    fn place<C: HeapContext<T>>(&mut self, ctx: &mut C, pos: usize, item: T) {
        self.heap[pos - 1] = item;
        ctx.set_position(item, pos);
    }

    /// Highest-priority element, without removing it
    pub fn peek(&self) -> Option<T> {
        self.heap.first().copied()
    }

    pub fn push<C: HeapContext<T>>(&mut self, ctx: &mut C, item: T) {
        self.heap.push(item);
        let pos = self.heap.len();
        self.sift_up(ctx, pos);
    }

    /// Remove and return the highest-priority element
    pub fn pop<C: HeapContext<T>>(&mut self, ctx: &mut C) -> Option<T> {
        let top = self.peek()?;
        if let Some(last) = self.heap.pop() {
            if !self.heap.is_empty() {
                self.place(ctx, 1, last);
                self.sift_down(ctx, 1);
            }
        }
        ctx.set_position(top, 0);
        Some(top)
    }

    /// Remove an arbitrary queued element
    ///
    /// Returns false if `item` is not in the queue.
    pub fn remove<C: HeapContext<T>>(&mut self, ctx: &mut C, item: T) -> bool {
        let pos = ctx.position(item);
        if pos == 0 || pos > self.heap.len() || self.at(pos) != item {
            return false;
        }

        let last_pos = self.heap.len();
        let moving = self.heap.pop();
        ctx.set_position(item, 0);
        if pos == last_pos {
            return true;
        }

        if let Some(moving) = moving {
            self.place(ctx, pos, moving);
            if pos > 1 && ctx.lower_priority(self.at(parent(pos)), moving) {
                self.sift_up(ctx, pos);
            } else {
                self.sift_down(ctx, pos);
            }
        }
        true
    }

    /// Restore heap order after the priority of `item` changed in place
    ///
    /// `increased` means the element should move toward the root.
    pub fn change_priority<C: HeapContext<T>>(&mut self, ctx: &mut C, item: T, increased: bool) {
        let pos = ctx.position(item);
        if pos == 0 || pos > self.heap.len() {
            return;
        }
        if increased {
            self.sift_up(ctx, pos);
        } else {
            self.sift_down(ctx, pos);
        }
    }

    fn sift_up<C: HeapContext<T>>(&mut self, ctx: &mut C, mut pos: usize) {
        let moving = self.at(pos);
        while pos > 1 && ctx.lower_priority(self.at(parent(pos)), moving) {
            let up = self.at(parent(pos));
            self.place(ctx, pos, up);
            pos = parent(pos);
        }
        self.place(ctx, pos, moving);
    }

    /// Child of `pos` to compare against while sifting down (left wins ties)
    fn select_child<C: HeapContext<T>>(&self, ctx: &C, pos: usize) -> Option<usize> {
        let child = left(pos);
        let count = self.heap.len();
        if child > count {
            return None;
        }
        if child < count && ctx.lower_priority(self.at(child), self.at(child + 1)) {
            return Some(child + 1);
        }
        Some(child)
    }

    fn sift_down<C: HeapContext<T>>(&mut self, ctx: &mut C, mut pos: usize) {
        let moving = self.at(pos);
        while let Some(child) = self.select_child(ctx, pos) {
            if !ctx.lower_priority(moving, self.at(child)) {
                break;
            }
            let down = self.at(child);
            self.place(ctx, pos, down);
            pos = child;
        }
        self.place(ctx, pos, moving);
    }
}

impl<T: Copy + PartialEq> Default for IndexedPriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
