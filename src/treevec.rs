//! A B-tree backed sequence, used as the ordered container for the sweep.
//!
//! The event queue, the sweep-line and the coordinate rounder all keep their
//! contents sorted. None of them has a key that can be compared on its own
//! (comparing two segments needs the arena they live in), so instead of a map
//! we keep a sequence with O(log n) positional insertion and removal, and do
//! the binary search ourselves with a comparator supplied at every call.

use std::cmp::Ordering;

use arrayvec::ArrayVec;

#[derive(Clone, Debug)]
pub struct TreeVec<T, const B: usize> {
    root: Box<Node<T, B>>,
}

#[derive(Clone, Debug)]
enum Node<T, const B: usize> {
    Leaf {
        data: ArrayVec<T, B>,
    },
    Internal {
        size: ArrayVec<usize, B>,
        children: ArrayVec<Box<Node<T, B>>, B>,
    },
}

enum InsertResult<T, const B: usize> {
    Done,
    Split(Box<Node<T, B>>),
}

enum RemoveResult {
    Done,
    Undersize,
}

enum MergeResult {
    Absorbed,
    Rebalanced,
}

/// Finds the child containing `offset`, and the offset relative to that child.
fn child_idx(sizes: &[usize], mut offset: usize) -> Option<(usize, usize)> {
    for (idx, &size) in sizes.iter().enumerate() {
        if size > offset {
            return Some((idx, offset));
        }
        offset -= size;
    }
    None
}

impl<T, const B: usize> Node<T, B> {
    fn subtree_size(&self) -> usize {
        match self {
            Node::Leaf { data } => data.len(),
            Node::Internal { size, .. } => size.iter().sum(),
        }
    }

    fn get(&self, offset: usize) -> Option<&T> {
        match self {
            Node::Leaf { data } => data.get(offset),
            Node::Internal { size, children } => {
                let (idx, offset) = child_idx(size, offset)?;
                children[idx].get(offset)
            }
        }
    }

    fn insert(&mut self, offset: usize, element: T) -> InsertResult<T, B> {
        match self {
            Node::Leaf { data } => {
                if !data.is_full() {
                    data.insert(offset, element);
                    return InsertResult::Done;
                }
                let mut upper: ArrayVec<T, B> = data.drain(B / 2..).collect();
                if offset <= B / 2 {
                    data.insert(offset, element);
                } else {
                    upper.insert(offset - B / 2, element);
                }
                InsertResult::Split(Box::new(Node::Leaf { data: upper }))
            }
            Node::Internal { size, children } => {
                // Inserting at the very end of a child is the same as inserting
                // at the start of the next one, so we bias towards the earlier
                // child (the last child might not exist yet).
                let (idx, offset) = match offset.checked_sub(1) {
                    Some(prev) => match child_idx(size, prev) {
                        Some((idx, offset)) => (idx, offset + 1),
                        None => panic!("insertion index {offset} out of bounds"),
                    },
                    None => (0, 0),
                };
                let node = match children[idx].insert(offset, element) {
                    InsertResult::Done => {
                        size[idx] += 1;
                        return InsertResult::Done;
                    }
                    InsertResult::Split(node) => node,
                };

                size[idx] = children[idx].subtree_size();
                if !children.is_full() {
                    size.insert(idx + 1, node.subtree_size());
                    children.insert(idx + 1, node);
                    return InsertResult::Done;
                }

                let mut upper_children: ArrayVec<_, B> = children.drain(B / 2..).collect();
                let mut upper_size: ArrayVec<_, B> = size.drain(B / 2..).collect();
                if idx < B / 2 {
                    size.insert(idx + 1, node.subtree_size());
                    children.insert(idx + 1, node);
                } else {
                    upper_size.insert(idx + 1 - B / 2, node.subtree_size());
                    upper_children.insert(idx + 1 - B / 2, node);
                }
                InsertResult::Split(Box::new(Node::Internal {
                    size: upper_size,
                    children: upper_children,
                }))
            }
        }
    }

    fn merge_from_right(&mut self, right: &mut Node<T, B>) -> MergeResult {
        match (self, right) {
            (Node::Leaf { data: left }, Node::Leaf { data: right }) => {
                if left.len() + right.len() <= B {
                    left.extend(right.drain(..));
                    MergeResult::Absorbed
                } else {
                    let count = (right.len() - left.len()) / 2;
                    left.extend(right.drain(..count.max(1)));
                    MergeResult::Rebalanced
                }
            }
            (
                Node::Internal {
                    size: left_size,
                    children: left,
                },
                Node::Internal {
                    size: right_size,
                    children: right,
                },
            ) => {
                if left.len() + right.len() <= B {
                    left_size.extend(right_size.drain(..));
                    left.extend(right.drain(..));
                    MergeResult::Absorbed
                } else {
                    let count = ((right.len() - left.len()) / 2).max(1);
                    left.extend(right.drain(..count));
                    left_size.extend(right_size.drain(..count));
                    MergeResult::Rebalanced
                }
            }
            _ => unreachable!("siblings always have the same height"),
        }
    }

    fn merge_from_left(&mut self, left: &mut Node<T, B>) -> MergeResult {
        match (left, self) {
            (Node::Leaf { data: left }, Node::Leaf { data: right }) => {
                if left.len() + right.len() <= B {
                    left.extend(right.drain(..));
                    std::mem::swap(left, right);
                    MergeResult::Absorbed
                } else {
                    // Only moves a single element across; the left sibling is
                    // big enough that this restores the minimum size.
                    if let Some(x) = left.pop() {
                        right.insert(0, x);
                    }
                    MergeResult::Rebalanced
                }
            }
            (
                Node::Internal {
                    size: left_size,
                    children: left,
                },
                Node::Internal {
                    size: right_size,
                    children: right,
                },
            ) => {
                if left.len() + right.len() <= B {
                    left_size.extend(right_size.drain(..));
                    left.extend(right.drain(..));
                    std::mem::swap(left, right);
                    std::mem::swap(left_size, right_size);
                    MergeResult::Absorbed
                } else {
                    if let (Some(child), Some(sz)) = (left.pop(), left_size.pop()) {
                        right.insert(0, child);
                        right_size.insert(0, sz);
                    }
                    MergeResult::Rebalanced
                }
            }
            _ => unreachable!("siblings always have the same height"),
        }
    }

    /// Removes the element at `offset` (which must be in bounds).
    fn remove(&mut self, offset: usize) -> (T, RemoveResult) {
        let (size, children) = match self {
            Node::Leaf { data } => {
                let elt = data.remove(offset);
                let res = if data.len() < B / 2 {
                    RemoveResult::Undersize
                } else {
                    RemoveResult::Done
                };
                return (elt, res);
            }
            Node::Internal { size, children } => (size, children),
        };

        let Some((idx, child_offset)) = child_idx(size, offset) else {
            panic!("removal index {offset} out of bounds");
        };
        size[idx] -= 1;
        let (elt, res) = children[idx].remove(child_offset);
        if let RemoveResult::Done = res {
            return (elt, RemoveResult::Done);
        }

        // The child is too small: steal from, or merge with, a sibling.
        let (left_idx, merge) = if idx + 1 < children.len() {
            let (a, b) = children.split_at_mut(idx + 1);
            (idx, a[idx].merge_from_right(&mut b[0]))
        } else {
            debug_assert!(idx > 0);
            let (a, b) = children.split_at_mut(idx);
            (idx - 1, b[0].merge_from_left(&mut a[idx - 1]))
        };
        match merge {
            MergeResult::Rebalanced => {
                size[left_idx] = children[left_idx].subtree_size();
                size[left_idx + 1] = children[left_idx + 1].subtree_size();
                (elt, RemoveResult::Done)
            }
            MergeResult::Absorbed => {
                // merge_from_right leaves everything on the left, merge_from_left
                // on the right. Either way, drop the empty one.
                let (keep, drop) = if left_idx == idx {
                    (idx, idx + 1)
                } else {
                    (idx, idx - 1)
                };
                size[keep] = children[keep].subtree_size();
                children.remove(drop);
                size.remove(drop);
                if children.len() < B / 2 {
                    (elt, RemoveResult::Undersize)
                } else {
                    (elt, RemoveResult::Done)
                }
            }
        }
    }

    #[cfg(test)]
    fn check_invariants(&self, is_root: bool) {
        match self {
            Node::Leaf { data } => {
                if !is_root {
                    assert!(data.len() >= B / 2);
                }
            }
            Node::Internal { size, children } => {
                assert_eq!(size.len(), children.len());
                if !is_root {
                    assert!(size.len() >= B / 2);
                }
                for (child, size) in children.iter().zip(size) {
                    assert_eq!(child.subtree_size(), *size);
                    child.check_invariants(false);
                }
            }
        }
    }
}

impl<T, const B: usize> Default for TreeVec<T, B> {
    fn default() -> Self {
        Self {
            root: Box::new(Node::Leaf {
                data: ArrayVec::new(),
            }),
        }
    }
}

impl<T, const B: usize> TreeVec<T, B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        match &*self.root {
            Node::Leaf { data } => data.is_empty(),
            Node::Internal { .. } => false,
        }
    }

    pub fn len(&self) -> usize {
        self.root.subtree_size()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.root.get(index)
    }

    /// Inserts `element` so that it ends up at position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > self.len()`.
    pub fn insert(&mut self, index: usize, element: T) {
        let InsertResult::Split(node) = self.root.insert(index, element) else {
            return;
        };
        let old_root = std::mem::replace(
            &mut self.root,
            Box::new(Node::Internal {
                size: ArrayVec::new(),
                children: ArrayVec::new(),
            }),
        );
        if let Node::Internal { size, children } = &mut *self.root {
            size.push(old_root.subtree_size());
            size.push(node.subtree_size());
            children.push(old_root);
            children.push(node);
        }
    }

    /// Removes and returns the element at position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn remove(&mut self, index: usize) -> T {
        let (elt, _) = self.root.remove(index);

        if let Node::Internal { children, .. } = &mut *self.root {
            if children.len() == 1 {
                if let Some(child) = children.pop() {
                    self.root = child;
                }
            }
        }
        elt
    }

    /// Removes and returns the first element, if there is one.
    pub fn pop_first(&mut self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            Some(self.remove(0))
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    #[cfg(test)]
    pub fn check_invariants(&self) {
        self.root.check_invariants(true);
    }

    pub fn iter(&self) -> Iter<'_, T, B> {
        let mut ret = Iter {
            stack: Vec::new(),
            leaf: [].iter(),
            remaining: self.len(),
        };
        ret.descend(&self.root);
        ret
    }

    /// Returns the index of the first element for which `pred` is false,
    /// assuming that `pred` is true on some prefix and false afterwards.
    pub fn partition_point<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        if let Node::Leaf { data } = &*self.root {
            return data.partition_point(pred);
        }

        let mut start = 0usize;
        let mut end = self.len();
        while start < end {
            let mid = start + (end - start) / 2;
            if pred(&self[mid]) {
                start = mid + 1;
            } else {
                end = mid;
            }
        }
        start
    }

    /// Inserts `element` in sorted position, returning its index.
    ///
    /// `cmp` must be consistent with the order the elements are already in.
    /// Equal elements are inserted after the existing ones.
    pub fn insert_sorted<F>(&mut self, element: T, mut cmp: F) -> usize
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let idx = self.partition_point(|x| cmp(x, &element) != Ordering::Greater);
        self.insert(idx, element);
        idx
    }
}

impl<T: PartialEq, const B: usize> TreeVec<T, B> {
    /// Finds the position of `element`, which must be present for the search
    /// to succeed.
    ///
    /// We binary search using `cmp`, and then check for an identical element
    /// among the ones that compare equal. If that fails (which can happen if
    /// `cmp` isn't quite transitive, or if an element's sort key changed
    /// after it was inserted), we fall back to a linear scan.
    pub fn find_sorted<F>(&self, element: &T, mut cmp: F) -> Option<usize>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let start = self.partition_point(|x| cmp(x, element) == Ordering::Less);
        let mut idx = start;
        while let Some(x) = self.get(idx) {
            if x == element {
                return Some(idx);
            }
            if cmp(x, element) != Ordering::Equal {
                break;
            }
            idx += 1;
        }
        self.iter().position(|x| x == element)
    }
}

impl<T, const B: usize> FromIterator<T> for TreeVec<T, B> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ret = TreeVec::new();
        for x in iter {
            ret.insert(ret.len(), x);
        }
        ret
    }
}

impl<T, const B: usize> std::ops::Index<usize> for TreeVec<T, B> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(x) => x,
            None => panic!("index {index} out of bounds (len {})", self.len()),
        }
    }
}

pub struct Iter<'a, T, const B: usize> {
    stack: Vec<std::slice::Iter<'a, Box<Node<T, B>>>>,
    leaf: std::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T, const B: usize> Iter<'a, T, B> {
    fn descend(&mut self, mut node: &'a Node<T, B>) {
        loop {
            match node {
                Node::Leaf { data } => {
                    self.leaf = data.iter();
                    return;
                }
                Node::Internal { children, .. } => {
                    let mut children = children.iter();
                    let Some(first) = children.next() else {
                        return;
                    };
                    node = first;
                    self.stack.push(children);
                }
            }
        }
    }
}

impl<'a, T, const B: usize> Iterator for Iter<'a, T, B> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if let Some(ret) = self.leaf.next() {
            return Some(ret);
        }
        loop {
            let stack_top = self.stack.last_mut()?;
            let Some(next_node) = stack_top.next() else {
                self.stack.pop();
                continue;
            };
            self.descend(next_node);
            return self.leaf.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn insert_get() {
        let mut vec = TreeVec::<i32, 4>::default();
        for x in 1..=4 {
            vec.insert(0, x);
        }
        vec.check_invariants();
        assert_eq!(vec.iter().copied().collect::<Vec<_>>(), vec![4, 3, 2, 1]);

        for x in 1..=4 {
            vec.insert(0, x);
        }
        vec.check_invariants();
        assert_eq!(
            vec.iter().copied().collect::<Vec<_>>(),
            vec![4, 3, 2, 1, 4, 3, 2, 1]
        );
        assert_eq!(vec[5], 3);
    }

    #[test]
    fn remove_returns_element() {
        let mut vec = TreeVec::<i32, 4>::default();
        for x in 0..20 {
            vec.insert(vec.len(), x);
        }
        assert_eq!(vec.remove(5), 5);
        assert_eq!(vec.pop_first(), Some(0));
        vec.check_invariants();
        assert_eq!(vec.len(), 18);
        assert_eq!(vec.first(), Some(&1));

        while vec.pop_first().is_some() {
            vec.check_invariants();
        }
        assert!(vec.is_empty());
        assert_eq!(vec.pop_first(), None);
    }

    #[test]
    fn sorted_insert_and_find() {
        let mut vec = TreeVec::<i32, 4>::default();
        for x in [5, 1, 4, 1, 3, 9, 2, 6] {
            vec.insert_sorted(x, i32::cmp);
        }
        vec.check_invariants();
        assert_eq!(
            vec.iter().copied().collect::<Vec<_>>(),
            vec![1, 1, 2, 3, 4, 5, 6, 9]
        );
        assert_eq!(vec.find_sorted(&6, i32::cmp), Some(6));
        assert_eq!(vec.find_sorted(&7, i32::cmp), None);
    }

    #[test]
    fn find_falls_back_to_scan() {
        let mut vec = TreeVec::<i32, 4>::default();
        for x in 0..10 {
            vec.insert(vec.len(), x);
        }
        // A comparator that disagrees with the stored order.
        let backwards = |a: &i32, b: &i32| b.cmp(a);
        assert_eq!(vec.find_sorted(&7, backwards), Some(7));
    }

    proptest! {
        #[test]
        fn behaves_like_a_vec(
            ops in prop::collection::vec((any::<bool>(), 0usize..64, any::<i16>()), 0..300),
        ) {
            let mut tree = TreeVec::<i16, 6>::new();
            let mut vec = Vec::new();
            for (insert, idx, val) in ops {
                if insert || vec.is_empty() {
                    let idx = idx % (vec.len() + 1);
                    tree.insert(idx, val);
                    vec.insert(idx, val);
                } else {
                    let idx = idx % vec.len();
                    prop_assert_eq!(tree.remove(idx), vec.remove(idx));
                }
                tree.check_invariants();
            }
            prop_assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec);
        }

        #[test]
        fn partition_point_matches_slice(
            mut vals in prop::collection::vec(any::<i16>(), 0..200),
            pivot in any::<i16>(),
        ) {
            vals.sort();
            let tree = vals.iter().copied().collect::<TreeVec<i16, 4>>();
            prop_assert_eq!(
                tree.partition_point(|&x| x < pivot),
                vals.partition_point(|&x| x < pivot)
            );
        }
    }
}
