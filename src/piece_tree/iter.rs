//! Component D: in-order piece iteration over the persistent tree,
//! grounded on the teacher's stack-based `PieceIter` (its
//! `tree/pieces.rs`), adapted from parent pointers to the `Rc`-shared,
//! parent-pointer-free node shape this crate uses. Ascending a right
//! subtree's absence is detected by pointer identity against the child
//! stored in the node just popped, rather than by comparing to a parent
//! pointer the node itself doesn't have.

use crate::piece::Piece;
use crate::tree::node::{InternalNode, Node};
use crate::tree::Tree;

#[derive(Clone)]
pub(crate) struct PieceIter<'a> {
    stack: Vec<&'a InternalNode>,
    pos: u64,
    len: u64,
}

impl<'a> PieceIter<'a> {
    /// Start just before the node containing document offset `at` (or
    /// past-the-end if `at` is at or beyond the tree's total size).
    pub(crate) fn new(tree: &'a Tree, at: u64) -> Self {
        let len = tree.total_size();
        if at >= len {
            PieceIter {
                stack: Vec::new(),
                pos: len,
                len,
            }
        } else {
            let (stack, pos) = tree.find_node(at);
            PieceIter { stack, pos, len }
        }
    }

    /// The node currently pointed at, with its starting document offset.
    pub(crate) fn get(&self) -> Option<(u64, Piece)> {
        self.stack.last().map(|n| (self.pos, n.piece))
    }

    fn tree_next(&mut self) -> Option<Piece> {
        let node = *self.stack.last()?;

        if let Node::Internal(right) = node.right.as_ref() {
            self.stack.push(right);
            let mut cur = right;
            while let Node::Internal(left) = cur.left.as_ref() {
                self.stack.push(left);
                cur = left;
            }
            return Some(cur.piece);
        }

        let mut came_from: *const InternalNode = self.stack.pop()?;
        while let Some(&top) = self.stack.last() {
            let ascended_from_left = matches!(
                top.left.as_ref(),
                Node::Internal(l) if std::ptr::eq(l as *const InternalNode, came_from)
            );
            if ascended_from_left {
                return Some(top.piece);
            }
            came_from = self.stack.pop()?;
        }
        None
    }

    /// Advance to, and return, the next piece in order.
    pub(crate) fn next(&mut self) -> Option<(u64, Piece)> {
        let (_, cur) = self.get()?;
        match self.tree_next() {
            Some(p) => {
                self.pos += cur.length;
                Some((self.pos, p))
            }
            None => {
                self.pos = self.len;
                self.stack.clear();
                None
            }
        }
    }
}
