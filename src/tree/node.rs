//! Component C (tree-node half): red-black tree nodes carrying a piece
//! plus the two augmented sums `size_left`/`lf_left` (spec §3).
//!
//! Nodes are persistent (`Rc`-shared, copy-on-write): there are no
//! parent pointers and no sentinel — "nil" is the `Node::Leaf` variant.
//! Insertion/removal are recursive and rebuild the path to the root,
//! rebalancing with `InternalNode::balance` (Okasaki's insertion cases
//! and Matt Might's deletion cases, unified). Every rotation case below
//! updates `size_left` and `lf_left` in lockstep, since `lf_left` is the
//! same kind of augmented sum as `size_left`, just over `lf_count`
//! instead of `length`.

use std::mem;
use std::rc::Rc;

use super::color::Color;
use crate::piece::Piece;

/// A node in the tree. `Leaf` is every nil child; `BBLeaf` is the
/// transient "double black" nil produced mid-deletion.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Node {
    Leaf,
    BBLeaf,
    Internal(InternalNode),
}

impl Node {
    #[inline]
    pub(crate) fn new(color: Color, piece: Piece) -> Node {
        Node::Internal(InternalNode::new(color, piece))
    }

    #[inline]
    pub(crate) fn color(&self) -> Color {
        match self {
            Node::Internal(n) => n.color,
            Node::Leaf => Color::Black,
            Node::BBLeaf => Color::BlackBlack,
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        !matches!(self, Node::Internal(_))
    }

    #[inline]
    pub(crate) fn redden(&mut self) {
        match self {
            Node::Leaf => unreachable!("reddening a Leaf"),
            Node::BBLeaf => *self = Node::Leaf,
            Node::Internal(n) => n.redden(),
        }
    }

    #[inline]
    pub(crate) fn internal(&mut self) -> Option<&mut InternalNode> {
        match self {
            Node::Internal(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn internal_ref(&self) -> Option<&InternalNode> {
        match self {
            Node::Internal(n) => Some(n),
            _ => None,
        }
    }

    /// Remove the piece held by this (leaf-adjacent) node. Mirrors the
    /// textbook RB-tree delete cases via Might's bubbling scheme.
    pub(crate) fn remove(&mut self) {
        match self {
            Node::Internal(n) => match (n.left.is_leaf(), n.right.is_leaf()) {
                (true, true) => match self.color() {
                    Color::Red => *self = Node::Leaf,
                    Color::Black => *self = Node::BBLeaf,
                    _ => unreachable!(),
                },
                (true, false) => {
                    if n.color == Color::Black && n.right.color() == Color::Red {
                        let mut right = n.take_right();
                        let right = Rc::make_mut(&mut right).internal().unwrap();
                        mem::swap(n, right);
                        n.color = Color::Black;
                    }
                }
                (false, true) => {
                    if n.color == Color::Black && n.left.color() == Color::Red {
                        let mut left = n.take_left();
                        let left = Rc::make_mut(&mut left).internal().unwrap();
                        mem::swap(n, left);
                        n.color = Color::Black;
                    }
                }
                (false, false) => {
                    let left = Rc::make_mut(&mut n.left);
                    let piece = left.remove_max();
                    n.size_left -= piece.length;
                    n.lf_left -= piece.lf_count as u64;
                    n.piece = piece;
                    n.bubble();
                }
            },
            _ => unreachable!("remove() called on a non-internal node"),
        }
    }

    /// Remove and return the in-order-last piece of this subtree.
    pub(crate) fn remove_max(&mut self) -> Piece {
        fn rec(node: &mut Node) -> Piece {
            match node {
                Node::Internal(n) => {
                    if n.right.is_leaf() {
                        let piece = n.piece;
                        node.remove();
                        piece
                    } else {
                        let right = Rc::make_mut(&mut n.right);
                        let piece = rec(right);
                        n.bubble();
                        piece
                    }
                }
                _ => unreachable!("remove_max() reached a leaf"),
            }
        }

        rec(self)
    }
}

impl From<InternalNode> for Node {
    fn from(n: InternalNode) -> Self {
        Node::Internal(n)
    }
}

/// An internal (non-nil) node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InternalNode {
    pub(crate) left: Rc<Node>,
    pub(crate) right: Rc<Node>,
    pub(crate) color: Color,

    pub(crate) piece: Piece,
    /// Total `length` of every piece in the left subtree (spec §3).
    pub(crate) size_left: u64,
    /// Total `lf_count` of every piece in the left subtree (spec §3).
    pub(crate) lf_left: u64,
}

impl InternalNode {
    pub(crate) fn new(color: Color, piece: Piece) -> InternalNode {
        InternalNode {
            left: Rc::new(Node::Leaf),
            right: Rc::new(Node::Leaf),
            color,
            piece,
            size_left: 0,
            lf_left: 0,
        }
    }

    /// Matt Might's deletion bubbling: propagate a transient
    /// `BlackBlack` child upward, then rebalance.
    pub(crate) fn bubble(&mut self) {
        use Color::BlackBlack as BB;

        if self.left.color() == BB || self.right.color() == BB {
            self.blacken();
            Rc::make_mut(&mut self.left).redden();
            Rc::make_mut(&mut self.right).redden();
        }

        self.balance();
    }

    #[inline]
    pub(crate) fn blacken(&mut self) {
        self.color.blacken();
    }

    #[inline]
    pub(crate) fn redden(&mut self) {
        self.color.redden();
    }

    #[inline]
    pub(crate) fn take_left(&mut self) -> Rc<Node> {
        mem::replace(&mut self.left, Rc::new(Node::Leaf))
    }

    #[inline]
    pub(crate) fn take_right(&mut self) -> Rc<Node> {
        mem::replace(&mut self.right, Rc::new(Node::Leaf))
    }

    /// Insert `piece` as the new in-order-first element of this subtree.
    pub(crate) fn insert_left(&mut self, piece: Piece) {
        fn ins_right(node: &mut InternalNode, piece: Piece) {
            let right = Rc::make_mut(&mut node.right);
            match right {
                Node::Internal(r) => {
                    ins_right(r, piece);
                    r.balance();
                }
                _ => node.right = Rc::new(InternalNode::new(Color::Red, piece).into()),
            }
        }

        let left = Rc::make_mut(&mut self.left);
        match left {
            Node::Internal(l) => {
                ins_right(l, piece);
                l.balance();
            }
            _ => self.left = Rc::new(InternalNode::new(Color::Red, piece).into()),
        }
    }

    /// Insert `piece` as the new in-order-last element of this subtree.
    pub(crate) fn insert_right(&mut self, piece: Piece) {
        fn ins_left(node: &mut InternalNode, piece: Piece) {
            node.size_left += piece.length;
            node.lf_left += piece.lf_count as u64;

            let left = Rc::make_mut(&mut node.left);
            match left {
                Node::Internal(l) => {
                    ins_left(l, piece);
                    l.balance();
                }
                _ => node.left = Rc::new(InternalNode::new(Color::Red, piece).into()),
            }
        }

        let right = Rc::make_mut(&mut self.right);
        match right {
            Node::Internal(r) => {
                ins_left(r, piece);
                r.balance();
            }
            _ => self.right = Rc::new(InternalNode::new(Color::Red, piece).into()),
        }
    }

    /// Okasaki's insertion cases and Might's deletion cases, combined
    /// (they're structurally the same rotation). Every branch updates
    /// `size_left` and `lf_left` together: `lf_left` tracks the exact
    /// same rotation `size_left` does, just summing `lf_count` instead
    /// of `length`.
    pub(crate) fn balance(&mut self) {
        use Color::{Black as B, NegativeBlack as NB, Red as R};

        #[inline]
        fn internal_color(n: &Rc<Node>) -> Option<Color> {
            match n.as_ref() {
                Node::Internal(n) => Some(n.color),
                _ => None,
            }
        }

        #[inline]
        fn internal_tree_colors(n: &Rc<Node>) -> (Option<Color>, Option<Color>, Option<Color>) {
            match n.as_ref() {
                Node::Internal(n) => (Some(n.color), internal_color(&n.left), internal_color(&n.right)),
                _ => (None, None, None),
            }
        }

        if self.color == R || self.color == NB {
            return;
        }

        let (color_l, color_l_l, color_l_r) = internal_tree_colors(&self.left);
        let (color_r, color_r_l, color_r_r) = internal_tree_colors(&self.right);

        match (color_l, color_l_l, color_l_r, color_r, color_r_l, color_r_r) {
            (Some(R), Some(R), ..) => {
                // left-left red-red violation
                let mut y_ptr = self.take_left();
                let y = Rc::make_mut(&mut y_ptr).internal().unwrap();
                let mut x_ptr = y.take_left();
                Rc::make_mut(&mut x_ptr).internal().unwrap().color = B;

                self.color.redden();
                y.color = B;

                self.size_left -= y.piece.length + y.size_left;
                self.lf_left -= y.piece.lf_count as u64 + y.lf_left;

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.size_left, &mut y.size_left);
                mem::swap(&mut self.lf_left, &mut y.lf_left);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut self.right, &mut y.right);

                self.left = x_ptr;
                self.right = y_ptr;
            }
            (Some(R), _, Some(R), ..) => {
                // left-right red-red violation
                let mut x_ptr = self.take_left();
                let x = Rc::make_mut(&mut x_ptr).internal().unwrap();
                let mut y_ptr = x.take_right();
                let y = Rc::make_mut(&mut y_ptr).internal().unwrap();

                self.redden();
                x.color = B;
                y.color = B;

                self.size_left -= x.piece.length + x.size_left + y.size_left + y.piece.length;
                self.lf_left -=
                    x.piece.lf_count as u64 + x.lf_left + y.lf_left + y.piece.lf_count as u64;

                y.size_left += x.piece.length + x.size_left;
                y.lf_left += x.piece.lf_count as u64 + x.lf_left;

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.size_left, &mut y.size_left);
                mem::swap(&mut self.lf_left, &mut y.lf_left);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut x.right, &mut y.right);
                mem::swap(&mut self.right, &mut y.right);

                self.right = y_ptr;
                self.left = x_ptr;
            }
            (.., Some(R), Some(R), _) => {
                // right-left red-red violation
                let mut z_ptr = self.take_right();
                let z = Rc::make_mut(&mut z_ptr).internal().unwrap();
                let mut y_ptr = z.take_left();
                let y = Rc::make_mut(&mut y_ptr).internal().unwrap();

                self.color.redden();
                z.color = B;
                y.color = B;

                z.size_left -= y.size_left + y.piece.length;
                z.lf_left -= y.lf_left + y.piece.lf_count as u64;

                y.size_left += self.size_left + self.piece.length;
                y.lf_left += self.lf_left + self.piece.lf_count as u64;

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.size_left, &mut y.size_left);
                mem::swap(&mut self.lf_left, &mut y.lf_left);
                mem::swap(&mut z.left, &mut y.right);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut self.left, &mut y.left);

                self.left = y_ptr;
                self.right = z_ptr;
            }
            (.., Some(R), _, Some(R)) => {
                // right-right red-red violation
                let mut y_ptr = self.take_right();
                let y = Rc::make_mut(&mut y_ptr).internal().unwrap();
                let mut z_ptr = y.take_right();
                let z = Rc::make_mut(&mut z_ptr).internal().unwrap();

                self.color.redden();
                y.color = B;
                z.color = B;

                y.size_left += self.size_left + self.piece.length;
                y.lf_left += self.lf_left + self.piece.lf_count as u64;

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.size_left, &mut y.size_left);
                mem::swap(&mut self.lf_left, &mut y.lf_left);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut self.left, &mut y.left);

                self.right = z_ptr;
                self.left = y_ptr;
            }
            (.., Some(NB), Some(B), Some(B)) => {
                // Might's negative-black case, right side
                let mut z_ptr = self.take_right();
                let z = Rc::make_mut(&mut z_ptr).internal().unwrap();
                let mut y_ptr = z.take_left();
                let y = Rc::make_mut(&mut y_ptr).internal().unwrap();
                let mut w_ptr = z.take_right();
                let w = Rc::make_mut(&mut w_ptr).internal().unwrap();

                self.color = B;
                z.color = B;
                y.color = B;
                w.color = R;

                z.size_left -= y.piece.length + y.size_left;
                z.lf_left -= y.piece.lf_count as u64 + y.lf_left;

                y.size_left = self.size_left + y.size_left + self.piece.length;
                y.lf_left = self.lf_left + y.lf_left + self.piece.lf_count as u64;

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.size_left, &mut y.size_left);
                mem::swap(&mut self.lf_left, &mut y.lf_left);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut y.left, &mut self.left);

                mem::swap(&mut self.left, &mut z.left);

                z.right = w_ptr;
                z.balance();

                self.left = y_ptr;
                self.right = z_ptr;
            }
            (Some(NB), Some(B), Some(B), ..) => {
                // Might's negative-black case, left side
                let mut x_ptr = self.take_left();
                let x = Rc::make_mut(&mut x_ptr).internal().unwrap();
                let mut w_ptr = x.take_left();
                let w = Rc::make_mut(&mut w_ptr).internal().unwrap();
                let mut y_ptr = x.take_right();
                let y = Rc::make_mut(&mut y_ptr).internal().unwrap();

                self.color = B;
                x.color = B;
                y.color = B;
                w.color = R;

                self.size_left -= x.piece.length + x.size_left + y.piece.length + y.size_left;
                self.lf_left -=
                    x.piece.lf_count as u64 + x.lf_left + y.piece.lf_count as u64 + y.lf_left;

                y.size_left += x.piece.length + x.size_left;
                y.lf_left += x.piece.lf_count as u64 + x.lf_left;

                mem::swap(&mut self.piece, &mut y.piece);
                mem::swap(&mut self.size_left, &mut y.size_left);
                mem::swap(&mut self.lf_left, &mut y.lf_left);
                mem::swap(&mut y.left, &mut y.right);
                mem::swap(&mut self.right, &mut y.right);
                mem::swap(&mut self.right, &mut x.right);

                x.left = w_ptr;
                x.balance();

                self.left = x_ptr;
                self.right = y_ptr;
            }
            _ => {}
        }
    }
}
