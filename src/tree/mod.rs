//! Component D (structural half): the augmented red-black tree itself.
//! `PieceTree` (in `crate::piece_tree`) owns a `Tree` plus the buffer
//! vector and drives every edit/query through it.

mod color;
pub(crate) mod node;

use std::ops::Range;
use std::rc::Rc;

use self::color::Color;
use self::node::{InternalNode, Node};
use crate::buffer::Buffer;
use crate::piece::{Piece, CHANGE_BUFFER};

#[derive(Clone, Debug)]
pub(crate) struct Tree {
    pub(crate) root: Rc<Node>,
    pub(crate) node_count: usize,
}

impl Tree {
    #[inline]
    pub(crate) fn new() -> Tree {
        Tree {
            root: Rc::new(Node::Leaf),
            node_count: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn max_height(&self) -> usize {
        #[inline(always)]
        fn log2(n: usize) -> usize {
            (usize::BITS - n.leading_zeros()) as usize
        }

        2 * log2(self.node_count + 1)
    }

    #[inline]
    pub(crate) fn total_size(&self) -> u64 {
        fn rec(n: &Node) -> u64 {
            match n {
                Node::Internal(n) => n.size_left + n.piece.length + rec(&n.right),
                _ => 0,
            }
        }
        rec(&self.root)
    }

    #[inline]
    pub(crate) fn total_lf(&self) -> u64 {
        fn rec(n: &Node) -> u64 {
            match n {
                Node::Internal(n) => n.lf_left + n.piece.lf_count as u64 + rec(&n.right),
                _ => 0,
            }
        }
        rec(&self.root)
    }

    /// Insert `piece` so that its first code unit lands at document
    /// offset `pos`. If the piece immediately preceding `pos` lives in
    /// the change buffer and is buffer-contiguous with `piece`, they are
    /// merged into one piece instead of creating a new node (§4.4.3
    /// "append to last edit").
    pub(crate) fn insert(&mut self, pos: u64, piece: Piece, buffers: &[Buffer]) {
        let inserted = insert_rec(&mut self.root, pos, piece, true, buffers);
        self.node_count += inserted.nodes;
    }

    /// Remove `range.len()` code units starting at `range.start`,
    /// splitting/merging boundary pieces via `buffers` as needed.
    pub(crate) fn remove(&mut self, range: Range<u64>, buffers: &[Buffer]) {
        let mut removed_units = 0;
        let len = range.end - range.start;

        while removed_units < len {
            let removed = remove_rec(&mut self.root, range.start, len - removed_units, true, buffers);

            if removed.node {
                self.node_count -= 1;
            }

            removed_units += removed.piece.length;

            if let Some(p) = removed.reinsert {
                removed_units -= p.length;
                let inserted = insert_rec(&mut self.root, range.start, p, true, buffers);
                self.node_count += inserted.nodes;
            }
        }
    }

    /// Descend to the node containing document offset `target`, per
    /// spec §4.4.1 `node_at`. Returns the path from root to that node
    /// plus the node's starting document offset.
    pub(crate) fn find_node(&self, mut target: u64) -> (Vec<&InternalNode>, u64) {
        let mut pos = 0;
        let mut stack = Vec::with_capacity(self.max_height());
        let mut node = self.root.as_ref();

        if node.is_leaf() {
            return (stack, pos);
        }

        loop {
            let n = node.internal_ref().unwrap();
            let left_len = n.size_left;

            pos += left_len;

            if left_len > target {
                stack.push(n);
                pos -= left_len;
                node = &n.left;
            } else if left_len == target
                || left_len + n.piece.length > target
                || (left_len + n.piece.length == target && n.right.is_leaf())
            {
                stack.push(n);
                return (stack, pos);
            } else {
                stack.push(n);
                target -= left_len + n.piece.length;
                pos += n.piece.length;
                node = &n.right;
            }
        }
    }

    /// Descend to the node containing document offset `target`, tracking
    /// both the running document offset and running document line number
    /// in the same size-based descent as [`find_node`](Self::find_node).
    /// Returns `(piece, node_start_offset, node_start_line)`, or `None`
    /// for an empty tree.
    pub(crate) fn locate_by_offset(&self, mut target: u64) -> Option<(Piece, u64, u64)> {
        let mut pos = 0u64;
        let mut line = 0u64;
        let mut node = self.root.as_ref();

        if node.is_leaf() {
            return None;
        }

        loop {
            let n = node.internal_ref().unwrap();
            let left_len = n.size_left;
            let left_lf = n.lf_left;

            pos += left_len;
            line += left_lf;

            if left_len > target {
                pos -= left_len;
                line -= left_lf;
                node = &n.left;
            } else if left_len == target
                || left_len + n.piece.length > target
                || (left_len + n.piece.length == target && n.right.is_leaf())
            {
                return Some((n.piece, pos, line));
            } else {
                target -= left_len + n.piece.length;
                pos += n.piece.length;
                line += n.piece.lf_count as u64;
                node = &n.right;
            }
        }
    }

    /// Descend to the node containing the *start* of logical line
    /// `target` (0-based), per spec §4.4.1 `node_at_line_column`'s
    /// line-descent half. Returns the path plus the node's starting
    /// document offset and starting line number.
    pub(crate) fn find_node_by_line(&self, mut target: u64) -> (Vec<&InternalNode>, u64, u64) {
        let mut pos = 0u64;
        let mut line = 0u64;
        let mut stack = Vec::with_capacity(self.max_height());
        let mut node = self.root.as_ref();

        if node.is_leaf() {
            return (stack, pos, line);
        }

        loop {
            let n = node.internal_ref().unwrap();
            let left_len = n.size_left;
            let left_lf = n.lf_left;
            let piece_lf = n.piece.lf_count as u64;

            pos += left_len;
            line += left_lf;

            if left_lf > target {
                stack.push(n);
                pos -= left_len;
                line -= left_lf;
                node = &n.left;
            } else if left_lf == target || left_lf + piece_lf > target || (left_lf + piece_lf == target && n.right.is_leaf()) {
                stack.push(n);
                return (stack, pos, line);
            } else {
                stack.push(n);
                target -= left_lf + piece_lf;
                pos += n.piece.length;
                line += piece_lf;
                node = &n.right;
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

fn black_height(node: &Rc<Node>) -> Result<u64, &'static str> {
    match node.as_ref() {
        Node::Leaf => Ok(1),
        Node::BBLeaf => Ok(2),
        Node::Internal(n) => {
            let left = black_height(&n.left)?;
            let right = black_height(&n.right)?;
            if left != right {
                return Err("black height unbalanced");
            }
            Ok(left + if n.color == Color::Black { 1 } else { 0 })
        }
    }
}

fn red_nodes_have_black_children(node: &Rc<Node>) -> bool {
    let self_ok = if node.color() == Color::Red {
        match node.as_ref() {
            Node::Internal(n) => n.left.color() == Color::Black && n.right.color() == Color::Black,
            _ => unreachable!(),
        }
    } else {
        true
    };

    match node.as_ref() {
        Node::Internal(n) => self_ok && red_nodes_have_black_children(&n.left) && red_nodes_have_black_children(&n.right),
        _ => self_ok,
    }
}

fn augmented_sums_match(node: &Rc<Node>) -> Result<(u64, u64), &'static str> {
    match node.as_ref() {
        Node::Leaf | Node::BBLeaf => Ok((0, 0)),
        Node::Internal(n) => {
            let (lsize, llf) = augmented_sums_match(&n.left)?;
            let (rsize, rlf) = augmented_sums_match(&n.right)?;
            if lsize != n.size_left || llf != n.lf_left {
                return Err("size_left/lf_left mismatch");
            }
            Ok((lsize + n.piece.length + rsize, llf + n.piece.lf_count as u64 + rlf))
        }
    }
}

/// Validate properties (1)-(6) of §3: the red/black invariants plus the
/// augmented `size_left`/`lf_left` sums. Always compiled (callers wrap
/// it in `debug_assert!`, per §7) since release builds elide the call
/// entirely rather than paying for a cfg(test)-only helper.
pub(crate) fn check_invariants(tree: &Tree) -> Result<(), &'static str> {
    if tree.root.color() != Color::Black {
        return Err("root is not black");
    }
    black_height(&tree.root)?;
    if !red_nodes_have_black_children(&tree.root) {
        return Err("red node has a red child");
    }
    augmented_sums_match(&tree.root)?;
    Ok(())
}

struct Inserted {
    nodes: usize,
    size: u64,
    lf: u64,
}

fn buffer_contiguous(buffers: &[Buffer], left: &Piece, right_start: crate::buffer::BufferPosition) -> bool {
    left.buffer_index == CHANGE_BUFFER
        && buffers[left.buffer_index as usize].offset_of(left.end)
            == buffers[left.buffer_index as usize].offset_of(right_start)
}

fn insert_rec(
    node: &mut Rc<Node>,
    mut index: u64,
    piece: Piece,
    at_root: bool,
    buffers: &[Buffer],
) -> Inserted {
    if node.is_leaf() {
        let color = if at_root { Color::Black } else { Color::Red };
        let ins = Inserted {
            nodes: 1,
            size: piece.length,
            lf: piece.lf_count as u64,
        };
        *node = Rc::new(Node::new(color, piece));
        return ins;
    }

    let n = Rc::make_mut(node).internal().unwrap();
    let left_len = n.size_left;

    let inserted = if left_len > index {
        let ret = insert_rec(&mut n.left, index, piece, false, buffers);
        n.size_left += ret.size;
        n.lf_left += ret.lf;
        ret
    } else if left_len == index {
        let ins = Inserted {
            nodes: 1,
            size: piece.length,
            lf: piece.lf_count as u64,
        };
        n.insert_left(piece);
        n.size_left += ins.size;
        n.lf_left += ins.lf;
        ins
    } else if left_len + n.piece.length == index {
        if buffer_contiguous(buffers, &n.piece, piece.start) {
            n.piece.grow_end(&buffers[n.piece.buffer_index as usize], piece.end);
            Inserted {
                nodes: 0,
                size: piece.length,
                lf: piece.lf_count as u64,
            }
        } else {
            let ins = Inserted {
                nodes: 1,
                size: piece.length,
                lf: piece.lf_count as u64,
            };
            n.insert_right(piece);
            ins
        }
    } else if left_len + n.piece.length > index {
        let buffer = &buffers[n.piece.buffer_index as usize];
        let rel = index - left_len;
        let abs = buffer.offset_of(n.piece.start) + rel;
        let split_at = buffer.position_of_bounded(abs, n.piece.start.line, n.piece.end.line);
        let (left_half, right_half) = n.piece.split_at(buffer, split_at);
        n.piece = left_half;

        let ins = Inserted {
            nodes: 2,
            size: piece.length,
            lf: piece.lf_count as u64,
        };
        n.insert_right(right_half);
        n.insert_right(piece);
        ins
    } else {
        index -= left_len + n.piece.length;
        insert_rec(&mut n.right, index, piece, false, buffers)
    };

    if inserted.nodes > 0 {
        n.balance();
    }

    if at_root {
        n.color = Color::Black;
    }

    inserted
}

struct Removed {
    piece: Piece,
    node: bool,
    reinsert: Option<Piece>,
}

fn remove_rec(
    node: &mut Rc<Node>,
    mut index: u64,
    len: u64,
    at_root: bool,
    buffers: &[Buffer],
) -> Removed {
    if node.is_leaf() {
        unreachable!("remove_rec reached a leaf");
    }

    let node_ref = Rc::make_mut(node);
    let n = node_ref.internal().unwrap();
    let n_left_len = n.size_left;
    let n_piece_len = n.piece.length;

    let (removed, remove_cur_node) = if n_left_len > index {
        let removed = remove_rec(&mut n.left, index, len, false, buffers);
        n.size_left -= removed.piece.length;
        n.lf_left -= removed.piece.lf_count as u64;
        (removed, false)
    } else if n_left_len == index {
        if len >= n_piece_len {
            (
                Removed {
                    piece: n.piece,
                    node: true,
                    reinsert: None,
                },
                true,
            )
        } else {
            let buffer = &buffers[n.piece.buffer_index as usize];
            let abs = buffer.offset_of(n.piece.start) + len;
            let split_at = buffer.position_of_bounded(abs, n.piece.start.line, n.piece.end.line);
            let (removed_half, remaining_half) = n.piece.split_at(buffer, split_at);
            n.piece = remaining_half;
            (
                Removed {
                    piece: removed_half,
                    node: false,
                    reinsert: None,
                },
                false,
            )
        }
    } else if n_left_len + n_piece_len > index {
        let buffer = &buffers[n.piece.buffer_index as usize];
        let split_off = index - n_left_len;
        let split_abs = buffer.offset_of(n.piece.start) + split_off;
        let split_at = buffer.position_of_bounded(split_abs, n.piece.start.line, n.piece.end.line);
        let (left_half, right_piece) = n.piece.split_at(buffer, split_at);
        n.piece = left_half;

        let removed_piece = right_piece;
        let reinsert = if len >= right_piece.length {
            None
        } else {
            let end_abs = buffer.offset_of(right_piece.start) + len;
            let end_at = buffer.position_of_bounded(end_abs, right_piece.start.line, right_piece.end.line);
            let (_removed, remaining) = right_piece.split_at(buffer, end_at);
            Some(remaining)
        };

        (
            Removed {
                piece: removed_piece,
                node: false,
                reinsert,
            },
            false,
        )
    } else {
        index -= n_left_len + n_piece_len;
        let removed = remove_rec(&mut n.right, index, len, false, buffers);
        (removed, false)
    };

    if remove_cur_node {
        node_ref.remove();
    } else if removed.node {
        node_ref.internal().unwrap().bubble();
    }

    if at_root {
        if let Node::Internal(n) = node_ref {
            n.color = Color::Black;
        } else {
            *node = Rc::new(Node::Leaf);
        }
    }

    removed
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::buffer::BufferPosition;

    fn one_buffer(text: &str) -> Vec<Buffer> {
        vec![Buffer::from_units(text.encode_utf16().collect())]
    }

    fn piece(buffers: &[Buffer], start: u32, end: u32) -> Piece {
        let b = &buffers[0];
        let s = b.position_of(start as u64);
        let e = b.position_of(end as u64);
        Piece::new(b, CHANGE_BUFFER, s, e)
    }

    #[test]
    fn insert_and_find() {
        let buffers = one_buffer("hello world");
        let mut tree = Tree::new();
        tree.insert(0, piece(&buffers, 0, 11), &buffers);
        assert_eq!(tree.total_size(), 11);
        let (stack, pos) = tree.find_node(5);
        assert_eq!(pos, 0);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn split_on_mid_insert() {
        let buffers = one_buffer("helloworld");
        let mut tree = Tree::new();
        tree.insert(0, piece(&buffers, 0, 10), &buffers);
        // second buffer for the inserted text
        let mut buffers2 = buffers;
        buffers2.push(Buffer::from_units(" ".encode_utf16().collect()));
        let b1 = &buffers2[1];
        let p = Piece::new(b1, 1, BufferPosition::new(0, 0), BufferPosition::new(0, 1));
        tree.insert(5, p, &buffers2);
        assert_eq!(tree.total_size(), 11);
        assert_eq!(tree.node_count, 3);
    }

    #[test]
    fn remove_whole_and_partial() {
        let buffers = one_buffer("abcdefghij");
        let mut tree = Tree::new();
        tree.insert(0, piece(&buffers, 0, 10), &buffers);
        tree.remove(2..7, &buffers);
        assert_eq!(tree.total_size(), 5);
    }

    pub(crate) fn is_valid_tree(tree: &Tree) -> Result<(), &'static str> {
        super::check_invariants(tree)
    }

    #[test]
    fn random_inserts_stay_valid() {
        let buffers = one_buffer("0123456789");
        let mut tree = Tree::new();
        for i in 0..10u32 {
            tree.insert(i as u64, piece(&buffers, i, i + 1), &buffers);
            assert_eq!(Ok(()), is_valid_tree(&tree));
        }
    }
}
