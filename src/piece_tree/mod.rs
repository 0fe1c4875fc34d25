//! Component D: the piece tree itself — the balanced tree plus every
//! edit/query algorithm, CRLF stitching, and the search cache (spec
//! §4.4). Grounded on the teacher's top-level `piece_tree.rs` facade:
//! same split between a thin public surface and query logic that walks
//! the tree, but built over UTF-16 code units instead of bytes and over
//! the persistent `tree::Tree` instead of the teacher's mutable one.

mod cache;
mod eol;
mod iter;

use std::cell::RefCell;

pub use self::eol::EndOfLine;

use self::cache::{CacheEntry, SearchCache};
use self::iter::PieceIter;
use crate::buffer::{Buffer, BufferPosition};
use crate::piece::{Piece, CHANGE_BUFFER};
use crate::tree::Tree;

const CR: u16 = 0x000D;
const LF: u16 = 0x000A;

/// Large-insert chunking threshold (§9): content longer than this is
/// split across several immutable buffers instead of grown in place.
const AVERAGE_BUFFER_SIZE: u64 = 65535;

/// A persistent-style text buffer: an append-only set of immutable
/// string chunks plus one mutable change buffer, indexed by a
/// red-black tree augmented with per-subtree length and line-feed sums.
///
/// Coordinates: offsets are 0-based code units; lines and columns are
/// 1-based, with column `line_length + 1` denoting one past the last
/// code unit of a line (spec §6).
#[derive(Debug)]
pub struct PieceTree {
    buffers: Vec<Buffer>,
    tree: Tree,
    length: u64,
    line_count: u64,
    eol: EndOfLine,
    eol_normalized: bool,
    search_cache: RefCell<SearchCache>,
    last_line: RefCell<Option<(u64, String)>>,
}

impl PieceTree {
    /// Build a tree from an ordered sequence of initial chunks; each
    /// becomes an immutable buffer at indices `1..=chunks.len()`, with
    /// buffer 0 starting out as the empty change buffer.
    pub fn new(chunks: Vec<String>, eol: EndOfLine, eol_normalized: bool) -> PieceTree {
        let mut buffers = vec![Buffer::empty()];
        let mut tree = Tree::new();
        let mut pos = 0u64;

        for chunk in chunks {
            let units: Vec<u16> = chunk.encode_utf16().collect();
            if units.is_empty() {
                continue;
            }
            let buffer = Buffer::from_units(units);
            let end = buffer.end_position();
            let buf_index = buffers.len() as u32;
            let piece = Piece::new(&buffer, buf_index, BufferPosition::new(0, 0), end);
            buffers.push(buffer);

            let len = piece.length;
            tree.insert(pos, piece, &buffers);
            pos += len;
        }

        let length = tree.total_size();
        let line_count = tree.total_lf() + 1;

        PieceTree {
            buffers,
            tree,
            length,
            line_count,
            eol,
            eol_normalized,
            search_cache: RefCell::new(SearchCache::new()),
            last_line: RefCell::new(None),
        }
    }

    #[inline]
    pub fn length(&self) -> u64 {
        self.length
    }

    #[inline]
    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    #[inline]
    pub fn eol(&self) -> EndOfLine {
        self.eol
    }

    #[inline]
    pub fn eol_normalized(&self) -> bool {
        self.eol_normalized
    }

    /// Insert `text` at `offset`, clamped to `[0, length]`. A no-op for
    /// empty text (P7).
    pub fn insert(&mut self, offset: u64, text: &str, eol_normalized: bool) {
        let offset = offset.min(self.length);
        let units: Vec<u16> = text.encode_utf16().collect();
        if units.is_empty() {
            return;
        }

        self.eol_normalized = self.eol_normalized && eol_normalized;

        let pieces = self.create_pieces(&units);
        let mut pos = offset;
        for piece in pieces {
            let len = piece.length;
            self.tree.insert(pos, piece, &self.buffers);
            pos += len;
        }
        let end = pos;

        self.length = self.tree.total_size();
        self.line_count = self.tree.total_lf() + 1;

        self.stitch_crlf(offset);
        self.stitch_crlf(end);

        self.length = self.tree.total_size();
        self.line_count = self.tree.total_lf() + 1;

        self.search_cache.borrow_mut().invalidate_from(offset);
        self.last_line.borrow_mut().take();
    }

    /// Remove `count` code units starting at `offset`. A no-op when
    /// `count == 0` (P7); both `offset` and `offset + count` are
    /// clamped to `[0, length]`.
    pub fn delete(&mut self, offset: u64, count: u64) {
        if count == 0 {
            return;
        }
        let start = offset.min(self.length);
        let end = (start + count).min(self.length);
        if start >= end {
            return;
        }

        self.tree.remove(start..end, &self.buffers);

        self.length = self.tree.total_size();
        self.line_count = self.tree.total_lf() + 1;

        self.stitch_crlf(start);

        self.length = self.tree.total_size();
        self.line_count = self.tree.total_lf() + 1;

        self.search_cache.borrow_mut().invalidate_from(start);
        self.last_line.borrow_mut().take();
    }

    /// Rebuild every buffer under `new_eol`, rewriting every `\r`,
    /// `\n`, and `\r\n` to it (§4.4.6). Sets `eol_normalized = true`.
    pub fn set_eol(&mut self, new_eol: EndOfLine) {
        log::debug!("rewriting eol from {:?} to {:?}, rebuilding {} buffers", self.eol, new_eol, self.buffers.len());
        let whole = self.units_in_range(0, self.length);
        let rewritten = rewrite_eol_units(&whole, new_eol);

        let lo = (AVERAGE_BUFFER_SIZE * 2 / 3) as usize;
        let hi = (AVERAGE_BUFFER_SIZE * 2) as usize;

        let mut buffers = vec![Buffer::empty()];
        let mut tree = Tree::new();
        let mut pos = 0u64;
        let mut start = 0usize;

        while start < rewritten.len() {
            let target = if rewritten.len() - start <= hi {
                rewritten.len()
            } else {
                (start + lo).max(start + 1)
            };
            let end = find_chunk_end(&rewritten, start, (target - start).max(1));

            let chunk = rewritten[start..end].to_vec();
            let buffer = Buffer::from_units(chunk);
            let end_pos = buffer.end_position();
            let buf_index = buffers.len() as u32;
            let piece = Piece::new(&buffer, buf_index, BufferPosition::new(0, 0), end_pos);
            buffers.push(buffer);

            let len = piece.length;
            tree.insert(pos, piece, &buffers);
            pos += len;
            start = end;
        }

        self.buffers = buffers;
        self.tree = tree;
        self.length = self.tree.total_size();
        self.line_count = self.tree.total_lf() + 1;
        self.eol = new_eol;
        self.eol_normalized = true;

        self.search_cache.borrow_mut().clear();
        self.last_line.borrow_mut().take();
    }

    /// Content of code units `[start, end)`, rewriting line terminators
    /// to `eol` whenever it differs from the tree's own EOL, or
    /// whenever the tree isn't EOL-normalised (spec §9, Open Question
    /// 2).
    pub fn value_in_range(&self, start: (u64, u64), end: (u64, u64), eol: Option<EndOfLine>) -> String {
        let start_off = self.offset_at(start.0, start.1);
        let end_off = self.offset_at(end.0, end.1).max(start_off);
        let units = self.units_in_range(start_off, end_off);

        let rewrite = eol.is_some_and(|e| e != self.eol) || !self.eol_normalized;
        if rewrite {
            let target = eol.unwrap_or(self.eol);
            String::from_utf16_lossy(&rewrite_eol_units(&units, target))
        } else {
            String::from_utf16_lossy(&units)
        }
    }

    /// Line `n`'s content (1-based), without its terminator.
    pub fn line_content(&self, n: u64) -> String {
        if let Some((cached_n, cached)) = self.last_line.borrow().as_ref() {
            if *cached_n == n {
                return cached.clone();
            }
        }
        let (start, end) = self.line_span(n);
        let units = self.units_in_range(start, end);
        let s = String::from_utf16_lossy(&units);
        *self.last_line.borrow_mut() = Some((n, s.clone()));
        s
    }

    /// Line `n`'s content including its terminator, minus
    /// `trailing_skip` trailing code units.
    pub fn line_raw_content(&self, n: u64, trailing_skip: u64) -> String {
        let (start, end, _) = self.line_bounds(n);
        let end = end.saturating_sub(trailing_skip).max(start);
        String::from_utf16_lossy(&self.units_in_range(start, end))
    }

    /// Every line's content, without terminators, merging a `\r` ending
    /// one piece with a `\n` starting the next into a single break even
    /// when the tree hasn't (yet) stitched them (§4.4.7).
    pub fn lines_content(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current: Vec<u16> = Vec::new();
        let mut dangling_cr = false;

        let mut iter = PieceIter::new(&self.tree, 0);
        while let Some((_, piece)) = iter.get() {
            let units = self.piece_units(&piece);
            let mut i = 0;

            if dangling_cr {
                if units.first() == Some(&LF) {
                    i = 1;
                }
                lines.push(String::from_utf16_lossy(&current));
                current.clear();
                dangling_cr = false;
            }

            while i < units.len() {
                let u = units[i];
                if u == CR {
                    if i + 1 < units.len() {
                        lines.push(String::from_utf16_lossy(&current));
                        current.clear();
                        i += if units[i + 1] == LF { 2 } else { 1 };
                    } else {
                        dangling_cr = true;
                        i += 1;
                    }
                    continue;
                }
                if u == LF {
                    lines.push(String::from_utf16_lossy(&current));
                    current.clear();
                    i += 1;
                    continue;
                }
                current.push(u);
                i += 1;
            }

            if iter.next().is_none() {
                break;
            }
        }

        if dangling_cr {
            lines.push(String::from_utf16_lossy(&current));
            current.clear();
        }
        lines.push(String::from_utf16_lossy(&current));
        lines
    }

    /// Length of line `n` excluding its terminator.
    pub fn line_length(&self, n: u64) -> u64 {
        let (start, end) = self.line_span(n);
        end - start
    }

    /// The code unit at document offset `offset`, or `None` past the
    /// end of the document.
    pub fn char_code_at(&self, offset: u64) -> Option<u16> {
        if offset >= self.length {
            return None;
        }

        if let Some(entry) = self.search_cache.borrow().get(offset) {
            let remainder = offset - entry.node_start_offset;
            let buffer = &self.buffers[entry.piece.buffer_index as usize];
            let start_off = buffer.offset_of(entry.piece.start);
            return Some(buffer.text()[(start_off + remainder) as usize]);
        }

        let (piece, node_start, _) = self.tree.locate_by_offset(offset)?;
        self.search_cache.borrow_mut().put(CacheEntry {
            node_start_offset: node_start,
            piece,
        });
        let remainder = offset - node_start;
        let buffer = &self.buffers[piece.buffer_index as usize];
        let start_off = buffer.offset_of(piece.start);
        Some(buffer.text()[(start_off + remainder) as usize])
    }

    /// The code unit at 0-based `idx` within line `line` (1-based), or
    /// `None` if `idx` is at or past the line's (terminator-excluded)
    /// length.
    pub fn line_char_code(&self, line: u64, idx: u64) -> Option<u16> {
        let (start, end) = self.line_span(line);
        let offset = start + idx;
        if offset >= end {
            return None;
        }
        self.char_code_at(offset)
    }

    /// Convert a 1-based `(line, column)` position to a 0-based offset,
    /// clamping `column` to the line's valid range `[1, line_length +
    /// 1]`.
    pub fn offset_at(&self, line: u64, column: u64) -> u64 {
        let (start, end) = self.line_span(line);
        let col0 = column.max(1) - 1;
        start + col0.min(end - start)
    }

    /// Convert a 0-based offset to a 1-based `(line, column)` position.
    ///
    /// The line is found via a single tree descent (counting internal
    /// buffer line-starts crossed within the located piece, which is
    /// safe regardless of where the piece sits within its buffer).
    /// Column is then `offset - line_start_offset(line)`: computing it
    /// from the piece's own buffer-relative column instead would
    /// conflate that column with orphaned buffer content that used to
    /// precede the piece on the same buffer line but isn't part of the
    /// document's line at all (content a split/delete left behind in
    /// the buffer without it being part of any surviving piece).
    pub fn position_at(&self, offset: u64) -> (u64, u64) {
        let offset = offset.min(self.length);
        let (piece, node_start, node_start_line) = match self.tree.locate_by_offset(offset) {
            Some(x) => x,
            None => return (1, 1),
        };

        let remainder = offset - node_start;
        let buffer = &self.buffers[piece.buffer_index as usize];
        let piece_start_off = buffer.offset_of(piece.start);
        let pos_in_buf = buffer.position_of_bounded(piece_start_off + remainder, piece.start.line, piece.end.line);

        let line0 = node_start_line + (pos_in_buf.line - piece.start.line) as u64;
        let line_start = self.line_start_offset(line0);
        (line0 + 1, offset - line_start + 1)
    }

    /// Visit every piece's content in order, stopping as soon as
    /// `visit` returns `false`. `visit` must not mutate the tree.
    pub fn iterate<F: FnMut(&[u16]) -> bool>(&self, mut visit: F) {
        let mut iter = PieceIter::new(&self.tree, 0);
        loop {
            let Some((_, piece)) = iter.get() else {
                return;
            };
            if !visit(self.piece_units(&piece)) {
                return;
            }
            if iter.next().is_none() {
                return;
            }
        }
    }

    /// Validate properties (1)-(6) of §3 (red/black invariants plus the
    /// augmented `size_left`/`lf_left` sums). Debug-only: compiled to a
    /// no-op when debug assertions are off, per the error-handling design
    /// that treats the red/black property as the only violation fatal
    /// enough to assert on.
    #[inline]
    pub fn debug_assert_invariants(&self) {
        debug_assert_eq!(crate::tree::check_invariants(&self.tree), Ok(()));
    }

    /// Content equality: true iff both trees' code-unit streams are
    /// identical, regardless of how each is chopped into pieces.
    pub fn equal(&self, other: &PieceTree) -> bool {
        if self.length != other.length {
            return false;
        }

        let mut a = ChunkCursor::new(self);
        let mut b = ChunkCursor::new(other);

        loop {
            let a_has = a.refill();
            let b_has = b.refill();
            match (a_has, b_has) {
                (false, false) => return true,
                (false, true) | (true, false) => return false,
                (true, true) => {}
            }

            let n = a.remaining().len().min(b.remaining().len());
            if a.remaining()[..n] != b.remaining()[..n] {
                return false;
            }
            a.advance(n);
            b.advance(n);
        }
    }

    // -- internal helpers ------------------------------------------------

    fn piece_units(&self, piece: &Piece) -> &[u16] {
        let buffer = &self.buffers[piece.buffer_index as usize];
        let start = buffer.offset_of(piece.start) as usize;
        let end = buffer.offset_of(piece.end) as usize;
        &buffer.text()[start..end]
    }

    /// Materialize the code units in `[start, end)`. Consults and
    /// refreshes the search cache: a hit on `start` reads the first
    /// piece directly, skipping the tree descent `PieceIter::new`
    /// would otherwise do (§4.4.8).
    fn units_in_range(&self, start: u64, end: u64) -> Vec<u16> {
        if start >= end {
            return Vec::new();
        }

        let mut out = Vec::with_capacity((end - start) as usize);

        let cached = self.search_cache.borrow().get(start);
        let resume_at = if let Some(entry) = cached {
            let units = self.piece_units(&entry.piece);
            let lo = (start - entry.node_start_offset) as usize;
            let hi = ((end - entry.node_start_offset).min(entry.piece.length)) as usize;
            out.extend_from_slice(&units[lo..hi]);

            let node_end = entry.node_start_offset + entry.piece.length;
            if node_end >= end {
                return out;
            }
            node_end
        } else {
            start
        };

        let mut iter = PieceIter::new(&self.tree, resume_at);
        while let Some((pos, piece)) = iter.get() {
            if pos >= end {
                break;
            }
            self.search_cache.borrow_mut().put(CacheEntry {
                node_start_offset: pos,
                piece,
            });

            let units = self.piece_units(&piece);
            let lo = start.saturating_sub(pos) as usize;
            let hi = ((end - pos).min(piece.length)) as usize;
            out.extend_from_slice(&units[lo..hi]);

            if iter.next().is_none() {
                break;
            }
        }
        out
    }

    /// Document offset of the first code unit of 0-based logical line
    /// `line0`, per spec §4.4.1 `node_at_line_column`'s line-descent.
    fn line_start_offset(&self, line0: u64) -> u64 {
        if line0 == 0 || self.tree.node_count == 0 {
            return 0;
        }
        if line0 >= self.line_count {
            return self.length;
        }

        let (stack, node_start_offset, node_start_line) = self.tree.find_node_by_line(line0);
        let Some(&node) = stack.last() else {
            return self.length;
        };

        let rows_into_piece = line0 - node_start_line;
        if rows_into_piece == 0 {
            // The descent only stops here without consuming an internal
            // break when this piece is itself the first to touch line0 (it
            // was reached via the right-redirect on an exact cumulative-lf
            // match). node_start_offset is the answer directly; deriving it
            // from piece.start.column instead would pick up any orphaned
            // buffer content sitting before the piece on the same buffer
            // line, which isn't part of the document at all.
            return node_start_offset;
        }

        let buffer = &self.buffers[node.piece.buffer_index as usize];
        let piece_line = node.piece.start.line as u64 + rows_into_piece;
        let line_start_in_buffer = buffer.line_starts()[piece_line as usize];
        let piece_start_off = buffer.offset_of(node.piece.start);

        node_start_offset + (line_start_in_buffer - piece_start_off)
    }

    /// `(start_offset, end_offset)` of line `n` (1-based), `end`
    /// inclusive of the line's terminator (or the document end for the
    /// last line).
    fn line_bounds(&self, n: u64) -> (u64, u64, bool) {
        let line0 = n.saturating_sub(1).min(self.line_count.saturating_sub(1));
        let start = self.line_start_offset(line0);
        let is_last = line0 + 1 >= self.line_count;
        let end = if is_last { self.length } else { self.line_start_offset(line0 + 1) };
        (start, end, is_last)
    }

    /// `(start_offset, end_offset)` of line `n`'s content, terminator
    /// excluded.
    fn line_span(&self, n: u64) -> (u64, u64) {
        let (start, end, _) = self.line_bounds(n);
        let mut content = self.units_in_range(start, end);
        let before = content.len() as u64;
        strip_trailing_eol(&mut content);
        let term_width = before - content.len() as u64;
        (start, end - term_width)
    }

    fn create_pieces(&mut self, units: &[u16]) -> Vec<Piece> {
        if units.len() as u64 > AVERAGE_BUFFER_SIZE {
            self.create_chunked_pieces(units)
        } else {
            vec![self.append_to_change_buffer(units)]
        }
    }

    fn append_to_change_buffer(&mut self, units: &[u16]) -> Piece {
        let buffer = &mut self.buffers[CHANGE_BUFFER as usize];
        let start = buffer.end_position();
        buffer.append(units);
        let end = buffer.end_position();
        Piece::new(buffer, CHANGE_BUFFER, start, end)
    }

    fn create_chunked_pieces(&mut self, units: &[u16]) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut start = 0usize;

        while start < units.len() {
            let end = find_chunk_end(units, start, AVERAGE_BUFFER_SIZE as usize);
            let chunk = units[start..end].to_vec();

            let buffer = Buffer::from_units(chunk);
            let end_pos = buffer.end_position();
            let buf_index = self.buffers.len() as u32;
            let piece = Piece::new(&buffer, buf_index, BufferPosition::new(0, 0), end_pos);
            self.buffers.push(buffer);
            pieces.push(piece);

            start = end;
        }

        pieces
    }

    /// CRLF stitching (§4.4.5): if the document offset boundary at
    /// `offset` splits a `\r\n` across two pieces, replace that seam
    /// with a single piece carrying the literal two code units.
    fn stitch_crlf(&mut self, offset: u64) {
        if self.eol_normalized && self.eol == EndOfLine::LF {
            return;
        }
        if offset == 0 || offset >= self.length {
            return;
        }
        if self.char_code_at(offset - 1) != Some(CR) || self.char_code_at(offset) != Some(LF) {
            return;
        }

        self.tree.remove(offset - 1..offset + 1, &self.buffers);

        let buffer = &mut self.buffers[CHANGE_BUFFER as usize];
        let start = buffer.end_position();
        buffer.append(&[CR, LF]);
        let end = buffer.end_position();
        let piece = Piece::new(buffer, CHANGE_BUFFER, start, end);

        self.tree.insert(offset - 1, piece, &self.buffers);

        // The remove/insert above can replace a piece that started before
        // `offset` (the one carrying the lone `\r`). invalidate_from(offset)
        // in the caller wouldn't reach that entry, so drop from one before.
        self.search_cache.borrow_mut().invalidate_from(offset - 1);
    }
}

impl Default for PieceTree {
    fn default() -> Self {
        PieceTree::new(Vec::new(), EndOfLine::LF, true)
    }
}

/// Walks two `PieceTree`s' content in lockstep without materializing
/// either in full, for [`PieceTree::equal`].
struct ChunkCursor<'a> {
    owner: &'a PieceTree,
    iter: PieceIter<'a>,
    units: &'a [u16],
    pos: usize,
}

impl<'a> ChunkCursor<'a> {
    fn new(owner: &'a PieceTree) -> Self {
        ChunkCursor {
            owner,
            iter: PieceIter::new(&owner.tree, 0),
            units: &[],
            pos: 0,
        }
    }

    /// Ensure there's at least one unread unit buffered, or report
    /// exhaustion. Skips over any zero-length pieces.
    fn refill(&mut self) -> bool {
        while self.pos == self.units.len() {
            match self.iter.get() {
                Some((_, piece)) => {
                    self.units = self.owner.piece_units(&piece);
                    self.pos = 0;
                    self.iter.next();
                }
                None => return false,
            }
        }
        true
    }

    fn remaining(&self) -> &[u16] {
        &self.units[self.pos..]
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }
}

#[inline]
fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

/// Largest `end` in `start..=start+max_len` that doesn't split a `\r\n`
/// pair or orphan a lone high surrogate, always making progress.
fn find_chunk_end(units: &[u16], start: usize, max_len: usize) -> usize {
    let mut end = (start + max_len).min(units.len());
    while end > start + 1 && end < units.len() {
        let splits_crlf = units[end - 1] == CR && units[end] == LF;
        let orphans_surrogate = is_high_surrogate(units[end - 1]);
        if splits_crlf || orphans_surrogate {
            end -= 1;
        } else {
            break;
        }
    }
    end
}

fn strip_trailing_eol(units: &mut Vec<u16>) {
    match units.last().copied() {
        Some(LF) => {
            units.pop();
            if units.last().copied() == Some(CR) {
                units.pop();
            }
        }
        Some(CR) => {
            units.pop();
        }
        _ => {}
    }
}

fn rewrite_eol_units(units: &[u16], target: EndOfLine) -> Vec<u16> {
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        match units[i] {
            CR if i + 1 < units.len() && units[i + 1] == LF => {
                out.extend_from_slice(target.as_units());
                i += 2;
            }
            CR | LF => {
                out.extend_from_slice(target.as_units());
                i += 1;
            }
            u => {
                out.push(u);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn pt(s: &str) -> PieceTree {
        PieceTree::new(vec![s.to_string()], EndOfLine::LF, false)
    }

    fn content(p: &PieceTree) -> String {
        let mut s = String::new();
        p.iterate(|units| {
            s.push_str(&String::from_utf16_lossy(units));
            true
        });
        s
    }

    #[test]
    fn insert_and_delete_basic() {
        let mut p = PieceTree::new(Vec::new(), EndOfLine::LF, true);
        p.insert(0, "This is a document with some text.", true);
        p.insert(34, "This is some more text to insert at offset 34.", true);
        assert_eq!(
            content(&p),
            "This is a document with some text.This is some more text to insert at offset 34."
        );
        p.delete(42, 5);
        assert_eq!(content(&p), "This is a document with some text.This is more text to insert at offset 34.");
    }

    #[test]
    fn prefix_sums_after_append_and_delete() {
        let mut p = pt("a\nb\nc\nde");
        p.insert(8, "fh\ni\njk", true);
        p.delete(7, 2);
        assert_eq!(content(&p), "a\nb\nc\ndh\ni\njk");
        assert_eq!(p.line_count(), 6);
        assert_eq!(p.position_at(9), (5, 1));
        assert_eq!(p.offset_at(6, 3), 13);
    }

    #[test]
    fn crlf_stitching_survives_delete() {
        let mut p = PieceTree::new(Vec::new(), EndOfLine::LF, false);
        p.insert(0, "a\r\nb", false);
        p.delete(0, 2);
        assert_eq!(content(&p), "\nb");
        assert_eq!(p.line_count(), 2);

        let mut q = PieceTree::new(Vec::new(), EndOfLine::LF, false);
        q.insert(0, "a\r\nb", false);
        q.delete(2, 2);
        assert_eq!(content(&q), "a\r");
        assert_eq!(q.line_count(), 2);
    }

    #[test]
    fn equal_ignores_piece_shape() {
        let a = PieceTree::new(vec!["abc".to_string()], EndOfLine::LF, true);
        let b = PieceTree::new(vec!["ab".to_string(), "c".to_string()], EndOfLine::LF, true);
        let c = PieceTree::new(vec!["abd".to_string()], EndOfLine::LF, true);
        let d = PieceTree::new(vec!["abcd".to_string()], EndOfLine::LF, true);
        assert!(a.equal(&b));
        assert!(!a.equal(&c));
        assert!(!a.equal(&d));
    }

    #[test]
    fn insert_and_delete_are_idempotent_on_empty_input() {
        let mut p = pt("hello");
        p.insert(2, "", true);
        assert_eq!(content(&p), "hello");
        p.delete(2, 0);
        assert_eq!(content(&p), "hello");
    }

    #[test]
    fn line_content_strips_terminator_but_raw_keeps_it() {
        let p = pt("one\ntwo\nthree");
        assert_eq!(p.line_content(1), "one");
        assert_eq!(p.line_raw_content(1, 0), "one\n");
        assert_eq!(p.line_content(3), "three");
        assert_eq!(p.line_length(2), 3);
    }

    #[test]
    fn lines_content_merges_dangling_cr() {
        let mut p = PieceTree::new(Vec::new(), EndOfLine::LF, false);
        p.insert(0, "a\r", false);
        p.insert(2, "\nb", false);
        assert_eq!(p.lines_content(), vec!["a".to_string(), "b".to_string()]);
    }
}
