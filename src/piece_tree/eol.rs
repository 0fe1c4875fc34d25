//! The document-wide end-of-line setting (spec §4.4.6).

static LF_UNITS: [u16; 1] = [0x000A];
static CRLF_UNITS: [u16; 2] = [0x000D, 0x000A];

/// A document's chosen line terminator. Only `\n` and `\r\n` are
/// supported; a lone `\r` is never a document EOL, only a possible
/// constituent of un-normalised content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfLine {
    LF,
    CRLF,
}

impl EndOfLine {
    #[inline]
    pub(crate) fn as_units(self) -> &'static [u16] {
        match self {
            EndOfLine::LF => &LF_UNITS,
            EndOfLine::CRLF => &CRLF_UNITS,
        }
    }
}

impl Default for EndOfLine {
    fn default() -> Self {
        EndOfLine::LF
    }
}
