//! Red-black colors for the persistent tree, Okasaki/Might style: two
//! transient colors (`BlackBlack`, `NegativeBlack`) appear only mid-delete
//! and are always resolved away by `InternalNode::balance` before a
//! mutation returns.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
    BlackBlack,
    NegativeBlack,
}

impl Color {
    #[inline]
    pub(crate) fn blacken(&mut self) {
        match *self {
            Color::Red => *self = Color::Black,
            Color::Black => *self = Color::BlackBlack,
            Color::BlackBlack => unreachable!("double-blackening a BlackBlack node"),
            Color::NegativeBlack => *self = Color::Red,
        }
    }

    #[inline]
    pub(crate) fn redden(&mut self) {
        match *self {
            Color::Red => *self = Color::NegativeBlack,
            Color::Black => *self = Color::Red,
            Color::BlackBlack => *self = Color::Black,
            Color::NegativeBlack => unreachable!("reddening a NegativeBlack node"),
        }
    }
}
