//! Board vocabulary shared by the oracle boundary and the move-selection
//! pipeline.
//!
//! The engine never owns board state; these types only describe what the
//! oracle reports (squares, pieces, sides) and what the engine answers with.

use std::fmt;
use std::str::FromStr;

use crate::errors::EngineError;

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Light,
    Dark,
}

impl Color {
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }

    /// Rank index (`0..=7`) where this side's minor and major pieces start.
    #[inline]
    pub const fn home_rank(self) -> u8 {
        match self {
            Color::Light => 0,
            Color::Dark => 7,
        }
    }
}

/// Piece kind (color is carried separately by [`Piece`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Uppercase algebraic letter; pawns have none.
    pub const fn letter(self) -> Option<char> {
        match self {
            PieceKind::Pawn => None,
            PieceKind::Knight => Some('N'),
            PieceKind::Bishop => Some('B'),
            PieceKind::Rook => Some('R'),
            PieceKind::Queen => Some('Q'),
            PieceKind::King => Some('K'),
        }
    }

    /// Lowercase promotion suffix used by long algebraic notation.
    pub const fn promotion_char(self) -> char {
        match self {
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::Pawn => 'p',
            PieceKind::King => 'k',
        }
    }

    pub const fn from_promotion_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_minor(self) -> bool {
        matches!(self, PieceKind::Knight | PieceKind::Bishop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }
}

/// Board square `0..=63` with a1 = 0, b1 = 1, ..., h8 = 63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub const fn new(index: u8) -> Option<Self> {
        if index < 64 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Wraps an index that the caller already knows to be on the board.
    #[inline]
    pub const fn masked(index: u8) -> Self {
        Self(index & 63)
    }

    pub const fn from_coords(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self(rank * 8 + file))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    /// King-move distance between two squares.
    pub fn chebyshev_distance(self, other: Square) -> u8 {
        self.file()
            .abs_diff(other.file())
            .max(self.rank().abs_diff(other.rank()))
    }

    /// d4, e4, d5, e5.
    pub fn is_center(self) -> bool {
        (3..=4).contains(&self.file()) && (3..=4).contains(&self.rank())
    }

    /// The c3-f6 block.
    pub fn is_extended_center(self) -> bool {
        (2..=5).contains(&self.file()) && (2..=5).contains(&self.rank())
    }

    pub fn is_edge_file(self) -> bool {
        self.file() == 0 || self.file() == 7
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..64).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        write!(f, "{file}{rank}")
    }
}

impl FromStr for Square {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(EngineError::IllegalMove(s.to_owned()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::from_coords(file, rank).ok_or_else(|| EngineError::IllegalMove(s.to_owned()))
    }
}

/// The move an analysis settles on. `None` is the sentinel for positions
/// without legal moves (checkmate or stalemate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BestMove {
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    },
    None,
}

impl BestMove {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, BestMove::None)
    }

    /// Long algebraic form for protocol output; the sentinel becomes the UCI
    /// null move `0000`.
    pub fn to_uci(&self) -> String {
        match self {
            BestMove::None => "0000".to_owned(),
            mv => mv.to_string(),
        }
    }
}

impl fmt::Display for BestMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BestMove::None => f.write_str("none"),
            BestMove::Move {
                from,
                to,
                promotion,
            } => {
                write!(f, "{from}{to}")?;
                if let Some(piece) = promotion {
                    write!(f, "{}", piece.promotion_char())?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for BestMove {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "none" || s == "0000" {
            return Ok(BestMove::None);
        }
        if s.len() != 4 && s.len() != 5 {
            return Err(EngineError::IllegalMove(s.to_owned()));
        }
        let from = s
            .get(0..2)
            .ok_or_else(|| EngineError::IllegalMove(s.to_owned()))?
            .parse()?;
        let to = s
            .get(2..4)
            .ok_or_else(|| EngineError::IllegalMove(s.to_owned()))?
            .parse()?;
        let suffix = s
            .get(4..)
            .ok_or_else(|| EngineError::IllegalMove(s.to_owned()))?;
        let promotion = match suffix.chars().next() {
            Some(c) => Some(
                PieceKind::from_promotion_char(c)
                    .ok_or_else(|| EngineError::IllegalMove(s.to_owned()))?,
            ),
            None => None,
        };
        Ok(BestMove::Move {
            from,
            to,
            promotion,
        })
    }
}

/// Short algebraic description without disambiguation or check markers,
/// e.g. `Nf3`, `exd5`, `e8=Q`, `O-O`.
pub fn coarse_notation(
    piece: PieceKind,
    from: Square,
    to: Square,
    captured: Option<PieceKind>,
    promotion: Option<PieceKind>,
) -> String {
    if piece == PieceKind::King && from.file().abs_diff(to.file()) == 2 {
        return if to.file() > from.file() {
            "O-O".to_owned()
        } else {
            "O-O-O".to_owned()
        };
    }

    let mut out = String::with_capacity(6);
    match piece.letter() {
        Some(letter) => out.push(letter),
        None if captured.is_some() => out.push((b'a' + from.file()) as char),
        None => {}
    }
    if captured.is_some() {
        out.push('x');
    }
    out.push_str(&to.to_string());
    if let Some(promoted) = promotion.and_then(PieceKind::letter) {
        out.push('=');
        out.push(promoted);
    }
    out
}
