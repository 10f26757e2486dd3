//! Pluggable positional evaluation.
//!
//! Selection code only talks to [`WeightedEvaluation`]; individual terms sit
//! behind [`PositionalTerm`] so they can be replaced without touching the
//! strategy chains. The pawn-structure, activity and king-safety terms are
//! deliberately coarse placeholders.

use crate::game_state::chess_types::{Color, Piece, PieceKind, Square};
use crate::oracle::position_oracle::PositionOracle;

pub const MATE_SCORE: i32 = 30000;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl MaterialScorer {
    /// Kings are never traded, so they carry no exchange value.
    #[inline]
    pub const fn piece_value(piece: PieceKind) -> i32 {
        match piece {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            PieceKind::King => 0,
        }
    }
}

/// Copy of the piece placement of one position, taken through the oracle.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    squares: [Option<Piece>; 64],
    side_to_move: Color,
    mobility: usize,
}

impl BoardSnapshot {
    pub fn capture<O: PositionOracle>(oracle: &O, position: &O::Handle) -> Self {
        let mut squares = [None; 64];
        for sq in Square::all() {
            squares[usize::from(sq.index())] = oracle.piece_at(position, sq);
        }
        Self {
            squares,
            side_to_move: oracle.turn_color(position),
            mobility: oracle.legal_moves(position).len(),
        }
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[usize::from(sq.index())]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Legal move count of the side to move.
    pub fn mobility(&self) -> usize {
        self.mobility
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.color == color && p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    fn pawns_on_file(&self, color: Color, file: u8) -> impl Iterator<Item = Square> + '_ {
        (0u8..8).filter_map(move |rank| {
            let sq = Square::from_coords(file, rank)?;
            (self.piece_at(sq) == Some(Piece::new(color, PieceKind::Pawn))).then_some(sq)
        })
    }
}

/// One scalar term of the positional evaluation, scored for `perspective`.
pub trait PositionalTerm: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(&self, board: &BoardSnapshot, perspective: Color) -> i32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialBalance;

impl PositionalTerm for MaterialBalance {
    fn name(&self) -> &'static str {
        "material"
    }

    fn score(&self, board: &BoardSnapshot, perspective: Color) -> i32 {
        board
            .pieces()
            .map(|(_, p)| {
                let value = MaterialScorer::piece_value(p.kind);
                if p.color == perspective {
                    value
                } else {
                    -value
                }
            })
            .sum()
    }
}

/// Doubled and isolated pawns cost, passed pawns earn.
#[derive(Debug, Clone, Copy, Default)]
pub struct PawnStructure;

impl PawnStructure {
    fn side_score(board: &BoardSnapshot, color: Color) -> i32 {
        let counts: Vec<usize> = (0u8..8)
            .map(|file| board.pawns_on_file(color, file).count())
            .collect();
        let mut score = 0;
        for file in 0u8..8 {
            let here = counts[usize::from(file)];
            if here == 0 {
                continue;
            }
            if here > 1 {
                score -= 20 * (here as i32 - 1);
            }
            let left = file.checked_sub(1).map_or(0, |f| counts[usize::from(f)]);
            let right = counts.get(usize::from(file) + 1).copied().unwrap_or(0);
            if left == 0 && right == 0 {
                score -= 15 * here as i32;
            }
            for pawn in board.pawns_on_file(color, file) {
                if Self::is_passed(board, color, pawn) {
                    score += 25;
                }
            }
        }
        score
    }

    fn is_passed(board: &BoardSnapshot, color: Color, pawn: Square) -> bool {
        let enemy = color.opposite();
        let files = pawn.file().saturating_sub(1)..=(pawn.file() + 1).min(7);
        files.into_iter().all(|file| {
            board.pawns_on_file(enemy, file).all(|sq| match color {
                Color::Light => sq.rank() <= pawn.rank(),
                Color::Dark => sq.rank() >= pawn.rank(),
            })
        })
    }
}

impl PositionalTerm for PawnStructure {
    fn name(&self) -> &'static str {
        "pawn_structure"
    }

    fn score(&self, board: &BoardSnapshot, perspective: Color) -> i32 {
        Self::side_score(board, perspective) - Self::side_score(board, perspective.opposite())
    }
}

/// Centralized pieces plus mobility of whoever is to move.
#[derive(Debug, Clone, Copy, Default)]
pub struct PieceActivity;

impl PositionalTerm for PieceActivity {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn score(&self, board: &BoardSnapshot, perspective: Color) -> i32 {
        let centralization: i32 = board
            .pieces()
            .filter(|(_, p)| !matches!(p.kind, PieceKind::Pawn | PieceKind::King))
            .map(|(sq, p)| {
                let bonus = if sq.is_center() {
                    15
                } else if sq.is_extended_center() {
                    8
                } else {
                    0
                };
                if p.color == perspective {
                    bonus
                } else {
                    -bonus
                }
            })
            .sum();
        let mobility = board.mobility() as i32 * 2;
        if board.side_to_move() == perspective {
            centralization + mobility
        } else {
            centralization - mobility
        }
    }
}

/// Pawn shield in front of the king, minus enemy pieces close to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct KingSafety;

impl KingSafety {
    fn side_score(board: &BoardSnapshot, color: Color) -> i32 {
        let Some(king) = board.king_square(color) else {
            return 0;
        };
        let own_pawn = Piece::new(color, PieceKind::Pawn);
        let ahead: [i8; 2] = match color {
            Color::Light => [1, 2],
            Color::Dark => [-1, -2],
        };
        let mut shield = 0;
        for step in ahead {
            let rank = king.rank() as i8 + step;
            for df in -1i8..=1 {
                let file = king.file() as i8 + df;
                if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                    continue;
                }
                if let Some(sq) = Square::from_coords(file as u8, rank as u8) {
                    if board.piece_at(sq) == Some(own_pawn) {
                        shield += 1;
                    }
                }
            }
        }
        let attackers = board
            .pieces()
            .filter(|(sq, p)| {
                p.color != color && p.kind != PieceKind::King && sq.chebyshev_distance(king) <= 2
            })
            .count() as i32;
        shield * 15 - attackers * 20
    }
}

impl PositionalTerm for KingSafety {
    fn name(&self) -> &'static str {
        "king_safety"
    }

    fn score(&self, board: &BoardSnapshot, perspective: Color) -> i32 {
        Self::side_score(board, perspective) - Self::side_score(board, perspective.opposite())
    }
}

/// Weighted sum of [`PositionalTerm`]s.
pub struct WeightedEvaluation {
    terms: Vec<(i32, Box<dyn PositionalTerm>)>,
}

impl WeightedEvaluation {
    pub fn empty() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn standard() -> Self {
        Self::empty()
            .with_term(1, MaterialBalance)
            .with_term(1, PawnStructure)
            .with_term(1, PieceActivity)
            .with_term(1, KingSafety)
    }

    pub fn with_term(mut self, weight: i32, term: impl PositionalTerm + 'static) -> Self {
        self.terms.push((weight, Box::new(term)));
        self
    }

    pub fn term_names(&self) -> Vec<&'static str> {
        self.terms.iter().map(|(_, t)| t.name()).collect()
    }

    pub fn evaluate(&self, board: &BoardSnapshot, perspective: Color) -> i32 {
        self.terms
            .iter()
            .map(|(weight, term)| weight * term.score(board, perspective))
            .sum()
    }
}

impl Default for WeightedEvaluation {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for WeightedEvaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedEvaluation")
            .field("terms", &self.term_names())
            .finish()
    }
}
