//! [`PositionOracle`] backed by the `shakmaty` rules library.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, FromSetup, Move, Position, Role};

use crate::errors::{EngineError, EngineResult};
use crate::game_state::chess_types::{Color, Piece, PieceKind, Square};
use crate::oracle::position_oracle::{CandidateMove, PositionOracle};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Standard chess rules; handles are `shakmaty::Chess` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyOracle;

impl ShakmatyOracle {
    /// Accepts `startpos`, full FEN, or a bare placement field (White to
    /// move, no castling, no en passant).
    fn normalize(encoded: &str) -> String {
        let trimmed = encoded.trim();
        if trimmed.eq_ignore_ascii_case("startpos") {
            return START_FEN.to_owned();
        }
        if trimmed.split_whitespace().count() == 1 {
            format!("{trimmed} w - - 0 1")
        } else {
            trimmed.to_owned()
        }
    }

    fn candidate(m: &Move) -> Option<CandidateMove> {
        let (from, to) = match m {
            Move::Normal { from, to, .. } | Move::EnPassant { from, to } => {
                (square_from(*from), square_from(*to))
            }
            Move::Castle { king, rook } => {
                let king_sq = square_from(*king);
                let rook_sq = square_from(*rook);
                let file = if rook_sq.file() > king_sq.file() { 6 } else { 2 };
                (king_sq, Square::from_coords(file, king_sq.rank())?)
            }
            Move::Put { .. } => return None,
        };
        let captured = match m {
            Move::Castle { .. } => None,
            _ => m.capture().map(kind_from),
        };
        Some(CandidateMove::new(
            from,
            to,
            kind_from(m.role()),
            m.promotion().map(kind_from),
            captured,
        ))
    }

    fn find_move(position: &Chess, mv: &CandidateMove) -> Option<Move> {
        position.legal_moves().into_iter().find(|m| {
            Self::candidate(m)
                .map(|c| c.from == mv.from && c.to == mv.to && c.promotion == mv.promotion)
                .unwrap_or(false)
        })
    }
}

impl PositionOracle for ShakmatyOracle {
    type Handle = Chess;

    fn load_position(&self, encoded: &str) -> EngineResult<Chess> {
        let normalized = Self::normalize(encoded);
        let invalid = |reason: String| EngineError::InvalidPosition {
            encoded: encoded.to_owned(),
            reason,
        };
        let fen: Fen = normalized.parse().map_err(|e| invalid(format!("{e}")))?;
        fen.into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))
    }

    fn encode(&self, position: &Chess) -> String {
        Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
    }

    fn legal_moves(&self, position: &Chess) -> Vec<CandidateMove> {
        position
            .legal_moves()
            .iter()
            .filter_map(Self::candidate)
            .collect()
    }

    fn apply(&self, position: &Chess, mv: &CandidateMove) -> EngineResult<Chess> {
        let legal =
            Self::find_move(position, mv).ok_or_else(|| EngineError::IllegalMove(mv.uci()))?;
        let mut next = position.clone();
        next.play_unchecked(&legal);
        Ok(next)
    }

    fn is_checkmate(&self, position: &Chess) -> bool {
        position.is_checkmate()
    }

    fn is_check(&self, position: &Chess) -> bool {
        position.is_check()
    }

    fn turn_color(&self, position: &Chess) -> Color {
        color_from(position.turn())
    }

    fn piece_at(&self, position: &Chess, square: Square) -> Option<Piece> {
        position
            .board()
            .piece_at(square_to(square))
            .map(|p| Piece::new(color_from(p.color), kind_from(p.role)))
    }

    fn null_move(&self, position: &Chess) -> Option<Chess> {
        if position.is_check() {
            return None;
        }
        let mut setup = position.clone().into_setup(EnPassantMode::Legal);
        setup.turn = !setup.turn;
        setup.ep_square = None;
        Chess::from_setup(setup, CastlingMode::Standard).ok()
    }
}

fn square_from(sq: shakmaty::Square) -> Square {
    Square::masked(u32::from(sq) as u8)
}

fn square_to(sq: Square) -> shakmaty::Square {
    shakmaty::Square::new(u32::from(sq.index()))
}

fn color_from(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::Light,
        shakmaty::Color::Black => Color::Dark,
    }
}

fn kind_from(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}
