//! Boundary to the external rules provider.
//!
//! The engine asks the oracle for legal moves and derives child positions
//! from it; it never edits a position in place. [`ProbeLine`] gives the
//! scanning code apply/undo semantics on top of that.

use crate::errors::EngineResult;
use crate::game_state::chess_types::{coarse_notation, BestMove, Color, Piece, PieceKind, Square};

/// One legal move as reported by the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMove {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub promotion: Option<PieceKind>,
    pub captured: Option<PieceKind>,
    pub notation: String,
}

impl CandidateMove {
    pub fn new(
        from: Square,
        to: Square,
        piece: PieceKind,
        promotion: Option<PieceKind>,
        captured: Option<PieceKind>,
    ) -> Self {
        Self {
            from,
            to,
            piece,
            promotion,
            captured,
            notation: coarse_notation(piece, from, to, captured, promotion),
        }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    #[inline]
    pub fn is_castle(&self) -> bool {
        self.piece == PieceKind::King && self.from.file().abs_diff(self.to.file()) == 2
    }

    pub fn best_move(&self) -> BestMove {
        BestMove::Move {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }

    /// Long algebraic form, e.g. `e2e4` or `a7a8q`.
    pub fn uci(&self) -> String {
        self.best_move().to_string()
    }
}

/// Rules provider the engine consumes.
///
/// Handles are values: `apply` returns a new handle and leaves its input
/// untouched, so discarding a handle is the undo.
pub trait PositionOracle: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    fn load_position(&self, encoded: &str) -> EngineResult<Self::Handle>;

    /// Inverse of `load_position`.
    fn encode(&self, position: &Self::Handle) -> String;

    fn legal_moves(&self, position: &Self::Handle) -> Vec<CandidateMove>;

    fn apply(&self, position: &Self::Handle, mv: &CandidateMove) -> EngineResult<Self::Handle>;

    fn is_checkmate(&self, position: &Self::Handle) -> bool;

    fn is_check(&self, position: &Self::Handle) -> bool;

    fn turn_color(&self, position: &Self::Handle) -> Color;

    fn piece_at(&self, position: &Self::Handle, square: Square) -> Option<Piece>;

    /// Same position with the other side to move. Oracles that cannot pass
    /// the turn, and positions in check, return `None`.
    fn null_move(&self, _position: &Self::Handle) -> Option<Self::Handle> {
        None
    }

    fn find_king(&self, position: &Self::Handle, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceKind::King);
        Square::all().find(|&sq| self.piece_at(position, sq) == Some(king))
    }
}

/// A stack of positions rooted at the caller's handle. `play` pushes a child,
/// `undo` pops back; the root itself is never replaced.
pub struct ProbeLine<'a, O: PositionOracle> {
    oracle: &'a O,
    stack: Vec<O::Handle>,
}

impl<'a, O: PositionOracle> ProbeLine<'a, O> {
    pub fn new(oracle: &'a O, root: O::Handle) -> Self {
        Self {
            oracle,
            stack: vec![root],
        }
    }

    pub fn current(&self) -> &O::Handle {
        // The root is pushed in `new` and never popped.
        &self.stack[self.stack.len() - 1]
    }

    pub fn play(&mut self, mv: &CandidateMove) -> EngineResult<&O::Handle> {
        let next = self.oracle.apply(self.current(), mv)?;
        self.stack.push(next);
        Ok(self.current())
    }

    /// Returns `false` when already at the root.
    pub fn undo(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Number of moves played beyond the root.
    pub fn ply(&self) -> usize {
        self.stack.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::shakmaty_oracle::ShakmatyOracle;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn probe_line_undo_returns_to_root() {
        let oracle = ShakmatyOracle;
        let root = oracle.load_position(START_FEN).expect("start position loads");
        let moves = oracle.legal_moves(&root);
        let e4 = moves
            .iter()
            .find(|m| m.uci() == "e2e4")
            .expect("e2e4 is legal");

        let mut line = ProbeLine::new(&oracle, root.clone());
        line.play(e4).expect("e2e4 applies");
        assert_eq!(line.ply(), 1);
        assert_eq!(oracle.turn_color(line.current()), Color::Dark);

        assert!(line.undo());
        assert!(!line.undo());
        assert_eq!(line.ply(), 0);
        assert_eq!(oracle.encode(line.current()), oracle.encode(&root));
    }

    #[test]
    fn candidate_move_reports_castling() {
        let mv = CandidateMove::new(
            "e1".parse().expect("e1"),
            "g1".parse().expect("g1"),
            PieceKind::King,
            None,
            None,
        );
        assert!(mv.is_castle());
        assert_eq!(mv.notation, "O-O");
        assert_eq!(mv.uci(), "e1g1");
    }
}
