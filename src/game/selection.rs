use chess::{BitBoard, Square, EMPTY};

use crate::game::rules::Position;

/// The piece the player has picked up and where it may go.
///
/// `reachable` is recomputed from the rules engine on every change of
/// selection and is empty whenever nothing is selected.
#[derive(Debug, Clone)]
pub struct Selection {
    selected: Option<Square>,
    reachable: BitBoard,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            selected: None,
            reachable: EMPTY,
        }
    }
}

impl Selection {
    pub fn select(&mut self, square: Option<Square>, position: &Position) {
        self.clear();
        if let Some(square) = square {
            self.selected = Some(square);
            self.reachable = position.destinations_from(square);
        }
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.reachable = EMPTY;
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn reachable(&self) -> BitBoard {
        self.reachable
    }

    pub fn can_reach(&self, square: Square) -> bool {
        self.reachable & BitBoard::from_square(square) != EMPTY
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_a_knight_lists_its_destinations() {
        let position = Position::new();
        let mut selection = Selection::default();
        selection.select(Some(Square::G1), &position);

        assert_eq!(selection.selected(), Some(Square::G1));
        assert!(selection.can_reach(Square::F3));
        assert!(selection.can_reach(Square::H3));
        assert_eq!(selection.reachable().popcnt(), 2);
    }

    #[test]
    fn selecting_none_clears_everything() {
        let position = Position::new();
        let mut selection = Selection::default();
        selection.select(Some(Square::E2), &position);
        selection.select(None, &position);

        assert!(selection.is_empty());
        assert_eq!(selection.reachable(), EMPTY);
    }

    #[test]
    fn reselection_replaces_the_reachable_set() {
        let position = Position::new();
        let mut selection = Selection::default();
        selection.select(Some(Square::E2), &position);
        selection.select(Some(Square::B1), &position);

        assert!(!selection.can_reach(Square::E4));
        assert!(selection.can_reach(Square::C3));
        assert!(selection.can_reach(Square::A3));
    }

    #[test]
    fn blocked_piece_has_no_destinations() {
        let position = Position::new();
        let mut selection = Selection::default();
        selection.select(Some(Square::A1), &position);

        assert_eq!(selection.selected(), Some(Square::A1));
        assert_eq!(selection.reachable(), EMPTY);
    }

    #[test]
    fn promotions_collapse_to_one_destination() {
        let position = Position::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut selection = Selection::default();
        selection.select(Some(Square::A7), &position);
        assert_eq!(selection.reachable(), BitBoard::from_square(Square::A8));
        assert_eq!(position.legal_moves_from(Square::A7).count(), 4);
    }
}
