pub mod catalog;
pub mod effects;
pub mod game;
pub mod grid;
pub mod state;

pub use game::{
    all_locked, build_board, compute_board_layout, drag_piece_to, draw_order, locked_count,
    pick_piece_at, raise_piece, release_piece, source_rect, target_position, BoardLayout,
    PlacementOutcome,
};
pub use state::BoardState;
