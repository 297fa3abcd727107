use hamekomi_core::game::{
    build_board, drag_piece_to, draw_order, locked_count, pick_piece_at, piece_col, piece_row,
    raise_piece, release_piece, target_position, BoardLayout, PlacementOutcome,
};
use hamekomi_core::grid::GRID_SIZES;
use hamekomi_core::state::BoardState;

const CONTAINER_W: f32 = 800.0;
const CONTAINER_H: f32 = 600.0;

fn build_test_board(n: u32) -> BoardState {
    build_board(1200, 900, CONTAINER_W, CONTAINER_H, n, 7)
}

// A hand-placed board with round numbers: origin (100, 100), piece 100x100,
// so the target for piece (row, col) is (100 + col*100, 100 + row*100).
fn build_square_board(n: u32) -> BoardState {
    let total = (n * n) as usize;
    BoardState {
        n,
        image_width: 1000,
        image_height: 1000,
        container_width: 1200.0,
        container_height: 1200.0,
        layout: Some(BoardLayout {
            origin_x: 100.0,
            origin_y: 100.0,
            width: n as f32 * 100.0,
            height: n as f32 * 100.0,
            piece_width: 100.0,
            piece_height: 100.0,
        }),
        positions: vec![(0.0, 0.0); total],
        locked: vec![false; total],
        z: (0..total as u32).collect(),
        solved: false,
        scatter_nonce: 0,
    }
}

#[test]
fn every_grid_size_builds_a_full_board() {
    for n in GRID_SIZES {
        let state = build_test_board(n);
        let total = (n * n) as usize;
        assert_eq!(state.total_pieces(), total);
        assert_eq!(state.locked.len(), total);
        assert_eq!(state.z.len(), total);
        assert!(!state.solved);
        for id in 0..total {
            assert_eq!(state.z[id], id as u32);
            assert!(!state.locked[id]);
        }
        // Every (row, col) pair is covered exactly once by id = row * n + col.
        let mut seen = vec![false; total];
        for id in 0..total {
            let cell = (piece_row(id, n) * n + piece_col(id, n)) as usize;
            assert!(!seen[cell]);
            seen[cell] = true;
        }
    }
}

#[test]
fn scatter_stays_inside_the_container() {
    let state = build_test_board(6);
    let layout = state.layout.expect("layout");
    for (x, y) in &state.positions {
        assert!(*x >= 0.0 && *x <= CONTAINER_W - layout.piece_width);
        assert!(*y >= 0.0 && *y <= CONTAINER_H - layout.piece_height);
        assert!(x.is_finite() && y.is_finite());
    }
}

#[test]
fn scatter_is_reproducible_per_nonce() {
    let first = build_board(1200, 900, CONTAINER_W, CONTAINER_H, 4, 42);
    let second = build_board(1200, 900, CONTAINER_W, CONTAINER_H, 4, 42);
    let other = build_board(1200, 900, CONTAINER_W, CONTAINER_H, 4, 43);
    assert_eq!(first.positions, second.positions);
    assert_ne!(first.positions, other.positions);
}

#[test]
fn degenerate_container_builds_no_pieces() {
    let state = build_board(1200, 900, 0.0, 0.0, 4, 7);
    assert!(state.layout.is_none());
    assert_eq!(state.total_pieces(), 0);
    assert!(!state.has_board());
}

#[test]
fn pick_hits_the_topmost_unlocked_piece() {
    let mut state = build_square_board(3);
    // Pieces 0 and 1 overlap at (300, 300); piece 1 starts above piece 0.
    state.positions[0] = (300.0, 300.0);
    state.positions[1] = (300.0, 300.0);
    assert_eq!(pick_piece_at(&state, 350.0, 350.0), Some(1));
    raise_piece(&mut state, 0);
    assert_eq!(pick_piece_at(&state, 350.0, 350.0), Some(0));
}

#[test]
fn pick_skips_locked_pieces() {
    let mut state = build_square_board(3);
    state.positions[0] = (300.0, 300.0);
    state.positions[1] = (300.0, 300.0);
    state.locked[1] = true;
    assert_eq!(pick_piece_at(&state, 350.0, 350.0), Some(0));
    state.locked[0] = true;
    assert_eq!(pick_piece_at(&state, 350.0, 350.0), None);
}

#[test]
fn pick_uses_half_open_piece_bounds() {
    let mut state = build_square_board(3);
    state.positions[0] = (300.0, 300.0);
    assert_eq!(pick_piece_at(&state, 300.0, 300.0), Some(0));
    assert_eq!(pick_piece_at(&state, 400.0, 300.0), None);
    assert_eq!(pick_piece_at(&state, 299.9, 300.0), None);
}

#[test]
fn raise_puts_the_piece_above_everything() {
    let mut state = build_square_board(3);
    raise_piece(&mut state, 2);
    let top = state.z.iter().copied().max().unwrap();
    assert_eq!(state.z[2], top);
    raise_piece(&mut state, 5);
    assert!(state.z[5] > state.z[2]);
}

#[test]
fn drag_clamps_to_the_container() {
    let mut state = build_square_board(3);
    drag_piece_to(&mut state, 0, -50.0, -50.0);
    assert_eq!(state.positions[0], (0.0, 0.0));
    drag_piece_to(&mut state, 0, 5000.0, 5000.0);
    assert_eq!(state.positions[0], (1100.0, 1100.0));
}

#[test]
fn release_inside_tolerance_snaps_and_locks() {
    let mut state = build_square_board(3);
    // Piece 4 is (row 1, col 1): target (200, 200), tolerance 0.25 * 100 = 25.
    let layout = state.layout.unwrap();
    assert_eq!(target_position(&layout, 1, 1), (200.0, 200.0));
    drag_piece_to(&mut state, 4, 195.0, 195.0);
    let outcome = release_piece(&mut state, 4);
    assert!(outcome.locked());
    assert_eq!(state.positions[4], (200.0, 200.0));
    assert!(state.locked[4]);
    assert_eq!(state.z[4], 0);
}

#[test]
fn release_outside_tolerance_keeps_the_piece() {
    let mut state = build_square_board(3);
    // (50, 50) is ~212 from the (200, 200) target, far past the 25 threshold.
    drag_piece_to(&mut state, 4, 50.0, 50.0);
    let outcome = release_piece(&mut state, 4);
    assert_eq!(outcome, PlacementOutcome::Kept);
    assert_eq!(state.positions[4], (50.0, 50.0));
    assert!(!state.locked[4]);
}

#[test]
fn release_at_exact_threshold_does_not_lock() {
    let mut state = build_square_board(3);
    drag_piece_to(&mut state, 4, 225.0, 200.0);
    let outcome = release_piece(&mut state, 4);
    assert_eq!(outcome, PlacementOutcome::Kept);
    drag_piece_to(&mut state, 4, 224.9, 200.0);
    assert!(release_piece(&mut state, 4).locked());
}

#[test]
fn locked_pieces_ignore_further_input() {
    let mut state = build_square_board(3);
    drag_piece_to(&mut state, 0, 105.0, 103.0);
    assert!(release_piece(&mut state, 0).locked());
    drag_piece_to(&mut state, 0, 500.0, 500.0);
    assert_eq!(state.positions[0], (100.0, 100.0));
    raise_piece(&mut state, 0);
    assert_eq!(state.z[0], 0);
    assert_eq!(release_piece(&mut state, 0), PlacementOutcome::Kept);
    assert!(state.locked[0]);
}

#[test]
fn solving_reports_exactly_one_transition() {
    let mut state = build_square_board(3);
    let layout = state.layout.unwrap();
    // Lock in a scrambled order; only the 9th lock reports solved_now.
    let order = [4usize, 0, 8, 2, 6, 1, 7, 3, 5];
    let mut solved_transitions = 0;
    for (index, id) in order.iter().enumerate() {
        let row = piece_row(*id, 3);
        let col = piece_col(*id, 3);
        let (tx, ty) = target_position(&layout, row, col);
        drag_piece_to(&mut state, *id, tx + 3.0, ty - 2.0);
        match release_piece(&mut state, *id) {
            PlacementOutcome::Locked { solved_now } => {
                if solved_now {
                    solved_transitions += 1;
                    assert_eq!(index, order.len() - 1);
                }
            }
            PlacementOutcome::Kept => panic!("piece {} did not lock", id),
        }
        assert_eq!(locked_count(&state), index + 1);
    }
    assert_eq!(solved_transitions, 1);
    assert!(state.solved);
}

#[test]
fn rebuild_after_resize_restores_a_full_scatter() {
    let mut state = build_test_board(4);
    let layout = state.layout.unwrap();
    drag_piece_to(&mut state, 0, layout.origin_x, layout.origin_y);
    release_piece(&mut state, 0);
    let rebuilt = build_board(1200, 900, 1000.0, 700.0, 4, state.scatter_nonce + 1);
    assert_eq!(rebuilt.total_pieces(), 16);
    assert!(!rebuilt.solved);
    assert_eq!(locked_count(&rebuilt), 0);
    for (x, y) in &rebuilt.positions {
        assert!(x.is_finite() && y.is_finite());
    }
}

#[test]
fn draw_order_sorts_by_z_then_id() {
    let mut state = build_square_board(3);
    raise_piece(&mut state, 2);
    let order = draw_order(&state);
    assert_eq!(*order.last().unwrap(), 2);
    // Locking sinks the piece back below every unlocked one.
    let layout = state.layout.unwrap();
    let (tx, ty) = target_position(&layout, 0, 2);
    drag_piece_to(&mut state, 2, tx + 1.0, ty + 1.0);
    assert!(release_piece(&mut state, 2).locked());
    let order = draw_order(&state);
    let locked_index = order.iter().position(|id| *id == 2).unwrap();
    let unlocked_index = order.iter().position(|id| *id == 1).unwrap();
    assert!(locked_index < unlocked_index);
}
