use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use gloo::timers::callback::Timeout;

use hamekomi_core::effects::{effect_seed, spawn_effect, PlacementEffect};
use hamekomi_core::game::{
    build_board, drag_piece_to, pick_piece_at, piece_col, piece_row, raise_piece, release_piece,
    target_position, PlacementOutcome, SOLVED_NOTIFY_DELAY_MS,
};
use hamekomi_core::state::BoardState;

use crate::audio::AudioEngine;

pub(crate) struct BoardHooks {
    pub(crate) on_move: Rc<dyn Fn()>,
    pub(crate) on_solved: Rc<dyn Fn()>,
}

#[derive(Clone, Copy)]
struct DragState {
    piece_id: usize,
    offset_x: f32,
    offset_y: f32,
}

// Single owner of the board: input listeners and the render loop both go
// through this store, and every mutation runs to completion before the next
// event or frame is processed.
pub(crate) struct BoardCore {
    state: RefCell<BoardState>,
    effects: RefCell<Vec<PlacementEffect>>,
    drag: RefCell<Option<DragState>>,
    hooks: RefCell<Option<BoardHooks>>,
    solved_timer: RefCell<Option<Timeout>>,
    audio: RefCell<Option<Rc<AudioEngine>>>,
    audio_failed: Cell<bool>,
    image_dims: Cell<(u32, u32)>,
    container: Cell<(f32, f32)>,
    grid: Cell<u32>,
    nonce: Cell<u32>,
    preview: Cell<bool>,
    muted: Cell<bool>,
}

impl BoardCore {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(BoardState::empty()),
            effects: RefCell::new(Vec::new()),
            drag: RefCell::new(None),
            hooks: RefCell::new(None),
            solved_timer: RefCell::new(None),
            audio: RefCell::new(None),
            audio_failed: Cell::new(false),
            image_dims: Cell::new((0, 0)),
            container: Cell::new((0.0, 0.0)),
            grid: Cell::new(0),
            nonce: Cell::new(0),
            preview: Cell::new(false),
            muted: Cell::new(false),
        })
    }

    pub(crate) fn set_hooks(&self, hooks: BoardHooks) {
        *self.hooks.borrow_mut() = Some(hooks);
    }

    pub(crate) fn state(&self) -> Ref<'_, BoardState> {
        self.state.borrow()
    }

    pub(crate) fn effects_mut(&self) -> RefMut<'_, Vec<PlacementEffect>> {
        self.effects.borrow_mut()
    }

    pub(crate) fn dragged_piece(&self) -> Option<usize> {
        self.drag.borrow().as_ref().map(|drag| drag.piece_id)
    }

    pub(crate) fn preview_visible(&self) -> bool {
        self.preview.get()
    }

    pub(crate) fn set_preview(&self, visible: bool) {
        self.preview.set(visible);
    }

    pub(crate) fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
        if let Some(audio) = self.audio.borrow().as_ref() {
            audio.set_muted(muted);
        }
    }

    pub(crate) fn initialize(&self, image_width: u32, image_height: u32, n: u32) {
        self.image_dims.set((image_width, image_height));
        self.grid.set(n);
        self.rebuild();
    }

    pub(crate) fn resize(&self, container_width: f32, container_height: f32) {
        self.container.set((container_width, container_height));
        self.rebuild();
    }

    pub(crate) fn set_grid(&self, n: u32) {
        self.grid.set(n);
        self.rebuild();
    }

    // Any change of image, grid, or display area discards the whole board and
    // rescatters. The pending solved timer dies with the old board so it can
    // never fire into the new one.
    fn rebuild(&self) {
        let (image_width, image_height) = self.image_dims.get();
        let (container_width, container_height) = self.container.get();
        let nonce = self.nonce.get().wrapping_add(1);
        self.nonce.set(nonce);
        *self.state.borrow_mut() = build_board(
            image_width,
            image_height,
            container_width,
            container_height,
            self.grid.get(),
            nonce,
        );
        self.effects.borrow_mut().clear();
        *self.drag.borrow_mut() = None;
        self.solved_timer.borrow_mut().take();
    }

    pub(crate) fn pointer_down(&self, x: f32, y: f32) {
        self.ensure_audio();
        if self.drag.borrow().is_some() {
            return;
        }
        let drag = {
            let mut state = self.state.borrow_mut();
            let Some(id) = pick_piece_at(&state, x, y) else {
                return;
            };
            let (px, py) = state.positions[id];
            raise_piece(&mut state, id);
            DragState {
                piece_id: id,
                offset_x: x - px,
                offset_y: y - py,
            }
        };
        *self.drag.borrow_mut() = Some(drag);
    }

    pub(crate) fn pointer_move(&self, x: f32, y: f32) {
        let Some(drag) = *self.drag.borrow() else {
            return;
        };
        drag_piece_to(
            &mut self.state.borrow_mut(),
            drag.piece_id,
            x - drag.offset_x,
            y - drag.offset_y,
        );
    }

    pub(crate) fn pointer_up(&self) {
        let Some(drag) = self.drag.borrow_mut().take() else {
            return;
        };
        let outcome = release_piece(&mut self.state.borrow_mut(), drag.piece_id);
        if let PlacementOutcome::Locked { solved_now } = outcome {
            self.spawn_lock_effect(drag.piece_id);
            if let Some(audio) = self.audio.borrow().as_ref() {
                audio.snap();
            }
            if solved_now {
                self.schedule_solved();
            }
        }
        let on_move = self
            .hooks
            .borrow()
            .as_ref()
            .map(|hooks| Rc::clone(&hooks.on_move));
        if let Some(on_move) = on_move {
            on_move();
        }
    }

    fn spawn_lock_effect(&self, piece_id: usize) {
        let state = self.state.borrow();
        let Some(layout) = state.layout else {
            return;
        };
        let row = piece_row(piece_id, state.n);
        let col = piece_col(piece_id, state.n);
        let (tx, ty) = target_position(&layout, row, col);
        let seed = effect_seed(piece_id, state.scatter_nonce);
        drop(state);
        self.effects
            .borrow_mut()
            .push(spawn_effect(tx, ty, now_ms(), seed));
    }

    fn schedule_solved(&self) {
        let on_solved = self
            .hooks
            .borrow()
            .as_ref()
            .map(|hooks| Rc::clone(&hooks.on_solved));
        let audio = self.audio.borrow().clone();
        let timer = Timeout::new(SOLVED_NOTIFY_DELAY_MS, move || {
            if let Some(audio) = audio.as_ref() {
                audio.solved();
            }
            if let Some(on_solved) = on_solved {
                on_solved();
            }
        });
        *self.solved_timer.borrow_mut() = Some(timer);
    }

    fn ensure_audio(&self) {
        if self.audio_failed.get() {
            return;
        }
        let mut audio = self.audio.borrow_mut();
        match audio.as_ref() {
            Some(engine) => engine.resume_if_suspended(),
            None => match AudioEngine::start(self.muted.get()) {
                Some(engine) => {
                    engine.resume_if_suspended();
                    *audio = Some(engine);
                }
                None => self.audio_failed.set(true),
            },
        }
    }
}

pub(crate) fn now_ms() -> f32 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now() as f32)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gloo::timers::future::TimeoutFuture;
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn counting_hooks() -> (BoardHooks, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let moves = Rc::new(Cell::new(0u32));
        let solves = Rc::new(Cell::new(0u32));
        let moves_hook = Rc::clone(&moves);
        let solves_hook = Rc::clone(&solves);
        let hooks = BoardHooks {
            on_move: Rc::new(move || moves_hook.set(moves_hook.get() + 1)),
            on_solved: Rc::new(move || solves_hook.set(solves_hook.get() + 1)),
        };
        (hooks, moves, solves)
    }

    fn first_unlocked_position(core: &BoardCore) -> (f32, f32) {
        let state = core.state();
        let id = (0..state.total_pieces())
            .find(|id| !state.locked[*id])
            .expect("an unlocked piece");
        state.positions[id]
    }

    // Picks whatever piece is topmost at the first unlocked piece's position
    // and drags it onto its own target. Scattered pieces may overlap, so the
    // picked id is read back rather than assumed.
    fn lock_one(core: &BoardCore) {
        let (px, py) = first_unlocked_position(core);
        core.pointer_down(px + 1.0, py + 1.0);
        let id = core.dragged_piece().expect("a picked piece");
        let (offset_x, offset_y, tx, ty) = {
            let state = core.state();
            let layout = state.layout.unwrap();
            let (qx, qy) = state.positions[id];
            let row = piece_row(id, state.n);
            let col = piece_col(id, state.n);
            let (tx, ty) = target_position(&layout, row, col);
            (px + 1.0 - qx, py + 1.0 - qy, tx, ty)
        };
        core.pointer_move(tx + offset_x, ty + offset_y);
        core.pointer_up();
    }

    #[wasm_bindgen_test]
    fn a_missed_pick_emits_no_move() {
        let core = BoardCore::new();
        let (hooks, moves, _) = counting_hooks();
        core.set_hooks(hooks);
        core.resize(600.0, 600.0);
        core.initialize(300, 300, 3);
        core.pointer_down(-10.0, -10.0);
        core.pointer_up();
        assert_eq!(moves.get(), 0);
    }

    #[wasm_bindgen_test]
    fn every_release_emits_exactly_one_move() {
        let core = BoardCore::new();
        let (hooks, moves, _) = counting_hooks();
        core.set_hooks(hooks);
        core.resize(600.0, 600.0);
        core.initialize(300, 300, 3);
        let (px, py) = first_unlocked_position(&core);
        core.pointer_down(px + 1.0, py + 1.0);
        // (0, 0) is at least 63 canvas px from every target on this board,
        // well past the 42.5 px tolerance, so the release cannot lock.
        core.pointer_move(0.0, 0.0);
        core.pointer_up();
        assert_eq!(moves.get(), 1);
        assert_eq!(hamekomi_core::game::locked_count(&core.state()), 0);
        // A second release without a drag is a no-op.
        core.pointer_up();
        assert_eq!(moves.get(), 1);
    }

    #[wasm_bindgen_test(async)]
    async fn solving_notifies_once_after_the_delay() {
        let core = BoardCore::new();
        let (hooks, moves, solves) = counting_hooks();
        core.set_hooks(hooks);
        core.resize(600.0, 600.0);
        core.initialize(300, 300, 3);
        for _ in 0..9 {
            lock_one(&core);
        }
        assert_eq!(moves.get(), 9);
        assert!(core.state().solved);
        assert_eq!(solves.get(), 0);
        TimeoutFuture::new(SOLVED_NOTIFY_DELAY_MS + 200).await;
        assert_eq!(solves.get(), 1);
        TimeoutFuture::new(SOLVED_NOTIFY_DELAY_MS).await;
        assert_eq!(solves.get(), 1);
    }

    #[wasm_bindgen_test(async)]
    async fn a_rebuild_invalidates_the_pending_solved_timer() {
        let core = BoardCore::new();
        let (hooks, _, solves) = counting_hooks();
        core.set_hooks(hooks);
        core.resize(600.0, 600.0);
        core.initialize(300, 300, 3);
        for _ in 0..9 {
            lock_one(&core);
        }
        core.initialize(300, 300, 3);
        TimeoutFuture::new(SOLVED_NOTIFY_DELAY_MS + 200).await;
        assert_eq!(solves.get(), 0);
        assert!(!core.state().solved);
    }

    #[wasm_bindgen_test]
    fn a_lock_spawns_one_effect() {
        let core = BoardCore::new();
        core.resize(600.0, 600.0);
        core.initialize(300, 300, 3);
        lock_one(&core);
        assert_eq!(core.effects_mut().len(), 1);
        let (px, py) = first_unlocked_position(&core);
        core.pointer_down(px + 1.0, py + 1.0);
        core.pointer_move(0.0, 0.0);
        core.pointer_up();
        assert_eq!(core.effects_mut().len(), 1);
    }
}
