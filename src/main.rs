mod app_core;
mod audio;
mod board_view;
mod input;
mod persisted;
mod puzzle_image;

use std::rc::Rc;

use gloo::timers::callback::Interval;
use web_sys::{Element, Event, HtmlCanvasElement, HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use hamekomi_core::catalog::PUZZLE_CATALOG;
use hamekomi_core::grid::{grid_label, grid_size_valid, GRID_SIZES};

use crate::app_core::{BoardCore, BoardHooks};
use crate::board_view::BoardView;
use crate::persisted::{load_settings, save_settings};
use crate::puzzle_image::{create_object_url, load_image, resolve_catalog_src, revoke_object_url};

const UPLOAD_LABEL: &str = "Your photo";

#[derive(Clone, PartialEq)]
enum PuzzleSource {
    Catalog { slug: String },
    Upload { url: String },
}

impl PuzzleSource {
    fn src(&self) -> Option<String> {
        match self {
            PuzzleSource::Catalog { slug } => resolve_catalog_src(slug),
            PuzzleSource::Upload { url } => Some(url.clone()),
        }
    }

    fn slug(&self) -> Option<&str> {
        match self {
            PuzzleSource::Catalog { slug } => Some(slug),
            PuzzleSource::Upload { .. } => None,
        }
    }
}

fn fmt_elapsed(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[function_component(App)]
fn app() -> Html {
    let settings = use_mut_ref(load_settings);
    let core = use_mut_ref(BoardCore::new);
    let view = use_mut_ref(|| None::<Rc<BoardView>>);
    let grid_live = use_mut_ref(|| settings.borrow().grid_size);
    let upload_url = use_mut_ref(|| None::<String>);

    let moves = use_state(|| 0u32);
    let moves_live = use_mut_ref(|| 0u32);
    let elapsed = use_state(|| 0u32);
    let elapsed_live = use_mut_ref(|| 0u32);
    let solved = use_state(|| false);
    let solved_live = use_mut_ref(|| false);
    let preview = use_state(|| settings.borrow().preview);
    let muted = use_state(|| settings.borrow().muted);
    let source = use_state(|| PuzzleSource::Catalog {
        slug: settings.borrow().puzzle_slug.clone(),
    });

    let container_ref = use_node_ref();
    let canvas_ref = use_node_ref();

    let reset_session = {
        let moves = moves.clone();
        let moves_live = Rc::clone(&moves_live);
        let elapsed = elapsed.clone();
        let elapsed_live = Rc::clone(&elapsed_live);
        let solved = solved.clone();
        let solved_live = Rc::clone(&solved_live);
        Rc::new(move || {
            *moves_live.borrow_mut() = 0;
            moves.set(0);
            *elapsed_live.borrow_mut() = 0;
            elapsed.set(0);
            *solved_live.borrow_mut() = false;
            solved.set(false);
        })
    };

    let persist = {
        let settings = Rc::clone(&settings);
        Rc::new(move || save_settings(&settings.borrow()))
    };

    // Mount the board once the canvas exists.
    {
        let container_ref = container_ref.clone();
        let canvas_ref = canvas_ref.clone();
        let core = Rc::clone(&core);
        let view = Rc::clone(&view);
        let settings = Rc::clone(&settings);
        let moves = moves.clone();
        let moves_live = Rc::clone(&moves_live);
        let solved = solved.clone();
        let solved_live = Rc::clone(&solved_live);
        use_effect_with((), move |_| {
            let container = container_ref.cast::<Element>();
            let canvas = canvas_ref.cast::<HtmlCanvasElement>();
            if let (Some(container), Some(canvas)) = (container, canvas) {
                let board = core.borrow().clone();
                {
                    let saved = settings.borrow();
                    board.set_preview(saved.preview);
                    board.set_muted(saved.muted);
                }
                board.set_hooks(BoardHooks {
                    on_move: Rc::new(move || {
                        *moves_live.borrow_mut() += 1;
                        moves.set(*moves_live.borrow());
                    }),
                    on_solved: Rc::new(move || {
                        *solved_live.borrow_mut() = true;
                        solved.set(true);
                    }),
                });
                match BoardView::mount(container, canvas, board) {
                    Ok(mounted) => *view.borrow_mut() = Some(mounted),
                    Err(err) => web_sys::console::error_1(&err),
                }
            }
            || ()
        });
    }

    // Session clock: ticks while unsolved, pauses on the solved overlay.
    {
        let elapsed = elapsed.clone();
        let elapsed_live = Rc::clone(&elapsed_live);
        let solved_live = Rc::clone(&solved_live);
        use_effect_with((), move |_| {
            let interval = Interval::new(1000, move || {
                if *solved_live.borrow() {
                    return;
                }
                *elapsed_live.borrow_mut() += 1;
                elapsed.set(*elapsed_live.borrow());
            });
            move || drop(interval)
        });
    }

    // (Re)load the image whenever the chosen puzzle changes; the board is
    // rebuilt only once the image has decoded.
    {
        let view = Rc::clone(&view);
        let grid_live = Rc::clone(&grid_live);
        use_effect_with((*source).clone(), move |source: &PuzzleSource| {
            if let Some(src) = source.src() {
                let view = Rc::clone(&view);
                let grid_live = Rc::clone(&grid_live);
                let result = load_image(
                    &src,
                    Rc::new(move |image| {
                        if let Some(view) = view.borrow().as_ref() {
                            view.set_image(image, *grid_live.borrow());
                        }
                    }),
                );
                if let Err(err) = result {
                    web_sys::console::error_1(&err);
                }
            }
            || ()
        });
    }

    let on_puzzle_change = {
        let source = source.clone();
        let settings = Rc::clone(&settings);
        let reset_session = Rc::clone(&reset_session);
        let persist = Rc::clone(&persist);
        Callback::from(move |event: Event| {
            let Some(select) = event.target_dyn_into::<HtmlSelectElement>() else {
                return;
            };
            let slug = select.value();
            if resolve_catalog_src(&slug).is_none() {
                return;
            }
            settings.borrow_mut().puzzle_slug = slug.clone();
            persist();
            reset_session();
            source.set(PuzzleSource::Catalog { slug });
        })
    };

    let on_upload = {
        let source = source.clone();
        let upload_url = Rc::clone(&upload_url);
        let reset_session = Rc::clone(&reset_session);
        Callback::from(move |event: Event| {
            let Some(input) = event.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            match create_object_url(&file) {
                Ok(url) => {
                    if let Some(previous) = upload_url.borrow_mut().replace(url.clone()) {
                        revoke_object_url(&previous);
                    }
                    reset_session();
                    source.set(PuzzleSource::Upload { url });
                }
                Err(err) => web_sys::console::error_1(&err),
            }
        })
    };

    let on_grid_change = {
        let view = Rc::clone(&view);
        let grid_live = Rc::clone(&grid_live);
        let settings = Rc::clone(&settings);
        let reset_session = Rc::clone(&reset_session);
        let persist = Rc::clone(&persist);
        Callback::from(move |event: Event| {
            let Some(select) = event.target_dyn_into::<HtmlSelectElement>() else {
                return;
            };
            let Ok(n) = select.value().parse::<u32>() else {
                return;
            };
            if !grid_size_valid(n) {
                return;
            }
            *grid_live.borrow_mut() = n;
            settings.borrow_mut().grid_size = n;
            persist();
            reset_session();
            if let Some(view) = view.borrow().as_ref() {
                view.set_grid(n);
            }
        })
    };

    let on_preview_toggle = {
        let preview = preview.clone();
        let core = Rc::clone(&core);
        let settings = Rc::clone(&settings);
        let persist = Rc::clone(&persist);
        Callback::from(move |_: Event| {
            let next = !*preview;
            preview.set(next);
            core.borrow().set_preview(next);
            settings.borrow_mut().preview = next;
            persist();
        })
    };

    let on_mute_toggle = {
        let muted = muted.clone();
        let core = Rc::clone(&core);
        let settings = Rc::clone(&settings);
        let persist = Rc::clone(&persist);
        Callback::from(move |_: Event| {
            let next = !*muted;
            muted.set(next);
            core.borrow().set_muted(next);
            settings.borrow_mut().muted = next;
            persist();
        })
    };

    let on_play_again = {
        let view = Rc::clone(&view);
        let grid_live = Rc::clone(&grid_live);
        let reset_session = Rc::clone(&reset_session);
        Callback::from(move |_: MouseEvent| {
            reset_session();
            if let Some(view) = view.borrow().as_ref() {
                view.set_grid(*grid_live.borrow());
            }
        })
    };

    let grid_value = *grid_live.borrow();
    let source_slug = source.slug().unwrap_or("").to_string();
    let uploading = matches!(&*source, PuzzleSource::Upload { .. });

    let solved_banner = if *solved {
        html! {
            <div class="solved-overlay">
                <p class="solved-title">{ "Solved!" }</p>
                <p class="solved-stats">
                    { format!("{} moves in {}", *moves, fmt_elapsed(*elapsed)) }
                </p>
                <button onclick={on_play_again}>{ "Play again" }</button>
            </div>
        }
    } else {
        html! {}
    };

    html! {
        <main class="app">
            <header class="toolbar">
                <label for="puzzle-select">{ "Puzzle" }</label>
                <select id="puzzle-select" onchange={on_puzzle_change} value={source_slug}>
                    { for PUZZLE_CATALOG.iter().map(|entry| html! {
                        <option value={entry.slug} selected={source.slug() == Some(entry.slug)}>
                            { entry.label }
                        </option>
                    }) }
                    if uploading {
                        <option value="" selected={true}>{ UPLOAD_LABEL }</option>
                    }
                </select>
                <input type="file" accept="image/*" onchange={on_upload} />
                <label for="grid-select">{ "Difficulty" }</label>
                <select id="grid-select" onchange={on_grid_change}>
                    { for GRID_SIZES.iter().map(|n| html! {
                        <option value={n.to_string()} selected={*n == grid_value}>
                            { grid_label(*n) }
                        </option>
                    }) }
                </select>
                <label class="toggle">
                    <input type="checkbox" checked={*preview} onchange={on_preview_toggle} />
                    { "Preview" }
                </label>
                <label class="toggle">
                    <input type="checkbox" checked={*muted} onchange={on_mute_toggle} />
                    { "Mute" }
                </label>
                <span class="session">
                    { format!("{} moves · {}", *moves, fmt_elapsed(*elapsed)) }
                </span>
            </header>
            <div class="board-shell" ref={container_ref}>
                <canvas class="board-canvas" ref={canvas_ref} />
                { solved_banner }
            </div>
        </main>
    }
}

fn main() {
    console_error_panic_hook::set_once();
    yew::Renderer::<App>::new().render();
}
