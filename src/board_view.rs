use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::render::{request_animation_frame, AnimationFrame};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    CanvasRenderingContext2d, Element, Event, HtmlCanvasElement, HtmlImageElement, MouseEvent,
    TouchEvent,
};

use hamekomi_core::effects::{
    effect_progress, update_effects, EFFECT_RING_MAX_RADIUS, PARTICLE_COLOR_COUNT,
};
use hamekomi_core::game::{
    draw_order, piece_col, piece_row, source_rect, BoardLayout, DRAG_SCALE, GRID_LINE_ALPHA,
    PREVIEW_ALPHA,
};

use crate::app_core::BoardCore;
use crate::input::{
    changed_touch_canvas_coords, first_touch_canvas_coords, mouse_canvas_coords, HasClientRect,
};

const BACKGROUND_FILL: &str = "#10131a";
const GRID_LINE_COLOR: &str = "#8ea0b8";
const PIECE_BORDER_COLOR: &str = "rgba(255, 255, 255, 0.35)";
const PIECE_BORDER_WIDTH: f64 = 1.0;
const DRAG_BORDER_COLOR: &str = "#f0b44c";
const DRAG_BORDER_WIDTH: f64 = 2.5;
const DRAG_SHADOW_COLOR: &str = "rgba(0, 0, 0, 0.45)";
const DRAG_SHADOW_BLUR: f64 = 18.0;
const DRAG_SHADOW_OFFSET_Y: f64 = 6.0;
const RING_COLOR: &str = "#f0b44c";
const RING_LINE_WIDTH: f64 = 3.0;
const BURST_FILL_COLOR: &str = "#f6d9a0";
const BURST_ALPHA: f64 = 0.4;
const BURST_RADIUS_MIN: f64 = 8.0;
const BURST_RADIUS_MAX: f64 = 32.0;
const PARTICLE_COLORS: [&str; PARTICLE_COLOR_COUNT as usize] =
    ["#f0b44c", "#f2785c", "#4cc9f0", "#9bf29b"];

pub(crate) struct BoardView {
    core: Rc<BoardCore>,
    container: Element,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    image: RefCell<Option<HtmlImageElement>>,
    listeners: RefCell<Vec<EventListener>>,
    frame: RefCell<Option<AnimationFrame>>,
    size_frame: RefCell<Option<AnimationFrame>>,
    size_retry: Cell<bool>,
}

impl BoardView {
    pub(crate) fn mount(
        container: Element,
        canvas: HtmlCanvasElement,
        core: Rc<BoardCore>,
    ) -> Result<Rc<Self>, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let view = Rc::new(Self {
            core,
            container,
            canvas,
            ctx,
            image: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            frame: RefCell::new(None),
            size_frame: RefCell::new(None),
            size_retry: Cell::new(false),
        });
        view.ensure_canvas_size();
        view.install_listeners();
        view.schedule_frame();
        Ok(view)
    }

    pub(crate) fn set_image(&self, image: HtmlImageElement, n: u32) {
        let width = image.natural_width();
        let height = image.natural_height();
        *self.image.borrow_mut() = Some(image);
        self.core.initialize(width, height, n);
    }

    pub(crate) fn set_grid(&self, n: u32) {
        self.core.set_grid(n);
    }

    fn sync_canvas_size(&self) -> bool {
        let rect = self.container.client_rect();
        let width = rect.width();
        let height = rect.height();
        if width <= 0.0 || height <= 0.0 {
            // No usable area yet; leave the board empty until the next resize.
            self.core.resize(0.0, 0.0);
            return false;
        }
        let ratio = web_sys::window()
            .map(|window| window.device_pixel_ratio())
            .unwrap_or(1.0);
        let buffer_width = (width * ratio).round().max(1.0) as u32;
        let buffer_height = (height * ratio).round().max(1.0) as u32;
        self.canvas.set_width(buffer_width);
        self.canvas.set_height(buffer_height);
        self.core
            .resize(buffer_width as f32, buffer_height as f32);
        true
    }

    fn ensure_canvas_size(self: &Rc<Self>) {
        if self.sync_canvas_size() {
            return;
        }
        if self.size_retry.replace(true) {
            return;
        }
        let view = Rc::clone(self);
        let handle = request_animation_frame(move |_| {
            view.size_frame.borrow_mut().take();
            view.size_retry.set(false);
            view.ensure_canvas_size();
        });
        *self.size_frame.borrow_mut() = Some(handle);
    }

    fn install_listeners(self: &Rc<Self>) {
        let mut listeners = Vec::new();
        let options = EventListenerOptions {
            phase: EventListenerPhase::Bubble,
            passive: false,
        };

        let canvas = self.canvas.clone();
        let core = Rc::clone(&self.core);
        listeners.push(EventListener::new_with_options(
            &self.canvas,
            "mousedown",
            options,
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                if event.button() != 0 {
                    return;
                }
                let Some((x, y)) = mouse_canvas_coords(event, &canvas) else {
                    return;
                };
                event.prevent_default();
                core.pointer_down(x, y);
            },
        ));

        let canvas = self.canvas.clone();
        let core = Rc::clone(&self.core);
        listeners.push(EventListener::new(
            &self.canvas,
            "mousemove",
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                let Some((x, y)) = mouse_canvas_coords(event, &canvas) else {
                    return;
                };
                core.pointer_move(x, y);
            },
        ));

        for release in ["mouseup", "mouseleave"] {
            let core = Rc::clone(&self.core);
            listeners.push(EventListener::new(&self.canvas, release, move |_| {
                core.pointer_up();
            }));
        }

        let canvas = self.canvas.clone();
        let core = Rc::clone(&self.core);
        listeners.push(EventListener::new_with_options(
            &self.canvas,
            "touchstart",
            options,
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                let Some((x, y)) = first_touch_canvas_coords(event, &canvas) else {
                    return;
                };
                event.prevent_default();
                core.pointer_down(x, y);
            },
        ));

        let canvas = self.canvas.clone();
        let core = Rc::clone(&self.core);
        listeners.push(EventListener::new_with_options(
            &self.canvas,
            "touchmove",
            options,
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                let Some((x, y)) = first_touch_canvas_coords(event, &canvas) else {
                    return;
                };
                event.prevent_default();
                core.pointer_move(x, y);
            },
        ));

        for release in ["touchend", "touchcancel"] {
            let canvas = self.canvas.clone();
            let core = Rc::clone(&self.core);
            listeners.push(EventListener::new_with_options(
                &self.canvas,
                release,
                options,
                move |event: &Event| {
                    if let Some(event) = event.dyn_ref::<TouchEvent>() {
                        if let Some((x, y)) = changed_touch_canvas_coords(event, &canvas) {
                            core.pointer_move(x, y);
                        }
                        event.prevent_default();
                    }
                    core.pointer_up();
                },
            ));
        }

        if let Some(window) = web_sys::window() {
            let view = Rc::clone(self);
            listeners.push(EventListener::new(&window, "resize", move |_| {
                view.sync_canvas_size();
            }));
        }

        *self.listeners.borrow_mut() = listeners;
    }

    fn schedule_frame(self: &Rc<Self>) {
        let view = Rc::clone(self);
        let handle = request_animation_frame(move |timestamp| {
            view.frame.borrow_mut().take();
            if let Err(err) = view.draw(timestamp as f32) {
                web_sys::console::error_1(&err);
            }
            view.schedule_frame();
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn draw(&self, now_ms: f32) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let width = self.canvas.width() as f64;
        let height = self.canvas.height() as f64;
        ctx.set_fill_style_str(BACKGROUND_FILL);
        ctx.fill_rect(0.0, 0.0, width, height);

        let state = self.core.state();
        let Some(layout) = state.layout else {
            return Ok(());
        };
        let image = self.image.borrow();
        let Some(image) = image.as_ref() else {
            return Ok(());
        };

        if self.core.preview_visible() {
            ctx.set_global_alpha(PREVIEW_ALPHA as f64);
            ctx.draw_image_with_html_image_element_and_dw_and_dh(
                image,
                layout.origin_x as f64,
                layout.origin_y as f64,
                layout.width as f64,
                layout.height as f64,
            )?;
            ctx.set_global_alpha(1.0);
        }

        self.draw_grid_lines(&layout, state.n);

        let dragged = self.core.dragged_piece();
        for id in draw_order(&state) {
            let row = piece_row(id, state.n);
            let col = piece_col(id, state.n);
            let (sx, sy, sw, sh) = source_rect(state.image_width, state.image_height, state.n, row, col);
            let (x, y) = state.positions[id];
            let (dx, dy) = (x as f64, y as f64);
            let (dw, dh) = (layout.piece_width as f64, layout.piece_height as f64);
            let dragging = dragged == Some(id);

            ctx.save();
            if dragging {
                let center_x = dx + dw * 0.5;
                let center_y = dy + dh * 0.5;
                ctx.translate(center_x, center_y)?;
                ctx.scale(DRAG_SCALE as f64, DRAG_SCALE as f64)?;
                ctx.translate(-center_x, -center_y)?;
                ctx.set_shadow_color(DRAG_SHADOW_COLOR);
                ctx.set_shadow_blur(DRAG_SHADOW_BLUR);
                ctx.set_shadow_offset_y(DRAG_SHADOW_OFFSET_Y);
            }
            ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image, sx as f64, sy as f64, sw as f64, sh as f64, dx, dy, dw, dh,
            )?;
            if !state.locked[id] {
                // Locked pieces fuse into the picture; only loose pieces keep
                // an outline.
                if dragging {
                    ctx.set_stroke_style_str(DRAG_BORDER_COLOR);
                    ctx.set_line_width(DRAG_BORDER_WIDTH);
                } else {
                    ctx.set_stroke_style_str(PIECE_BORDER_COLOR);
                    ctx.set_line_width(PIECE_BORDER_WIDTH);
                }
                ctx.stroke_rect(dx, dy, dw, dh);
            }
            ctx.restore();
        }

        self.draw_effects(now_ms);
        Ok(())
    }

    fn draw_grid_lines(&self, layout: &BoardLayout, n: u32) {
        let ctx = &self.ctx;
        ctx.set_global_alpha(GRID_LINE_ALPHA as f64);
        ctx.set_stroke_style_str(GRID_LINE_COLOR);
        ctx.set_line_width(1.0);
        ctx.begin_path();
        for step in 0..=n {
            let x = (layout.origin_x + step as f32 * layout.piece_width) as f64;
            ctx.move_to(x, layout.origin_y as f64);
            ctx.line_to(x, (layout.origin_y + layout.height) as f64);
            let y = (layout.origin_y + step as f32 * layout.piece_height) as f64;
            ctx.move_to(layout.origin_x as f64, y);
            ctx.line_to((layout.origin_x + layout.width) as f64, y);
        }
        ctx.stroke();
        ctx.set_global_alpha(1.0);
    }

    // Update runs first (aging and pruning live in the core), drawing only
    // reads what survived.
    fn draw_effects(&self, now_ms: f32) {
        let ctx = &self.ctx;
        let mut effects = self.core.effects_mut();
        update_effects(&mut effects, now_ms);
        for effect in effects.iter() {
            let progress = effect_progress(effect, now_ms) as f64;
            let x = effect.x as f64;
            let y = effect.y as f64;

            ctx.set_global_alpha(1.0 - progress);
            ctx.set_stroke_style_str(RING_COLOR);
            ctx.set_line_width(RING_LINE_WIDTH);
            ctx.begin_path();
            let ring_radius = EFFECT_RING_MAX_RADIUS as f64 * progress;
            let _ = ctx.arc(x, y, ring_radius.max(0.1), 0.0, std::f64::consts::TAU);
            ctx.stroke();

            if progress < 0.5 {
                ctx.set_global_alpha((1.0 - progress * 2.0) * BURST_ALPHA);
                ctx.set_fill_style_str(BURST_FILL_COLOR);
                ctx.begin_path();
                let burst_radius =
                    BURST_RADIUS_MIN + (BURST_RADIUS_MAX - BURST_RADIUS_MIN) * progress * 2.0;
                let _ = ctx.arc(x, y, burst_radius, 0.0, std::f64::consts::TAU);
                ctx.fill();
            }

            for particle in &effect.particles {
                if particle.life <= 0.0 {
                    continue;
                }
                ctx.set_global_alpha(particle.life as f64);
                ctx.set_fill_style_str(PARTICLE_COLORS[particle.color as usize]);
                ctx.begin_path();
                let radius = (particle.radius * particle.life) as f64;
                let _ = ctx.arc(particle.x as f64, particle.y as f64, radius.max(0.1), 0.0, std::f64::consts::TAU);
                ctx.fill();
            }
        }
        ctx.set_global_alpha(1.0);
    }
}
