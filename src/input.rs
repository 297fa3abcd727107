use web_sys::{DomRect, Element, HtmlCanvasElement, MouseEvent, Touch, TouchEvent};

pub(crate) trait HasClientRect {
    fn client_rect(&self) -> DomRect;
}

impl HasClientRect for HtmlCanvasElement {
    fn client_rect(&self) -> DomRect {
        self.get_bounding_client_rect()
    }
}

impl HasClientRect for Element {
    fn client_rect(&self) -> DomRect {
        self.get_bounding_client_rect()
    }
}

// Maps client (screen) coordinates into canvas buffer pixels. The buffer is
// sized independently of the CSS box (device pixel ratio, layout), so the
// ratio between the two is applied per axis.
pub(crate) fn screen_to_canvas_coords(
    screen_x: f32,
    screen_y: f32,
    canvas: &HtmlCanvasElement,
) -> Option<(f32, f32)> {
    let rect = canvas.client_rect();
    let rect_width = rect.width() as f32;
    let rect_height = rect.height() as f32;
    if rect_width <= 0.0 || rect_height <= 0.0 {
        return None;
    }
    let scale_x = canvas.width() as f32 / rect_width;
    let scale_y = canvas.height() as f32 / rect_height;
    let x = (screen_x - rect.left() as f32) * scale_x;
    let y = (screen_y - rect.top() as f32) * scale_y;
    Some((x, y))
}

pub(crate) fn mouse_canvas_coords(
    event: &MouseEvent,
    canvas: &HtmlCanvasElement,
) -> Option<(f32, f32)> {
    screen_to_canvas_coords(event.client_x() as f32, event.client_y() as f32, canvas)
}

fn touch_coords(touch: &Touch, canvas: &HtmlCanvasElement) -> Option<(f32, f32)> {
    screen_to_canvas_coords(touch.client_x() as f32, touch.client_y() as f32, canvas)
}

pub(crate) fn first_touch_canvas_coords(
    event: &TouchEvent,
    canvas: &HtmlCanvasElement,
) -> Option<(f32, f32)> {
    let touch = event.touches().get(0)?;
    touch_coords(&touch, canvas)
}

// touchend carries the lifted finger in changedTouches only.
pub(crate) fn changed_touch_canvas_coords(
    event: &TouchEvent,
    canvas: &HtmlCanvasElement,
) -> Option<(f32, f32)> {
    let touch = event.changed_touches().get(0)?;
    touch_coords(&touch, canvas)
}
