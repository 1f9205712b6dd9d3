/// Translation of winit window events into surface pointer events.
///
/// winit reports raw cursor motion and button transitions; the dispatch
/// layer expects the browser-style stream (down, up, click, context menu,
/// double click). [`PointerInput`] keeps the little state needed to
/// synthesize the latter.

use std::time::{Duration, Instant};
use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use crate::error::Result;
use crate::root::{Root, Size};
use super::event::{EventName, NativePointerEvent};

/// Two primary clicks closer than this form a double click
pub const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(300);

/// Pixels per scrolled line
const WHEEL_LINE_PIXELS: f32 = 40.0;

/// Cursor state carried between window events
#[derive(Debug, Clone)]
pub struct PointerInput {
    /// Cursor position in logical pixels
    position: Vec2,
    scale_factor: f64,
    pressed: Option<u16>,
    last_click: Option<Instant>,
}

impl Default for PointerInput {
    fn default() -> Self {
        Self { position: Vec2::ZERO, scale_factor: 1.0, pressed: None, last_click: None }
    }
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Physical-to-logical ratio used for positions and sizes
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    /// Surface events produced by one window event
    pub fn translate(&mut self, event: &WindowEvent) -> Vec<(EventName, NativePointerEvent)> {
        self.translate_at(event, Instant::now())
    }

    /// Same as [`translate`](Self::translate) with an explicit clock reading
    pub fn translate_at(&mut self, event: &WindowEvent, now: Instant) -> Vec<(EventName, NativePointerEvent)> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let scale = self.scale_factor;
                self.cursor_moved(Vec2::new((position.x / scale) as f32, (position.y / scale) as f32))
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.button(button_code(*button), *state == ElementState::Pressed, now)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y) * WHEEL_LINE_PIXELS,
                    MouseScrollDelta::PixelDelta(pixels) => Vec2::new(pixels.x as f32, pixels.y as f32),
                };
                // winit scrolls up on positive y; wheel deltas scroll down on positive y
                self.wheel(-amount)
            }
            WindowEvent::CursorLeft { .. } => self.cursor_left(),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.set_scale_factor(*scale_factor);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn cursor_moved(&mut self, position: Vec2) -> Vec<(EventName, NativePointerEvent)> {
        self.position = position;
        vec![(EventName::PointerMove, self.native(self.pressed.unwrap_or(0)))]
    }

    /// Button transition; a release of the held button also yields the click family
    pub fn button(&mut self, button: u16, pressed: bool, now: Instant) -> Vec<(EventName, NativePointerEvent)> {
        let native = self.native(button);
        if pressed {
            self.pressed = Some(button);
            return vec![(EventName::PointerDown, native)];
        }

        let mut events = vec![(EventName::PointerUp, native)];
        if self.pressed.take() != Some(button) {
            return events;
        }
        match button {
            0 => {
                events.push((EventName::Click, native));
                let double = self
                    .last_click
                    .is_some_and(|last| now.saturating_duration_since(last) <= DOUBLE_CLICK_INTERVAL);
                if double {
                    events.push((EventName::DoubleClick, native));
                    self.last_click = None;
                } else {
                    self.last_click = Some(now);
                }
            }
            2 => events.push((EventName::ContextMenu, native)),
            _ => {}
        }
        events
    }

    pub fn wheel(&mut self, delta: Vec2) -> Vec<(EventName, NativePointerEvent)> {
        let native = NativePointerEvent { wheel_delta: delta, ..self.native(0) };
        vec![(EventName::Wheel, native)]
    }

    pub fn cursor_left(&mut self) -> Vec<(EventName, NativePointerEvent)> {
        self.pressed = None;
        vec![(EventName::PointerLeave, self.native(0))]
    }

    fn native(&self, button: u16) -> NativePointerEvent {
        NativePointerEvent { offset: self.position, pointer_id: 1, button, wheel_delta: Vec2::ZERO }
    }
}

fn button_code(button: MouseButton) -> u16 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::Back => 3,
        MouseButton::Forward => 4,
        MouseButton::Other(code) => code,
    }
}

impl Root {
    /// Feed one window event to the root
    ///
    /// Resizes the root on `Resized` and dispatches every pointer event
    /// `input` derives from the window event.
    pub fn handle_window_event(&mut self, input: &mut PointerInput, event: &WindowEvent) -> Result<()> {
        if let WindowEvent::Resized(size) = event {
            let scale = input.scale_factor() as f32;
            self.set_size(Size::new(size.width as f32 / scale, size.height as f32 / scale));
        }
        if let WindowEvent::ScaleFactorChanged { scale_factor, .. } = event {
            self.set_dpr(*scale_factor as f32);
        }
        for (name, native) in input.translate(event) {
            self.handle_pointer(name, &native)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "winit_input_tests.rs"]
mod tests;
