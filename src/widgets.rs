//! Immediate-mode widgets drawn with the shape and text renderers.
//!
//! Every widget is positioned by its centre, like [`Pose`]. `update` does the hit testing
//! against a [`CursorState`] and returns whether anything changed; `draw` only renders.

use crate::backend::RenderBackend;
use crate::input::{CursorState, BACKSPACE, DELETE};
use crate::utils::{Color, Pose, Position, Rectangle};
use crate::Engine;

/// Label height relative to the widget height.
const LABEL_RATIO: f32 = 0.6;

fn hit(pose: &Pose, cursor: &CursorState) -> bool {
    pose.contains(cursor.position())
}

/// Text scale that makes glyphs roughly `height` pixels tall.
fn label_scale<B: RenderBackend>(engine: &Engine<B>, height: f32) -> f32 {
    let baked = engine.font().metrics().pixel_height;
    if baked > 0.0 {
        height * LABEL_RATIO / baked
    } else {
        1.0
    }
}

fn draw_centered_label<B: RenderBackend>(
    engine: &mut Engine<B>,
    text: &str,
    center: Position,
    height: f32,
    color: Color,
) {
    if text.is_empty() {
        return;
    }
    let scale = label_scale(engine, height);
    let size = engine.measure_text(text, scale);
    engine.draw_text(
        text,
        center.x - size.width / 2.0,
        center.y - size.height / 2.0,
        scale,
        color,
    );
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WidgetState {
    pub hover: bool,
    pub pressed: bool,
    pub focused: bool,
}

pub struct Button {
    pub pose: Pose,
    pub label: String,
    pub label_color: Color,
    pub state: WidgetState,
    pub on_click: Option<Box<dyn FnMut()>>,
}

impl Button {
    pub fn new(x: f32, y: f32, width: f32, height: f32, label: &str) -> Self {
        Self {
            pose: Pose::new(x, y, width, height, Color::rgb(0.3, 0.3, 0.6)),
            label: label.to_string(),
            label_color: Color::WHITE,
            state: WidgetState::default(),
            on_click: None,
        }
    }

    pub fn with_callback(mut self, on_click: impl FnMut() + 'static) -> Self {
        self.on_click = Some(Box::new(on_click));
        self
    }

    /// Returns true on the frame the button is released over itself.
    pub fn update(&mut self, cursor: &CursorState) -> bool {
        let over = hit(&self.pose, cursor);
        self.state.hover = over;
        if over && cursor.down {
            self.state.pressed = true;
        } else if self.state.pressed && !cursor.down {
            self.state.pressed = false;
            if over {
                if let Some(on_click) = self.on_click.as_mut() {
                    on_click();
                }
                return true;
            }
        }
        false
    }

    pub fn draw<B: RenderBackend>(&self, engine: &mut Engine<B>) {
        let mut color = self.pose.color;
        if self.state.hover {
            color = color.scaled(1.2);
        }
        if self.state.pressed {
            color = self.pose.color.scaled(0.8);
        }
        engine.draw_rectangle(Pose { color, ..self.pose });
        draw_centered_label(
            engine,
            &self.label,
            Position::new(self.pose.x, self.pose.y),
            self.pose.height,
            self.label_color,
        );
    }
}

pub struct Slider {
    pub track: Pose,
    pub handle: Pose,
    pub min: f32,
    pub max: f32,
    value: f32,
    dragging: bool,
    pub on_change: Option<Box<dyn FnMut(f32)>>,
}

impl Slider {
    pub fn new(x: f32, y: f32, width: f32, height: f32, min: f32, max: f32, value: f32) -> Self {
        let mut slider = Self {
            track: Pose::new(x, y, width, height, Color::rgb(0.2, 0.2, 0.2)),
            handle: Pose::new(x, y, height, height, Color::rgb(0.8, 0.8, 0.8)),
            min,
            max,
            value,
            dragging: false,
            on_change: None,
        };
        slider.set_value(value);
        slider
    }

    pub fn with_callback(mut self, on_change: impl FnMut(f32) + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn track_left(&self) -> f32 {
        self.track.x - self.track.width / 2.0
    }

    /// Sets the value (clamped to the range) and moves the handle to match.
    pub fn set_value(&mut self, value: f32) {
        let (lo, hi) = (self.min.min(self.max), self.min.max(self.max));
        self.value = value.clamp(lo, hi);
        let span = self.max - self.min;
        let ratio = if span != 0.0 {
            (self.value - self.min) / span
        } else {
            0.0
        };
        self.handle.x = self.track_left() + ratio * self.track.width;
    }

    fn move_handle_to(&mut self, x: f32) -> bool {
        let left = self.track_left();
        let x = x.clamp(left, left + self.track.width);
        let ratio = if self.track.width > 0.0 {
            (x - left) / self.track.width
        } else {
            0.0
        };
        let value = self.min + ratio * (self.max - self.min);
        if value == self.value {
            return false;
        }
        self.value = value;
        self.handle.x = x;
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(value);
        }
        true
    }

    /// Drags the handle, or jumps it to a click on the track. Returns true if the value moved.
    pub fn update(&mut self, cursor: &CursorState) -> bool {
        if self.dragging {
            if cursor.down {
                return self.move_handle_to(cursor.x);
            }
            self.dragging = false;
            return false;
        }
        let over_handle = hit(&self.handle, cursor);
        let over_track = hit(&self.track, cursor);
        if cursor.down && (over_handle || over_track) {
            self.dragging = true;
            if over_track && !over_handle {
                return self.move_handle_to(cursor.x);
            }
        }
        false
    }

    pub fn draw<B: RenderBackend>(&self, engine: &mut Engine<B>) {
        engine.draw_rectangle(self.track);
        engine.draw_rectangle(self.handle);
    }
}

pub struct Toggle {
    pub pose: Pose,
    pub label: String,
    pub label_color: Color,
    pub checked: bool,
    pub state: WidgetState,
    pub on_toggle: Option<Box<dyn FnMut(bool)>>,
}

impl Toggle {
    pub fn new(x: f32, y: f32, width: f32, height: f32, label: &str, checked: bool) -> Self {
        Self {
            pose: Pose::new(x, y, width, height, Color::rgb(0.2, 0.2, 0.2)),
            label: label.to_string(),
            label_color: Color::WHITE,
            checked,
            state: WidgetState::default(),
            on_toggle: None,
        }
    }

    pub fn with_callback(mut self, on_toggle: impl FnMut(bool) + 'static) -> Self {
        self.on_toggle = Some(Box::new(on_toggle));
        self
    }

    /// Flips `checked` when released over the box.
    pub fn update(&mut self, cursor: &CursorState) -> bool {
        let over = hit(&self.pose, cursor);
        self.state.hover = over;
        if over && cursor.down {
            self.state.pressed = true;
        } else if self.state.pressed && !cursor.down {
            self.state.pressed = false;
            if over {
                self.checked = !self.checked;
                if let Some(on_toggle) = self.on_toggle.as_mut() {
                    on_toggle(self.checked);
                }
                return true;
            }
        }
        false
    }

    pub fn draw<B: RenderBackend>(&self, engine: &mut Engine<B>) {
        engine.draw_rectangle(self.pose);
        if self.checked {
            let side = self.pose.height * LABEL_RATIO;
            engine.draw_rectangle(Pose {
                width: side,
                height: side,
                color: Color::WHITE,
                ..self.pose
            });
        }
        if !self.label.is_empty() {
            let scale = label_scale(engine, self.pose.height);
            let size = engine.measure_text(&self.label, scale);
            engine.draw_text(
                &self.label,
                self.pose.x + self.pose.width / 2.0 + self.pose.height * 0.25,
                self.pose.y - size.height / 2.0,
                scale,
                self.label_color,
            );
        }
    }
}

pub struct ProgressBar {
    pub pose: Pose,
    pub fill_color: Color,
    pub min: f32,
    pub max: f32,
    pub show_text: bool,
    value: f32,
}

impl ProgressBar {
    pub fn new(x: f32, y: f32, width: f32, height: f32, min: f32, max: f32, value: f32) -> Self {
        let mut bar = Self {
            pose: Pose::new(x, y, width, height, Color::rgb(0.2, 0.2, 0.2)),
            fill_color: Color::rgb(0.2, 0.6, 0.2),
            min,
            max,
            show_text: true,
            value: min,
        };
        bar.set_value(value);
        bar
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set_value(&mut self, value: f32) {
        let (lo, hi) = (self.min.min(self.max), self.min.max(self.max));
        self.value = value.clamp(lo, hi);
    }

    pub fn ratio(&self) -> f32 {
        let span = self.max - self.min;
        if span == 0.0 {
            0.0
        } else {
            (self.value - self.min) / span
        }
    }

    /// The filled part, growing from the left edge.
    pub fn fill(&self) -> Pose {
        let width = self.ratio() * self.pose.width;
        Pose {
            x: self.pose.x - self.pose.width / 2.0 + width / 2.0,
            width,
            color: self.fill_color,
            ..self.pose
        }
    }

    pub fn draw<B: RenderBackend>(&self, engine: &mut Engine<B>) {
        engine.draw_rectangle(self.pose);
        let fill = self.fill();
        if fill.width > 0.0 {
            engine.draw_rectangle(fill);
        }
        if self.show_text {
            let percent = format!("{:.0}%", self.ratio() * 100.0);
            draw_centered_label(
                engine,
                &percent,
                Position::new(self.pose.x, self.pose.y),
                self.pose.height,
                Color::WHITE,
            );
        }
    }
}

pub struct MenuItem {
    pub label: String,
    pub enabled: bool,
    pub sub_items: Vec<MenuItem>,
    pub on_select: Option<Box<dyn FnMut()>>,
}

impl MenuItem {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            enabled: true,
            sub_items: Vec::new(),
            on_select: None,
        }
    }

    pub fn with_callback(mut self, on_select: impl FnMut() + 'static) -> Self {
        self.on_select = Some(Box::new(on_select));
        self
    }

    pub fn with_sub_item(mut self, item: MenuItem) -> Self {
        self.sub_items.push(item);
        self
    }

    fn select(&mut self) {
        if !self.enabled {
            return;
        }
        if let Some(on_select) = self.on_select.as_mut() {
            on_select();
        }
    }
}

pub struct MenuBar {
    pub pose: Pose,
    pub label_color: Color,
    pub items: Vec<MenuItem>,
    active: Option<usize>,
    hovered: Option<usize>,
    expanded: bool,
    was_down: bool,
}

impl MenuBar {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pose: Pose::new(x, y, width, height, Color::rgb(0.3, 0.3, 0.3)),
            label_color: Color::WHITE,
            items: Vec::new(),
            active: None,
            hovered: None,
            expanded: false,
            was_down: false,
        }
    }

    pub fn with_item(mut self, item: MenuItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    fn item_width(&self) -> f32 {
        self.pose.width / self.items.len().max(1) as f32
    }

    fn item_pose(&self, index: usize) -> Pose {
        let width = self.item_width();
        Pose {
            x: self.pose.x - self.pose.width / 2.0 + width / 2.0 + index as f32 * width,
            width,
            ..self.pose
        }
    }

    fn sub_item_pose(&self, menu: usize, index: usize) -> Pose {
        let top = self.item_pose(menu);
        Pose {
            y: self.pose.y + self.pose.height / 2.0 + (index as f32 + 0.5) * self.pose.height,
            color: Color::rgb(0.25, 0.25, 0.25),
            ..top
        }
    }

    fn close(&mut self) {
        self.active = None;
        self.expanded = false;
    }

    /// Tracks the hovered item and opens, closes or selects on a fresh press.
    pub fn update(&mut self, cursor: &CursorState) -> bool {
        if self.items.is_empty() {
            return false;
        }
        let pressed = cursor.down && !self.was_down;
        self.was_down = cursor.down;
        let mut changed = false;

        let over_bar = hit(&self.pose, cursor);
        let hovered = if over_bar {
            let left = self.pose.x - self.pose.width / 2.0;
            let index = ((cursor.x - left) / self.item_width()).floor();
            (index >= 0.0 && (index as usize) < self.items.len()).then_some(index as usize)
        } else {
            None
        };
        if hovered != self.hovered {
            self.hovered = hovered;
            changed = true;
        }
        if !pressed {
            return changed;
        }

        if let Some(index) = hovered {
            if self.expanded && self.active == Some(index) {
                self.close();
            } else if self.items[index].sub_items.is_empty() {
                self.close();
                self.items[index].select();
            } else {
                self.active = Some(index);
                self.expanded = true;
            }
            return true;
        }

        if self.expanded {
            if let Some(menu) = self.active {
                let picked = (0..self.items[menu].sub_items.len())
                    .find(|&j| hit(&self.sub_item_pose(menu, j), cursor));
                if let Some(j) = picked {
                    self.items[menu].sub_items[j].select();
                }
            }
            self.close();
            changed = true;
        }
        changed
    }

    pub fn draw<B: RenderBackend>(&self, engine: &mut Engine<B>) {
        engine.draw_rectangle(self.pose);
        for (i, item) in self.items.iter().enumerate() {
            let mut pose = self.item_pose(i);
            if self.active == Some(i) || self.hovered == Some(i) {
                pose.color = pose.color.lightened(0.1);
            }
            engine.draw_rectangle(pose);
            let color = if item.enabled {
                self.label_color
            } else {
                self.label_color.with_alpha(0.4)
            };
            draw_centered_label(
                engine,
                &item.label,
                Position::new(pose.x, pose.y),
                pose.height,
                color,
            );
        }

        let Some(menu) = self.active.filter(|_| self.expanded) else {
            return;
        };
        let Some(item) = self.items.get(menu) else {
            return;
        };
        for (j, sub) in item.sub_items.iter().enumerate() {
            let pose = self.sub_item_pose(menu, j);
            engine.draw_rectangle(pose);
            draw_centered_label(
                engine,
                &sub.label,
                Position::new(pose.x, pose.y),
                pose.height,
                self.label_color,
            );
        }
    }
}

/// Single-line ASCII text input.
pub struct TextField {
    pub pose: Pose,
    pub text_color: Color,
    pub state: WidgetState,
    pub on_change: Option<Box<dyn FnMut(&str)>>,
    text: String,
    cursor: usize,
    capacity: usize,
}

impl TextField {
    /// `capacity` is the maximum number of characters the field accepts.
    pub fn new(x: f32, y: f32, width: f32, height: f32, capacity: usize) -> Self {
        Self {
            pose: Pose::new(x, y, width, height, Color::WHITE),
            text_color: Color::BLACK,
            state: WidgetState::default(),
            on_change: None,
            text: String::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    pub fn with_callback(mut self, on_change: impl FnMut(&str) + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text
            .chars()
            .filter(|c| c.is_ascii() && !c.is_ascii_control())
            .take(self.capacity)
            .collect();
        self.cursor = self.text.len();
    }

    pub fn move_cursor(&mut self, position: usize) {
        self.cursor = position.min(self.text.len());
    }

    /// Focus follows clicks; while focused, `keys` (everything typed this frame, oldest
    /// first) edit the text at the cursor.
    pub fn update(&mut self, cursor: &CursorState, keys: &[char]) -> bool {
        let over = hit(&self.pose, cursor);
        self.state.hover = over;
        let mut changed = false;
        if cursor.down && over {
            self.state.focused = true;
            changed = true;
        } else if cursor.down && self.state.focused {
            self.state.focused = false;
            changed = true;
        }

        if !self.state.focused {
            return changed;
        }
        let mut edited = false;
        for &key in keys {
            edited |= self.apply_key(key);
        }
        if edited {
            if let Some(on_change) = self.on_change.as_mut() {
                on_change(&self.text);
            }
        }
        changed || edited
    }

    fn apply_key(&mut self, key: char) -> bool {
        match key {
            BACKSPACE => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.text.remove(self.cursor);
                    true
                } else {
                    false
                }
            }
            DELETE => {
                if self.cursor < self.text.len() {
                    self.text.remove(self.cursor);
                    true
                } else {
                    false
                }
            }
            ' '..='~' if self.text.len() < self.capacity => {
                self.text.insert(self.cursor, key);
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }

    pub fn draw<B: RenderBackend>(&self, engine: &mut Engine<B>) {
        engine.draw_rectangle(self.pose);
        let bounds: Rectangle = self.pose.bounds();
        let padding = self.pose.height * 0.2;
        let scale = label_scale(engine, self.pose.height);
        let line = engine.measure_text("M", scale).height;
        let top = self.pose.y - line / 2.0;
        engine.draw_text(&self.text, bounds.x + padding, top, scale, self.text_color);

        if self.state.focused {
            let before = engine.measure_text(&self.text[..self.cursor], scale).width;
            engine.draw_rectangle(Pose::new(
                bounds.x + padding + before + 1.0,
                self.pose.y,
                2.0,
                line,
                self.text_color,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32, down: bool) -> CursorState {
        CursorState { x, y, down }
    }

    #[test]
    fn button_fires_on_release_over_itself() {
        use std::cell::Cell;
        use std::rc::Rc;

        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let mut button =
            Button::new(100.0, 100.0, 80.0, 30.0, "OK").with_callback(move || {
                counter.set(counter.get() + 1)
            });

        assert!(!button.update(&at(100.0, 100.0, true)));
        assert!(button.state.pressed);
        assert!(button.update(&at(100.0, 100.0, false)));
        assert_eq!(clicks.get(), 1);

        // pressed inside, released outside
        button.update(&at(100.0, 100.0, true));
        assert!(!button.update(&at(300.0, 300.0, false)));
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn slider_jumps_to_track_click_and_clamps_drag() {
        let mut slider = Slider::new(100.0, 50.0, 200.0, 20.0, 0.0, 10.0, 0.0);
        assert_eq!(slider.handle.x, 0.0);

        // track spans x = 0..200; clicking at 150 is 75%
        assert!(slider.update(&at(150.0, 50.0, true)));
        assert!((slider.value() - 7.5).abs() < 1e-5);
        assert!(slider.is_dragging());

        assert!(slider.update(&at(500.0, 50.0, true)));
        assert_eq!(slider.value(), 10.0);
        assert_eq!(slider.handle.x, 200.0);

        assert!(!slider.update(&at(500.0, 50.0, false)));
        assert!(!slider.is_dragging());
    }

    #[test]
    fn toggle_flips_once_per_click() {
        let mut toggle = Toggle::new(20.0, 20.0, 20.0, 20.0, "sound", false);
        toggle.update(&at(20.0, 20.0, true));
        toggle.update(&at(20.0, 20.0, true));
        assert!(toggle.update(&at(20.0, 20.0, false)));
        assert!(toggle.checked);
        assert!(!toggle.update(&at(20.0, 20.0, false)));
        assert!(toggle.checked);
    }

    #[test]
    fn progress_fill_grows_from_the_left_edge() {
        let bar = ProgressBar::new(100.0, 10.0, 200.0, 20.0, 0.0, 100.0, 25.0);
        let fill = bar.fill();
        assert_eq!(fill.width, 50.0);
        assert_eq!(fill.x, 25.0);
        assert_eq!(ProgressBar::new(0.0, 0.0, 10.0, 10.0, 0.0, 1.0, 5.0).value(), 1.0);
    }

    #[test]
    fn menu_opens_closes_and_selects_sub_items() {
        use std::cell::Cell;
        use std::rc::Rc;

        let opened = Rc::new(Cell::new(false));
        let flag = opened.clone();
        let mut menu = MenuBar::new(100.0, 10.0, 200.0, 20.0)
            .with_item(
                MenuItem::new("File")
                    .with_sub_item(MenuItem::new("Open").with_callback(move || flag.set(true))),
            )
            .with_item(MenuItem::new("Help"));

        // items are 100 wide: File spans x 0..100, Help 100..200
        assert!(menu.update(&at(150.0, 10.0, false)));
        assert_eq!(menu.hovered(), Some(1));

        menu.update(&at(50.0, 10.0, true));
        assert_eq!(menu.active(), Some(0));
        assert!(menu.is_expanded());

        // holding the button does not toggle again
        menu.update(&at(50.0, 10.0, true));
        assert!(menu.is_expanded());

        // first sub item sits right below the bar, centred at y = 30
        menu.update(&at(50.0, 10.0, false));
        assert!(menu.update(&at(50.0, 30.0, true)));
        assert!(opened.get());
        assert!(!menu.is_expanded());
        assert_eq!(menu.active(), None);
    }

    #[test]
    fn text_field_edits_at_the_cursor_when_focused() {
        let mut field = TextField::new(100.0, 100.0, 200.0, 30.0, 4);
        assert!(!field.update(&at(0.0, 0.0, false), &['a']));
        assert_eq!(field.text(), "");

        field.update(&at(100.0, 100.0, true), &[]);
        assert!(field.state.focused);
        let up = at(100.0, 100.0, false);
        for c in ['a', 'b', 'c'] {
            assert!(field.update(&up, &[c]));
        }
        field.move_cursor(1);
        field.update(&up, &['x']);
        assert_eq!(field.text(), "axbc");
        // full
        assert!(!field.update(&up, &['z']));

        field.update(&up, &[BACKSPACE]);
        assert_eq!(field.text(), "abc");
        field.update(&up, &[DELETE]);
        assert_eq!(field.text(), "ac");
        assert_eq!(field.cursor(), 1);

        // clicking elsewhere drops focus
        field.update(&at(400.0, 400.0, true), &[]);
        assert!(!field.state.focused);
    }

    #[test]
    fn text_field_takes_every_key_typed_in_one_frame() {
        use std::cell::Cell;
        use std::rc::Rc;

        let changes = Rc::new(Cell::new(0));
        let counter = changes.clone();
        let mut field = TextField::new(100.0, 100.0, 200.0, 30.0, 16)
            .with_callback(move |_| counter.set(counter.get() + 1));
        field.update(&at(100.0, 100.0, true), &[]);

        let up = at(100.0, 100.0, false);
        assert!(field.update(&up, &['h', 'e', 'y', BACKSPACE, 'l', 'l', 'o']));
        assert_eq!(field.text(), "hello");
        assert_eq!(field.cursor(), 5);
        assert_eq!(changes.get(), 1);

        field.set_text("tab\there é!");
        assert_eq!(field.text(), "tabthere !");
        assert_eq!(field.cursor(), 10);
    }
}
