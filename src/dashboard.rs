//! The multi-stream imgui front end.
//!
//! One window per stream shows the latest annotated frame with its counts.
//! Clicks and hovering over the image are mapped back to frame pixels and
//! sent to the stream's worker as [`Command`]s; the key bindings apply to
//! whichever stream window has focus.

use imgui::{Condition, Key, MouseButton, Ui};
use imgui_glow_renderer::AutoRenderer;

use crate::config::Settings;
use crate::counter::RegionCounts;
use crate::geometry::Point;
use crate::image::Image;
use crate::keymap::{Keymap, ENTER, ESCAPE};
use crate::session::Command;
use crate::stream::StreamHandle;
use crate::*;

/// Splits `NAME=URL`. Without a name the input doubles as one.
pub fn parse_stream(arg: &str) -> (String, String) {
    match arg.split_once('=') {
        Some((name, input)) if !name.trim().is_empty() => {
            (name.trim().to_string(), input.trim().to_string())
        }
        _ => (arg.trim().to_string(), arg.trim().to_string()),
    }
}

/// The imgui key for a keymap character, if imgui has one.
pub fn imgui_key(key: char) -> Option<Key> {
    Some(match key {
        ENTER => Key::Enter,
        ESCAPE => Key::Escape,
        ' ' => Key::Space,
        'a' => Key::A,
        'b' => Key::B,
        'c' => Key::C,
        'd' => Key::D,
        'e' => Key::E,
        'f' => Key::F,
        'g' => Key::G,
        'h' => Key::H,
        'i' => Key::I,
        'j' => Key::J,
        'k' => Key::K,
        'l' => Key::L,
        'm' => Key::M,
        'n' => Key::N,
        'o' => Key::O,
        'p' => Key::P,
        'q' => Key::Q,
        'r' => Key::R,
        's' => Key::S,
        't' => Key::T,
        'u' => Key::U,
        'v' => Key::V,
        'w' => Key::W,
        'x' => Key::X,
        'y' => Key::Y,
        'z' => Key::Z,
        '0' => Key::Alpha0,
        '1' => Key::Alpha1,
        '2' => Key::Alpha2,
        '3' => Key::Alpha3,
        '4' => Key::Alpha4,
        '5' => Key::Alpha5,
        '6' => Key::Alpha6,
        '7' => Key::Alpha7,
        '8' => Key::Alpha8,
        '9' => Key::Alpha9,
        _ => return None,
    })
}

/// Case-insensitive substring match of a stream title against the filter.
/// An empty filter shows every stream.
pub fn matches_filter(title: &str, filter: &str) -> bool {
    title.to_lowercase().contains(&filter.to_lowercase())
}

/// Maps a screen position over a displayed image back to frame pixels.
pub fn to_frame_point(mouse: [f32; 2], origin: [f32; 2], scale: f32) -> Point {
    Point::new(
        ((mouse[0] - origin[0]) / scale) as i32,
        ((mouse[1] - origin[1]) / scale) as i32,
    )
}

pub fn format_counts(counts: &RegionCounts) -> String {
    if counts.is_empty() {
        return "no hits".to_string();
    }
    counts
        .iter()
        .map(|(color, n)| format!("{color}: {n}"))
        .collect::<Vec<_>>()
        .join("  ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TileAction {
    Keep,
    Remove,
}

struct Tile {
    id: usize,
    title: String,
    rename: Option<String>,
    handle: StreamHandle,
    image: Image,
    last_pointer: Option<Point>,
    status: Option<String>,
}

impl Tile {
    fn show(&mut self, ui: &Ui, renderer: &mut AutoRenderer, keymap: &Keymap) -> TileAction {
        let mut action = TileAction::Keep;
        let title = format!("{}##stream{}", self.title, self.id);

        ui.window(&title)
            .size([820., 520.], Condition::FirstUseEver)
            .build(|| {
                action = self.toolbar(ui);
                self.frame(ui, renderer);

                if let Some(outcome) = self.handle.outcome() {
                    ui.text_colored([1., 0.4, 0.4, 1.], outcome);
                }
                if let Some(status) = &self.status {
                    ui.text(status);
                }

                if ui.is_window_focused() && self.rename.is_none() && !ui.io().want_text_input {
                    for (key, bound) in keymap.iter() {
                        if imgui_key(key).is_some_and(|k| ui.is_key_pressed(k)) {
                            self.handle.send(bound.command());
                        }
                    }
                }
            });
        action
    }

    fn toolbar(&mut self, ui: &Ui) -> TileAction {
        match self.rename.as_mut() {
            Some(buffer) => {
                let entered = ui
                    .input_text("##name", buffer)
                    .enter_returns_true(true)
                    .build();
                ui.same_line();
                if entered || ui.button("Save") {
                    let name = buffer.trim().to_string();
                    if !name.is_empty() {
                        self.title = name;
                    }
                    self.rename = None;
                }
            }
            None => {
                ui.text(&self.title);
                ui.same_line();
                if ui.button("Rename") {
                    self.rename = Some(self.title.clone());
                }
            }
        }

        ui.same_line();
        if ui.button("Snapshot") {
            self.status = Some(self.snapshot());
        }
        ui.same_line();
        if ui.button("Remove") {
            return TileAction::Remove;
        }
        TileAction::Keep
    }

    fn snapshot(&self) -> String {
        let Some(latest) = self.handle.latest() else {
            return "nothing to save yet".to_string();
        };
        match utils::save_frame(&latest.frame, &format!("{}.png", self.title)) {
            Ok(file) => format!("saved {}", file.display()),
            Err(e) => {
                log::warn!("{}: snapshot failed: {e}", self.title);
                format!("snapshot failed: {e}")
            }
        }
    }

    fn frame(&mut self, ui: &Ui, renderer: &mut AutoRenderer) {
        let Some(snapshot) = self.handle.latest() else {
            ui.text(format!("connecting to {}", self.handle.input));
            return;
        };
        let lock = if snapshot.locked { "locked" } else { "editing" };
        ui.text(format!("[{lock}] {}", format_counts(&snapshot.counts)));

        let (texture_id, size) = match self.image.upload(&snapshot.frame, renderer) {
            Ok(uploaded) => uploaded,
            Err(e) => {
                ui.text(format!("cannot show frame: {e}"));
                return;
            }
        };

        let scale = (ui.content_region_avail()[0] / size[0]).clamp(0.1, 1.);
        let origin = ui.cursor_screen_pos();
        imgui::Image::new(texture_id, [size[0] * scale, size[1] * scale]).build(ui);

        if !ui.is_item_hovered() {
            return;
        }
        let point = to_frame_point(ui.io().mouse_pos, origin, scale);
        if self.last_pointer != Some(point) {
            self.last_pointer = Some(point);
            self.handle.send(Command::PointerMove(point));
        }
        if ui.is_mouse_clicked(MouseButton::Left) {
            self.handle.send(Command::Click(point));
        }
    }
}

pub struct Dashboard {
    settings: Settings,
    tiles: Vec<Tile>,
    next_id: usize,
    new_name: String,
    new_input: String,
    filter: String,
    status: Option<String>,
    quit: bool,
}

impl Dashboard {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            tiles: Vec::new(),
            next_id: 0,
            new_name: String::new(),
            new_input: String::new(),
            filter: String::new(),
            status: None,
            quit: false,
        }
    }

    pub fn add(&mut self, name: &str, input: &str) -> Result<()> {
        let handle = StreamHandle::spawn(name, input, &self.settings)?;
        log::info!("added stream {name} ({input})");
        self.tiles.push(Tile {
            id: self.next_id,
            title: name.to_string(),
            rename: None,
            handle,
            image: Image::default(),
            last_pointer: None,
            status: None,
        });
        self.next_id += 1;
        Ok(())
    }

    /// Draws one UI frame. Returns `false` once the user asked to quit.
    pub fn frame(&mut self, ui: &Ui, renderer: &mut AutoRenderer) -> bool {
        self.control_panel(ui);

        let mut removed = Vec::new();
        for (idx, tile) in self.tiles.iter_mut().enumerate() {
            // drained even when hidden or collapsed so the worker can hand
            // over the next frame
            tile.handle.refresh();
            if !matches_filter(&tile.title, &self.filter) {
                continue;
            }
            if tile.show(ui, renderer, &self.settings.keymap) == TileAction::Remove {
                removed.push(idx);
            }
        }
        for idx in removed.into_iter().rev() {
            let mut tile = self.tiles.remove(idx);
            tile.image.release(renderer);
            log::info!("removing stream {}", tile.title);
            tile.handle.shutdown();
        }

        if self.quit {
            for tile in self.tiles.drain(..) {
                tile.handle.shutdown();
            }
        }
        !self.quit
    }

    fn control_panel(&mut self, ui: &Ui) {
        ui.window("Streams")
            .size([360., 260.], Condition::FirstUseEver)
            .position([10., 10.], Condition::FirstUseEver)
            .build(|| {
                ui.input_text("name", &mut self.new_name).build();
                ui.input_text("url or camera", &mut self.new_input).build();
                if ui.button("Add") && !self.new_input.trim().is_empty() {
                    let input = self.new_input.trim().to_string();
                    let name = match self.new_name.trim() {
                        "" => input.clone(),
                        name => name.to_string(),
                    };
                    self.status = match self.add(&name, &input) {
                        Ok(()) => {
                            self.new_name.clear();
                            self.new_input.clear();
                            None
                        }
                        Err(e) => Some(format!("could not add {name}: {e}")),
                    };
                }
                ui.same_line();
                if ui.button("Quit") {
                    self.quit = true;
                }
                if let Some(status) = &self.status {
                    ui.text_colored([1., 0.4, 0.4, 1.], status);
                }

                ui.separator();
                ui.input_text("filter", &mut self.filter).build();
                let shown = self
                    .tiles
                    .iter()
                    .filter(|tile| matches_filter(&tile.title, &self.filter))
                    .count();
                ui.text(format!("{shown} of {} stream(s)", self.tiles.len()));
                for (key, action) in self.settings.keymap.iter() {
                    ui.text(format!("{:>6}  {action:?}", key_label(key)));
                }
            });
    }
}

fn key_label(key: char) -> String {
    match key {
        ENTER => "enter".to_string(),
        ESCAPE => "esc".to_string(),
        ' ' => "space".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionColor;

    #[test]
    fn stream_arguments_split_on_the_first_equals() {
        assert_eq!(
            parse_stream("gate=rtsp://cam/feed?a=b"),
            ("gate".to_string(), "rtsp://cam/feed?a=b".to_string())
        );
        assert_eq!(
            parse_stream("traffic.mp4"),
            ("traffic.mp4".to_string(), "traffic.mp4".to_string())
        );
        assert_eq!(parse_stream("=0"), ("=0".to_string(), "=0".to_string()));
    }

    #[test]
    fn filter_matches_titles_ignoring_case() {
        assert!(matches_filter("North Gate", ""));
        assert!(matches_filter("North Gate", "gate"));
        assert!(matches_filter("North Gate", "TH G"));
        assert!(!matches_filter("North Gate", "south"));
        assert!(!matches_filter("", "a"));
    }

    #[test]
    fn every_default_binding_has_an_imgui_key() {
        for (key, _) in Keymap::default().iter() {
            assert!(imgui_key(key).is_some(), "{key:?} is unmapped");
        }
        assert_eq!(imgui_key('%'), None);
    }

    #[test]
    fn screen_positions_scale_back_to_frame_pixels() {
        assert_eq!(to_frame_point([110., 60.], [10., 10.], 0.5), Point::new(200, 100));
        assert_eq!(to_frame_point([10., 10.], [10., 10.], 1.), Point::new(0, 0));
    }

    #[test]
    fn counts_read_as_colour_and_total() {
        assert_eq!(format_counts(&RegionCounts::default()), "no hits");
        let counts: RegionCounts = [(RegionColor::Green, 2), (RegionColor::Red, 1)]
            .into_iter()
            .collect();
        assert_eq!(format_counts(&counts), "green: 2  red: 1");
    }
}
