use crate::counter::RegionCounts;
use crate::geometry::Point;
use crate::keymap::Keymap;
use crate::pipeline::{CommandSource, FrameSink};
use crate::session::Command;
use crate::*;
use mpsc::Receiver;

/// A highgui window that shows frames and turns its mouse and keyboard
/// input into commands.
///
/// The mouse callback only queues commands; they are picked up by
/// [`CommandSource::poll`] once per frame. Both roles are implemented on
/// `&HighguiWindow` so one window can be the sink and the command source of
/// the same pipeline.
pub struct HighguiWindow {
    name: String,
    keymap: Keymap,
    mouse: Receiver<Command>,
}

impl HighguiWindow {
    pub fn open(name: &str, keymap: Keymap) -> Result<Self> {
        highgui::named_window(name, highgui::WINDOW_AUTOSIZE)?;

        let (tx, rx) = mpsc::channel();
        highgui::set_mouse_callback(
            name,
            Some(Box::new(move |event, x, y, _flags| {
                let command = match event {
                    highgui::EVENT_LBUTTONDOWN => Command::Click(Point::new(x, y)),
                    highgui::EVENT_MOUSEMOVE => Command::PointerMove(Point::new(x, y)),
                    _ => return,
                };
                let _ = tx.send(command);
            })),
        )?;

        Ok(Self {
            name: name.to_string(),
            keymap,
            mouse: rx,
        })
    }
}

impl FrameSink<cv::Mat> for &HighguiWindow {
    fn deliver(&mut self, frame: &cv::Mat, _: &RegionCounts) -> Result<()> {
        highgui::imshow(&self.name, frame)?;
        Ok(())
    }
}

impl CommandSource for &HighguiWindow {
    fn poll(&mut self) -> Result<Vec<Command>> {
        // mouse callbacks fire while wait_key pumps the window events
        let key = highgui::wait_key(1)?;
        let mut commands: Vec<Command> = self.mouse.try_iter().collect();
        commands.extend(self.keymap.from_wait_key(key));
        Ok(commands)
    }
}

impl Drop for HighguiWindow {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.name) {
            log::debug!("closing {}: {e}", self.name);
        }
    }
}
