//! Interactive drawing state for one stream.
//!
//! The host translates raw mouse and keyboard input into [`Command`]s and
//! feeds them to [`AnnotationSession::apply`] between frames. Editing
//! commands are refused with [`Error::EditLocked`] while the edit lock is
//! held; lock, unlock, pointer tracking and stop always go through.

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::region::{Polygon, RegionColor, RegionStore, DELETE_TOLERANCE_PX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Click(Point),
    PointerMove(Point),
    Undo,
    Commit,
    SetColor(RegionColor),
    DeleteNearLast,
    Lock,
    Unlock,
    Stop,
}

/// Whether the processing loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Drawing,
}

#[derive(Debug, Clone)]
pub struct AnnotationSession {
    pending_points: Vec<Point>,
    active_color: RegionColor,
    edit_locked: bool,
    cursor_position: Option<Point>,
    delete_tolerance: f64,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self {
            pending_points: Vec::new(),
            active_color: RegionColor::Blue,
            edit_locked: false,
            cursor_position: None,
            delete_tolerance: DELETE_TOLERANCE_PX,
        }
    }
}

impl AnnotationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delete_tolerance(mut self, tolerance_px: f64) -> Self {
        self.delete_tolerance = tolerance_px;
        self
    }

    pub fn state(&self) -> SessionState {
        if self.pending_points.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Drawing
        }
    }

    pub fn pending_points(&self) -> &[Point] {
        &self.pending_points
    }

    pub fn active_color(&self) -> RegionColor {
        self.active_color
    }

    pub fn is_locked(&self) -> bool {
        self.edit_locked
    }

    pub fn cursor_position(&self) -> Option<Point> {
        self.cursor_position
    }

    pub fn apply(&mut self, command: Command, store: &mut RegionStore) -> Result<Flow> {
        match command {
            Command::Click(p) => self.on_click(p)?,
            Command::PointerMove(p) => self.on_pointer_move(p),
            Command::Undo => self.on_undo()?,
            Command::Commit => self.on_commit(store)?,
            Command::SetColor(color) => self.on_set_color(color)?,
            Command::DeleteNearLast => {
                self.on_delete_at_last_point(store)?;
            }
            Command::Lock => self.on_lock(),
            Command::Unlock => self.on_unlock(),
            Command::Stop => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }

    fn check_unlocked(&self) -> Result<()> {
        if self.edit_locked {
            return Err(Error::EditLocked);
        }
        Ok(())
    }

    pub fn on_click(&mut self, point: Point) -> Result<()> {
        self.check_unlocked()?;
        self.pending_points.push(point);
        Ok(())
    }

    /// Turns the pending points into a region. Sequences that are too short
    /// to enclose anything are dropped and reported as
    /// [`Error::EmptyPendingShape`]; either way the session returns to idle.
    pub fn on_commit(&mut self, store: &mut RegionStore) -> Result<()> {
        self.check_unlocked()?;
        let points = std::mem::take(&mut self.pending_points);
        if points.len() < 3 {
            return Err(Error::EmptyPendingShape(points.len()));
        }
        store.add(Polygon::new(points, self.active_color));
        Ok(())
    }

    pub fn on_undo(&mut self) -> Result<()> {
        self.check_unlocked()?;
        self.pending_points.pop();
        Ok(())
    }

    pub fn on_set_color(&mut self, color: RegionColor) -> Result<()> {
        self.check_unlocked()?;
        self.active_color = color;
        Ok(())
    }

    /// Deletes the region whose edge passes near the last pending point.
    /// The pending point itself stays.
    pub fn on_delete_at_last_point(&mut self, store: &mut RegionStore) -> Result<Option<Polygon>> {
        self.check_unlocked()?;
        Ok(match self.pending_points.last() {
            Some(&last) => store.remove_near(last, self.delete_tolerance),
            None => None,
        })
    }

    pub fn on_lock(&mut self) {
        self.edit_locked = true;
    }

    pub fn on_unlock(&mut self) {
        self.edit_locked = false;
    }

    pub fn on_pointer_move(&mut self, point: Point) {
        self.cursor_position = Some(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_all(session: &mut AnnotationSession, points: &[(i32, i32)]) {
        for &p in points {
            session.on_click(p.into()).unwrap();
        }
    }

    #[test]
    fn clicking_moves_to_drawing() {
        let mut session = AnnotationSession::new();
        assert_eq!(session.state(), SessionState::Idle);
        session.on_click(Point::new(3, 4)).unwrap();
        assert_eq!(session.state(), SessionState::Drawing);
        assert_eq!(session.pending_points(), [Point::new(3, 4)]);
    }

    #[test]
    fn commit_with_three_points_creates_one_region() {
        let mut session = AnnotationSession::new();
        let mut store = RegionStore::new();
        session.on_set_color(RegionColor::Green).unwrap();
        click_all(&mut session, &[(0, 0), (10, 0), (10, 10)]);

        session.on_commit(&mut store).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.iter().next().unwrap().color(), RegionColor::Green);
        assert!(session.pending_points().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn commit_with_two_points_discards_them() {
        let mut session = AnnotationSession::new();
        let mut store = RegionStore::new();
        click_all(&mut session, &[(0, 0), (10, 0)]);

        let err = session.on_commit(&mut store).unwrap_err();
        assert!(matches!(err, Error::EmptyPendingShape(2)));
        assert!(store.is_empty());
        assert!(session.pending_points().is_empty());
    }

    #[test]
    fn commit_with_nothing_pending() {
        let mut session = AnnotationSession::new();
        let mut store = RegionStore::new();
        assert!(matches!(
            session.on_commit(&mut store),
            Err(Error::EmptyPendingShape(0))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn undo_back_to_idle() {
        let mut session = AnnotationSession::new();
        click_all(&mut session, &[(1, 1), (2, 2)]);
        session.on_undo().unwrap();
        assert_eq!(session.pending_points(), [Point::new(1, 1)]);
        session.on_undo().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        // undo while idle does nothing
        session.on_undo().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn set_color_leaves_committed_regions_alone() {
        let mut session = AnnotationSession::new();
        let mut store = RegionStore::new();
        click_all(&mut session, &[(0, 0), (10, 0), (10, 10)]);
        session.on_commit(&mut store).unwrap();

        session.on_set_color(RegionColor::Purple).unwrap();
        assert_eq!(session.active_color(), RegionColor::Purple);
        assert_eq!(store.iter().next().unwrap().color(), RegionColor::Blue);
    }

    #[test]
    fn delete_uses_the_last_pending_point() {
        let mut session = AnnotationSession::new();
        let mut store = RegionStore::new();
        click_all(&mut session, &[(0, 0), (100, 0), (100, 100)]);
        session.on_commit(&mut store).unwrap();

        session.on_click(Point::new(50, 2)).unwrap();
        let removed = session.on_delete_at_last_point(&mut store).unwrap();
        assert!(removed.is_some());
        assert!(store.is_empty());
        assert_eq!(session.pending_points(), [Point::new(50, 2)]);
    }

    #[test]
    fn delete_without_pending_points_is_a_noop() {
        let mut session = AnnotationSession::new();
        let mut store = RegionStore::new();
        store.add(Polygon::new(
            vec![Point::new(0, 0), Point::new(10, 0), Point::new(10, 10)],
            RegionColor::Red,
        ));
        assert!(session.on_delete_at_last_point(&mut store).unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn lock_freezes_every_editing_command() {
        let mut session = AnnotationSession::new();
        let mut store = RegionStore::new();
        click_all(&mut session, &[(0, 0), (100, 0), (100, 100)]);
        session.on_commit(&mut store).unwrap();
        click_all(&mut session, &[(50, 1), (60, 60)]);

        session.on_lock();
        let before_points = session.pending_points().to_vec();
        for _ in 0..3 {
            for command in [
                Command::Click(Point::new(7, 7)),
                Command::Undo,
                Command::Commit,
                Command::SetColor(RegionColor::Orange),
                Command::DeleteNearLast,
            ] {
                assert!(matches!(
                    session.apply(command, &mut store),
                    Err(Error::EditLocked)
                ));
            }
        }
        assert_eq!(session.pending_points(), before_points);
        assert_eq!(store.len(), 1);
        assert_eq!(session.active_color(), RegionColor::Blue);

        // cursor tracking and the lock toggles still go through
        session.apply(Command::PointerMove(Point::new(9, 9)), &mut store).unwrap();
        assert_eq!(session.cursor_position(), Some(Point::new(9, 9)));
        session.apply(Command::Lock, &mut store).unwrap();
        assert!(session.is_locked());
        session.apply(Command::Unlock, &mut store).unwrap();
        assert!(!session.is_locked());
        session.apply(Command::Unlock, &mut store).unwrap();
        session.apply(Command::Click(Point::new(7, 7)), &mut store).unwrap();
        assert_eq!(session.pending_points().len(), 3);
    }

    #[test]
    fn stop_ends_the_flow_even_when_locked() {
        let mut session = AnnotationSession::new();
        let mut store = RegionStore::new();
        session.on_lock();
        assert_eq!(session.apply(Command::Stop, &mut store).unwrap(), Flow::Stop);
    }

    #[test]
    fn custom_delete_tolerance() {
        let mut session = AnnotationSession::new().with_delete_tolerance(20.);
        let mut store = RegionStore::new();
        click_all(&mut session, &[(0, 0), (100, 0), (100, 100)]);
        session.on_commit(&mut store).unwrap();
        session.on_click(Point::new(50, 15)).unwrap();
        assert!(session.on_delete_at_last_point(&mut store).unwrap().is_some());
    }
}
