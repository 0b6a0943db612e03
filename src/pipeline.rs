//! The per-stream processing loop and the seams it runs against.
//!
//! One iteration pulls a frame, runs the detector on the untouched frame,
//! counts, draws the overlay, hands the frame to the sink and finally drains
//! pending commands. Region edits therefore only ever happen between frames.

use crate::counter::{count_regions, Detection, RegionCounts};
use crate::error::Result;
use crate::mpsc::{Receiver, TryRecvError};
use crate::region::RegionStore;
use crate::render::{Canvas, Renderer};
use crate::session::{AnnotationSession, Command, Flow};

pub trait FrameSource {
    type Frame;

    /// `Ok(None)` is a clean end of stream.
    fn next_frame(&mut self) -> Result<Option<Self::Frame>>;
}

pub trait Detector<F> {
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>>;
}

/// Receives each rendered frame. The frame is only borrowed for the call;
/// anything kept past it must be copied.
pub trait FrameSink<F> {
    fn deliver(&mut self, frame: &F, counts: &RegionCounts) -> Result<()>;
}

pub trait CommandSource {
    fn poll(&mut self) -> Result<Vec<Command>>;
}

impl<F, A: FrameSink<F>, B: FrameSink<F>> FrameSink<F> for (A, B) {
    fn deliver(&mut self, frame: &F, counts: &RegionCounts) -> Result<()> {
        self.0.deliver(frame, counts)?;
        self.1.deliver(frame, counts)
    }
}

impl<F, K: FrameSink<F>> FrameSink<F> for Option<K> {
    fn deliver(&mut self, frame: &F, counts: &RegionCounts) -> Result<()> {
        match self {
            Some(sink) => sink.deliver(frame, counts),
            None => Ok(()),
        }
    }
}

/// A dropped sender means the host is gone, which stops the loop.
impl CommandSource for Receiver<Command> {
    fn poll(&mut self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        loop {
            match self.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    commands.push(Command::Stop);
                    break;
                }
            }
        }
        Ok(commands)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StreamEnded,
    Quit,
}

#[derive(Debug, Default)]
pub struct Pipeline {
    pub session: AnnotationSession,
    pub store: RegionStore,
    pub renderer: Renderer,
    frames: u64,
}

impl Pipeline {
    pub fn new(session: AnnotationSession, renderer: Renderer) -> Self {
        Self {
            session,
            store: RegionStore::new(),
            renderer,
            frames: 0,
        }
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Counts and draws one frame.
    pub fn process_frame<C: Canvas>(
        &mut self,
        frame: &mut C,
        detections: &[Detection],
    ) -> Result<RegionCounts> {
        let counts = count_regions(detections, &self.store);
        self.renderer
            .draw(frame, detections, &self.store, &self.session, &counts)?;
        self.frames += 1;
        Ok(counts)
    }

    /// Applies commands in order. Refused commands are dropped without
    /// feedback.
    pub fn apply_commands(&mut self, commands: impl IntoIterator<Item = Command>) -> Flow {
        for command in commands {
            match self.session.apply(command, &mut self.store) {
                Ok(Flow::Stop) => return Flow::Stop,
                Ok(Flow::Continue) => {}
                Err(e) if e.is_soft() => log::debug!("{command:?} ignored: {e}"),
                Err(e) => log::warn!("{command:?} failed: {e}"),
            }
        }
        Flow::Continue
    }

    /// One loop iteration. `Ok(Some(_))` means the loop is over.
    pub fn step<S, D, K, Q>(
        &mut self,
        source: &mut S,
        detector: &mut D,
        sink: &mut K,
        commands: &mut Q,
    ) -> Result<Option<StopReason>>
    where
        S: FrameSource,
        S::Frame: Canvas,
        D: Detector<S::Frame>,
        K: FrameSink<S::Frame>,
        Q: CommandSource,
    {
        let Some(mut frame) = source.next_frame()? else {
            log::info!("stream ended after {} frames", self.frames);
            return Ok(Some(StopReason::StreamEnded));
        };

        let detections = detector.detect(&frame)?;
        let counts = self.process_frame(&mut frame, &detections)?;
        sink.deliver(&frame, &counts)?;

        if self.apply_commands(commands.poll()?) == Flow::Stop {
            log::info!("stopped after {} frames", self.frames);
            return Ok(Some(StopReason::Quit));
        }
        Ok(None)
    }

    pub fn run<S, D, K, Q>(
        &mut self,
        source: &mut S,
        detector: &mut D,
        sink: &mut K,
        commands: &mut Q,
    ) -> Result<StopReason>
    where
        S: FrameSource,
        S::Frame: Canvas,
        D: Detector<S::Frame>,
        K: FrameSink<S::Frame>,
        Q: CommandSource,
    {
        loop {
            if let Some(reason) = self.step(source, detector, sink, commands)? {
                return Ok(reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::geometry::Point;
    use crate::mpsc;
    use crate::render::DisplayColor;

    #[derive(Debug, Default, Clone)]
    struct Blank {
        strokes: usize,
    }

    impl Canvas for Blank {
        fn line(&mut self, _: Point, _: Point, _: DisplayColor, _: i32) -> Result<()> {
            self.strokes += 1;
            Ok(())
        }
        fn filled_circle(&mut self, _: Point, _: i32, _: DisplayColor) -> Result<()> {
            self.strokes += 1;
            Ok(())
        }
        fn filled_rect(&mut self, _: Point, _: Point, _: DisplayColor) -> Result<()> {
            self.strokes += 1;
            Ok(())
        }
        fn text_size(&self, _: &str, _: f64, _: i32) -> Result<(i32, i32)> {
            Ok((10, 10))
        }
        fn text(&mut self, _: &str, _: Point, _: f64, _: DisplayColor, _: i32) -> Result<()> {
            self.strokes += 1;
            Ok(())
        }
    }

    struct Frames(usize);

    impl FrameSource for Frames {
        type Frame = Blank;
        fn next_frame(&mut self) -> Result<Option<Blank>> {
            if self.0 == 0 {
                return Ok(None);
            }
            self.0 -= 1;
            Ok(Some(Blank::default()))
        }
    }

    struct Fixed(Vec<Detection>);

    impl Detector<Blank> for Fixed {
        fn detect(&mut self, _: &Blank) -> Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl Detector<Blank> for Broken {
        fn detect(&mut self, _: &Blank) -> Result<Vec<Detection>> {
            Err(Error::Upstream("model crashed".into()))
        }
    }

    #[derive(Default)]
    struct Collect(Vec<(usize, RegionCounts)>);

    impl FrameSink<Blank> for Collect {
        fn deliver(&mut self, frame: &Blank, counts: &RegionCounts) -> Result<()> {
            self.0.push((frame.strokes, counts.clone()));
            Ok(())
        }
    }

    /// Replays one batch of commands per frame.
    struct Script(Vec<Vec<Command>>);

    impl CommandSource for Script {
        fn poll(&mut self) -> Result<Vec<Command>> {
            if self.0.is_empty() {
                return Ok(Vec::new());
            }
            Ok(self.0.remove(0))
        }
    }

    fn triangle_clicks() -> Vec<Command> {
        vec![
            Command::Click(Point::new(0, 0)),
            Command::Click(Point::new(100, 0)),
            Command::Click(Point::new(0, 100)),
            Command::Commit,
        ]
    }

    #[test]
    fn runs_until_the_stream_ends() {
        let mut pipeline = Pipeline::default();
        let mut sink = Collect::default();
        let detection = Detection::from_corners(5, 5, 15, 15).unwrap();
        let reason = pipeline
            .run(
                &mut Frames(3),
                &mut Fixed(vec![detection]),
                &mut sink,
                &mut Script(vec![triangle_clicks()]),
            )
            .unwrap();

        assert_eq!(reason, StopReason::StreamEnded);
        assert_eq!(pipeline.frames_processed(), 3);
        // the region only exists from the second frame on
        assert!(sink.0[0].1.is_empty());
        assert_eq!(sink.0[1].1.get(crate::region::RegionColor::Blue), 1);
        assert!(sink.0[1].0 > sink.0[0].0);
    }

    #[test]
    fn stop_command_quits_before_the_next_frame() {
        let mut pipeline = Pipeline::default();
        let mut sink = Collect::default();
        let reason = pipeline
            .run(
                &mut Frames(10),
                &mut Fixed(Vec::new()),
                &mut sink,
                &mut Script(vec![vec![], vec![Command::Lock, Command::Stop]]),
            )
            .unwrap();
        assert_eq!(reason, StopReason::Quit);
        assert_eq!(sink.0.len(), 2);
    }

    #[test]
    fn detector_failure_is_fatal() {
        let mut pipeline = Pipeline::default();
        let result = pipeline.run(
            &mut Frames(2),
            &mut Broken,
            &mut Collect::default(),
            &mut Script(Vec::new()),
        );
        assert!(matches!(result, Err(Error::Upstream(_))));
    }

    #[test]
    fn refused_commands_do_not_stop_the_batch() {
        let mut pipeline = Pipeline::default();
        let mut commands = vec![Command::Lock, Command::Click(Point::new(1, 1)), Command::Unlock];
        commands.extend(triangle_clicks());
        assert_eq!(pipeline.apply_commands(commands), Flow::Continue);
        assert_eq!(pipeline.store.len(), 1);
        assert_eq!(pipeline.store.iter().next().unwrap().vertices().len(), 3);
    }

    #[test]
    fn disconnected_channel_reads_as_stop() {
        let (tx, mut rx) = mpsc::channel();
        tx.send(Command::Undo).unwrap();
        drop(tx);
        assert_eq!(rx.poll().unwrap(), [Command::Undo, Command::Stop]);
    }
}
