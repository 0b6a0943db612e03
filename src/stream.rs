//! Background processing for the dashboard.
//!
//! Every stream runs its own [`Pipeline`] on a worker thread. Commands flow
//! to the worker over an unbounded channel. Frame snapshots flow back through
//! a single slot: while the UI has not picked up the previous snapshot, new
//! ones are dropped, so a hidden or stalled tile never queues frames.

use crate::config::Settings;
use crate::counter::RegionCounts;
use crate::detection::YoloDetector;
use crate::pipeline::{FrameSink, Pipeline, StopReason};
use crate::render::Renderer;
use crate::session::{AnnotationSession, Command};
use crate::source::{Recorder, VideoSource};
use crate::*;
use mpsc::{Receiver, Sender, SyncSender, TrySendError};

/// Snapshots that may wait for the UI at once.
pub const SNAPSHOT_SLOTS: usize = 1;

/// A rendered frame handed across threads.
pub struct Snapshot {
    pub frame: cv::Mat,
    pub counts: RegionCounts,
    pub locked: bool,
}

struct SnapshotSink {
    sender: SyncSender<Snapshot>,
    locked: bool,
}

impl FrameSink<cv::Mat> for SnapshotSink {
    fn deliver(&mut self, frame: &cv::Mat, counts: &RegionCounts) -> Result<()> {
        let snapshot = Snapshot {
            frame: frame.try_clone()?,
            counts: counts.clone(),
            locked: self.locked,
        };
        match self.sender.try_send(snapshot) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => log::debug!("display went away, dropping frame"),
        }
        Ok(())
    }
}

pub struct StreamHandle {
    pub name: String,
    pub input: String,
    commands: Sender<Command>,
    snapshots: Receiver<Snapshot>,
    latest: Option<Snapshot>,
    worker: Option<thread::JoinHandle<Result<StopReason>>>,
    outcome: Option<String>,
}

impl StreamHandle {
    pub fn spawn(name: &str, input: &str, settings: &Settings) -> Result<Self> {
        let (commands, command_rx) = mpsc::channel();
        let (snapshot_tx, snapshots) = mpsc::sync_channel(SNAPSHOT_SLOTS);

        let input_owned = input.to_string();
        let record_to = settings
            .video
            .record
            .as_ref()
            .map(|dir| dir.join(format!("{name}.mp4")));
        let settings = settings.clone();
        let worker = thread::Builder::new()
            .name(format!("stream-{name}"))
            .spawn(move || run_worker(&input_owned, &settings, record_to, snapshot_tx, command_rx))?;

        Ok(Self {
            name: name.to_string(),
            input: input.to_string(),
            commands,
            snapshots,
            latest: None,
            worker: Some(worker),
            outcome: None,
        })
    }

    pub fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::debug!("{}: worker already stopped", self.name);
        }
    }

    /// Takes the waiting snapshot, if any, and notices a finished worker.
    /// Call once per UI frame whether or not the stream is on screen.
    pub fn refresh(&mut self) -> bool {
        let fresh = match self.snapshots.try_iter().last() {
            Some(snapshot) => {
                self.latest = Some(snapshot);
                true
            }
            None => false,
        };
        self.reap();
        fresh
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    /// Why the worker stopped, once it has.
    pub fn outcome(&self) -> Option<&str> {
        self.outcome.as_deref()
    }

    fn reap(&mut self) {
        if !self.worker.as_ref().is_some_and(|w| w.is_finished()) {
            return;
        }
        let Some(worker) = self.worker.take() else {
            return;
        };
        let outcome = match worker.join() {
            Ok(Ok(StopReason::StreamEnded)) => "stream ended".to_string(),
            Ok(Ok(StopReason::Quit)) => "stopped".to_string(),
            Ok(Err(e)) => {
                log::warn!("{}: {e}", self.name);
                format!("failed: {e}")
            }
            Err(_) => "worker panicked".to_string(),
        };
        self.outcome = Some(outcome);
    }

    /// Stops the worker and waits for it.
    pub fn shutdown(mut self) {
        let _ = self.commands.send(Command::Stop);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(
    input: &str,
    settings: &Settings,
    record_to: Option<path::PathBuf>,
    snapshots: SyncSender<Snapshot>,
    mut commands: Receiver<Command>,
) -> Result<StopReason> {
    let mut source = VideoSource::open(input, &settings.video)?;
    let mut detector = YoloDetector::new(&settings.detector)?;
    let recorder = match record_to {
        Some(file) => Some(Recorder::create(&file, &settings.video)?),
        None => None,
    };

    let session = AnnotationSession::new().with_delete_tolerance(settings.delete_tolerance);
    let renderer = Renderer::new(settings.style.clone(), settings.palette.clone());
    let mut pipeline = Pipeline::new(session, renderer);

    let mut sink = (
        SnapshotSink {
            sender: snapshots,
            locked: false,
        },
        recorder,
    );

    // the lock flag shown in the UI trails the session by at most one frame
    loop {
        sink.0.locked = pipeline.session.is_locked();
        if let Some(reason) = pipeline.step(&mut source, &mut detector, &mut sink, &mut commands)? {
            return Ok(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliver(sink: &mut SnapshotSink) {
        sink.deliver(&cv::Mat::default(), &RegionCounts::default())
            .unwrap();
    }

    #[test]
    fn undrained_snapshots_do_not_queue_up() {
        let (tx, rx) = mpsc::sync_channel(SNAPSHOT_SLOTS);
        let mut sink = SnapshotSink {
            sender: tx,
            locked: false,
        };

        for _ in 0..10 {
            deliver(&mut sink);
        }
        assert_eq!(rx.try_iter().count(), SNAPSHOT_SLOTS);

        sink.locked = true;
        deliver(&mut sink);
        let waiting: Vec<Snapshot> = rx.try_iter().collect();
        assert_eq!(waiting.len(), 1);
        assert!(waiting[0].locked);
    }

    #[test]
    fn a_closed_display_is_not_an_error() {
        let (tx, rx) = mpsc::sync_channel(SNAPSHOT_SLOTS);
        drop(rx);
        let mut sink = SnapshotSink {
            sender: tx,
            locked: false,
        };
        deliver(&mut sink);
    }
}
