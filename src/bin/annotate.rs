//! Single-stream annotator in a plain OpenCV window.
//!
//! Click to place vertices, Enter or Space to close a region, `u`/`e` to
//! lock and unlock editing, `t` to delete the region nearest the last click.

use anyhow::Context;
use clap::Parser;
use regioncount::config::{CommonArgs, Settings};
use regioncount::detection::YoloDetector;
use regioncount::display::HighguiWindow;
use regioncount::pipeline::{Pipeline, StopReason};
use regioncount::render::Renderer;
use regioncount::session::AnnotationSession;
use regioncount::source::{Recorder, VideoSource};

const WINDOW_NAME: &str = "regioncount";

#[derive(Parser, Debug)]
#[command(version, about = "Draw counting regions over a live detection stream")]
struct Cli {
    /// Video file, stream URL or camera index
    input: String,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.common).context("loading settings")?;

    let mut source = VideoSource::open(&cli.input, &settings.video)
        .with_context(|| format!("opening {}", cli.input))?;
    let mut detector = YoloDetector::new(&settings.detector).context("loading detector")?;
    let recorder = match &settings.video.record {
        Some(file) => Some(Recorder::create(file, &settings.video).context("starting recorder")?),
        None => None,
    };
    let window = HighguiWindow::open(WINDOW_NAME, settings.keymap.clone())?;

    let session = AnnotationSession::new().with_delete_tolerance(settings.delete_tolerance);
    let renderer = Renderer::new(settings.style.clone(), settings.palette.clone());
    let mut pipeline = Pipeline::new(session, renderer);

    let mut sink = (&window, recorder);
    let mut input = &window;
    let reason = pipeline.run(&mut source, &mut detector, &mut sink, &mut input)?;
    match reason {
        StopReason::StreamEnded => log::info!("{} ended", cli.input),
        StopReason::Quit => log::info!("quit"),
    }
    log::info!(
        "{} frames, {} region(s) drawn",
        pipeline.frames_processed(),
        pipeline.store.len()
    );
    Ok(())
}
