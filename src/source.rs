use crate::config::VideoSettings;
use crate::counter::RegionCounts;
use crate::pipeline::{FrameSink, FrameSource};
use crate::*;

/// Frames from a file, URL or camera, resized to the working size.
pub struct VideoSource {
    capture: videoio::VideoCapture,
    input: String,
    size: cv::Size,
    skip_frames: u32,
    started: bool,
}

impl VideoSource {
    /// A bare integer opens that camera index, anything else is handed to
    /// OpenCV as a file name or stream URL.
    pub fn open(input: &str, video: &VideoSettings) -> Result<Self> {
        let capture = match input.parse::<i32>() {
            Ok(index) => videoio::VideoCapture::new(index, videoio::CAP_ANY)?,
            Err(_) => videoio::VideoCapture::from_file(input, videoio::CAP_ANY)?,
        };
        if !capture.is_opened()? {
            return Err(Error::Upstream(format!("could not open video {input:?}")));
        }
        log::info!("opened {input}");

        Ok(Self {
            capture,
            input: input.to_string(),
            size: cv::Size::new(video.width, video.height),
            skip_frames: video.skip_frames,
            started: false,
        })
    }

    fn read(&mut self, into: &mut cv::Mat) -> Result<bool> {
        Ok(self.capture.read(into)? && !into.empty())
    }
}

impl FrameSource for VideoSource {
    type Frame = cv::Mat;

    fn next_frame(&mut self) -> Result<Option<cv::Mat>> {
        let mut raw = cv::Mat::default();
        if !self.started {
            self.started = true;
            for _ in 0..self.skip_frames {
                if !self.read(&mut raw)? {
                    return Ok(None);
                }
            }
            if self.skip_frames > 0 {
                log::info!("{}: skipped {} frames", self.input, self.skip_frames);
            }
        }

        if !self.read(&mut raw)? {
            return Ok(None);
        }
        let mut frame = cv::Mat::default();
        imgproc::resize(&raw, &mut frame, self.size, 0., 0., imgproc::INTER_LINEAR)?;
        Ok(Some(frame))
    }
}

/// Writes annotated frames to an mp4 file.
pub struct Recorder {
    writer: videoio::VideoWriter,
}

impl Recorder {
    pub fn create(file: &path::Path, video: &VideoSettings) -> Result<Self> {
        if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let fourcc = videoio::VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = videoio::VideoWriter::new(
            &file.to_string_lossy(),
            fourcc,
            video.record_fps,
            cv::Size::new(video.width, video.height),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(Error::Upstream(format!(
                "could not write video {}",
                file.display()
            )));
        }
        log::info!("recording to {}", file.display());
        Ok(Self { writer })
    }
}

impl FrameSink<cv::Mat> for Recorder {
    fn deliver(&mut self, frame: &cv::Mat, _: &RegionCounts) -> Result<()> {
        self.writer.write(frame)?;
        Ok(())
    }
}
