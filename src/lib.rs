pub mod app;
pub mod canvas;
pub mod config;
pub mod counter;
pub mod dashboard;
pub mod detection;
pub mod display;
pub mod error;
pub mod geometry;
pub mod image;
pub mod keymap;
pub mod pipeline;
pub mod region;
pub mod render;
pub mod session;
pub mod source;
pub mod stream;
pub mod utils;
pub mod window;

pub use std::{fs, path};
pub use std::{sync::mpsc, thread};

pub use opencv::{core as cv, prelude::*};
pub use opencv::{dnn, highgui, imgcodecs, imgproc, videoio};

pub use error::{Error, Result};
