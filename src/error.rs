use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The polygon encloses no area, so it has no centroid.
    #[error("polygon has zero area")]
    DegenerateGeometry,

    #[error("edit lock is engaged")]
    EditLocked,

    #[error("pending shape has {0} point(s), at least 3 are needed")]
    EmptyPendingShape(usize),

    #[error("malformed detection box ({x1}, {y1}) -> ({x2}, {y2})")]
    MalformedDetection { x1: i32, y1: i32, x2: i32, y2: i32 },

    #[error("unknown region color {0:?}")]
    UnknownColor(String),

    #[error("invalid palette entry {0:?}")]
    Palette(String),

    #[error("invalid key binding {0:?}")]
    Keymap(String),

    #[error("invalid setting: {0}")]
    Setting(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error(transparent)]
    OpenCv(#[from] opencv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Soft errors are contained within the frame or command that raised them.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Error::DegenerateGeometry
                | Error::EditLocked
                | Error::EmptyPendingShape(_)
                | Error::MalformedDetection { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_and_command_errors_are_soft() {
        assert!(Error::DegenerateGeometry.is_soft());
        assert!(Error::EditLocked.is_soft());
        assert!(Error::EmptyPendingShape(2).is_soft());
        assert!(Error::MalformedDetection { x1: 5, y1: 0, x2: 0, y2: 5 }.is_soft());
    }

    #[test]
    fn stream_and_startup_errors_are_not() {
        assert!(!Error::Upstream("camera unplugged".into()).is_soft());
        assert!(!Error::Setting("frame size".into()).is_soft());
        assert!(!Error::Io(std::io::ErrorKind::NotFound.into()).is_soft());
    }
}
