use crate::*;

const OUTPUT_FOLDER: &str = "output";

/// Next free `output/<n>-<name>` path, numbered after the highest existing
/// entry.
pub fn get_save_filepath(name: &str) -> Result<path::PathBuf> {
    next_numbered_path(path::Path::new(OUTPUT_FOLDER), name)
}

fn next_numbered_path(folder: &path::Path, name: &str) -> Result<path::PathBuf> {
    if !folder.exists() {
        fs::create_dir_all(folder)?;
    }

    let mut i = 0;
    for item in folder.read_dir()? {
        let file_name = item?.file_name();
        let Some((num_str, _)) = file_name.to_str().and_then(|f| f.split_once('-')) else {
            continue;
        };
        if let Ok(num) = num_str.parse::<u32>() {
            i = i.max(num);
        }
    }

    Ok(folder.join(format!("{}-{}", i + 1, name)))
}

/// Writes a frame as an image, picking the format from `name`.
pub fn save_frame(frame: &cv::Mat, name: &str) -> Result<path::PathBuf> {
    let file = get_save_filepath(name)?;
    imgcodecs::imwrite_def(&file.to_string_lossy(), frame)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_follow_the_highest_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let first = next_numbered_path(dir.path(), "snap.png").unwrap();
        assert_eq!(first, dir.path().join("1-snap.png"));

        fs::write(dir.path().join("4-old.png"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        let next = next_numbered_path(dir.path(), "snap.png").unwrap();
        assert_eq!(next, dir.path().join("5-snap.png"));
    }

    #[test]
    fn creates_the_folder() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("shots");
        next_numbered_path(&nested, "a.png").unwrap();
        assert!(nested.is_dir());
    }
}
