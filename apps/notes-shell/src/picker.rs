//! Image picker backed by a directory of image files.
//!
//! Stands in for the platform photo library: permission is "granted" when the
//! directory can be read, and picking lists its images and asks for a number.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use domain::{CoreError, ImagePicker, ImageRef, Permission, PickOutcome};
use tracing::debug;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "heic", "bmp"];

pub struct DirectoryPicker {
    dir: PathBuf,
}

impl DirectoryPicker {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

/// Image files directly inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_image_extension(p))
        .collect();
    images.sort();
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Parse a 1-based menu choice. Blank input, `q`, or anything out of range
/// counts as cancelling.
pub fn parse_choice(line: &str, count: usize) -> Option<usize> {
    let n: usize = line.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

/// `file://` URI for a picked path.
pub fn to_image_ref(path: &Path) -> Result<ImageRef, CoreError> {
    let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    ImageRef::new(format!("file://{}", abs.display()))
}

impl ImagePicker for DirectoryPicker {
    fn request_permission(&self) -> Result<Permission, CoreError> {
        match fs::read_dir(&self.dir) {
            Ok(_) => Ok(Permission::Granted),
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "image directory not readable");
                Ok(Permission::Denied)
            }
        }
    }

    fn pick_image(&self) -> Result<PickOutcome, CoreError> {
        let images = list_images(&self.dir).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound => CoreError::PermissionDenied,
            _ => CoreError::ImagePicker(e.to_string()),
        })?;
        if images.is_empty() {
            println!("No images in {}", self.dir.display());
            return Ok(PickOutcome::Cancelled);
        }

        let mut out = io::stdout();
        for (i, path) in images.iter().enumerate() {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            writeln!(out, "  {:>2}) {}", i + 1, name).map_err(|e| CoreError::ImagePicker(e.to_string()))?;
        }
        write!(out, "image # (blank to cancel)> ").map_err(|e| CoreError::ImagePicker(e.to_string()))?;
        out.flush().map_err(|e| CoreError::ImagePicker(e.to_string()))?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CoreError::ImagePicker(e.to_string()))?;

        match parse_choice(&line, images.len()) {
            Some(i) => Ok(PickOutcome::Selected(vec![to_image_ref(&images[i])?])),
            None => Ok(PickOutcome::Cancelled),
        }
    }
}
