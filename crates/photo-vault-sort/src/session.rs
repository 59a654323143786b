use crate::keymap::Action;
use photo_vault_core::transfer::{self, CopyOutcome};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tracing::debug;

pub const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "gif", "heic", "heif", "webp", "mp4", "avi", "mov", "mkv",
    "m4v",
];

/// Media files directly inside `dir` (not recursive), sorted by name.
pub fn list_media(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_media(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_media(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Copied { destination: PathBuf },
    AlreadyExists { destination: PathBuf },
    Skipped,
    Unbound,
    Quit,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub copied: usize,
    pub already_there: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn add(&mut self, placement: &Placement) {
        match placement {
            Placement::Copied { .. } => self.copied += 1,
            Placement::AlreadyExists { .. } => self.already_there += 1,
            Placement::Skipped | Placement::Unbound => self.skipped += 1,
            Placement::Quit => {}
        }
    }
}

/// Carry out `action` for `file`, copying into `<target_root>/<Month>/`.
/// Existing files are never overwritten.
pub fn place(
    file: &Path,
    target_root: &Path,
    action: Action,
) -> Result<Placement, photo_vault_core::Error> {
    let month = match action {
        Action::File(month) => month,
        Action::Skip => return Ok(Placement::Skipped),
        Action::Unbound => return Ok(Placement::Unbound),
        Action::Quit => return Ok(Placement::Quit),
    };
    let folder = target_root.join(month);
    debug!("Filing {} under {}", file.display(), folder.display());
    // Triage copies are never cancelled.
    let never = AtomicBool::new(false);
    match transfer::copy_into_folder(file, &folder, &never)? {
        CopyOutcome::Copied { destination, .. } => Ok(Placement::Copied { destination }),
        CopyOutcome::AlreadyExists { destination } => Ok(Placement::AlreadyExists { destination }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_media_is_flat_and_filtered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.JPG"), b"b").unwrap();
        fs::write(dir.path().join("a.mov"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.jpg"), b"c").unwrap();

        let files = list_media(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.mov"), dir.path().join("b.JPG")]);
    }

    #[test]
    fn test_place_copies_into_month_folder_once() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("IMG_7.jpg");
        fs::write(&file, b"seven").unwrap();
        let target = dir.path().join("sorted");

        let first = place(&file, &target, Action::File("March")).unwrap();
        let destination = target.join("March/IMG_7.jpg");
        assert_eq!(first, Placement::Copied { destination: destination.clone() });
        assert_eq!(fs::read(&destination).unwrap(), b"seven");

        let second = place(&file, &target, Action::File("March")).unwrap();
        assert_eq!(second, Placement::AlreadyExists { destination });
    }

    #[test]
    fn test_skip_and_quit_touch_nothing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("IMG_8.jpg");
        fs::write(&file, b"eight").unwrap();
        let target = dir.path().join("sorted");

        assert_eq!(place(&file, &target, Action::Skip).unwrap(), Placement::Skipped);
        assert_eq!(place(&file, &target, Action::Quit).unwrap(), Placement::Quit);
        assert!(!target.exists());
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::default();
        tally.add(&Placement::Copied { destination: PathBuf::from("/t/May/a.jpg") });
        tally.add(&Placement::Skipped);
        tally.add(&Placement::Unbound);
        tally.add(&Placement::Quit);
        assert_eq!(
            tally,
            Tally {
                copied: 1,
                already_there: 0,
                skipped: 2
            }
        );
    }
}
