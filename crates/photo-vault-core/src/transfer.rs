//! Copying files into the destination tree.
//!
//! Both the sync engine and the triage tool go through [`copy_into_folder`] /
//! [`copy_preserving`], so a destination file is either complete with the
//! source's timestamps or absent.

use crate::error::Error;
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

const COPY_BUFFER_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied { destination: PathBuf, bytes: u64 },
    AlreadyExists { destination: PathBuf },
}

/// Copy `source` into `folder` under its own file name, creating the folder.
/// An existing file of that name is left alone.
pub fn copy_into_folder(
    source: &Path,
    folder: &Path,
    cancel: &AtomicBool,
) -> Result<CopyOutcome, Error> {
    let file_name = source
        .file_name()
        .ok_or_else(|| Error::Other(format!("{} has no file name", source.display())))?;
    let destination = folder.join(file_name);
    if destination.exists() {
        return Ok(CopyOutcome::AlreadyExists { destination });
    }
    fs::create_dir_all(folder)?;
    let bytes = copy_preserving(source, &destination, cancel)?;
    Ok(CopyOutcome::Copied { destination, bytes })
}

/// Copy bytes, permissions and access/modification times from `source` to
/// `destination`.
///
/// Data goes to a hidden `.part` sibling first and is renamed into place
/// after `fsync`. On failure or cancellation the partial file is removed and
/// `destination` is never created.
pub fn copy_preserving(source: &Path, destination: &Path, cancel: &AtomicBool) -> Result<u64, Error> {
    let partial = partial_path(destination);
    match copy_to_partial(source, &partial, cancel) {
        Ok(bytes) => {
            if let Err(e) = fs::rename(&partial, destination) {
                remove_partial(&partial);
                return Err(e.into());
            }
            debug!("Copied {} -> {} ({} bytes)", source.display(), destination.display(), bytes);
            Ok(bytes)
        }
        Err(e) => {
            remove_partial(&partial);
            Err(e)
        }
    }
}

fn copy_to_partial(source: &Path, partial: &Path, cancel: &AtomicBool) -> Result<u64, Error> {
    let metadata = fs::metadata(source)?;
    let mut input = File::open(source)?;
    let mut output = File::create(partial)?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        let read = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        output.write_all(&buffer[..read])?;
        total += read as u64;
    }
    output.sync_all()?;
    drop(output);

    fs::set_permissions(partial, metadata.permissions())?;
    filetime::set_file_times(
        partial,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;
    Ok(total)
}

fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.part", name))
}

fn remove_partial(partial: &Path) {
    if let Err(e) = fs::remove_file(partial) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove partial copy {}: {}", partial.display(), e);
        }
    }
}
