//! Path validation.
//!
//! Anything that ends up joined onto a storage root goes through here first,
//! so that a crafted name can never write outside that root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalize a relative storage path, rejecting anything that would escape
/// the storage root (leading `..`), contains null bytes, or is empty.
fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || exn::Exn::from(ErrorKind::InvalidPath(path.to_path_buf()));
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but
                // truncate in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    return Err(invalid());
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => return Err(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    return Err(invalid());
                }
            },
        }
    }
    match components.is_empty() {
        true => Err(invalid()),
        false => Ok(components.into_iter().collect()),
    }
}

/// Like [`validate`], but the result must also be a bare file name: no
/// directories at all.
pub(crate) fn validate_file_name(name: impl AsRef<Path>) -> Result<PathBuf> {
    let name = name.as_ref();
    let validated = validate(name)?;
    if validated.components().count() != 1 || name.components().count() != 1 {
        exn::bail!(ErrorKind::InvalidPath(name.to_path_buf()));
    }
    Ok(validated)
}
