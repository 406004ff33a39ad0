// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Transient upload storage
//!
//! Every request persists its upload under the working directory exactly
//! once, named by a generated uuid so concurrent requests can never collide
//! on a client-supplied filename. The file is removed when the guard drops,
//! on every exit path.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use uuid::Uuid;

/// Create the upload working directory if it is absent. Called once at
/// process startup.
pub fn init_upload_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create upload directory {}", dir.display()))
}

/// A request-scoped upload persisted to disk.
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// Write the uploaded bytes to `<dir>/<uuid>.<ext>`. Only a sanitized
    /// extension of the client filename is kept; no client-controlled path
    /// component reaches the filesystem.
    pub fn write(dir: &Path, client_filename: &str, bytes: &[u8]) -> Result<Self> {
        let name = match sanitize_extension(client_filename) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = dir.join(name);

        fs::write(&path, bytes)
            .with_context(|| format!("Failed to write upload to {}", path.display()))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(
                    "Failed to remove transient upload {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Keep only an alphanumeric, lowercased extension from the client filename.
fn sanitize_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|e| !e.is_empty())
}
