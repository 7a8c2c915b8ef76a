//! Raw page dumps for offline inspection.
//!
//! [`DumpingFetcher`] wraps another [`Fetcher`] and writes every page it
//! returns to `<dir>/<label>`. A failed write is logged and otherwise
//! ignored: dumping never changes what the caller sees.

use std::io;
use std::path::{Path, PathBuf};

use crate::{Fetcher, PageRequest, TransportError};

/// Writes `content` to `dir/label`, creating `dir` if needed.
///
/// The label is reduced to a safe file name first. Returns the written path.
pub async fn persist_raw_page(dir: &Path, content: &str, label: &str) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(dump_file_name(label));
    tokio::fs::write(&path, content).await?;
    Ok(path)
}

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
fn dump_file_name(label: &str) -> String {
    let mut out: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // no hidden files, no `..`
    out = out.trim_start_matches('.').to_string();
    if out.is_empty() { "page.html".to_string() } else { out }
}

/// A [`Fetcher`] decorator that dumps every fetched page to disk.
pub struct DumpingFetcher<F: Fetcher> {
    inner: F,
    dir: PathBuf,
}

impl<F: Fetcher> DumpingFetcher<F> {
    pub fn new(inner: F, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: Fetcher> Fetcher for DumpingFetcher<F> {
    async fn fetch(&self, request: &PageRequest) -> Result<String, TransportError> {
        let body = self.inner.fetch(request).await?;
        match persist_raw_page(&self.dir, &body, &request.label).await {
            Ok(path) => tracing::debug!(path = %path.display(), "page dumped"),
            Err(e) => tracing::warn!(
                label = %request.label,
                dir = %self.dir.display(),
                error = %e,
                "failed to dump page"
            ),
        }
        Ok(body)
    }
}
