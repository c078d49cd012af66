//! Lazy datapoint streams.
//!
//! A [`DataFlow`] is a boxed iterator of `Result` items. Dataset builders
//! and the analyzer produce dataflows; [`DataFlowExt`] adds the combinators
//! used to chain mappers onto them and [`MultiThreadMapData`] spreads a
//! mapper over worker threads without changing the item order.

mod parallel;

pub use parallel::MultiThreadMapData;

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A lazy stream of datapoints.
pub type DataFlow<T> = Box<dyn Iterator<Item = Result<T>> + Send>;

/// Combinators over dataflows.
///
/// Errors are passed through untouched; mappers only see `Ok` items.
pub trait DataFlowExt<T>: Iterator<Item = Result<T>> + Send + Sized + 'static
where
    T: Send + 'static,
{
    /// Apply a fallible mapping to each datapoint.
    fn map_data<U, F>(self, mut f: F) -> DataFlow<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Result<U> + Send + 'static,
    {
        Box::new(self.map(move |item| item.and_then(&mut f)))
    }

    /// Apply a fallible mapping, dropping datapoints mapped to `None`.
    fn filter_map_data<U, F>(self, mut f: F) -> DataFlow<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Result<Option<U>> + Send + 'static,
    {
        Box::new(self.filter_map(move |item| match item {
            Ok(value) => f(value).transpose(),
            Err(e) => Some(Err(e)),
        }))
    }

    /// Yield at most `n` items.
    fn take_data(self, n: usize) -> DataFlow<T> {
        Box::new(self.take(n))
    }

    /// Box the stream.
    fn boxed(self) -> DataFlow<T> {
        Box::new(self)
    }
}

impl<T, I> DataFlowExt<T> for I
where
    T: Send + 'static,
    I: Iterator<Item = Result<T>> + Send + 'static,
{
}

/// Lists the files a dataflow starts from.
pub struct SerializerFiles;

impl SerializerFiles {
    /// Recursively list files with one of the given extensions.
    ///
    /// Extensions are compared case-insensitively and without the leading
    /// dot. Paths are sorted and truncated to `max_datapoints`.
    pub fn load<P: AsRef<Path>>(
        dir: P,
        extensions: &[&str],
        max_datapoints: Option<usize>,
    ) -> Result<DataFlow<PathBuf>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::NotADirectory(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        collect_files(dir, extensions, &mut files)?;
        files.sort();
        if let Some(max) = max_datapoints {
            files.truncate(max);
        }
        log::debug!("listed {} files in {}", files.len(), dir.display());

        Ok(Box::new(files.into_iter().map(Ok)))
    }
}

fn collect_files(dir: &Path, extensions: &[&str], files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, extensions, files)?;
        } else if has_extension(&path, extensions) {
            files.push(path);
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
