//! Report file loader.
//!
//! Reads whole report files into memory before extraction; block and row
//! boundaries cannot be recovered from a partial buffer. Files are expected
//! to be plain text dumps of the daily SOM report, one or more per directory.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::parser::{ExtractionReport, ExtractorConfig, OptionChainExtractor};

/// File extension of report dumps.
pub const REPORT_EXTENSION: &str = "txt";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loads report files and runs them through the extractor.
#[derive(Debug, Clone, Default)]
pub struct ReportLoader {
    extractor: OptionChainExtractor,
}

impl ReportLoader {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            extractor: OptionChainExtractor::new(config),
        }
    }

    /// Read a report file. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_text(&self, path: &Path) -> Result<String, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }
        let bytes = fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Load and extract a single report file.
    pub fn load_file(&self, path: &Path) -> Result<ExtractionReport, LoaderError> {
        let text = self.read_text(path)?;
        let report = self.extractor.extract_text_report(&text);
        info!(
            "Loaded {}: {} blocks, {} rows, {} skipped",
            path.display(),
            report.blocks.len(),
            report.parsed_rows(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// List report files in a directory, sorted by name.
    pub fn report_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
        if !dir.exists() {
            return Err(LoaderError::FileNotFound(dir.display().to_string()));
        }
        if !dir.is_dir() {
            return Err(LoaderError::NotADirectory(dir.display().to_string()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let is_report = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(REPORT_EXTENSION))
                .unwrap_or(false);
            if is_report {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Expand a mix of files and directories into report files.
    ///
    /// Directories contribute their report files; plain paths pass through.
    pub fn expand_paths(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, LoaderError> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(self.report_files(path)?);
            } else {
                files.push(path.clone());
            }
        }
        Ok(files)
    }

    /// Load many files in parallel. Results keep the input order.
    pub fn load_many(
        &self,
        paths: &[PathBuf],
    ) -> Vec<(PathBuf, Result<ExtractionReport, LoaderError>)> {
        self.load_many_with(paths, |_| {})
    }

    /// Like [`load_many`](Self::load_many), calling `on_done` as each file finishes.
    pub fn load_many_with<F>(
        &self,
        paths: &[PathBuf],
        on_done: F,
    ) -> Vec<(PathBuf, Result<ExtractionReport, LoaderError>)>
    where
        F: Fn(&Path) + Sync,
    {
        paths
            .par_iter()
            .map(|path| {
                let result = self.load_file(path);
                on_done(path);
                (path.clone(), result)
            })
            .collect()
    }
}
