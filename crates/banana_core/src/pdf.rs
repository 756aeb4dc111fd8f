//! PDF page splitting.
//!
//! # Responsibility
//! - Split an uploaded multi-page PDF into one single-page PDF per page so
//!   each page can be attached to its own slide.
//!
//! # Invariants
//! - Output files are named `page_{n}.pdf` with `n` starting at 1.
//! - Returned paths are ordered by page number.

use log::{error, info};
use lopdf::Document;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Errors from PDF splitting.
#[derive(Debug)]
pub enum PdfError {
    /// Output directory or output file could not be created.
    Io { path: PathBuf, source: std::io::Error },
    /// Source file is missing or is not a readable PDF.
    Load { path: PathBuf, message: String },
    /// A single-page document could not be serialized.
    Save { path: PathBuf, message: String },
}

impl Display for PdfError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "I/O error at `{}`: {source}", path.display()),
            Self::Load { path, message } => {
                write!(f, "failed to load PDF `{}`: {message}", path.display())
            }
            Self::Save { path, message } => {
                write!(f, "failed to write PDF page `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for PdfError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Load { .. } | Self::Save { .. } => None,
        }
    }
}

/// Splits `pdf_path` into single-page PDFs written under `output_dir`.
///
/// # Side effects
/// - Creates `output_dir` (and parents) when missing.
/// - Overwrites existing `page_{n}.pdf` files.
pub fn split_pdf_to_pages(
    pdf_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, PdfError> {
    let pdf_path = pdf_path.as_ref();
    let output_dir = output_dir.as_ref();
    let started_at = Instant::now();

    match split_inner(pdf_path, output_dir) {
        Ok(paths) => {
            info!(
                "event=pdf_split module=pdf status=ok pages={} source={} duration_ms={}",
                paths.len(),
                pdf_path.display(),
                started_at.elapsed().as_millis()
            );
            Ok(paths)
        }
        Err(err) => {
            error!(
                "event=pdf_split module=pdf status=error source={} duration_ms={} error={}",
                pdf_path.display(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn split_inner(pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, PdfError> {
    std::fs::create_dir_all(output_dir).map_err(|source| PdfError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let source = Document::load(pdf_path).map_err(|err| PdfError::Load {
        path: pdf_path.to_path_buf(),
        message: err.to_string(),
    })?;

    let page_numbers: Vec<u32> = source.get_pages().keys().copied().collect();
    let mut page_paths = Vec::with_capacity(page_numbers.len());

    for (index, &keep) in page_numbers.iter().enumerate() {
        let others: Vec<u32> = page_numbers
            .iter()
            .copied()
            .filter(|&number| number != keep)
            .collect();

        let mut single = source.clone();
        single.delete_pages(&others);
        single.prune_objects();

        let page_path = output_dir.join(format!("page_{}.pdf", index + 1));
        write_document(&mut single, &page_path)?;
        page_paths.push(page_path);
    }

    Ok(page_paths)
}

fn write_document(document: &mut Document, path: &Path) -> Result<(), PdfError> {
    let file = File::create(path).map_err(|source| PdfError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    document
        .save_to(&mut writer)
        .map_err(|err| PdfError::Save {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    writer.flush().map_err(|source| PdfError::Io {
        path: path.to_path_buf(),
        source,
    })
}
