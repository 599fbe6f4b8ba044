//! Ticker - Uploaded Ticker Lists

use crate::error::{Error, Result};
use crate::helpers::file_extension;
use std::collections::HashSet;

/// Parse an uploaded ticker list
///
/// Tickers are separated by newlines, commas, or semicolons. Entries are
/// trimmed and uppercased; blanks and repeats are dropped, first occurrence wins.
pub fn parse_ticker_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(['\n', '\r', ',', ';'])
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Accept only `.txt` ticker uploads
pub fn validate_ticker_file(file_name: &str) -> Result<()> {
    match file_extension(file_name).as_deref() {
        Some("txt") => Ok(()),
        _ => Err(Error::UnsupportedFile {
            file_name: file_name.to_string(),
            expected: ".txt",
        }),
    }
}

/// A validated ticker upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerUpload {
    pub file_name: String,
    pub tickers: Vec<String>,
}

impl TickerUpload {
    /// Validate the file name and parse its contents
    pub fn from_file(file_name: &str, contents: &str) -> Result<Self> {
        validate_ticker_file(file_name)?;
        let tickers = parse_ticker_list(contents);
        if tickers.is_empty() {
            return Err(Error::Invalid {
                message: format!("No tickers found in '{file_name}'"),
            });
        }
        Ok(Self {
            file_name: file_name.to_string(),
            tickers,
        })
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Short status line for the upload area
    pub fn summary(&self) -> String {
        format!("{} unique tickers loaded from {}", self.len(), self.file_name)
    }
}
