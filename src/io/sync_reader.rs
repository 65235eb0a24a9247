//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over batch instructions from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read and deserialize CSV rows
//! sequentially, delegating parsing and conversion to the csv_format
//! module. It maintains streaming behavior by processing rows one at a
//! time without loading the entire file into memory.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! Result<Instruction, LedgerError> for each CSV row:
//!
//! ```no_run
//! use rust_ledger_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("instructions.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(instruction) => println!("Parsed instruction: {:?}", instruction),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row failures are yielded as Err variants in the iterator
//! - Line numbers are attached for debugging

use crate::io::csv_format::{convert_csv_instruction, CsvInstruction};
use crate::types::{Instruction, LedgerError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
///
/// Provides an iterator interface over batch instructions.
/// Maintains streaming behavior with constant memory usage.
///
/// # Examples
///
/// ```no_run
/// use rust_ledger_engine::io::sync_reader::SyncReader;
/// use std::path::Path;
///
/// let reader = SyncReader::new(Path::new("instructions.csv")).unwrap();
/// let instructions: Vec<_> = reader.filter_map(Result::ok).collect();
/// println!("Successfully parsed {} instructions", instructions.len());
/// ```
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// Opens the CSV file and prepares it for streaming iteration.
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (lifecycle rows leave columns empty)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    ///
    /// # Errors
    ///
    /// * `FileNotFound` - No file exists at `path`
    /// * `IoError` - The file exists but could not be opened
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => LedgerError::from(e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Instruction, LedgerError>;

    /// Get the next instruction from the CSV file
    ///
    /// This method:
    /// 1. Reads the next CSV row and deserializes it to CsvInstruction
    /// 2. Converts the CsvInstruction to an Instruction using
    ///    csv_format::convert_csv_instruction
    /// 3. Attaches line numbers to any failure
    ///
    /// # Returns
    ///
    /// * `Some(Ok(Instruction))` - Successfully parsed instruction
    /// * `Some(Err(LedgerError))` - Parse or conversion error with line
    ///   number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvInstruction>();

        match deserializer.next()? {
            Ok(csv_instruction) => {
                self.line_num += 1;
                // Wrap conversion failures with the data line number
                // (+1 accounts for the header row)
                Some(convert_csv_instruction(csv_instruction).map_err(|e| {
                    LedgerError::ParseError {
                        line: Some((self.line_num + 1) as u64),
                        message: e.to_string(),
                    }
                }))
            }
            Err(e) => {
                self.line_num += 1;
                Some(Err(LedgerError::ParseError {
                    line: Some((self.line_num + 1) as u64),
                    message: e.to_string(),
                }))
            }
        }
    }
}
