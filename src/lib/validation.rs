//! Input validation utilities
//!
//! Common checks for command-line file paths and numeric parameters with consistent error
//! messages, using the structured error types from [`crate::errors`].

use crate::errors::{RealignError, Result};
use std::fmt::Display;
use std::path::Path;

/// Validate that a file exists
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Input BAM", "Reference")
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use fgrealign_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/file.bam", "Input BAM");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(RealignError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that the directory an output file will be written into exists
///
/// # Errors
/// Returns an error if the parent directory is missing
pub fn validate_output_parent<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    match path_ref.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(RealignError::InvalidFileFormat {
                file_type: description.to_string(),
                path: path_ref.display().to_string(),
                reason: format!("Output directory '{}' does not exist", parent.display()),
            })
        }
        _ => Ok(()),
    }
}

/// Validate that a value lies within an inclusive range
///
/// # Errors
/// Returns an error if `value` is outside `[min, max]`
///
/// # Example
/// ```
/// use fgrealign_lib::validation::validate_in_range;
///
/// assert!(validate_in_range(5, 1, 12, "compression-level").is_ok());
/// assert!(validate_in_range(0, 1, 12, "compression-level").is_err());
/// ```
pub fn validate_in_range<T: PartialOrd + Display>(value: T, min: T, max: T, name: &str) -> Result<()> {
    if value < min || value > max {
        return Err(RealignError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("must be between {min} and {max}, got {value}"),
        });
    }
    Ok(())
}
