//! Export per-sample classifications to CSV.
//!
//! Columns: `index,value,component,probability`. Unassigned samples leave
//! `component` and `probability` empty so spreadsheets read them as blanks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::Category;
use crate::error::AppError;

/// Write per-sample classifications to a CSV file.
pub fn write_classes_csv(path: &Path, data: &[f64], categories: &[Category]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_classes(&mut out, data, categories)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))?;
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))?;
    Ok(())
}

fn write_classes<W: Write>(out: &mut W, data: &[f64], categories: &[Category]) -> std::io::Result<()> {
    writeln!(out, "index,value,component,probability")?;
    for (i, (x, category)) in data.iter().zip(categories).enumerate() {
        match category {
            Category::Assigned {
                component,
                probability,
            } => writeln!(out, "{i},{x},{component},{probability:.6}")?,
            Category::Unassigned => writeln!(out, "{i},{x},,")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_blank_unassigned_fields() {
        let data = [0.5, 99.0];
        let categories = [
            Category::Assigned {
                component: 1,
                probability: 0.75,
            },
            Category::Unassigned,
        ];
        let mut buf = Vec::new();
        write_classes(&mut buf, &data, &categories).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "index,value,component,probability\n0,0.5,1,0.750000\n1,99,,\n"
        );
    }
}
