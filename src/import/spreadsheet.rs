//! XLSX workbooks (first worksheet only)

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use super::TAX_ID_COLUMN;
use crate::error::{AppError, AppResult};

/// Digits in a CPF
const CPF_DIGITS: usize = 11;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        // Tax IDs typed as numbers come back as floats
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Tax IDs typed as numbers lose their leading zeros; put them back so the
/// same CPF reads identically from CSV and XLSX
fn tax_id_text(cell: &Data) -> String {
    let text = cell_text(cell);
    match cell {
        Data::Int(_) | Data::Float(_)
            if text.len() < CPF_DIGITS && text.bytes().all(|b| b.is_ascii_digit()) =>
        {
            format!("{:0>width$}", text, width = CPF_DIGITS)
        }
        _ => text,
    }
}

fn row_text(row: &[Data]) -> Vec<String> {
    row.iter()
        .enumerate()
        .map(|(i, cell)| {
            if i == TAX_ID_COLUMN {
                tax_id_text(cell)
            } else {
                cell_text(cell)
            }
        })
        .collect()
}

pub fn read_rows(bytes: &[u8]) -> AppResult<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::BadRequest(format!("Invalid spreadsheet: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::BadRequest("Spreadsheet has no worksheet".to_string()))?
        .map_err(|e| AppError::BadRequest(format!("Unreadable worksheet: {}", e)))?;

    Ok(range.rows().map(row_text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_cells_lose_the_decimal_point() {
        assert_eq!(cell_text(&Data::Float(12345678909.0)), "12345678909");
        assert_eq!(cell_text(&Data::Int(42)), "42");
        assert_eq!(cell_text(&Data::String(" Ana ".to_string())), "Ana");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_numeric_tax_id_keeps_leading_zeros() {
        let row = row_text(&[
            Data::String("Ana".to_string()),
            Data::Float(1234567890.0),
            Data::Empty,
            Data::Float(11987654321.0),
        ]);
        assert_eq!(row, vec!["Ana", "01234567890", "", "11987654321"]);

        assert_eq!(tax_id_text(&Data::Int(9)), "00000000009");
        // Text cells already carry their zeros, CNPJs are longer than a CPF
        assert_eq!(tax_id_text(&Data::String("012.345.678-90".to_string())), "012.345.678-90");
        assert_eq!(tax_id_text(&Data::Float(12345678000195.0)), "12345678000195");
        assert_eq!(tax_id_text(&Data::String("CPF".to_string())), "CPF");
    }

    #[test]
    fn test_garbage_bytes_are_a_bad_request() {
        let err = read_rows(b"not a zip archive").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
