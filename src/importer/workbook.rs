//! Workbook access and cell coercion.

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, prelude::FromPrimitive};

use super::ImportError;

pub const PICKUP_POINT_SHEET: &str = "Pickup point";
pub const USER_SHEET: &str = "User";
pub const PRODUCT_SHEET: &str = "Product";
pub const ORDER_SHEET: &str = "Order";

static EMPTY: Data = Data::Empty;

/// One spreadsheet row with its 1-based row number.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub number: usize,
    pub cells: Vec<Data>,
}

impl Row {
    /// Cell by 0-based column; missing cells read as empty.
    pub fn cell(&self, column: usize) -> &Data {
        self.cells.get(column).unwrap_or(&EMPTY)
    }
}

/// Data rows of one sheet. The header row (row 1) is not included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    rows: Vec<Row>,
}

impl Sheet {
    pub fn from_range(range: &Range<Data>) -> Self {
        let Some((start_row, start_col)) = range.start() else {
            return Self::default();
        };
        let rows = range
            .rows()
            .enumerate()
            .map(|(offset, cells)| {
                let mut row = vec![Data::Empty; start_col as usize];
                row.extend(cells.iter().cloned());
                Row {
                    number: start_row as usize + offset + 1,
                    cells: row,
                }
            })
            .filter(|row| row.number >= 2)
            .collect();
        Self { rows }
    }

    /// Builds a sheet from data rows, numbered from row 2 as if under a header.
    pub fn from_rows(rows: Vec<Vec<Data>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(offset, cells)| Row {
                number: offset + 2,
                cells,
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// The four tables of an import, in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub pickup_points: Sheet,
    pub users: Sheet,
    pub products: Sheet,
    pub orders: Sheet,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let mut workbook = open_workbook_auto(path)?;
        let names = workbook.sheet_names();
        for required in [PICKUP_POINT_SHEET, USER_SHEET, PRODUCT_SHEET, ORDER_SHEET] {
            if !names.iter().any(|name| name == required) {
                return Err(ImportError::MissingSheet(required.to_string()));
            }
        }

        Ok(Self {
            pickup_points: Sheet::from_range(&workbook.worksheet_range(PICKUP_POINT_SHEET)?),
            users: Sheet::from_range(&workbook.worksheet_range(USER_SHEET)?),
            products: Sheet::from_range(&workbook.worksheet_range(PRODUCT_SHEET)?),
            orders: Sheet::from_range(&workbook.worksheet_range(ORDER_SHEET)?),
        })
    }
}

/// Trimmed text of a cell; blank cells give `None`. Integral numbers render without a
/// fractional part.
pub fn text(cell: &Data) -> Option<String> {
    let value = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => value.to_string(),
            None => dt.as_f64().to_string(),
        },
    };
    if value.is_empty() { None } else { Some(value) }
}

pub fn integer(cell: &Data) -> Result<Option<i64>, String> {
    match cell {
        Data::Empty => Ok(None),
        Data::Int(i) => Ok(Some(*i)),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(Some(*f as i64)),
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .map(Some)
                .map_err(|_| format!("expected an integer, found {s:?}"))
        }
        other => Err(format!("expected an integer, found {other:?}")),
    }
}

pub fn decimal(cell: &Data) -> Result<Option<Decimal>, String> {
    match cell {
        Data::Empty => Ok(None),
        Data::Int(i) => Ok(Some(Decimal::from(*i))),
        Data::Float(f) => Decimal::from_f64(*f)
            .map(Some)
            .ok_or_else(|| format!("number {f} is out of range")),
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.replace(',', ".")
                .parse::<Decimal>()
                .map(Some)
                .map_err(|_| format!("expected a number, found {s:?}"))
        }
        other => Err(format!("expected a number, found {other:?}")),
    }
}

pub fn date(cell: &Data) -> Result<Option<NaiveDate>, String> {
    match cell {
        Data::Empty => Ok(None),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|value| Some(value.date()))
            .ok_or_else(|| format!("invalid date value {}", dt.as_f64())),
        Data::Int(i) => serial_date(*i as f64),
        Data::Float(f) => serial_date(*f),
        Data::String(s) | Data::DateTimeIso(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            parse_date_text(s)
                .map(Some)
                .ok_or_else(|| format!("expected a date, found {s:?}"))
        }
        other => Err(format!("expected a date, found {other:?}")),
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10).unwrap_or(s);
    ["%Y-%m-%d", "%d.%m.%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(head, format).ok())
}

fn serial_date(serial: f64) -> Result<Option<NaiveDate>, String> {
    excel_serial_date(serial)
        .map(Some)
        .ok_or_else(|| format!("invalid date serial {serial}"))
}

/// Days since 1899-12-30, the epoch of the 1900 date system.
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}
