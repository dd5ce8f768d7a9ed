use std::sync::OnceLock;

use regex::Regex;

use crate::{
    data::{Cell, RawGrid, RowRecord},
    error::PipelineError,
    header::LocatedHeader,
};

pub const DOB_COLUMN: &str = "dob";
pub const LEGAL_BIRTHDAY_COLUMN: &str = "legal_birthday";
const BIRTHDAY_COMPONENTS: [&str; 3] = ["birthday_day", "birthday_month", "birthday_year"];

fn legal_birthday_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").expect("legal birthday pattern")
    })
}

/// Rows of one sheet after normalization, plus the zero-based indices of
/// rows whose `legal_birthday` kept an unrecognized format. Those rows are
/// highlighted later, never rejected.
#[derive(Debug)]
pub struct NormalizedSheet {
    pub rows: Vec<RowRecord>,
    pub invalid_legal_birthday: Vec<usize>,
}

/// Converts the grid rows below the located header into row records. String
/// cells arrive pre-trimmed from the decode layer; columns with an empty
/// header name are skipped, and missing trailing cells become empty values.
///
/// Derived columns: `dob` is added when the header carries all three
/// birthday components (and only then); `legal_birthday` is normalized in
/// place when that column exists. A sheet with no rows past the header
/// aborts with `NoDataRows`.
pub fn normalize_rows(
    grid: &RawGrid,
    header: &LocatedHeader,
    scope: &str,
) -> Result<NormalizedSheet, PipelineError> {
    if grid.len() <= header.row_index + 1 {
        return Err(PipelineError::NoDataRows {
            scope: scope.to_string(),
        });
    }

    let derive_dob = BIRTHDAY_COMPONENTS
        .iter()
        .all(|component| header.columns.iter().any(|name| name == component));
    let has_legal_birthday = header
        .columns
        .iter()
        .any(|name| name == LEGAL_BIRTHDAY_COLUMN);

    let mut rows = Vec::with_capacity(grid.len() - header.row_index - 1);
    let mut invalid_legal_birthday = Vec::new();

    for raw_row in grid.iter().skip(header.row_index + 1) {
        let mut record = RowRecord::new();
        for (position, name) in header.columns.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let cell = raw_row.get(position).cloned().unwrap_or(Cell::Empty);
            record.set(name, cell);
        }

        if derive_dob {
            record.set(DOB_COLUMN, compose_dob(&record));
        }
        if has_legal_birthday && !rewrite_legal_birthday(&mut record) {
            invalid_legal_birthday.push(rows.len());
        }

        rows.push(record);
    }

    Ok(NormalizedSheet {
        rows,
        invalid_legal_birthday,
    })
}

/// `YYYY-MM-DD` from the three birthday components, day and month padded to
/// two digits. An empty day or month pads to `00`; only an empty year
/// collapses the result to an empty cell. The `dob` key itself is always
/// written.
fn compose_dob(record: &RowRecord) -> Cell {
    let day = record.display_value("birthday_day");
    let month = record.display_value("birthday_month");
    let year = record.display_value("birthday_year");
    if year.is_empty() {
        return Cell::Empty;
    }
    Cell::Text(format!("{year}-{month:0>2}-{day:0>2}"))
}

/// Normalizes `legal_birthday` to ISO form. Date cells are already ISO on
/// display; `D/M/YYYY` and `D-M-YYYY` strings are rewritten zero-padded.
/// Anything else non-empty is kept verbatim and reported as invalid via the
/// `false` return.
fn rewrite_legal_birthday(record: &mut RowRecord) -> bool {
    let cell = match record.get(LEGAL_BIRTHDAY_COLUMN) {
        Some(cell) if !cell.is_empty() => cell.clone(),
        _ => return true,
    };
    match cell {
        Cell::Date(_) => true,
        Cell::Text(value) => match legal_birthday_pattern().captures(&value) {
            Some(caps) => {
                let day = &caps[1];
                let month = &caps[2];
                let year = &caps[3];
                record.set(
                    LEGAL_BIRTHDAY_COLUMN,
                    Cell::Text(format!("{year}-{month:0>2}-{day:0>2}")),
                );
                true
            }
            None => false,
        },
        _ => false,
    }
}
