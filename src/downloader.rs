use rust_xlsxwriter::{Workbook, Worksheet};

use crate::cell::CellValue;
use crate::error::Result;
use crate::item::{Item, iso_today};

/// Fixed header row of every export
pub const EXPORT_HEADER: [&str; 7] = [
    "Tên vật tư",
    "Số lượng",
    "Đơn vị",
    "Vị trí",
    "Người nhập",
    "Ngày",
    "Ghi chú",
];

/// Name of the single worksheet in the workbook
pub const SHEET_NAME: &str = "Vattu";

/// Longest string Excel accepts in one cell
pub const MAX_CELL_CHARS: usize = 32_767;

/// Spreadsheet formats the export can be downloaded in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

/// Builds the export table: the header row followed by one row per item, in
/// list order.
pub fn export_table<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<Vec<CellValue>> {
    let mut table: Vec<Vec<CellValue>> =
        vec![EXPORT_HEADER.iter().map(|h| CellValue::text(*h)).collect()];

    table.extend(items.into_iter().map(|it| {
        vec![
            CellValue::text(&it.name),
            CellValue::Number(it.quantity),
            CellValue::text(&it.unit),
            CellValue::text(&it.location),
            CellValue::text(&it.user),
            CellValue::text(&it.date),
            CellValue::text(&it.notes),
        ]
    }));

    table
}

/// Download file name for an export made today, e.g.
/// `vattu_export_2024-05-01.xlsx`.
pub fn export_filename(format: ExportFormat) -> String {
    format!("vattu_export_{}.{}", iso_today(), format.extension())
}

/// Renders a table in the requested format.
pub fn render(table: &[Vec<CellValue>], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Xlsx => to_xlsx(table),
        ExportFormat::Csv => Ok(to_csv(table).into_bytes()),
    }
}

/// Convert a table to CSV format
///
/// Values containing commas, quotes or line breaks are quoted, with embedded
/// quotes doubled.
pub fn to_csv(table: &[Vec<CellValue>]) -> String {
    let mut csv_content = String::new();

    for row in table {
        for (c, cell) in row.iter().enumerate() {
            if c > 0 {
                csv_content.push(',');
            }

            let value = cell.to_string();
            if value.contains([',', '"', '\n', '\r']) {
                let escaped = value.replace('"', "\"\"");
                csv_content.push_str(&format!("\"{}\"", escaped));
            } else {
                csv_content.push_str(&value);
            }
        }
        csv_content.push('\n');
    }

    csv_content
}

/// Convert a table to XLSX format
///
/// Numbers are written as numeric cells so they stay summable in Excel;
/// everything else is written as text, cut to [`MAX_CELL_CHARS`].
pub fn to_xlsx(table: &[Vec<CellValue>]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_NAME)?;

    for (r, row) in table.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                CellValue::Number(n) => {
                    worksheet.write_number(r as u32, c as u16, *n)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(r as u32, c as u16, cell_text(s))?;
                }
            }
        }
    }

    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

fn cell_text(s: &str) -> &str {
    match s.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            log::warn!(
                "cell text of {} chars cut to {}",
                s.chars().count(),
                MAX_CELL_CHARS
            );
            &s[..end]
        }
        None => s,
    }
}
