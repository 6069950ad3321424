use super::{DocumentKind, Renderer};
use crate::descriptor::Cell;
use crate::error::RenderError;
use crate::sections::{DataTable, ReportLayout};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::debug;

const HEADER_FILL: u32 = 0x1E40AF;
const MAX_COLUMN_WIDTH: usize = 50;

/// Two-sheet workbook: key figures on "Summary", every record on "Detail".
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxRenderer;

impl XlsxRenderer {
    fn workbook(layout: &ReportLayout) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let summary = workbook.add_worksheet();
        summary.set_name("Summary")?;
        write_summary(summary, layout)?;

        let detail = workbook.add_worksheet();
        detail.set_name("Detail")?;
        write_detail(detail, &layout.detail)?;

        workbook.save_to_buffer()
    }
}

impl Renderer for XlsxRenderer {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Spreadsheet
    }

    fn render(&self, layout: &ReportLayout) -> Result<Vec<u8>, RenderError> {
        let bytes = Self::workbook(layout)
            .map_err(|err| RenderError::new(DocumentKind::Spreadsheet, err.to_string()))?;
        debug!(rows = layout.detail.rows.len(), bytes = bytes.len(), "rendered workbook");
        Ok(bytes)
    }
}

fn write_summary(sheet: &mut Worksheet, layout: &ReportLayout) -> Result<(), XlsxError> {
    let title = Format::new()
        .set_bold()
        .set_font_size(16)
        .set_font_color(Color::RGB(0x1E3A8A))
        .set_align(FormatAlign::Center);
    let bold = Format::new().set_bold();
    let section = Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(Color::RGB(HEADER_FILL));

    let (heading, subtitle, info) = match layout.header() {
        Some(h) => (h.title.as_str(), h.subtitle.as_str(), h.info.as_str()),
        None => (layout.name.as_str(), "", ""),
    };
    sheet.merge_range(0, 0, 0, 3, heading, &title)?;
    sheet.write_string(1, 0, subtitle)?;
    sheet.write_string(2, 0, info)?;

    sheet.write_string_with_format(4, 0, "REPORT STATISTICS", &section)?;
    let mut row = 5u32;
    for kv in &layout.key_figures {
        sheet.write_string_with_format(row, 0, &kv.label, &bold)?;
        sheet.write_string(row, 1, &kv.value)?;
        row += 1;
    }

    if !layout.notes.is_empty() {
        row += 1;
        for note in &layout.notes {
            sheet.write_string(row, 0, note)?;
            row += 1;
        }
    }

    sheet.set_column_width(0, 30)?;
    sheet.set_column_width(1, 25)?;
    Ok(())
}

fn write_detail(sheet: &mut Worksheet, table: &DataTable) -> Result<(), XlsxError> {
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);
    let number = Format::new().set_num_format("#,##0.00");

    for (col, heading) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, heading, &header)?;
    }
    for (i, cells) in table.rows.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            match cell {
                Cell::Text(text) => sheet.write_string(row, col as u16, text)?,
                Cell::Number(value) => {
                    sheet.write_number_with_format(row, col as u16, *value, &number)?
                }
            };
        }
    }
    for (col, width) in column_widths(table).into_iter().enumerate() {
        sheet.set_column_width(col as u16, width as f64)?;
    }
    Ok(())
}

/// Widest rendered value per column plus 2, capped at 50 characters.
fn column_widths(table: &DataTable) -> Vec<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(col, heading)| {
            let widest = table
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.display().chars().count())
                .chain(std::iter::once(heading.chars().count()))
                .max()
                .unwrap_or(0);
            (widest + 2).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}
