use super::{DocumentKind, Renderer};
use crate::descriptor::Orientation;
use crate::error::RenderError;
use crate::sections::{Analysis, ContentBlock, DataTable, Footer, Header, ReportLayout, Summary};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rect, Rgb,
};
use tracing::debug;

const PT_TO_MM: f32 = 0.352_778;
// Average Helvetica advance, in ems.
const CHAR_EM: f32 = 0.5;

const TITLE_COLOR: u32 = 0x1E3A8A;
const SUBTITLE_COLOR: u32 = 0x374151;
const SECTION_COLOR: u32 = 0x1E40AF;
const HEADER_BAND: u32 = 0x1E40AF;
const HIGHLIGHT_TEXT: u32 = 0x059669;
const HIGHLIGHT_BAND: u32 = 0xF0FDF4;
const GRID: u32 = 0x9CA3AF;
const FOOTER_COLOR: u32 = 0x6B7280;
const BLACK: u32 = 0x000000;
const WHITE: u32 = 0xFFFFFF;

const HEADER_ROW_HEIGHT: f32 = 8.0;
const ROW_HEIGHT: f32 = 6.5;
const CELL_PADDING: f32 = 2.0;

fn color(hex: u32) -> Color {
    let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
    Color::Rgb(Rgb::new(channel(16), channel(8), channel(0), None))
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.4
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * PT_TO_MM * CHAR_EM
}

/// Clip `text` so it fits in `width` millimetres.
fn fit(text: &str, size: f32, width: f32) -> String {
    if text_width(text, size) <= width {
        return text.to_string();
    }
    let max_chars = (width / (size * PT_TO_MM * CHAR_EM)).floor() as usize;
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size) > width && !current.is_empty() {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[derive(Debug, Clone, Copy)]
struct Geometry {
    width: f32,
    height: f32,
    margin_x: f32,
    margin_y: f32,
}

impl Geometry {
    // A4, with tighter margins on landscape pages.
    fn for_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Portrait => Self {
                width: 210.0,
                height: 297.0,
                margin_x: 20.0,
                margin_y: 20.0,
            },
            Orientation::Landscape => Self {
                width: 297.0,
                height: 210.0,
                margin_x: 15.0,
                margin_y: 10.0,
            },
        }
    }

    fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin_x
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PageStats {
    pages: usize,
    table_headers: usize,
    notes: usize,
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
}

/// Top-down writer over a growing PDF document. `cursor` is the distance
/// from the top edge of the current page.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    geometry: Geometry,
    cursor: f32,
    stats: PageStats,
}

impl PageWriter {
    fn new(title: &str, geometry: Geometry) -> Result<Self, printpdf::Error> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(geometry.width),
            Mm(geometry.height),
            "Page 1",
        );
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            geometry,
            cursor: geometry.margin_y,
            stats: PageStats {
                pages: 1,
                ..PageStats::default()
            },
        })
    }

    fn remaining(&self) -> f32 {
        self.geometry.height - self.geometry.margin_y - self.cursor
    }

    fn new_page(&mut self) {
        self.stats.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(self.geometry.width),
            Mm(self.geometry.height),
            format!("Page {}", self.stats.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = self.geometry.margin_y;
    }

    /// Start a new page unless `height` still fits. Returns whether a break
    /// happened.
    fn ensure(&mut self, height: f32) -> bool {
        if height > self.remaining() && self.cursor > self.geometry.margin_y {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn space(&mut self, height: f32) {
        self.cursor = (self.cursor + height).min(self.geometry.height - self.geometry.margin_y);
    }

    fn draw_text(&self, text: &str, size: f32, x: f32, baseline: f32, bold: bool, rgb: u32) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(color(rgb));
        self.layer.use_text(
            text,
            size,
            Mm(x),
            Mm(self.geometry.height - baseline),
            font,
        );
    }

    fn rect(&self, x: f32, top: f32, width: f32, height: f32, mode: PaintMode, rgb: u32) {
        match mode {
            PaintMode::Stroke => {
                self.layer.set_outline_color(color(rgb));
                self.layer.set_outline_thickness(0.5);
            }
            _ => self.layer.set_fill_color(color(rgb)),
        }
        let bottom = self.geometry.height - top - height;
        let rect = Rect::new(Mm(x), Mm(bottom), Mm(x + width), Mm(bottom + height)).with_mode(mode);
        self.layer.add_rect(rect);
    }

    fn line(&mut self, text: &str, size: f32, bold: bool, rgb: u32, align: Align) {
        let height = line_height(size);
        self.ensure(height);
        let fitted = fit(text, size, self.geometry.content_width());
        let x = match align {
            Align::Left => self.geometry.margin_x,
            Align::Center => (self.geometry.width - text_width(&fitted, size)) / 2.0,
        };
        self.draw_text(&fitted, size, x, self.cursor + size * PT_TO_MM, bold, rgb);
        self.cursor += height;
    }

    fn paragraph(&mut self, text: &str, size: f32, rgb: u32) {
        for line in wrap(text, size, self.geometry.content_width()) {
            self.line(&line, size, false, rgb, Align::Left);
        }
    }

    fn section_heading(&mut self, text: &str) {
        // Keep the heading with at least one line of what follows.
        self.ensure(line_height(12.0) + HEADER_ROW_HEIGHT + ROW_HEIGHT);
        self.space(3.0);
        self.line(text, 12.0, true, SECTION_COLOR, Align::Left);
        self.space(1.5);
    }

    fn header(&mut self, header: &Header) {
        self.line(&header.title, 20.0, true, TITLE_COLOR, Align::Center);
        self.space(2.0);
        self.line(&header.subtitle, 13.0, false, SUBTITLE_COLOR, Align::Center);
        self.space(3.0);
        self.paragraph(&header.info, 10.0, BLACK);
        self.space(8.0);
    }

    fn summary(&mut self, summary: &Summary) {
        self.section_heading(&summary.heading);
        let size = 11.0;
        let band = summary.lines.len() as f32 * line_height(size) + 2.0 * CELL_PADDING;
        self.ensure(band);
        self.rect(
            self.geometry.margin_x,
            self.cursor,
            self.geometry.content_width(),
            band,
            PaintMode::Fill,
            HIGHLIGHT_BAND,
        );
        self.cursor += CELL_PADDING;
        for kv in &summary.lines {
            let text = format!("{}: {}", kv.label, kv.value);
            self.line(&text, size, true, HIGHLIGHT_TEXT, Align::Left);
        }
        self.cursor += CELL_PADDING;
        self.space(5.0);
    }

    fn column_widths(&self, table: &DataTable) -> Vec<f32> {
        let natural: Vec<f32> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, heading)| {
                let body = table
                    .rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| text_width(&cell.display(), 8.0))
                    .fold(0.0f32, f32::max);
                body.max(text_width(heading, 9.0)) + 2.0 * CELL_PADDING
            })
            .collect();
        let total: f32 = natural.iter().sum();
        if total <= 0.0 {
            return natural;
        }
        let scale = self.geometry.content_width() / total;
        natural.into_iter().map(|w| w * scale).collect()
    }

    fn table_header(&mut self, columns: &[String], widths: &[f32]) {
        let mut x = self.geometry.margin_x;
        let total: f32 = widths.iter().sum();
        self.rect(x, self.cursor, total, HEADER_ROW_HEIGHT, PaintMode::Fill, HEADER_BAND);
        for (heading, width) in columns.iter().zip(widths) {
            let text = fit(heading, 9.0, width - 2.0 * CELL_PADDING);
            let baseline = self.cursor + HEADER_ROW_HEIGHT / 2.0 + 9.0 * PT_TO_MM * 0.35;
            self.draw_text(&text, 9.0, x + CELL_PADDING, baseline, true, WHITE);
            self.rect(x, self.cursor, *width, HEADER_ROW_HEIGHT, PaintMode::Stroke, GRID);
            x += width;
        }
        self.cursor += HEADER_ROW_HEIGHT;
        self.stats.table_headers += 1;
    }

    fn table(&mut self, table: &DataTable) {
        self.section_heading(&table.heading);
        if table.rows.is_empty() {
            self.space(5.0);
            return;
        }
        let widths = self.column_widths(table);
        self.ensure(HEADER_ROW_HEIGHT + ROW_HEIGHT);
        self.table_header(&table.columns, &widths);

        for row in &table.rows {
            if self.ensure(ROW_HEIGHT) {
                self.table_header(&table.columns, &widths);
            }
            let mut x = self.geometry.margin_x;
            let baseline = self.cursor + ROW_HEIGHT / 2.0 + 8.0 * PT_TO_MM * 0.35;
            for (cell, width) in row.iter().zip(&widths) {
                let text = fit(&cell.display(), 8.0, width - 2.0 * CELL_PADDING);
                self.draw_text(&text, 8.0, x + CELL_PADDING, baseline, false, BLACK);
                self.rect(x, self.cursor, *width, ROW_HEIGHT, PaintMode::Stroke, GRID);
                x += width;
            }
            self.cursor += ROW_HEIGHT;
        }
        self.space(8.0);
    }

    fn analysis(&mut self, analysis: &Analysis) {
        self.section_heading(&analysis.heading);
        if !analysis.lines.is_empty() {
            self.line(&analysis.caption, 10.0, true, BLACK, Align::Left);
            for line in &analysis.lines {
                self.line(line, 10.0, false, BLACK, Align::Left);
            }
        }
        self.space(5.0);
    }

    // Request flags such as "Annexes: requested", above the footer.
    fn notes(&mut self, notes: &[String]) {
        if notes.is_empty() {
            return;
        }
        self.space(4.0);
        for note in notes {
            self.line(note, 9.0, false, SUBTITLE_COLOR, Align::Left);
            self.stats.notes += 1;
        }
    }

    fn footer(&mut self, footer: &Footer) {
        self.space(8.0);
        self.line(&footer.text, 8.0, false, FOOTER_COLOR, Align::Center);
    }

    fn finish(self) -> Result<(Vec<u8>, PageStats), printpdf::Error> {
        let stats = self.stats;
        let bytes = self.doc.save_to_bytes()?;
        Ok((bytes, stats))
    }
}

/// A4 page-flow renderer built on `printpdf`'s builtin Helvetica fonts.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl PdfRenderer {
    fn paginate(layout: &ReportLayout) -> Result<(Vec<u8>, PageStats), printpdf::Error> {
        let title = layout.header().map(|h| h.title.as_str()).unwrap_or(layout.name.as_str());
        let mut writer = PageWriter::new(title, Geometry::for_orientation(layout.orientation))?;
        for block in &layout.blocks {
            match block {
                ContentBlock::Header(header) => writer.header(header),
                ContentBlock::SummaryParagraph(summary) => writer.summary(summary),
                ContentBlock::DataTable(table) => writer.table(table),
                ContentBlock::AnalysisParagraph(analysis) => writer.analysis(analysis),
                ContentBlock::Footer(footer) => {
                    writer.notes(&layout.notes);
                    writer.footer(footer);
                }
            }
        }
        writer.finish()
    }
}

impl Renderer for PdfRenderer {
    fn kind(&self) -> DocumentKind {
        DocumentKind::PageFlow
    }

    fn render(&self, layout: &ReportLayout) -> Result<Vec<u8>, RenderError> {
        let (bytes, stats) = Self::paginate(layout)
            .map_err(|err| RenderError::new(DocumentKind::PageFlow, err.to_string()))?;
        debug!(pages = stats.pages, bytes = bytes.len(), "rendered pdf");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReportConfiguration, ReportType};
    use crate::sections::SectionBuilder;
    use crate::stats::aggregate;
    use crate::types::ProjectRecord;
    use chrono::NaiveDate;

    fn layout(report_type: ReportType, rows: usize) -> ReportLayout {
        let records: Vec<ProjectRecord> = (0..rows)
            .map(|i| ProjectRecord {
                id: format!("PROJ-{i:03}"),
                program: format!("Drainage rehabilitation works, sector {i}"),
                area: "Public Works".into(),
                modified_budget: 250_000.0 * (i + 1) as f64,
                physical_progress: (i % 100) as f64,
                status: "In progress".into(),
                ..ProjectRecord::default()
            })
            .collect();
        let stats = aggregate(&records);
        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let at = cutoff.and_hms_opt(12, 0, 0).unwrap();
        let config = ReportConfiguration::new(report_type, cutoff);
        SectionBuilder::new(at).layout(&config, &records, &stats)
    }

    #[test]
    fn short_report_fits_one_page() {
        let (bytes, stats) = PdfRenderer::paginate(&layout(ReportType::Executive, 3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.table_headers, 1);
    }

    #[test]
    fn long_tables_break_and_repeat_header() {
        let (_, stats) = PdfRenderer::paginate(&layout(ReportType::Portfolio, 200)).unwrap();
        assert!(stats.pages > 1);
        assert!(stats.table_headers > 1);
        assert!(stats.table_headers <= stats.pages);
    }

    #[test]
    fn placeholder_report_renders_without_table() {
        let (bytes, stats) = PdfRenderer::paginate(&layout(ReportType::Transparency, 5)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(stats.table_headers, 0);
    }

    #[test]
    fn request_notes_are_drawn_before_footer() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let builder = SectionBuilder::new(cutoff.and_hms_opt(12, 0, 0).unwrap());
        let stats = aggregate(&[]);

        let mut config = ReportConfiguration::new(ReportType::Territorial, cutoff);
        config.include_annex = true;
        let annexed = builder.layout(&config, &[], &stats);
        assert_eq!(annexed.notes, vec!["Charts: included", "Annexes: requested"]);
        let (_, drawn) = PdfRenderer::paginate(&annexed).unwrap();
        assert_eq!(drawn.notes, 2);

        let plain = builder.layout(&config.with_charts(false), &[], &stats);
        let (_, drawn) = PdfRenderer::paginate(&plain).unwrap();
        assert_eq!(drawn.notes, 1);

        let bare = ReportConfiguration::new(ReportType::Portfolio, cutoff).with_charts(false);
        let (_, drawn) = PdfRenderer::paginate(&builder.layout(&bare, &[], &stats)).unwrap();
        assert_eq!(drawn.notes, 0);
    }

    #[test]
    fn fit_and_wrap_respect_width() {
        assert_eq!(fit("short", 8.0, 100.0), "short");
        let clipped = fit(&"x".repeat(200), 8.0, 20.0);
        assert!(clipped.ends_with("..."));
        assert!(text_width(&clipped, 8.0) <= 20.0);

        let lines = wrap("Type: Executive | Period: Monthly | Cutoff date: 31/03/2026", 10.0, 40.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| !l.is_empty()));
    }
}
