//! Styled XLSX report rendering.
//!
//! Layout, top to bottom: a frozen, filterable header row; one row per
//! listing with alternating fill; a blank spacer row; a footer naming the
//! data source and the generation time.

use std::io::Write;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use jobsheet_core::error::AppError;
use jobsheet_core::models::{COLUMNS, JobListing, ReportSummary, SENTINEL};
use jobsheet_core::traits::ReportWriter;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};

const HEADER_FILL: u32 = 0x1F4E78;
const STRIPE_FILL: u32 = 0xF5F5F5;
const MUTED_FONT: u32 = 0x808080;

/// Upper bound for auto-fitted column widths, in characters.
pub const MAX_COLUMN_WIDTH: f64 = 80.0;

/// Longest text Excel accepts in a single cell, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// [`ReportWriter`] producing a single-sheet `.xlsx` workbook.
///
/// The file is rendered in memory, written to a temporary file next to the
/// destination and renamed into place, so a failed run never leaves a
/// partial report behind.
#[derive(Debug, Clone)]
pub struct XlsxReportWriter {
    source_url: String,
    sheet_name: String,
    sentinel: String,
    generated_at: Option<NaiveDateTime>,
}

impl XlsxReportWriter {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            sheet_name: "Jobs".to_string(),
            sentinel: SENTINEL.to_string(),
            generated_at: None,
        }
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Cells equal to `sentinel` are rendered muted.
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Fix the footer timestamp instead of using the local clock.
    pub fn with_timestamp(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    fn render(&self, listings: &[JobListing]) -> Result<(Vec<u8>, ReportSummary), XlsxError> {
        let border = FormatBorder::Thin;
        let header = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(HEADER_FILL))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(border);
        let plain = Format::new().set_border(border);
        let striped = Format::new()
            .set_border(border)
            .set_background_color(Color::RGB(STRIPE_FILL));
        let muted = Format::new()
            .set_border(border)
            .set_italic()
            .set_font_color(Color::RGB(MUTED_FONT));
        let muted_striped = Format::new()
            .set_border(border)
            .set_italic()
            .set_font_color(Color::RGB(MUTED_FONT))
            .set_background_color(Color::RGB(STRIPE_FILL));
        let footer = Format::new()
            .set_italic()
            .set_font_color(Color::RGB(MUTED_FONT));

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name)?;

        let last_col = (COLUMNS.len() - 1) as u16;
        for (col, label) in COLUMNS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *label, &header)?;
        }

        for (idx, listing) in listings.iter().enumerate() {
            let row = idx as u32 + 1;
            let is_striped = idx % 2 == 0;
            for (col, raw) in listing.cells().iter().enumerate() {
                let value = fit_cell(raw);
                if value.len() < raw.len() {
                    tracing::warn!(
                        row,
                        column = COLUMNS[col],
                        limit = MAX_CELL_CHARS,
                        "Cell text truncated to the spreadsheet limit"
                    );
                }
                let format = match (is_striped, value == self.sentinel) {
                    (true, true) => &muted_striped,
                    (true, false) => &striped,
                    (false, true) => &muted,
                    (false, false) => &plain,
                };
                sheet.write_string_with_format(row, col as u16, value, format)?;
            }
        }

        for (col, width) in column_widths(listings).iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }

        let last_row = listings.len() as u32;
        sheet.set_freeze_panes(1, 0)?;
        sheet.autofilter(0, 0, last_row, last_col)?;

        let footer_row = last_row + 2;
        let generated_at = self
            .generated_at
            .unwrap_or_else(|| Local::now().naive_local())
            .format("%Y-%m-%d %H:%M:%S");
        sheet.write_string_with_format(
            footer_row,
            0,
            format!("Sourced from {}", self.source_url),
            &footer,
        )?;
        sheet.write_string_with_format(
            footer_row,
            1,
            format!("Generated on: {generated_at}"),
            &footer,
        )?;

        let bytes = workbook.save_to_buffer()?;
        Ok((
            bytes,
            ReportSummary {
                data_rows: listings.len(),
                footer_row,
            },
        ))
    }
}

impl ReportWriter for XlsxReportWriter {
    fn write(&self, listings: &[JobListing], dest: &Path) -> Result<ReportSummary, AppError> {
        let (bytes, summary) = self
            .render(listings)
            .map_err(|e| AppError::ReportError(e.to_string()))?;
        persist_atomically(&bytes, dest)?;
        Ok(summary)
    }
}

/// Column widths in characters: longest cell (header included) plus 2,
/// capped at [`MAX_COLUMN_WIDTH`].
pub fn column_widths(listings: &[JobListing]) -> [f64; COLUMNS.len()] {
    let mut longest = COLUMNS.map(|label| label.chars().count());
    for listing in listings {
        for (col, value) in listing.cells().iter().enumerate() {
            longest[col] = longest[col].max(fit_cell(value).chars().count());
        }
    }
    longest.map(|len| (len as f64 + 2.0).min(MAX_COLUMN_WIDTH))
}

/// `value` cut to at most [`MAX_CELL_CHARS`] characters, on a char boundary.
pub fn fit_cell(value: &str) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Write `bytes` to a temp file beside `dest`, then rename it over `dest`.
///
/// A missing or unwritable directory fails before anything is created.
fn persist_atomically(bytes: &[u8], dest: &Path) -> Result<(), AppError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".jobsheet-").suffix(".tmp");
    // Temp files are owner-only; a report gets the usual umask-filtered mode.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    if let Ok(existing) = std::fs::metadata(dest) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}
