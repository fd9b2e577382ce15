//! PDF export of a filtered expense history.
//!
//! [`plan_report`] lays the report out as pages of text lines; it is pure and
//! holds all pagination rules. [`render_expense_report`] only draws those lines
//! with `printpdf`.

use chrono::NaiveDate;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use rust_decimal::Decimal;
use tracing::info;

use crate::database::models::{Expense, ExpenseFilter, Settings};
use crate::error::{Error, Result};
use crate::summary::Summary;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_X: f32 = 15.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;

/// x offsets of Date | Payer | Category | Amount | Description
const COLUMNS: [f32; 5] = [15.0, 42.0, 82.0, 112.0, 140.0];
const DESCRIPTION_CHARS: usize = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Meta,
    Header,
    Row,
    Subtotal,
    Total,
    Blank,
}

impl LineKind {
    fn height(&self) -> f32 {
        match self {
            LineKind::Title => 10.0,
            LineKind::Header | LineKind::Total => 7.0,
            _ => 6.0,
        }
    }

    fn font_size(&self) -> f32 {
        match self {
            LineKind::Title => 18.0,
            LineKind::Header | LineKind::Total => 11.0,
            LineKind::Meta => 9.0,
            _ => 10.0,
        }
    }

    fn bold(&self) -> bool {
        matches!(self, LineKind::Title | LineKind::Header | LineKind::Total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub kind: LineKind,
    pub cells: Vec<String>,
}

impl ReportLine {
    fn text(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            cells: vec![text.into()],
        }
    }

    fn header() -> Self {
        Self {
            kind: LineKind::Header,
            cells: ["Date", "Payer", "Category", "Amount", "Description"]
                .map(String::from)
                .to_vec(),
        }
    }
}

pub type Page = Vec<ReportLine>;

pub fn fmt_amount(symbol: &str, amount: Decimal) -> String {
    format!("{symbol}{:.2}", amount)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Lays the report out into pages. A table row that spills onto a new page
/// brings the column header with it.
pub fn plan_report(
    expenses: &[Expense],
    filter: &ExpenseFilter,
    settings: &Settings,
    generated_on: NaiveDate,
) -> Result<Vec<Page>> {
    let symbol = settings.currency_symbol.as_str();
    let summary = Summary::from_expenses(expenses)?;

    let mut lines = vec![
        ReportLine::text(LineKind::Title, settings.export_title.clone()),
        ReportLine::text(LineKind::Meta, format!("Filter: {}", filter.describe())),
        ReportLine::text(
            LineKind::Meta,
            format!("Generated {generated_on} - {} expenses", expenses.len()),
        ),
        ReportLine::text(LineKind::Blank, ""),
        ReportLine::header(),
    ];

    if expenses.is_empty() {
        lines.push(ReportLine::text(LineKind::Row, "No expenses match this filter."));
    }
    for e in expenses {
        lines.push(ReportLine {
            kind: LineKind::Row,
            cells: vec![
                e.occurred_on.to_string(),
                truncate(&e.payer, 16),
                e.category.to_string(),
                fmt_amount(symbol, e.amount),
                truncate(e.description.as_deref().unwrap_or(""), DESCRIPTION_CHARS),
            ],
        });
    }

    lines.push(ReportLine::text(LineKind::Blank, ""));
    for p in &summary.by_payer {
        lines.push(ReportLine::text(
            LineKind::Subtotal,
            format!("{}: {} ({} expenses)", p.payer, fmt_amount(symbol, p.total), p.count),
        ));
    }
    lines.push(ReportLine::text(
        LineKind::Total,
        format!("Total: {}", fmt_amount(symbol, summary.total)),
    ));

    Ok(paginate(lines, PAGE_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM))
}

fn paginate(lines: Vec<ReportLine>, capacity: f32) -> Vec<Page> {
    let mut pages: Vec<Page> = vec![Vec::new()];
    let mut used = 0.0;

    for line in lines {
        let height = line.kind.height();
        if used + height > capacity {
            pages.push(Vec::new());
            used = 0.0;
            if line.kind == LineKind::Row {
                let header = ReportLine::header();
                used += header.kind.height();
                if let Some(page) = pages.last_mut() {
                    page.push(header);
                }
            }
        }
        used += height;
        if let Some(page) = pages.last_mut() {
            page.push(line);
        }
    }
    pages
}

fn export_err(e: impl std::fmt::Display) -> Error {
    Error::Export(e.to_string())
}

/// Renders the filtered expenses as a PDF document.
pub fn render_expense_report(
    expenses: &[Expense],
    filter: &ExpenseFilter,
    settings: &Settings,
) -> Result<Vec<u8>> {
    let generated_on = chrono::Local::now().date_naive();
    let pages = plan_report(expenses, filter, settings, generated_on)?;

    let (doc, first_page, first_layer) = PdfDocument::new(
        settings.export_title.clone(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1".to_string(),
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(export_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(export_err)?;

    let page_count = pages.len();
    for (i, lines) in pages.iter().enumerate() {
        let (page, layer) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);

        let mut y = PAGE_HEIGHT - MARGIN_TOP;
        for line in lines {
            draw_line(&layer, line, y, &regular, &bold);
            y -= line.kind.height();
        }
        layer.use_text(
            format!("Page {} of {page_count}", i + 1),
            8.0,
            Mm(PAGE_WIDTH - MARGIN_X - 25.0),
            Mm(MARGIN_BOTTOM / 2.0),
            &regular,
        );
    }

    let bytes = doc.save_to_bytes().map_err(export_err)?;
    info!("Rendered {} expenses into a {page_count}-page PDF", expenses.len());
    Ok(bytes)
}

fn draw_line(
    layer: &PdfLayerReference,
    line: &ReportLine,
    y: f32,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let font = if line.kind.bold() { bold } else { regular };
    let size = line.kind.font_size();

    match line.kind {
        LineKind::Blank => {}
        LineKind::Header | LineKind::Row if line.cells.len() == COLUMNS.len() => {
            for (cell, x) in line.cells.iter().zip(COLUMNS) {
                layer.use_text(cell.clone(), size, Mm(x), Mm(y), font);
            }
        }
        _ => {
            let text = line.cells.join(" ");
            layer.use_text(text, size, Mm(MARGIN_X), Mm(y), font);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Category;
    use std::str::FromStr;

    fn expense(id: i64, payer: &str, amount: &str, description: Option<&str>) -> Expense {
        let day = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        Expense {
            expense_id: id,
            payer: payer.into(),
            category: Category::Food,
            amount: Decimal::from_str(amount).unwrap(),
            description: description.map(String::from),
            occurred_on: day,
            created_at: day.and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn short_report_fits_one_page() {
        let rows = vec![
            expense(1, "Ana", "12.5", Some("Lunch")),
            expense(2, "Ben", "7", None),
        ];
        let pages = plan_report(&rows, &ExpenseFilter::default(), &Settings::default(), today()).unwrap();
        assert_eq!(pages.len(), 1);

        let page = &pages[0];
        assert_eq!(page[0].cells, vec!["Trip Expense Report".to_string()]);
        assert_eq!(page[1].cells, vec!["Filter: All expenses".to_string()]);
        let row = page.iter().find(|l| l.kind == LineKind::Row).unwrap();
        assert_eq!(row.cells[3], "$12.50");

        let total = page.last().unwrap();
        assert_eq!(total.kind, LineKind::Total);
        assert_eq!(total.cells[0], "Total: $19.50");
    }

    #[test]
    fn long_report_repeats_the_header_on_each_page() {
        let rows: Vec<Expense> = (0..120).map(|i| expense(i, "Ana", "1", None)).collect();
        let pages = plan_report(&rows, &ExpenseFilter::default(), &Settings::default(), today()).unwrap();
        assert!(pages.len() >= 3);

        for page in &pages[1..] {
            if page.iter().any(|l| l.kind == LineKind::Row) {
                assert_eq!(page[0].kind, LineKind::Header);
            }
        }
        let row_count: usize = pages
            .iter()
            .flatten()
            .filter(|l| l.kind == LineKind::Row)
            .count();
        assert_eq!(row_count, 120);

        let capacity = PAGE_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        for page in &pages {
            let used: f32 = page.iter().map(|l| l.kind.height()).sum();
            assert!(used <= capacity);
        }
    }

    #[test]
    fn empty_filter_result_says_so() {
        let filter = ExpenseFilter {
            payer: Some("Nobody".into()),
            ..Default::default()
        };
        let pages = plan_report(&[], &filter, &Settings::default(), today()).unwrap();
        let flat: Vec<&ReportLine> = pages.iter().flatten().collect();
        assert!(flat.iter().any(|l| l.cells[0] == "No expenses match this filter."));
        assert_eq!(flat.last().unwrap().cells[0], "Total: $0.00");
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let long = "a".repeat(80);
        let rows = vec![expense(1, "Ana", "3", Some(&long))];
        let pages = plan_report(&rows, &ExpenseFilter::default(), &Settings::default(), today()).unwrap();
        let row = pages[0].iter().find(|l| l.kind == LineKind::Row).unwrap();
        assert_eq!(row.cells[4].chars().count(), DESCRIPTION_CHARS);
        assert!(row.cells[4].ends_with("..."));
    }

    #[test]
    fn rendered_bytes_are_a_pdf() {
        let rows = vec![expense(1, "Ana", "12.5", Some("Lunch"))];
        let bytes =
            render_expense_report(&rows, &ExpenseFilter::default(), &Settings::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
