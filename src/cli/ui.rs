use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row,
        Sparkline, Table, Tabs, Wrap,
    },
    Frame,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::cli::state::{App, FilesFocus, FormField, Prompt, Tab};
use crate::cli::util::fmt_money;
use crate::summary::{checked_sum, BudgetStatus};

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    // tabs | main content | status bar
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(size);

    let titles = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(Span::raw(format!("{} {}", i + 1, t.title()))))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(Block::default().borders(Borders::ALL).title("Trip Expenses"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(tabs, root[0]);

    match app.tab {
        Tab::Expenses => draw_expenses(f, root[1], app),
        Tab::AddExpense => draw_form(f, root[1], app),
        Tab::Summary => draw_summary(f, root[1], app),
        Tab::Files => draw_files(f, root[1], app),
        Tab::Settings => draw_settings(f, root[1], app),
        Tab::Help => draw_help(f, root[1]),
    }

    f.render_widget(Paragraph::new(app.status.as_str()), root[2]);

    if let Some(prompt) = &app.prompt {
        let height = prompt.fields.len() as u16 + 5;
        let area = center_rect(root[1], 60, height);
        f.render_widget(Clear, area);
        draw_prompt(f, area, prompt);
    }
}

// Expenses Page

fn draw_expenses(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(vec!["Date", "Payer", "Category", "Description", "Amount"]).height(1);
    let symbol = app.currency().to_string();

    let body: Vec<Row> = app
        .expenses
        .list
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(e.occurred_on.to_string()),
                Cell::from(e.payer.clone()),
                Cell::from(e.category.as_str()),
                Cell::from(e.description.clone().unwrap_or_default()),
                Cell::from(fmt_money(&symbol, &e.amount)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Percentage(50),
        Constraint::Length(14),
    ];

    let total = match checked_sum(app.expenses.list.iter().map(|e| e.amount)) {
        Ok(total) => fmt_money(&symbol, &total),
        Err(_) => "total out of range".to_string(),
    };
    let title = format!(
        "{}  ({} rows, {})  a=add e=edit x=delete p/c/d=filter f=clear o=export",
        app.expenses.filter.describe(),
        app.expenses.list.len(),
        total
    );

    let table = Table::new(body, widths)
        .header(header.style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.expenses.tsel);
}

// Add / Edit Page

fn draw_form(f: &mut Frame, area: Rect, app: &mut App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(8)])
        .split(cols[0]);

    let form = &app.form;
    let mark = |field: FormField| if form.focus == field { "> " } else { "  " };

    let form_lines = vec![
        format!("{}Payer      : {}", mark(FormField::Payer), form.payer.rendered(form.focus == FormField::Payer)),
        format!("{}Category   : < {} >", mark(FormField::Category), form.category),
        format!("{}Amount     : {}", mark(FormField::Amount), form.amount.rendered(form.focus == FormField::Amount)),
        format!("{}Date       : {}", mark(FormField::Date), form.date.rendered(form.focus == FormField::Date)),
        format!(
            "{}Description: {}",
            mark(FormField::Description),
            form.description.rendered(form.focus == FormField::Description)
        ),
    ]
    .join("\n");

    let title = match form.editing_id {
        Some(id) => format!("Edit expense #{id}"),
        None => "Add expense".to_string(),
    };
    let form_p = Paragraph::new(form_lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(form_p, left[0]);

    let status = if let Some(err) = &form.error {
        format!("Error: {err}")
    } else if let Some(ok) = &form.success {
        format!("Success: {ok}")
    } else {
        String::new()
    };
    let help_lines = vec![
        "Tab/Shift+Tab or Up/Down: switch field".to_string(),
        "Up/Down on Payer: pick a known payer".into(),
        "Left/Right on Category: change category".into(),
        "Enter or Ctrl+s: save | Esc: back".into(),
        String::new(),
        status,
    ]
    .join("\n");
    let help_p = Paragraph::new(help_lines)
        .block(Block::default().borders(Borders::ALL).title("Help & Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_p, left[1]);

    let current = app.form.payer.trimmed().to_string();
    let items: Vec<ListItem> = app
        .payer_candidates()
        .into_iter()
        .map(|name| {
            let style = if name == current {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(name)).style(style)
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Payers"));
    f.render_widget(list, cols[1]);
}

// Summary Page

fn to_units(d: Decimal) -> u64 {
    d.round().to_u64().unwrap_or(0)
}

fn draw_summary(f: &mut Frame, area: Rect, app: &mut App) {
    let symbol = app.currency().to_string();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(40),
            Constraint::Min(8),
        ])
        .split(area);

    let s = &app.summary.summary;
    let headline = format!(
        "Total {}  |  {} expenses  |  {} payers  |  {} per person",
        fmt_money(&symbol, &s.total),
        s.count,
        s.by_payer.len(),
        fmt_money(&symbol, &s.per_person())
    );
    f.render_widget(
        Paragraph::new(headline).block(
            Block::default()
                .borders(Borders::ALL)
                .title(app.expenses.filter.describe()),
        ),
        rows[0],
    );

    // budgets
    let header = Row::new(vec!["Payer", "Spent", "Budget", "Remaining", "Status"]);
    let body: Vec<Row> = app
        .summary
        .budgets
        .iter()
        .map(|b| {
            let (label, color) = match b.status {
                BudgetStatus::Within => ("within", Color::Green),
                BudgetStatus::Over => ("OVER", Color::Red),
            };
            Row::new(vec![
                Cell::from(b.payer.clone()),
                Cell::from(fmt_money(&symbol, &b.spent)),
                Cell::from(fmt_money(&symbol, &b.budget)),
                Cell::from(fmt_money(&symbol, &b.remaining)),
                Cell::from(label).style(Style::default().fg(color)),
            ])
        })
        .collect();
    let widths = [
        Constraint::Percentage(30),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(8),
    ];
    let table = Table::new(body, widths)
        .header(header.style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().borders(Borders::ALL).title("Budgets  (b/Enter=set, r=refresh)"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(table, rows[1], &mut app.summary.sel);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);

    let s = &app.summary.summary;
    let category_bars: Vec<Bar> = s
        .by_category
        .iter()
        .map(|c| {
            Bar::default()
                .value(to_units(c.total))
                .label(Line::from(c.category.as_str()))
                .text_value(fmt_money("", &c.total))
        })
        .collect();
    let by_category = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("By category"))
        .data(BarGroup::default().bars(&category_bars))
        .bar_width(9)
        .bar_gap(1);
    f.render_widget(by_category, charts[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(5)])
        .split(charts[1]);

    let payer_bars: Vec<Bar> = s
        .by_payer
        .iter()
        .map(|p| {
            Bar::default()
                .value(to_units(p.total))
                .label(Line::from(p.payer.clone()))
                .text_value(fmt_money("", &p.total))
        })
        .collect();
    let by_payer = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("By payer"))
        .data(BarGroup::default().bars(&payer_bars))
        .bar_width(9)
        .bar_gap(1);
    f.render_widget(by_payer, right[0]);

    let daily: Vec<u64> = s.by_day.iter().map(|d| to_units(d.total)).collect();
    let span = match (s.by_day.first(), s.by_day.last()) {
        (Some(a), Some(b)) => format!("Daily  {} .. {}", a.day, b.day),
        _ => "Daily".to_string(),
    };
    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(span))
        .data(&daily);
    f.render_widget(sparkline, right[1]);
}

// Trips & Files Page

fn focus_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn draw_files(f: &mut Frame, area: Rect, app: &mut App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let active = app.settings.settings.active_trip_id;
    let items: Vec<ListItem> = app
        .files
        .trips
        .iter()
        .map(|t| {
            let star = if Some(t.trip_id) == active { "* " } else { "  " };
            let place = t.location.as_deref().map(|l| format!("  ({l})")).unwrap_or_default();
            ListItem::new(Line::from(format!("{star}{}{place}", t.trip_name)))
        })
        .collect();
    let trips = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app.files.focus == FilesFocus::Trips))
                .title("Trips  (n=new, s=set active, x=delete)"),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(trips, cols[0], &mut app.files.trip_sel);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(5)])
        .split(cols[1]);

    let header = Row::new(vec!["Name", "Type", "Note", "Added"]);
    let body: Vec<Row> = app
        .files
        .files
        .iter()
        .map(|file| {
            Row::new(vec![
                Cell::from(file.file_name.clone()),
                Cell::from(file.mime_type.clone()),
                Cell::from(file.note.clone().unwrap_or_default()),
                Cell::from(file.created_at.format("%Y-%m-%d %H:%M").to_string()),
            ])
        })
        .collect();
    let widths = [
        Constraint::Percentage(35),
        Constraint::Length(18),
        Constraint::Percentage(30),
        Constraint::Length(17),
    ];
    let title = match app.current_trip() {
        Some(t) => format!("Files of {}  (a=attach, x=delete, Left/Right=switch)", t.trip_name),
        None => "Files".to_string(),
    };
    let table = Table::new(body, widths)
        .header(header.style(Style::default().add_modifier(Modifier::BOLD)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app.files.focus == FilesFocus::Files))
                .title(title),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(table, right[0], &mut app.files.file_sel);

    let details = match app.current_file() {
        Some(file) => Paragraph::new(format!("URL : {}\nTrip: {}", file.url, file.trip_name)),
        None => Paragraph::new("No file selected"),
    }
    .block(Block::default().borders(Borders::ALL).title("Details"))
    .wrap(Wrap { trim: true });
    f.render_widget(details, right[1]);
}

// Settings Page

fn draw_settings(f: &mut Frame, area: Rect, app: &mut App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let s = &app.settings.settings;
    let active_trip = s
        .active_trip_id
        .and_then(|id| app.files.trips.iter().find(|t| t.trip_id == id))
        .map(|t| t.trip_name.clone())
        .or_else(|| s.active_trip_id.map(|id| format!("#{id}")))
        .unwrap_or_else(|| "<none>".into());
    let text = format!(
        "Currency     : {}\nDefault payer: {}\nExport title : {}\nActive trip  : {}\n\ne = edit",
        s.currency_symbol,
        s.default_payer.as_deref().unwrap_or("<none>"),
        s.export_title,
        active_trip,
    );
    f.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Settings")),
        cols[0],
    );

    let items: Vec<ListItem> = app
        .settings
        .profiles
        .iter()
        .map(|p| ListItem::new(Line::from(p.display_name.clone())))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Members  (n=add, x=remove)"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, cols[1], &mut app.settings.sel);
}

fn draw_prompt(f: &mut Frame, area: Rect, prompt: &Prompt) {
    let width = prompt.fields.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let mut lines: Vec<String> = prompt
        .fields
        .iter()
        .enumerate()
        .map(|(i, (label, edit))| format!("{label:<width$} : {}", edit.rendered(i == prompt.focus)))
        .collect();
    lines.push(String::new());
    lines.push("Tab: next field | Enter: confirm | Esc: cancel".into());
    if let Some(err) = &prompt.error {
        lines.push(format!("Error: {err}"));
    }

    let p = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title(prompt.title.as_str()))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        "Global Keys:",
        "  q        : Quit",
        "  ?        : Help",
        "  Tab      : Next view (1-6 jumps directly)",
        "",
        "Expenses:",
        "  Up/Down  : Navigate list",
        "  a        : Add expense",
        "  e/Enter  : Edit selected expense",
        "  x/Del    : Delete selected expense",
        "  p / c    : Cycle payer / category filter",
        "  d        : Date range filter (from..to)",
        "  f        : Clear filters",
        "  o        : Export filtered expenses to PDF",
        "",
        "Add/Edit:",
        "  Tab      : Next field",
        "  Enter    : Save",
        "  Esc      : Back to list",
        "",
        "Summary:",
        "  b/Enter  : Set budget of selected payer",
        "",
        "Trips & Files:",
        "  Left/Right: Trips <-> Files",
        "  n        : New trip",
        "  a        : Attach a local file to the selected trip",
        "  s        : Make selected trip active",
        "  x/Del    : Delete trip or file",
        "",
        "Settings:",
        "  e        : Edit settings",
        "  n / x    : Add / remove member",
    ]
    .join("\n");

    let p = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help & Keybindings"));
    f.render_widget(p, area);
}

fn center_rect(rect: Rect, w: u16, h: u16) -> Rect {
    let x = rect.x + rect.width.saturating_sub(w) / 2;
    let y = rect.y + rect.height.saturating_sub(h) / 2;
    Rect {
        x,
        y,
        width: w.min(rect.width),
        height: h.min(rect.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_rect_fits_inside() {
        let outer = Rect::new(0, 0, 40, 10);
        let r = center_rect(outer, 60, 6);
        assert_eq!(r.width, 40);
        assert_eq!(r.y, 2);
    }

    #[test]
    fn bars_use_whole_units() {
        assert_eq!(to_units(Decimal::new(1240, 2)), 12);
        assert_eq!(to_units(Decimal::new(-5, 0)), 0);
    }
}
