// src/cli/state.rs
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::{ListState, TableState};

use crate::cli::api::Client;
use crate::cli::input::LineEdit;
use crate::cli::util::{iso, parse_date, parse_money, parse_range, today};
use crate::database::models::{
    Category, Expense, ExpenseFilter, FileRecord, NewExpense, NewTrip, Profile, Settings,
    TripRecord,
};
use crate::summary::{BudgetLine, Summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Expenses,
    AddExpense,
    Summary,
    Files,
    Settings,
    Help,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Expenses,
        Tab::AddExpense,
        Tab::Summary,
        Tab::Files,
        Tab::Settings,
        Tab::Help,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Expenses => "Expenses",
            Tab::AddExpense => "Add/Edit",
            Tab::Summary => "Summary",
            Tab::Files => "Trips & Files",
            Tab::Settings => "Settings",
            Tab::Help => "Help",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn cycle(&self, delta: i32) -> Tab {
        let len = Self::ALL.len() as i32;
        Self::ALL[(self.index() as i32 + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Payer,
    Category,
    Amount,
    Date,
    Description,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Payer,
        FormField::Category,
        FormField::Amount,
        FormField::Date,
        FormField::Description,
    ];

    fn cycle(&self, delta: i32) -> FormField {
        let pos = Self::ORDER.iter().position(|f| f == self).unwrap_or(0) as i32;
        Self::ORDER[(pos + delta).rem_euclid(Self::ORDER.len() as i32) as usize]
    }
}

/// Shared by "add" and inline "edit"; `editing_id` tells them apart.
#[derive(Default, Clone, Debug)]
pub struct ExpenseForm {
    pub editing_id: Option<i64>,
    pub payer: LineEdit,
    pub category: Category,
    pub amount: LineEdit,
    pub date: LineEdit,
    pub description: LineEdit,
    pub focus: FormField,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl ExpenseForm {
    pub fn blank(default_payer: Option<&str>) -> Self {
        Self {
            payer: LineEdit::with_value(default_payer.unwrap_or_default()),
            date: LineEdit::with_value(iso(&today())),
            ..Default::default()
        }
    }

    pub fn from_expense(e: &Expense) -> Self {
        Self {
            editing_id: Some(e.expense_id),
            payer: LineEdit::with_value(e.payer.clone()),
            category: e.category,
            amount: LineEdit::with_value(e.amount.to_string()),
            date: LineEdit::with_value(iso(&e.occurred_on)),
            description: LineEdit::with_value(e.description.clone().unwrap_or_default()),
            ..Default::default()
        }
    }

    pub fn to_new_expense(&self) -> Result<NewExpense, String> {
        let payer = self.payer.trimmed();
        if payer.is_empty() {
            return Err("Payer is required".into());
        }
        if self.amount.trimmed().is_empty() {
            return Err("Amount cannot be empty".into());
        }
        let amount = parse_money(&self.amount.value).ok_or("Invalid amount format")?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err("Amount must not be negative".into());
        }
        let occurred_on = if self.date.trimmed().is_empty() {
            today()
        } else {
            parse_date(&self.date.value).ok_or("Format: YYYY-MM-DD")?
        };
        let description = Some(self.description.trimmed().to_string()).filter(|d| !d.is_empty());

        Ok(NewExpense {
            payer: payer.to_string(),
            category: self.category,
            amount,
            description,
            occurred_on,
        })
    }

    fn focused_edit(&mut self) -> Option<&mut LineEdit> {
        match self.focus {
            FormField::Payer => Some(&mut self.payer),
            FormField::Category => None,
            FormField::Amount => Some(&mut self.amount),
            FormField::Date => Some(&mut self.date),
            FormField::Description => Some(&mut self.description),
        }
    }
}

#[derive(Default)]
pub struct ExpensesPage {
    pub list: Vec<Expense>,
    pub tsel: TableState,
    pub filter: ExpenseFilter,
    pub payers: Vec<String>,
}

#[derive(Default)]
pub struct SummaryPage {
    pub summary: Summary,
    pub budgets: Vec<BudgetLine>,
    pub sel: TableState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilesFocus {
    #[default]
    Trips,
    Files,
}

#[derive(Default)]
pub struct FilesPage {
    pub trips: Vec<TripRecord>,
    pub trip_sel: ListState,
    pub files: Vec<FileRecord>,
    pub file_sel: TableState,
    pub focus: FilesFocus,
}

#[derive(Default)]
pub struct SettingsPage {
    pub settings: Settings,
    pub profiles: Vec<Profile>,
    pub sel: ListState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptKind {
    NewTrip,
    AttachFile { trip_id: i64 },
    SetBudget { payer: String },
    NewMember,
    DateRange,
    EditSettings,
}

/// Small modal form with labelled text fields.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub title: String,
    pub fields: Vec<(&'static str, LineEdit)>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Prompt {
    fn new(kind: PromptKind, title: impl Into<String>, fields: Vec<(&'static str, String)>) -> Self {
        Self {
            kind,
            title: title.into(),
            fields: fields
                .into_iter()
                .map(|(label, value)| (label, LineEdit::with_value(value)))
                .collect(),
            focus: 0,
            error: None,
        }
    }

    fn value(&self, i: usize) -> &str {
        self.fields.get(i).map(|(_, e)| e.trimmed()).unwrap_or_default()
    }

    fn optional(&self, i: usize) -> Option<String> {
        Some(self.value(i).to_string()).filter(|v| !v.is_empty())
    }
}

pub struct App {
    pub api: Client,
    pub tab: Tab,
    pub status: String,
    pub quit: bool,
    pub expenses: ExpensesPage,
    pub form: ExpenseForm,
    pub summary: SummaryPage,
    pub files: FilesPage,
    pub settings: SettingsPage,
    pub prompt: Option<Prompt>,
}

/// Next value in `None, Some(options[0]), …, Some(options[n-1]), None`.
pub fn cycle_option<T: Clone + PartialEq>(current: Option<&T>, options: &[T]) -> Option<T> {
    match current.and_then(|c| options.iter().position(|o| o == c)) {
        None => options.first().cloned(),
        Some(i) => options.get(i + 1).cloned(),
    }
}

fn move_index(current: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let cur = current.unwrap_or(0) as isize;
    Some((cur + delta).rem_euclid(len as isize) as usize)
}

fn clamp_index(current: Option<usize>, len: usize) -> Option<usize> {
    match (len, current) {
        (0, _) => None,
        (n, Some(i)) if i >= n => Some(n - 1),
        (_, None) => Some(0),
        (_, x) => x,
    }
}

impl App {
    pub fn new(api: Client, settings: Settings) -> Self {
        let form = ExpenseForm::blank(settings.default_payer.as_deref());
        Self {
            api,
            tab: Tab::Expenses,
            status: "Tab/1-6 switch view | ? help | q quit".into(),
            quit: false,
            expenses: ExpensesPage::default(),
            form,
            summary: SummaryPage::default(),
            files: FilesPage::default(),
            settings: SettingsPage {
                settings,
                ..Default::default()
            },
            prompt: None,
        }
    }

    pub fn currency(&self) -> &str {
        &self.settings.settings.currency_symbol
    }

    // ============= fetching =============

    pub async fn refresh_expenses(&mut self) -> Result<()> {
        self.expenses.list = self.api.list_expenses(&self.expenses.filter).await?;
        self.expenses.payers = self.api.payers().await?;
        let sel = clamp_index(self.expenses.tsel.selected(), self.expenses.list.len());
        self.expenses.tsel.select(sel);
        Ok(())
    }

    pub async fn refresh_summary(&mut self) -> Result<()> {
        let (summary, budgets) = self.api.summary(&self.expenses.filter).await?;
        self.summary.summary = summary;
        self.summary.budgets = budgets;
        let sel = clamp_index(self.summary.sel.selected(), self.summary.budgets.len());
        self.summary.sel.select(sel);
        Ok(())
    }

    pub async fn refresh_trips(&mut self) -> Result<()> {
        self.files.trips = self.api.list_trips().await?;
        let active = self.settings.settings.active_trip_id.and_then(|id| {
            self.files.trips.iter().position(|t| t.trip_id == id)
        });
        let sel = match self.files.trip_sel.selected() {
            None => active.or(clamp_index(None, self.files.trips.len())),
            cur => clamp_index(cur, self.files.trips.len()),
        };
        self.files.trip_sel.select(sel);
        self.refresh_files().await
    }

    pub async fn refresh_files(&mut self) -> Result<()> {
        self.files.files = match self.current_trip() {
            Some(trip) => self.api.list_files(trip.trip_id).await?,
            None => Vec::new(),
        };
        let sel = clamp_index(self.files.file_sel.selected(), self.files.files.len());
        self.files.file_sel.select(sel);
        Ok(())
    }

    pub async fn refresh_settings(&mut self) -> Result<()> {
        self.settings.settings = self.api.load_settings().await?;
        self.settings.profiles = self.api.list_profiles().await?;
        let sel = clamp_index(self.settings.sel.selected(), self.settings.profiles.len());
        self.settings.sel.select(sel);
        Ok(())
    }

    /// Switches view and fetches what it shows.
    pub async fn switch_tab(&mut self, tab: Tab) -> Result<()> {
        self.tab = tab;
        match tab {
            Tab::Expenses => self.refresh_expenses().await,
            Tab::AddExpense => {
                self.expenses.payers = self.api.payers().await?;
                self.settings.profiles = self.api.list_profiles().await?;
                Ok(())
            }
            Tab::Summary => self.refresh_summary().await,
            Tab::Files => self.refresh_trips().await,
            Tab::Settings => self.refresh_settings().await,
            Tab::Help => Ok(()),
        }
    }

    pub fn current_expense(&self) -> Option<&Expense> {
        self.expenses.list.get(self.expenses.tsel.selected()?)
    }

    pub fn current_trip(&self) -> Option<&TripRecord> {
        self.files.trips.get(self.files.trip_sel.selected()?)
    }

    pub fn current_file(&self) -> Option<&FileRecord> {
        self.files.files.get(self.files.file_sel.selected()?)
    }

    fn current_budget(&self) -> Option<&BudgetLine> {
        self.summary.budgets.get(self.summary.sel.selected()?)
    }

    fn current_profile(&self) -> Option<&Profile> {
        self.settings.profiles.get(self.settings.sel.selected()?)
    }

    /// Members first, then anyone who already paid for something.
    pub fn payer_candidates(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .settings
            .profiles
            .iter()
            .map(|p| p.display_name.clone())
            .collect();
        for p in &self.expenses.payers {
            if !names.contains(p) {
                names.push(p.clone());
            }
        }
        names
    }

    // ============= keys =============

    pub async fn handle_key(&mut self, k: KeyEvent) -> Result<()> {
        if k.kind != KeyEventKind::Press {
            return Ok(());
        }
        if let Err(e) = self.dispatch(k).await {
            self.status = format!("Error: {e:#}");
        }
        Ok(())
    }

    async fn dispatch(&mut self, k: KeyEvent) -> Result<()> {
        if self.prompt.is_some() {
            return self.handle_prompt_key(k).await;
        }
        if self.tab == Tab::AddExpense {
            return self.handle_form_key(k).await;
        }

        match k.code {
            KeyCode::Char('q') => {
                self.quit = true;
                return Ok(());
            }
            KeyCode::Tab => return self.switch_tab(self.tab.cycle(1)).await,
            KeyCode::BackTab => return self.switch_tab(self.tab.cycle(-1)).await,
            KeyCode::Char('?') => return self.switch_tab(Tab::Help).await,
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                return self.switch_tab(Tab::ALL[idx]).await;
            }
            _ => {}
        }

        match self.tab {
            Tab::Expenses => self.handle_expenses_key(k.code).await,
            Tab::Summary => self.handle_summary_key(k.code).await,
            Tab::Files => self.handle_files_key(k.code).await,
            Tab::Settings => self.handle_settings_key(k.code).await,
            Tab::Help => {
                if matches!(k.code, KeyCode::Esc | KeyCode::Char('b')) {
                    self.switch_tab(Tab::Expenses).await?;
                }
                Ok(())
            }
            Tab::AddExpense => Ok(()),
        }
    }

    async fn handle_expenses_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Up => {
                let i = move_index(self.expenses.tsel.selected(), self.expenses.list.len(), -1);
                self.expenses.tsel.select(i);
            }
            KeyCode::Down => {
                let i = move_index(self.expenses.tsel.selected(), self.expenses.list.len(), 1);
                self.expenses.tsel.select(i);
            }
            KeyCode::Char('a') => {
                self.form = ExpenseForm::blank(self.settings.settings.default_payer.as_deref());
                self.switch_tab(Tab::AddExpense).await?;
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(e) = self.current_expense() {
                    self.form = ExpenseForm::from_expense(e);
                    self.switch_tab(Tab::AddExpense).await?;
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(id) = self.current_expense().map(|e| e.expense_id) {
                    self.api.delete_expense(id).await?;
                    self.refresh_expenses().await?;
                    self.status = "Deleted.".into();
                }
            }
            KeyCode::Char('r') => self.refresh_expenses().await?,
            KeyCode::Char('p') => {
                self.expenses.filter.payer = cycle_option(
                    self.expenses.filter.payer.as_ref(),
                    &self.expenses.payers,
                );
                self.refresh_expenses().await?;
            }
            KeyCode::Char('c') => {
                self.expenses.filter.category =
                    cycle_option(self.expenses.filter.category.as_ref(), &Category::ALL);
                self.refresh_expenses().await?;
            }
            KeyCode::Char('d') => {
                let f = &self.expenses.filter;
                let current = match (f.from, f.to) {
                    (None, None) => String::new(),
                    (from, to) => format!(
                        "{}..{}",
                        from.map(|d| iso(&d)).unwrap_or_default(),
                        to.map(|d| iso(&d)).unwrap_or_default()
                    ),
                };
                self.prompt = Some(Prompt::new(
                    PromptKind::DateRange,
                    "Date range (YYYY-MM-DD..YYYY-MM-DD)",
                    vec![("Range", current)],
                ));
            }
            KeyCode::Char('f') => {
                self.expenses.filter = ExpenseFilter::default();
                self.refresh_expenses().await?;
            }
            KeyCode::Char('o') => {
                let out = PathBuf::from(format!("expenses-{}.pdf", iso(&today())));
                let count = self.api.export_pdf(&self.expenses.filter, &out).await?;
                self.status = format!("Exported {count} expenses to {}", out.display());
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_form_key(&mut self, k: KeyEvent) -> Result<()> {
        let save = k.code == KeyCode::Enter
            || (k.code == KeyCode::Char('s') && k.modifiers.contains(KeyModifiers::CONTROL));
        if save {
            return self.submit_expense().await;
        }

        match k.code {
            KeyCode::Esc => {
                self.form.error = None;
                self.switch_tab(Tab::Expenses).await?;
            }
            KeyCode::Tab => self.form.focus = self.form.focus.cycle(1),
            KeyCode::BackTab => self.form.focus = self.form.focus.cycle(-1),
            KeyCode::Up | KeyCode::Down if self.form.focus == FormField::Payer => {
                let candidates = self.payer_candidates();
                let delta = if k.code == KeyCode::Up { -1 } else { 1 };
                let cur = candidates.iter().position(|c| c == self.form.payer.trimmed());
                if let Some(i) = move_index(cur, candidates.len(), delta) {
                    self.form.payer.set(candidates[i].clone());
                }
            }
            KeyCode::Up => self.form.focus = self.form.focus.cycle(-1),
            KeyCode::Down => self.form.focus = self.form.focus.cycle(1),
            KeyCode::Left if self.form.focus == FormField::Category => {
                self.form.category = self.form.category.cycle(-1);
            }
            KeyCode::Right if self.form.focus == FormField::Category => {
                self.form.category = self.form.category.cycle(1);
            }
            code => {
                if let Some(edit) = self.form.focused_edit() {
                    edit.handle_key(code);
                }
            }
        }
        Ok(())
    }

    pub async fn submit_expense(&mut self) -> Result<()> {
        let new = match self.form.to_new_expense() {
            Ok(new) => new,
            Err(msg) => {
                self.form.error = Some(msg);
                self.form.success = None;
                return Ok(());
            }
        };

        let saved = match self.form.editing_id {
            Some(id) => self.api.update_expense(id, new).await,
            None => self.api.create_expense(new).await,
        };

        match saved {
            Ok(e) => {
                let verb = if self.form.editing_id.is_some() { "Updated" } else { "Saved" };
                self.status = format!("{verb} expense #{}", e.expense_id);
                if self.form.editing_id.is_some() {
                    self.switch_tab(Tab::Expenses).await?;
                    self.form = ExpenseForm::blank(self.settings.settings.default_payer.as_deref());
                } else {
                    // keep payer and date for quick entry of the next one
                    self.form.amount.clear();
                    self.form.description.clear();
                    self.form.focus = FormField::Amount;
                    self.form.error = None;
                    self.form.success = Some(format!("Saved #{}", e.expense_id));
                    self.expenses.payers = self.api.payers().await?;
                }
            }
            Err(e) => {
                self.form.error = Some(format!("Save failed: {e}"));
                self.form.success = None;
            }
        }
        Ok(())
    }

    async fn handle_summary_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Up => {
                let i = move_index(self.summary.sel.selected(), self.summary.budgets.len(), -1);
                self.summary.sel.select(i);
            }
            KeyCode::Down => {
                let i = move_index(self.summary.sel.selected(), self.summary.budgets.len(), 1);
                self.summary.sel.select(i);
            }
            KeyCode::Char('b') | KeyCode::Enter => {
                if let Some(line) = self.current_budget() {
                    let payer = line.payer.clone();
                    self.prompt = Some(Prompt::new(
                        PromptKind::SetBudget {
                            payer: payer.clone(),
                        },
                        format!("Budget for {payer}"),
                        vec![("Budget", line.budget.to_string())],
                    ));
                }
            }
            KeyCode::Char('r') => self.refresh_summary().await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_files_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Left => self.files.focus = FilesFocus::Trips,
            KeyCode::Right => self.files.focus = FilesFocus::Files,
            KeyCode::Up | KeyCode::Down => {
                let delta = if code == KeyCode::Up { -1 } else { 1 };
                match self.files.focus {
                    FilesFocus::Trips => {
                        let i = move_index(self.files.trip_sel.selected(), self.files.trips.len(), delta);
                        self.files.trip_sel.select(i);
                        self.files.file_sel.select(None);
                        self.refresh_files().await?;
                    }
                    FilesFocus::Files => {
                        let i = move_index(self.files.file_sel.selected(), self.files.files.len(), delta);
                        self.files.file_sel.select(i);
                    }
                }
            }
            KeyCode::Char('n') => {
                self.prompt = Some(Prompt::new(
                    PromptKind::NewTrip,
                    "New trip",
                    vec![("Name", String::new()), ("Location", String::new()), ("Note", String::new())],
                ));
            }
            KeyCode::Char('a') => match self.current_trip() {
                Some(trip) => {
                    self.prompt = Some(Prompt::new(
                        PromptKind::AttachFile { trip_id: trip.trip_id },
                        format!("Attach file to {}", trip.trip_name),
                        vec![("Path", String::new()), ("Note", String::new())],
                    ));
                }
                None => self.status = "Create a trip first (n)".into(),
            },
            KeyCode::Char('s') => {
                if let Some(trip) = self.current_trip() {
                    let name = trip.trip_name.clone();
                    self.settings.settings.active_trip_id = Some(trip.trip_id);
                    self.api.save_settings(&self.settings.settings).await?;
                    self.status = format!("Active trip: {name}");
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => match self.files.focus {
                FilesFocus::Trips => {
                    if let Some(id) = self.current_trip().map(|t| t.trip_id) {
                        self.api.delete_trip(id).await?;
                        self.files.file_sel.select(None);
                        self.refresh_trips().await?;
                        self.status = "Trip deleted.".into();
                    }
                }
                FilesFocus::Files => {
                    if let Some(id) = self.current_file().map(|f| f.file_id) {
                        self.api.delete_file(id).await?;
                        self.refresh_files().await?;
                        self.status = "File deleted.".into();
                    }
                }
            },
            KeyCode::Char('r') => self.refresh_trips().await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_settings_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Up => {
                let i = move_index(self.settings.sel.selected(), self.settings.profiles.len(), -1);
                self.settings.sel.select(i);
            }
            KeyCode::Down => {
                let i = move_index(self.settings.sel.selected(), self.settings.profiles.len(), 1);
                self.settings.sel.select(i);
            }
            KeyCode::Char('e') => {
                let s = &self.settings.settings;
                self.prompt = Some(Prompt::new(
                    PromptKind::EditSettings,
                    "Settings",
                    vec![
                        ("Currency", s.currency_symbol.clone()),
                        ("Default payer", s.default_payer.clone().unwrap_or_default()),
                        ("Export title", s.export_title.clone()),
                    ],
                ));
            }
            KeyCode::Char('n') => {
                self.prompt = Some(Prompt::new(
                    PromptKind::NewMember,
                    "New trip member",
                    vec![("Name", String::new())],
                ));
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(id) = self.current_profile().map(|p| p.profile_id) {
                    self.api.delete_profile(id).await?;
                    self.refresh_settings().await?;
                }
            }
            KeyCode::Char('r') => self.refresh_settings().await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_prompt_key(&mut self, k: KeyEvent) -> Result<()> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(());
        };
        match k.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Tab | KeyCode::Down => {
                prompt.focus = (prompt.focus + 1) % prompt.fields.len().max(1);
            }
            KeyCode::BackTab | KeyCode::Up => {
                let len = prompt.fields.len().max(1);
                prompt.focus = (prompt.focus + len - 1) % len;
            }
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    if let Err(e) = self.submit_prompt(&prompt).await {
                        self.prompt = Some(Prompt {
                            error: Some(format!("{e:#}")),
                            ..prompt
                        });
                    }
                }
            }
            code => {
                if let Some((_, edit)) = prompt.fields.get_mut(prompt.focus) {
                    edit.handle_key(code);
                }
            }
        }
        Ok(())
    }

    async fn submit_prompt(&mut self, prompt: &Prompt) -> Result<()> {
        match &prompt.kind {
            PromptKind::NewTrip => {
                let trip = self
                    .api
                    .create_trip(NewTrip {
                        trip_name: prompt.value(0).to_string(),
                        location: prompt.optional(1),
                        note: prompt.optional(2),
                    })
                    .await?;
                self.files.trip_sel.select(None);
                self.refresh_trips().await?;
                let pos = self.files.trips.iter().position(|t| t.trip_id == trip.trip_id);
                self.files.trip_sel.select(pos);
                self.refresh_files().await?;
                self.status = format!("Trip '{}' created", trip.trip_name);
            }
            PromptKind::AttachFile { trip_id } => {
                if prompt.value(0).is_empty() {
                    return Err(anyhow!("Path is required"));
                }
                let path = PathBuf::from(prompt.value(0));
                let file = self.api.attach_file(*trip_id, &path, prompt.optional(1)).await?;
                self.refresh_files().await?;
                self.status = format!("Uploaded {} ({})", file.file_name, file.url);
            }
            PromptKind::SetBudget { payer } => {
                let budget = parse_money(prompt.value(0)).ok_or_else(|| anyhow!("Invalid amount format"))?;
                self.api.set_budget(payer, budget).await?;
                self.refresh_summary().await?;
            }
            PromptKind::NewMember => {
                let profile = self.api.create_profile(prompt.value(0)).await?;
                self.refresh_settings().await?;
                self.status = format!("Added {}", profile.display_name);
            }
            PromptKind::DateRange => {
                let (from, to) = parse_range(prompt.value(0)).map_err(|e| anyhow!(e))?;
                self.expenses.filter.from = from;
                self.expenses.filter.to = to;
                self.refresh_expenses().await?;
            }
            PromptKind::EditSettings => {
                let settings = Settings {
                    currency_symbol: prompt.value(0).to_string(),
                    default_payer: prompt.optional(1),
                    export_title: prompt.value(2).to_string(),
                    ..self.settings.settings.clone()
                }
                .validate()?;
                self.api.save_settings(&settings).await?;
                self.settings.settings = settings;
                self.status = "Settings saved.".into();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::db::{connection, migrate};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn form(payer: &str, amount: &str, date: &str) -> ExpenseForm {
        ExpenseForm {
            payer: LineEdit::with_value(payer),
            amount: LineEdit::with_value(amount),
            date: LineEdit::with_value(date),
            category: Category::Transport,
            ..Default::default()
        }
    }

    #[test]
    fn form_builds_a_new_expense() {
        let mut f = form(" Ana ", "42.10", "2024-07-03");
        f.description.set("Train to Sintra");
        let new = f.to_new_expense().unwrap();
        assert_eq!(new.payer, "Ana");
        assert_eq!(new.amount, Decimal::new(4210, 2));
        assert_eq!(new.occurred_on, NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());
        assert_eq!(new.category, Category::Transport);
        assert_eq!(new.description.as_deref(), Some("Train to Sintra"));
    }

    #[test]
    fn form_reports_the_first_problem() {
        assert_eq!(form("", "1", "").to_new_expense().unwrap_err(), "Payer is required");
        assert_eq!(form("Ana", "", "").to_new_expense().unwrap_err(), "Amount cannot be empty");
        assert_eq!(form("Ana", "abc", "").to_new_expense().unwrap_err(), "Invalid amount format");
        assert_eq!(
            form("Ana", "-3", "").to_new_expense().unwrap_err(),
            "Amount must not be negative"
        );
        assert_eq!(form("Ana", "3", "3rd July").to_new_expense().unwrap_err(), "Format: YYYY-MM-DD");
    }

    #[test]
    fn edit_form_round_trips_an_expense() {
        let e = Expense {
            expense_id: 9,
            payer: "Ben".into(),
            category: Category::Lodging,
            amount: Decimal::new(15000, 2),
            description: None,
            occurred_on: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
            created_at: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap().and_hms_opt(8, 0, 0).unwrap(),
        };
        let f = ExpenseForm::from_expense(&e);
        assert_eq!(f.editing_id, Some(9));
        let new = f.to_new_expense().unwrap();
        assert_eq!(new.amount, e.amount);
        assert_eq!(new.occurred_on, e.occurred_on);
        assert_eq!(new.description, None);
    }

    #[test]
    fn filter_cycles_through_none() {
        let payers = vec!["Ana".to_string(), "Ben".to_string()];
        let a = cycle_option(None, &payers);
        assert_eq!(a.as_deref(), Some("Ana"));
        let b = cycle_option(a.as_ref(), &payers);
        assert_eq!(b.as_deref(), Some("Ben"));
        assert_eq!(cycle_option(b.as_ref(), &payers), None);
        // a payer that vanished restarts the cycle
        assert_eq!(cycle_option(Some(&"Zed".to_string()), &payers).as_deref(), Some("Ana"));
    }

    #[test]
    fn tabs_wrap() {
        assert_eq!(Tab::Expenses.cycle(-1), Tab::Help);
        assert_eq!(Tab::Help.cycle(1), Tab::Expenses);
        assert_eq!(Tab::Summary.index(), 2);
    }

    #[test]
    fn selection_helpers() {
        assert_eq!(move_index(None, 0, 1), None);
        assert_eq!(move_index(Some(2), 3, 1), Some(0));
        assert_eq!(move_index(Some(0), 3, -1), Some(2));
        assert_eq!(clamp_index(Some(5), 2), Some(1));
        assert_eq!(clamp_index(None, 2), Some(0));
        assert_eq!(clamp_index(Some(1), 0), None);
    }

    // ============= key handling against a real store =============

    async fn app(dir: &std::path::Path) -> App {
        let pool = connection::connect("sqlite::memory:", 1).await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        let config = Config {
            database_url: "sqlite::memory:".into(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            upload_dir: dir.join("uploads"),
            public_base_url: "http://localhost/objects".into(),
            max_upload_bytes: 1024,
            settings_path: dir.join("settings.json"),
            log_file: dir.join("log"),
        };
        let api = Client::new(pool, &config);
        let settings = api.load_settings().await.unwrap();
        App::new(api, settings)
    }

    async fn add(app: &App, payer: &str, category: Category, amount: i64, day: u32) -> Expense {
        app.api
            .create_expense(NewExpense {
                payer: payer.into(),
                category,
                amount: Decimal::from(amount),
                description: None,
                occurred_on: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            })
            .await
            .unwrap()
    }

    async fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).await.unwrap();
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c)).await;
        }
    }

    #[tokio::test]
    async fn delete_key_removes_the_selected_row_and_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path()).await;
        add(&app, "Ana", Category::Food, 10, 1).await;
        add(&app, "Ben", Category::Lodging, 80, 2).await;
        app.switch_tab(Tab::Expenses).await.unwrap();
        assert_eq!(app.expenses.list.len(), 2);
        // newest first, first row selected
        assert_eq!(app.current_expense().unwrap().payer, "Ben");

        press(&mut app, KeyCode::Char('x')).await;
        assert_eq!(app.status, "Deleted.");
        assert_eq!(app.expenses.list.len(), 1);
        assert_eq!(app.expenses.list[0].payer, "Ana");
        assert_eq!(app.expenses.payers, vec!["Ana".to_string()]);
        assert_eq!(app.expenses.tsel.selected(), Some(0));
    }

    #[tokio::test]
    async fn filter_keys_cycle_payer_and_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path()).await;
        add(&app, "Ana", Category::Food, 10, 1).await;
        add(&app, "Ben", Category::Transport, 20, 2).await;
        add(&app, "Ana", Category::Lodging, 90, 3).await;
        app.switch_tab(Tab::Expenses).await.unwrap();

        press(&mut app, KeyCode::Char('p')).await;
        assert_eq!(app.expenses.filter.payer.as_deref(), Some("Ana"));
        assert_eq!(app.expenses.list.len(), 2);
        press(&mut app, KeyCode::Char('p')).await;
        assert_eq!(app.expenses.filter.payer.as_deref(), Some("Ben"));
        assert_eq!(app.expenses.list.len(), 1);
        press(&mut app, KeyCode::Char('p')).await;
        assert_eq!(app.expenses.filter.payer, None);
        assert_eq!(app.expenses.list.len(), 3);

        press(&mut app, KeyCode::Char('c')).await;
        assert_eq!(app.expenses.filter.category, Some(Category::Food));
        assert_eq!(app.expenses.list.len(), 1);
        press(&mut app, KeyCode::Char('c')).await;
        assert_eq!(app.expenses.filter.category, Some(Category::Transport));
        assert_eq!(app.expenses.list[0].payer, "Ben");

        press(&mut app, KeyCode::Char('f')).await;
        assert_eq!(app.expenses.filter, ExpenseFilter::default());
        assert_eq!(app.expenses.list.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_member_keeps_the_prompt_open_with_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path()).await;
        app.switch_tab(Tab::Settings).await.unwrap();

        press(&mut app, KeyCode::Char('n')).await;
        type_text(&mut app, "Ana").await;
        press(&mut app, KeyCode::Enter).await;
        assert!(app.prompt.is_none());
        assert_eq!(app.status, "Added Ana");
        assert_eq!(app.settings.profiles.len(), 1);

        press(&mut app, KeyCode::Char('n')).await;
        type_text(&mut app, "Ana").await;
        press(&mut app, KeyCode::Enter).await;
        let prompt = app.prompt.as_ref().unwrap();
        assert_eq!(prompt.kind, PromptKind::NewMember);
        assert!(prompt.error.as_deref().unwrap().contains("UNIQUE constraint failed"));
        assert_eq!(prompt.value(0), "Ana");
        assert_eq!(app.settings.profiles.len(), 1);

        press(&mut app, KeyCode::Esc).await;
        assert!(app.prompt.is_none());
    }

    #[tokio::test]
    async fn failed_delete_shows_the_error_in_the_status_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path()).await;
        let e = add(&app, "Ana", Category::Food, 10, 1).await;
        app.switch_tab(Tab::Expenses).await.unwrap();

        // removed behind the view's back; the list is now stale
        app.api.delete_expense(e.expense_id).await.unwrap();
        press(&mut app, KeyCode::Char('x')).await;
        assert!(app.status.starts_with("Error:"), "{}", app.status);
        assert!(app.status.contains(&format!("Expense {} not found", e.expense_id)));
        assert_eq!(app.expenses.list.len(), 1);
    }

    #[tokio::test]
    async fn form_keys_save_an_expense() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path()).await;
        app.switch_tab(Tab::Expenses).await.unwrap();

        press(&mut app, KeyCode::Char('a')).await;
        assert_eq!(app.tab, Tab::AddExpense);
        type_text(&mut app, "Cleo").await;
        press(&mut app, KeyCode::Tab).await;
        press(&mut app, KeyCode::Right).await;
        press(&mut app, KeyCode::Tab).await;
        type_text(&mut app, "12.5").await;
        press(&mut app, KeyCode::Enter).await;

        assert_eq!(app.form.error, None);
        assert!(app.status.starts_with("Saved expense #"));
        assert_eq!(app.form.focus, FormField::Amount);
        assert!(app.form.amount.value.is_empty());
        assert_eq!(app.form.payer.trimmed(), "Cleo");

        press(&mut app, KeyCode::Esc).await;
        assert_eq!(app.tab, Tab::Expenses);
        assert_eq!(app.expenses.list.len(), 1);
        assert_eq!(app.expenses.list[0].category, Category::Transport);
        assert_eq!(app.expenses.list[0].amount, Decimal::new(1250, 2));
    }
}
