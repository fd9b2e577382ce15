use std::str::FromStr;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::{
    Category, Expense, ExpenseFilter, FileRecord, NewExpense, NewFile, NewTrip, PersonBudget,
    Profile, Settings, TripRecord,
};
use crate::error::{Error, Result};
use crate::export;
use crate::summary::{budget_report, BudgetLine, Summary};

/// Filter as it arrives in a query string; blank values mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseQuery {
    pub payer: Option<String>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_day(field: &str, value: Option<String>) -> Result<Option<NaiveDate>> {
    non_blank(value)
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|_| Error::validation(format!("{field} must be YYYY-MM-DD")))
        })
        .transpose()
}

impl ExpenseQuery {
    pub fn into_filter(self) -> Result<ExpenseFilter> {
        let category = non_blank(self.category)
            .map(|c| Category::from_str(&c).map_err(Error::Validation))
            .transpose()?;
        let filter = ExpenseFilter {
            payer: non_blank(self.payer),
            category,
            from: parse_day("from", self.from)?,
            to: parse_day("to", self.to)?,
        };
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(Error::validation("from must not be after to"));
            }
        }
        Ok(filter)
    }
}

/* ========== Expenses ========== */

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>> {
    let filter = query.into_filter()?;
    Ok(Json(queries::list_expenses(&state.db, &filter).await?))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<NewExpense>,
) -> Result<impl IntoResponse> {
    let expense = queries::create_expense(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>> {
    Ok(Json(queries::get_expense(&state.db, id).await?))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<NewExpense>,
) -> Result<Json<Expense>> {
    Ok(Json(queries::update_expense(&state.db, id, payload).await?))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    queries::delete_expense(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ========== Summary & budgets ========== */

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: Summary,
    pub per_person: Decimal,
    pub budgets: Vec<BudgetLine>,
}

pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<SummaryResponse>> {
    let filter = query.into_filter()?;
    let expenses = queries::list_expenses(&state.db, &filter).await?;
    let budgets = queries::ensure_person_budgets(&state.db).await?;

    let summary = Summary::from_expenses(&expenses)?;
    let budgets = budget_report(&summary, &budgets)?;
    Ok(Json(SummaryResponse {
        per_person: summary.per_person(),
        summary,
        budgets,
    }))
}

pub async fn list_budgets(State(state): State<AppState>) -> Result<Json<Vec<PersonBudget>>> {
    Ok(Json(queries::ensure_person_budgets(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct BudgetBody {
    pub budget: Decimal,
}

pub async fn set_budget(
    State(state): State<AppState>,
    Path(payer): Path<String>,
    Json(body): Json<BudgetBody>,
) -> Result<Json<PersonBudget>> {
    Ok(Json(queries::set_person_budget(&state.db, &payer, body.budget).await?))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    Path(payer): Path<String>,
) -> Result<StatusCode> {
    queries::delete_person_budget(&state.db, &payer).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ========== Trips & files ========== */

pub async fn list_trips(State(state): State<AppState>) -> Result<Json<Vec<TripRecord>>> {
    Ok(Json(queries::list_trips(&state.db).await?))
}

pub async fn create_trip(
    State(state): State<AppState>,
    Json(payload): Json<NewTrip>,
) -> Result<impl IntoResponse> {
    let trip = queries::create_trip(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

pub async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TripRecord>> {
    Ok(Json(queries::get_trip(&state.db, id).await?))
}

pub async fn delete_trip(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let keys = queries::delete_trip(&state.db, id).await?;
    state.store.delete_all(&keys).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_files(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
) -> Result<Json<Vec<FileRecord>>> {
    queries::get_trip(&state.db, trip_id).await?;
    Ok(Json(queries::list_files(&state.db, trip_id).await?))
}

fn multipart_error(e: MultipartError, limit: usize) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { limit }
    } else {
        Error::validation(e.body_text())
    }
}

/// Multipart form with a `file` part and an optional `note` part.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    queries::get_trip(&state.db, trip_id).await?;
    let limit = state.store.max_upload_bytes();

    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut note: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                upload = Some((file_name, bytes.to_vec()));
            }
            Some("note") => {
                note = Some(field.text().await.map_err(|e| multipart_error(e, limit))?);
            }
            other => warn!("Ignoring multipart field {other:?}"),
        }
    }

    let (file_name, bytes) = upload.ok_or_else(|| Error::validation("Missing 'file' part"))?;
    let stored = state.store.put(trip_id, &file_name, &bytes).await?;

    let record = queries::insert_file(
        &state.db,
        NewFile {
            trip_id,
            file_name: crate::storage::sanitize_file_name(&file_name),
            url: stored.url,
            mime_type: stored.mime_type,
            storage_key: stored.key.clone(),
            note,
        },
    )
    .await;

    match record {
        Ok(file) => Ok((StatusCode::CREATED, Json(file))),
        Err(e) => {
            // keep the store free of objects nothing points to
            if let Err(cleanup) = state.store.delete(&stored.key).await {
                warn!("Could not remove object {} after a failed insert: {cleanup}", stored.key);
            }
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NoteBody {
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn update_file_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NoteBody>,
) -> Result<Json<FileRecord>> {
    Ok(Json(queries::update_file_note(&state.db, id, body.note).await?))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let file = queries::delete_file(&state.db, id).await?;
    state.store.delete(&file.storage_key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ========== Profiles ========== */

pub async fn list_profiles(State(state): State<AppState>) -> Result<Json<Vec<Profile>>> {
    Ok(Json(queries::list_profiles(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct NewProfile {
    pub display_name: String,
}

pub async fn create_profile(
    State(state): State<AppState>,
    Json(body): Json<NewProfile>,
) -> Result<impl IntoResponse> {
    let profile = queries::create_profile(&state.db, &body.display_name).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    queries::delete_profile(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ========== Settings ========== */

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>> {
    Ok(Json(Settings::load(&state.config.settings_path).await?))
}

pub async fn save_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>> {
    let settings = settings.validate()?;
    settings.save(&state.config.settings_path).await?;
    Ok(Json(settings))
}

/* ========== Export ========== */

pub async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ExpenseQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.into_filter()?;
    let expenses = queries::list_expenses(&state.db, &filter).await?;
    let settings = Settings::load(&state.config.settings_path).await?;

    let bytes = tokio::task::spawn_blocking(move || {
        export::render_expense_report(&expenses, &filter, &settings)
    })
    .await
    .map_err(|e| Error::Export(e.to_string()))??;

    info!("Exported {} bytes of PDF", bytes.len());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"expenses.pdf\""),
        ],
        bytes,
    ))
}
