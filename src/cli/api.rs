use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

use crate::config::Config;
use crate::database::db::queries;
use crate::database::models::{
    Expense, ExpenseFilter, FileRecord, NewExpense, NewFile, NewTrip, PersonBudget, Profile,
    Settings, TripRecord,
};
use crate::export;
use crate::storage::{sanitize_file_name, ObjectStore};
use crate::summary::{budget_report, BudgetLine, Summary};

/// Everything a view needs from the store. Each call goes straight to the
/// database; views refetch after every mutation.
#[derive(Clone)]
pub struct Client {
    pool: Pool<Sqlite>,
    store: ObjectStore,
    settings_path: PathBuf,
}

impl Client {
    pub fn new(pool: Pool<Sqlite>, config: &Config) -> Self {
        Self {
            pool,
            store: ObjectStore::new(
                &config.upload_dir,
                &config.public_base_url,
                config.max_upload_bytes,
            ),
            settings_path: config.settings_path.clone(),
        }
    }

    // ============= Expenses =============

    pub async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        Ok(queries::list_expenses(&self.pool, filter).await?)
    }

    pub async fn create_expense(&self, new: NewExpense) -> Result<Expense> {
        Ok(queries::create_expense(&self.pool, new).await?)
    }

    pub async fn update_expense(&self, id: i64, update: NewExpense) -> Result<Expense> {
        Ok(queries::update_expense(&self.pool, id, update).await?)
    }

    pub async fn delete_expense(&self, id: i64) -> Result<()> {
        Ok(queries::delete_expense(&self.pool, id).await?)
    }

    pub async fn payers(&self) -> Result<Vec<String>> {
        Ok(queries::distinct_payers(&self.pool).await?)
    }

    // ============= Summary & budgets =============

    /// Summary of the filtered expenses plus the budget table. Creates the
    /// default budgets of new payers on the way.
    pub async fn summary(&self, filter: &ExpenseFilter) -> Result<(Summary, Vec<BudgetLine>)> {
        let expenses = queries::list_expenses(&self.pool, filter).await?;
        let budgets = queries::ensure_person_budgets(&self.pool).await?;
        let summary = Summary::from_expenses(&expenses)?;
        let lines = budget_report(&summary, &budgets)?;
        Ok((summary, lines))
    }

    pub async fn set_budget(&self, payer: &str, budget: Decimal) -> Result<PersonBudget> {
        Ok(queries::set_person_budget(&self.pool, payer, budget).await?)
    }

    // ============= Trips & files =============

    pub async fn list_trips(&self) -> Result<Vec<TripRecord>> {
        Ok(queries::list_trips(&self.pool).await?)
    }

    pub async fn create_trip(&self, new: NewTrip) -> Result<TripRecord> {
        Ok(queries::create_trip(&self.pool, new).await?)
    }

    pub async fn delete_trip(&self, trip_id: i64) -> Result<()> {
        let keys = queries::delete_trip(&self.pool, trip_id).await?;
        self.store.delete_all(&keys).await?;
        Ok(())
    }

    pub async fn list_files(&self, trip_id: i64) -> Result<Vec<FileRecord>> {
        Ok(queries::list_files(&self.pool, trip_id).await?)
    }

    /// Copies a local file into the object store and records it under the trip.
    pub async fn attach_file(
        &self,
        trip_id: i64,
        local_path: &Path,
        note: Option<String>,
    ) -> Result<FileRecord> {
        let bytes = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("Cannot read {}", local_path.display()))?;
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let stored = self.store.put(trip_id, &file_name, &bytes).await?;
        let record = queries::insert_file(
            &self.pool,
            NewFile {
                trip_id,
                file_name: sanitize_file_name(&file_name),
                url: stored.url,
                mime_type: stored.mime_type,
                storage_key: stored.key.clone(),
                note,
            },
        )
        .await;

        match record {
            Ok(file) => Ok(file),
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&stored.key).await {
                    warn!("Could not remove object {} after a failed insert: {cleanup}", stored.key);
                }
                Err(e.into())
            }
        }
    }

    pub async fn delete_file(&self, file_id: i64) -> Result<()> {
        let file = queries::delete_file(&self.pool, file_id).await?;
        self.store.delete(&file.storage_key).await?;
        Ok(())
    }

    // ============= Profiles & settings =============

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        Ok(queries::list_profiles(&self.pool).await?)
    }

    pub async fn create_profile(&self, name: &str) -> Result<Profile> {
        Ok(queries::create_profile(&self.pool, name).await?)
    }

    pub async fn delete_profile(&self, id: i64) -> Result<()> {
        Ok(queries::delete_profile(&self.pool, id).await?)
    }

    pub async fn load_settings(&self) -> Result<Settings> {
        Ok(Settings::load(&self.settings_path).await?)
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        Ok(settings.save(&self.settings_path).await?)
    }

    // ============= Export =============

    /// Writes the filtered expenses to `out` as PDF and returns the row count.
    pub async fn export_pdf(&self, filter: &ExpenseFilter, out: &Path) -> Result<usize> {
        let expenses = self.list_expenses(filter).await?;
        let settings = self.load_settings().await?;
        let count = expenses.len();

        let filter = filter.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            export::render_expense_report(&expenses, &filter, &settings)
        })
        .await??;

        tokio::fs::write(out, bytes)
            .await
            .with_context(|| format!("Cannot write {}", out.display()))?;
        info!("Exported {count} expenses to {}", out.display());
        Ok(count)
    }
}
