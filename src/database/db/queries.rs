use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info};

use crate::database::models::{
    checked_money, Category, Expense, ExpenseFilter, FileRecord, NewExpense, NewFile, NewTrip, PersonBudget,
    Profile, RecordKind, TripRecord,
};
use crate::error::{Error, Result};
use crate::summary::{checked_sum, even_split};

/*
Row-level CRUD for the four tables: expenses, person_budgets, files, profiles.
Amounts are TEXT columns; they are parsed back into Decimal here.
 */

const EXPENSE_COLUMNS: &str =
    "expense_id, payer, category, amount, description, occurred_on, created_at";

const FILE_COLUMNS: &str = "file_id, kind, trip_id, trip_name, location, file_name, file_url, \
                            mime_type, storage_key, note, created_at";

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(column)?;
    Decimal::from_str(&text).map_err(|e| {
        sqlx::Error::Decode(format!("Invalid Decimal format for {column}: {e}").into())
    })
}

fn expense_from_row(row: &SqliteRow) -> Result<Expense, sqlx::Error> {
    let category: String = row.try_get("category")?;
    let category = Category::from_str(&category).map_err(|e| sqlx::Error::Decode(e.into()))?;

    Ok(Expense {
        expense_id: row.try_get("expense_id")?,
        payer: row.try_get("payer")?,
        category,
        amount: decimal_column(row, "amount")?,
        description: row.try_get("description")?,
        occurred_on: row.try_get("occurred_on")?,
        created_at: row.try_get("created_at")?,
    })
}

fn trip_from_row(row: &SqliteRow) -> Result<TripRecord, sqlx::Error> {
    Ok(TripRecord {
        trip_id: row.try_get("file_id")?,
        trip_name: row.try_get("trip_name")?,
        location: row.try_get("location")?,
        note: row.try_get("note")?,
        created_at: row.try_get("created_at")?,
    })
}

fn file_from_row(row: &SqliteRow) -> Result<FileRecord, sqlx::Error> {
    Ok(FileRecord {
        file_id: row.try_get("file_id")?,
        trip_id: row.try_get("trip_id")?,
        trip_name: row.try_get("trip_name")?,
        location: row.try_get("location")?,
        file_name: row.try_get("file_name")?,
        url: row.try_get("file_url")?,
        mime_type: row.try_get("mime_type")?,
        note: row.try_get("note")?,
        storage_key: row.try_get("storage_key")?,
        created_at: row.try_get("created_at")?,
    })
}

fn blank_to_none(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/*==========Expense Queries=========== */

// List expenses, newest first
pub async fn list_expenses(pool: &Pool<Sqlite>, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
    let category = filter.category.map(|c| c.as_str());

    let rows = sqlx::query(&format!(
        r#"
        SELECT {EXPENSE_COLUMNS}
        FROM expenses
        WHERE (? IS NULL OR payer = ?)
          AND (? IS NULL OR category = ?)
          AND (? IS NULL OR occurred_on >= ?)
          AND (? IS NULL OR occurred_on <= ?)
        ORDER BY occurred_on DESC, expense_id DESC
        "#
    ))
    .bind(filter.payer.as_deref())
    .bind(filter.payer.as_deref())
    .bind(category)
    .bind(category)
    .bind(filter.from)
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.to)
    .fetch_all(pool)
    .await?;

    let expenses = rows
        .iter()
        .map(expense_from_row)
        .collect::<Result<Vec<_>, sqlx::Error>>()?;
    debug!("Fetched {} expenses", expenses.len());
    Ok(expenses)
}

// Get expense by id
pub async fn get_expense(pool: &Pool<Sqlite>, expense_id: i64) -> Result<Expense> {
    let row = sqlx::query(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE expense_id = ?"
    ))
    .bind(expense_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found(format!("Expense {expense_id}")))?;

    Ok(expense_from_row(&row)?)
}

// Create expense
pub async fn create_expense(pool: &Pool<Sqlite>, new: NewExpense) -> Result<Expense> {
    let new = new.validate()?;

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO expenses (payer, category, amount, description, occurred_on)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {EXPENSE_COLUMNS}
        "#
    ))
    .bind(&new.payer)
    .bind(new.category.as_str())
    .bind(new.amount.to_string())
    .bind(new.description.as_deref())
    .bind(new.occurred_on)
    .fetch_one(pool)
    .await?;

    let expense = expense_from_row(&row)?;
    info!(
        "Expense {} created: {} paid {} for {}",
        expense.expense_id, expense.payer, expense.amount, expense.category
    );
    Ok(expense)
}

// Update expense, replacing every editable field
pub async fn update_expense(
    pool: &Pool<Sqlite>,
    expense_id: i64,
    update: NewExpense,
) -> Result<Expense> {
    let update = update.validate()?;

    let row = sqlx::query(&format!(
        r#"
        UPDATE expenses
        SET payer = ?, category = ?, amount = ?, description = ?, occurred_on = ?
        WHERE expense_id = ?
        RETURNING {EXPENSE_COLUMNS}
        "#
    ))
    .bind(&update.payer)
    .bind(update.category.as_str())
    .bind(update.amount.to_string())
    .bind(update.description.as_deref())
    .bind(update.occurred_on)
    .bind(expense_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found(format!("Expense {expense_id}")))?;

    info!("Expense {expense_id} updated");
    Ok(expense_from_row(&row)?)
}

// Delete expense
pub async fn delete_expense(pool: &Pool<Sqlite>, expense_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM expenses WHERE expense_id = ?")
        .bind(expense_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("Expense {expense_id}")));
    }
    info!("Expense {expense_id} deleted");
    Ok(())
}

pub async fn distinct_payers(pool: &Pool<Sqlite>) -> Result<Vec<String>> {
    let payers = sqlx::query_scalar("SELECT DISTINCT payer FROM expenses ORDER BY payer ASC")
        .fetch_all(pool)
        .await?;
    Ok(payers)
}

/*==========Budget Queries=========== */

pub async fn list_person_budgets(pool: &Pool<Sqlite>) -> Result<Vec<PersonBudget>> {
    sqlx::query("SELECT payer, budget FROM person_budgets ORDER BY payer ASC")
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| -> Result<PersonBudget> {
            Ok(PersonBudget {
                payer: row.try_get("payer")?,
                budget: decimal_column(row, "budget")?,
            })
        })
        .collect()
}

/* Creates a budget for every payer that does not have one yet.
The default ceiling is an even split of the total spend at this moment;
budgets that already exist are left alone. */
pub async fn ensure_person_budgets(pool: &Pool<Sqlite>) -> Result<Vec<PersonBudget>> {
    let mut tx = pool.begin().await?;

    let payers: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT payer FROM expenses ORDER BY payer ASC")
            .fetch_all(&mut *tx)
            .await?;

    let amounts: Vec<String> = sqlx::query_scalar("SELECT amount FROM expenses")
        .fetch_all(&mut *tx)
        .await?;
    let amounts = amounts
        .iter()
        .map(|a| Decimal::from_str(a))
        .collect::<Result<Vec<Decimal>, _>>()
        .map_err(|e| sqlx::Error::Decode(format!("Invalid Decimal format for amount: {e}").into()))?;
    let total = checked_sum(amounts)?;

    let share = even_split(total, payers.len());
    let mut created = 0;
    for payer in &payers {
        let result = sqlx::query("INSERT OR IGNORE INTO person_budgets (payer, budget) VALUES (?, ?)")
            .bind(payer)
            .bind(share.to_string())
            .execute(&mut *tx)
            .await?;
        created += result.rows_affected();
    }

    tx.commit().await?;

    if created > 0 {
        info!("Created {created} default budgets of {share}");
    }
    list_person_budgets(pool).await
}

// Set (or create) a payer's ceiling
pub async fn set_person_budget(
    pool: &Pool<Sqlite>,
    payer: &str,
    budget: Decimal,
) -> Result<PersonBudget> {
    let payer = payer.trim();
    if payer.is_empty() {
        return Err(Error::validation("Payer is required"));
    }
    let budget = checked_money("Budget", budget)?;

    sqlx::query(
        r#"
        INSERT INTO person_budgets (payer, budget)
        VALUES (?, ?)
        ON CONFLICT (payer) DO UPDATE SET budget = excluded.budget
        "#,
    )
    .bind(payer)
    .bind(budget.to_string())
    .execute(pool)
    .await?;

    info!("Budget for {payer} set to {budget}");
    Ok(PersonBudget {
        payer: payer.to_string(),
        budget,
    })
}

pub async fn delete_person_budget(pool: &Pool<Sqlite>, payer: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM person_budgets WHERE payer = ?")
        .bind(payer)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("Budget for {payer}")));
    }
    Ok(())
}

/*==========Trip & File Queries=========== */

// Create a trip marker row
pub async fn create_trip(pool: &Pool<Sqlite>, new: NewTrip) -> Result<TripRecord> {
    let trip_name = new.trip_name.trim();
    if trip_name.is_empty() {
        return Err(Error::validation("Trip name is required"));
    }

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO files (kind, trip_name, location, note)
        VALUES (?, ?, ?, ?)
        RETURNING {FILE_COLUMNS}
        "#
    ))
    .bind(RecordKind::Trip.as_str())
    .bind(trip_name)
    .bind(blank_to_none(new.location))
    .bind(blank_to_none(new.note))
    .fetch_one(pool)
    .await?;

    let trip = trip_from_row(&row)?;
    info!("Trip {} '{}' created", trip.trip_id, trip.trip_name);
    Ok(trip)
}

pub async fn list_trips(pool: &Pool<Sqlite>) -> Result<Vec<TripRecord>> {
    sqlx::query(&format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE kind = ? ORDER BY created_at DESC, file_id DESC"
    ))
    .bind(RecordKind::Trip.as_str())
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| trip_from_row(row).map_err(Error::from))
    .collect()
}

pub async fn get_trip(pool: &Pool<Sqlite>, trip_id: i64) -> Result<TripRecord> {
    let row = sqlx::query(&format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE file_id = ? AND kind = ?"
    ))
    .bind(trip_id)
    .bind(RecordKind::Trip.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found(format!("Trip {trip_id}")))?;

    Ok(trip_from_row(&row)?)
}

/* Deletes the trip marker and all of its file rows in one transaction.
Returns the storage keys of the removed files so the caller can drop the objects. */
pub async fn delete_trip(pool: &Pool<Sqlite>, trip_id: i64) -> Result<Vec<String>> {
    let mut tx = pool.begin().await?;

    let keys: Vec<String> = sqlx::query_scalar(
        "SELECT storage_key FROM files WHERE trip_id = ? AND kind = ? AND storage_key IS NOT NULL",
    )
    .bind(trip_id)
    .bind(RecordKind::File.as_str())
    .fetch_all(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM files WHERE trip_id = ? AND kind = ?")
        .bind(trip_id)
        .bind(RecordKind::File.as_str())
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM files WHERE file_id = ? AND kind = ?")
        .bind(trip_id)
        .bind(RecordKind::Trip.as_str())
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        // dropping tx rolls back
        return Err(Error::not_found(format!("Trip {trip_id}")));
    }

    tx.commit().await?;
    info!("Trip {trip_id} deleted with {} files", keys.len());
    Ok(keys)
}

// Record an uploaded file under its trip
pub async fn insert_file(pool: &Pool<Sqlite>, new: NewFile) -> Result<FileRecord> {
    let trip = get_trip(pool, new.trip_id).await?;
    if new.file_name.trim().is_empty() {
        return Err(Error::validation("File name is required"));
    }

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO files (kind, trip_id, trip_name, location, file_name, file_url, mime_type, storage_key, note)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {FILE_COLUMNS}
        "#
    ))
    .bind(RecordKind::File.as_str())
    .bind(trip.trip_id)
    .bind(&trip.trip_name)
    .bind(trip.location.as_deref())
    .bind(new.file_name.trim())
    .bind(&new.url)
    .bind(&new.mime_type)
    .bind(&new.storage_key)
    .bind(blank_to_none(new.note))
    .fetch_one(pool)
    .await?;

    let file = file_from_row(&row)?;
    info!("File {} '{}' attached to trip {}", file.file_id, file.file_name, trip.trip_id);
    Ok(file)
}

pub async fn list_files(pool: &Pool<Sqlite>, trip_id: i64) -> Result<Vec<FileRecord>> {
    sqlx::query(&format!(
        r#"
        SELECT {FILE_COLUMNS}
        FROM files
        WHERE kind = ? AND trip_id = ?
        ORDER BY created_at DESC, file_id DESC
        "#
    ))
    .bind(RecordKind::File.as_str())
    .bind(trip_id)
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| file_from_row(row).map_err(Error::from))
    .collect()
}

pub async fn get_file(pool: &Pool<Sqlite>, file_id: i64) -> Result<FileRecord> {
    let row = sqlx::query(&format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE file_id = ? AND kind = ?"
    ))
    .bind(file_id)
    .bind(RecordKind::File.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found(format!("File {file_id}")))?;

    Ok(file_from_row(&row)?)
}

pub async fn update_file_note(
    pool: &Pool<Sqlite>,
    file_id: i64,
    note: Option<String>,
) -> Result<FileRecord> {
    let result = sqlx::query("UPDATE files SET note = ? WHERE file_id = ? AND kind = ?")
        .bind(blank_to_none(note))
        .bind(file_id)
        .bind(RecordKind::File.as_str())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("File {file_id}")));
    }
    get_file(pool, file_id).await
}

// Delete a file row; returns it so the caller can remove the stored object
pub async fn delete_file(pool: &Pool<Sqlite>, file_id: i64) -> Result<FileRecord> {
    let file = get_file(pool, file_id).await?;

    sqlx::query("DELETE FROM files WHERE file_id = ? AND kind = ?")
        .bind(file_id)
        .bind(RecordKind::File.as_str())
        .execute(pool)
        .await?;

    info!("File {file_id} deleted");
    Ok(file)
}

/*==========Profile Queries=========== */

pub async fn list_profiles(pool: &Pool<Sqlite>) -> Result<Vec<Profile>> {
    sqlx::query("SELECT profile_id, display_name, created_at FROM profiles ORDER BY display_name ASC")
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| -> Result<Profile> {
            Ok(Profile {
                profile_id: row.try_get("profile_id")?,
                display_name: row.try_get("display_name")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

pub async fn create_profile(pool: &Pool<Sqlite>, display_name: &str) -> Result<Profile> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(Error::validation("Display name is required"));
    }

    let row = sqlx::query(
        r#"
        INSERT INTO profiles (display_name)
        VALUES (?)
        RETURNING profile_id, display_name, created_at
        "#,
    )
    .bind(display_name)
    .fetch_one(pool)
    .await?;

    Ok(Profile {
        profile_id: row.try_get("profile_id")?,
        display_name: row.try_get("display_name")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn delete_profile(pool: &Pool<Sqlite>, profile_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM profiles WHERE profile_id = ?")
        .bind(profile_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("Profile {profile_id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::{connection, migrate};
    use chrono::NaiveDate;

    async fn pool() -> Pool<Sqlite> {
        let pool = connection::connect("sqlite::memory:", 1).await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        pool
    }

    fn expense(payer: &str, category: Category, amount: &str, day: u32) -> NewExpense {
        NewExpense {
            payer: payer.into(),
            category,
            amount: Decimal::from_str(amount).unwrap(),
            description: None,
            occurred_on: NaiveDate::from_ymd_opt(2024, 7, day).unwrap(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn expense_crud_round() {
        let pool = pool().await;

        let created = create_expense(&pool, expense("Ana", Category::Food, "12.50", 2))
            .await
            .unwrap();
        assert!(created.expense_id > 0);
        assert_eq!(created.amount, dec("12.50"));

        let fetched = get_expense(&pool, created.expense_id).await.unwrap();
        assert_eq!(fetched, created);

        let mut change = expense("Ana", Category::Transport, "20", 3);
        change.description = Some("Taxi".into());
        let updated = update_expense(&pool, created.expense_id, change).await.unwrap();
        assert_eq!(updated.category, Category::Transport);
        assert_eq!(updated.description.as_deref(), Some("Taxi"));

        delete_expense(&pool, created.expense_id).await.unwrap();
        assert!(matches!(
            get_expense(&pool, created.expense_id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            delete_expense(&pool, created.expense_id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn negative_amount_never_reaches_the_table() {
        let pool = pool().await;
        let err = create_expense(&pool, expense("Ana", Category::Food, "-1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(list_expenses(&pool, &ExpenseFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let pool = pool().await;
        create_expense(&pool, expense("Ana", Category::Food, "10", 1)).await.unwrap();
        create_expense(&pool, expense("Ben", Category::Food, "20", 3)).await.unwrap();
        create_expense(&pool, expense("Ana", Category::Lodging, "90", 2)).await.unwrap();

        let all = list_expenses(&pool, &ExpenseFilter::default()).await.unwrap();
        let days: Vec<u32> = all.iter().map(|e| chrono::Datelike::day(&e.occurred_on)).collect();
        assert_eq!(days, vec![3, 2, 1]);

        let ana = ExpenseFilter {
            payer: Some("Ana".into()),
            ..Default::default()
        };
        assert_eq!(list_expenses(&pool, &ana).await.unwrap().len(), 2);

        let food_from_2nd = ExpenseFilter {
            category: Some(Category::Food),
            from: NaiveDate::from_ymd_opt(2024, 7, 2),
            ..Default::default()
        };
        let rows = list_expenses(&pool, &food_from_2nd).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].payer, "Ben");
    }

    #[tokio::test]
    async fn lazy_budgets_default_to_even_split_and_keep_existing() {
        let pool = pool().await;
        create_expense(&pool, expense("Ana", Category::Food, "30", 1)).await.unwrap();
        create_expense(&pool, expense("Ben", Category::Food, "60", 1)).await.unwrap();

        let budgets = ensure_person_budgets(&pool).await.unwrap();
        assert_eq!(budgets.len(), 2);
        assert!(budgets.iter().all(|b| b.budget == dec("45")));

        set_person_budget(&pool, "Ana", dec("100")).await.unwrap();
        create_expense(&pool, expense("Cy", Category::Other, "90", 2)).await.unwrap();

        let budgets = ensure_person_budgets(&pool).await.unwrap();
        let get = |name: &str| budgets.iter().find(|b| b.payer == name).unwrap().budget;
        assert_eq!(get("Ana"), dec("100"));
        assert_eq!(get("Ben"), dec("45"));
        assert_eq!(get("Cy"), dec("60"));
    }

    #[tokio::test]
    async fn budget_rejects_negative_and_deletes() {
        let pool = pool().await;
        assert!(set_person_budget(&pool, "Ana", dec("-5")).await.is_err());
        assert!(set_person_budget(&pool, "Ana", dec("1000000000.01")).await.is_err());
        set_person_budget(&pool, "Ana", dec("5")).await.unwrap();
        delete_person_budget(&pool, "Ana").await.unwrap();
        assert!(list_person_budgets(&pool).await.unwrap().is_empty());
        assert!(delete_person_budget(&pool, "Ana").await.is_err());
    }

    #[tokio::test]
    async fn deleting_a_trip_removes_its_files() {
        let pool = pool().await;
        let trip = create_trip(
            &pool,
            NewTrip {
                trip_name: "Lisbon".into(),
                location: Some("Portugal".into()),
                note: None,
            },
        )
        .await
        .unwrap();
        let other = create_trip(
            &pool,
            NewTrip {
                trip_name: "Porto".into(),
                location: None,
                note: None,
            },
        )
        .await
        .unwrap();

        for (trip_id, key) in [(trip.trip_id, "a"), (trip.trip_id, "b"), (other.trip_id, "c")] {
            insert_file(
                &pool,
                NewFile {
                    trip_id,
                    file_name: format!("{key}.pdf"),
                    url: format!("http://x/{key}"),
                    mime_type: "application/pdf".into(),
                    storage_key: key.into(),
                    note: None,
                },
            )
            .await
            .unwrap();
        }

        let files = list_files(&pool, trip.trip_id).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].location.as_deref(), Some("Portugal"));

        let mut keys = delete_trip(&pool, trip.trip_id).await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert!(list_files(&pool, trip.trip_id).await.unwrap().is_empty());
        assert_eq!(list_files(&pool, other.trip_id).await.unwrap().len(), 1);
        assert_eq!(list_trips(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn trip_names_are_unique_and_required() {
        let pool = pool().await;
        let new = |name: &str| NewTrip {
            trip_name: name.into(),
            location: None,
            note: None,
        };
        create_trip(&pool, new("Rome")).await.unwrap();
        assert!(matches!(create_trip(&pool, new("Rome")).await, Err(Error::Database(_))));
        assert!(matches!(create_trip(&pool, new("  ")).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn file_note_updates_and_files_need_a_trip() {
        let pool = pool().await;
        let missing = insert_file(
            &pool,
            NewFile {
                trip_id: 99,
                file_name: "r.png".into(),
                url: "u".into(),
                mime_type: "image/png".into(),
                storage_key: "k".into(),
                note: None,
            },
        )
        .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));

        let trip = create_trip(
            &pool,
            NewTrip {
                trip_name: "Oslo".into(),
                location: None,
                note: None,
            },
        )
        .await
        .unwrap();
        let file = insert_file(
            &pool,
            NewFile {
                trip_id: trip.trip_id,
                file_name: "r.png".into(),
                url: "u".into(),
                mime_type: "image/png".into(),
                storage_key: "k".into(),
                note: None,
            },
        )
        .await
        .unwrap();

        let noted = update_file_note(&pool, file.file_id, Some("dinner".into())).await.unwrap();
        assert_eq!(noted.note.as_deref(), Some("dinner"));

        // a trip id is not a file id
        assert!(get_file(&pool, trip.trip_id).await.is_err());

        let removed = delete_file(&pool, file.file_id).await.unwrap();
        assert_eq!(removed.storage_key, "k");
    }

    #[tokio::test]
    async fn profiles_are_unique_members() {
        let pool = pool().await;
        let ana = create_profile(&pool, " Ana ").await.unwrap();
        assert_eq!(ana.display_name, "Ana");
        assert!(create_profile(&pool, "Ana").await.is_err());
        assert!(create_profile(&pool, "").await.is_err());

        create_profile(&pool, "Ben").await.unwrap();
        assert_eq!(list_profiles(&pool).await.unwrap().len(), 2);

        delete_profile(&pool, ana.profile_id).await.unwrap();
        assert_eq!(list_profiles(&pool).await.unwrap().len(), 1);
    }
}
