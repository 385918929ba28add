use crate::models::{ApiError, Arrangement, Branch, NewArrangement};
use chrono::Utc;
use ikebana_qubo::{BranchChoice, Role};
use sqlx::{sqlite::SqlitePoolOptions, SqliteConnection, SqlitePool};

pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

pub async fn init_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS arrangements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            artist TEXT NOT NULL,
            comment TEXT NOT NULL DEFAULT '',
            vase_width REAL NOT NULL,
            vase_height REAL NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS branches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            arr_id INTEGER NOT NULL REFERENCES arrangements(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            length REAL,
            azimuth REAL,
            elevation REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_branches_arr_id ON branches(arr_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn insert_branch(
    conn: &mut SqliteConnection,
    arr_id: i64,
    role: Role,
    choice: &BranchChoice,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO branches (arr_id, role, length, azimuth, elevation) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(arr_id)
    .bind(role.as_str())
    .bind(choice.length)
    .bind(choice.azimuth)
    .bind(choice.elevation)
    .execute(conn)
    .await?;
    Ok(())
}

/// Stores the arrangement metadata and its branches in one transaction and
/// returns the new arrangement id.
pub async fn save_arrangement(
    pool: &SqlitePool,
    arrangement: &NewArrangement,
    branches: &[(Role, BranchChoice)],
) -> Result<i64, ApiError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO arrangements (artist, comment, vase_width, vase_height, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&arrangement.artist)
    .bind(&arrangement.comment)
    .bind(arrangement.vase_width)
    .bind(arrangement.vase_height)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;
    let arr_id = result.last_insert_rowid();

    for (role, choice) in branches {
        insert_branch(&mut *tx, arr_id, *role, choice).await?;
    }

    tx.commit().await?;
    Ok(arr_id)
}

/// Appends branches to an existing arrangement.
pub async fn save_branches(
    pool: &SqlitePool,
    arr_id: i64,
    branches: &[(Role, BranchChoice)],
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;
    for (role, choice) in branches {
        insert_branch(&mut *tx, arr_id, *role, choice).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn get_arrangement(pool: &SqlitePool, id: i64) -> Result<Option<Arrangement>, ApiError> {
    let arrangement = sqlx::query_as::<_, Arrangement>("SELECT * FROM arrangements WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(arrangement)
}

pub async fn get_branches(pool: &SqlitePool, arr_id: i64) -> Result<Vec<Branch>, ApiError> {
    let branches =
        sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE arr_id = ? ORDER BY id ASC")
            .bind(arr_id)
            .fetch_all(pool)
            .await?;

    Ok(branches)
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_database(&pool).await.unwrap();
    pool
}
