use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

const CREATE_COUNTERS: &str = r#"
CREATE TABLE IF NOT EXISTS counters (
    name VARCHAR(64) NOT NULL PRIMARY KEY,
    seq BIGINT UNSIGNED NOT NULL
)
"#;

// Binary collation keeps `=` filters and ORDER BY byte-exact; search lowercases explicitly.
const CREATE_EMPLOYEES: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    handle CHAR(36) NOT NULL PRIMARY KEY,
    id BIGINT UNSIGNED NOT NULL,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(100) NOT NULL,
    department VARCHAR(50) NOT NULL,
    designation VARCHAR(50) NOT NULL,
    salary DOUBLE NOT NULL,
    joining_date DATE NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'Active',
    created_at DATETIME(3) NOT NULL,
    updated_at DATETIME(3) NOT NULL,
    UNIQUE KEY uq_employees_id (id),
    UNIQUE KEY uq_employees_email (email),
    KEY idx_employees_department (department),
    KEY idx_employees_designation (designation),
    KEY idx_employees_created_at (created_at)
) DEFAULT CHARSET = utf8mb4 COLLATE = utf8mb4_bin
"#;

/// Creates the tables on first start; existing tables are left alone.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for statement in [CREATE_COUNTERS, CREATE_EMPLOYEES] {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}
