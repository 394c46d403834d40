use async_trait::async_trait;
use sqlx::PgConnection;

use systicket_core::AppResult;

use super::{SchemaMigration, execute_all};

/// Adds the nullable company profile columns to `service_desks`.
pub struct AddCompanyInfoToServiceDesks;

/// Column name and SQL type, in creation order.
const COMPANY_COLUMNS: [(&str, &str); 7] = [
    ("company_trade_name", "VARCHAR(255)"),
    ("company_cnpj", "VARCHAR(18)"),
    ("company_legal_name", "VARCHAR(255)"),
    ("company_address", "TEXT"),
    ("company_phone", "VARCHAR(20)"),
    ("company_email", "VARCHAR(255)"),
    ("company_website", "VARCHAR(255)"),
];

fn up_statements() -> Vec<String> {
    COMPANY_COLUMNS
        .iter()
        .map(|(column, sql_type)| {
            format!("ALTER TABLE service_desks ADD COLUMN IF NOT EXISTS {column} {sql_type} NULL")
        })
        .collect()
}

fn down_statements() -> Vec<String> {
    COMPANY_COLUMNS
        .iter()
        .rev()
        .map(|(column, _)| format!("ALTER TABLE service_desks DROP COLUMN IF EXISTS {column}"))
        .collect()
}

#[async_trait]
impl SchemaMigration for AddCompanyInfoToServiceDesks {
    fn version(&self) -> i64 {
        1_738_350_000_000
    }

    fn name(&self) -> &'static str {
        "add_company_info_to_service_desks"
    }

    async fn up(&self, connection: &mut PgConnection) -> AppResult<()> {
        let statements = up_statements();
        let statements: Vec<&str> = statements.iter().map(String::as_str).collect();
        execute_all(connection, &statements, "failed to add service desk company columns").await
    }

    async fn down(&self, connection: &mut PgConnection) -> AppResult<()> {
        let statements = down_statements();
        let statements: Vec<&str> = statements.iter().map(String::as_str).collect();
        execute_all(connection, &statements, "failed to drop service desk company columns").await
    }
}
