use async_trait::async_trait;
use sqlx::PgConnection;

use systicket_core::AppResult;

use super::{SchemaMigration, execute_all};

/// Adds the optional `tickets.queue_id` reference to `queues`.
pub struct AddQueueIdToTickets;

const UP: &[&str] = &[
    "ALTER TABLE tickets ADD COLUMN IF NOT EXISTS queue_id UUID NULL",
    r#"CREATE INDEX IF NOT EXISTS "IDX_TICKETS_QUEUE_ID" ON tickets (queue_id)"#,
    r#"
    DO $$
    BEGIN
        IF NOT EXISTS (
            SELECT 1 FROM pg_constraint WHERE conname = 'FK_TICKETS_QUEUE'
        ) THEN
            ALTER TABLE tickets
                ADD CONSTRAINT "FK_TICKETS_QUEUE"
                FOREIGN KEY (queue_id) REFERENCES queues (id) ON DELETE SET NULL;
        END IF;
    END
    $$
    "#,
];

const DOWN: &[&str] = &[
    r#"ALTER TABLE tickets DROP CONSTRAINT IF EXISTS "FK_TICKETS_QUEUE""#,
    r#"DROP INDEX IF EXISTS "IDX_TICKETS_QUEUE_ID""#,
    "ALTER TABLE tickets DROP COLUMN IF EXISTS queue_id",
];

#[async_trait]
impl SchemaMigration for AddQueueIdToTickets {
    fn version(&self) -> i64 {
        1_738_298_300_000
    }

    fn name(&self) -> &'static str {
        "add_queue_id_to_tickets"
    }

    async fn up(&self, connection: &mut PgConnection) -> AppResult<()> {
        execute_all(connection, UP, "failed to add tickets.queue_id").await
    }

    async fn down(&self, connection: &mut PgConnection) -> AppResult<()> {
        execute_all(connection, DOWN, "failed to drop tickets.queue_id").await
    }
}
