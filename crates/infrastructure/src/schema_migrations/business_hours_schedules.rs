use async_trait::async_trait;
use serde_json::{Map, Value, json};
use sqlx::PgConnection;
use uuid::Uuid;

use systicket_core::{AppError, AppResult};

use super::SchemaMigration;

/// Reshapes `sla_config.business_hours` from one daily window into
/// per-weekday schedules.
pub struct BusinessHoursSchedules;

/// Monday through Friday, used when a config carries no `working_days`.
const DEFAULT_WORKING_DAYS: [i64; 5] = [1, 2, 3, 4, 5];

/// Converts `{timezone, start, end}` plus `working_days` into
/// `{timezone, schedules: [{day_of_week, periods: [{start, end}]}]}`.
///
/// Returns `None` when the config has no single-window business hours.
pub(crate) fn upgrade_sla_config(sla_config: &Value) -> Option<Value> {
    let business_hours = sla_config.get("business_hours")?.as_object()?;
    if business_hours.contains_key("schedules") || !business_hours.contains_key("start") {
        return None;
    }

    let period = json!({
        "start": business_hours.get("start").cloned().unwrap_or(Value::Null),
        "end": business_hours.get("end").cloned().unwrap_or(Value::Null),
    });
    let schedules: Vec<Value> = working_days(sla_config)
        .into_iter()
        .map(|day| json!({"day_of_week": day, "periods": [period.clone()]}))
        .collect();

    let mut reshaped = Map::new();
    if let Some(timezone) = business_hours.get("timezone") {
        reshaped.insert("timezone".to_owned(), timezone.clone());
    }
    reshaped.insert("schedules".to_owned(), Value::Array(schedules));

    let mut upgraded = sla_config.clone();
    upgraded["business_hours"] = Value::Object(reshaped);
    Some(upgraded)
}

/// Collapses schedules back to the first period of the first schedule.
///
/// Returns `None` when the config has no schedules.
pub(crate) fn downgrade_sla_config(sla_config: &Value) -> Option<Value> {
    let business_hours = sla_config.get("business_hours")?.as_object()?;
    let schedules = business_hours.get("schedules")?;
    let first_period = schedules.pointer("/0/periods/0");
    let bound = |key: &str| {
        first_period
            .and_then(|period| period.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    };

    let mut flattened = Map::new();
    if let Some(timezone) = business_hours.get("timezone") {
        flattened.insert("timezone".to_owned(), timezone.clone());
    }
    flattened.insert("start".to_owned(), bound("start"));
    flattened.insert("end".to_owned(), bound("end"));

    let mut downgraded = sla_config.clone();
    downgraded["business_hours"] = Value::Object(flattened);
    Some(downgraded)
}

fn working_days(sla_config: &Value) -> Vec<i64> {
    let Some(days) = sla_config.get("working_days").and_then(Value::as_array) else {
        return DEFAULT_WORKING_DAYS.to_vec();
    };

    days.iter()
        .filter_map(|day| {
            day.as_i64()
                .or_else(|| day.as_str().and_then(|value| value.trim().parse().ok()))
        })
        .collect()
}

async fn rewrite_configs(
    connection: &mut PgConnection,
    transform: fn(&Value) -> Option<Value>,
) -> AppResult<usize> {
    let rows = sqlx::query_as::<_, (Uuid, Value)>(
        r#"
        SELECT id, sla_config
        FROM service_desks
        WHERE sla_config IS NOT NULL
            AND sla_config -> 'business_hours' IS NOT NULL
        FOR UPDATE
        "#,
    )
    .fetch_all(&mut *connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to read service desk sla configs: {error}")))?;

    let mut rewritten = 0;
    for (service_desk_id, sla_config) in rows {
        let Some(updated) = transform(&sla_config) else {
            continue;
        };

        sqlx::query("UPDATE service_desks SET sla_config = $2 WHERE id = $1")
            .bind(service_desk_id)
            .bind(updated)
            .execute(&mut *connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to rewrite sla config of service desk '{service_desk_id}': {error}"
                ))
            })?;
        rewritten += 1;
    }

    Ok(rewritten)
}

#[async_trait]
impl SchemaMigration for BusinessHoursSchedules {
    fn version(&self) -> i64 {
        1_738_360_000_000
    }

    fn name(&self) -> &'static str {
        "business_hours_schedules"
    }

    async fn up(&self, connection: &mut PgConnection) -> AppResult<()> {
        let rewritten = rewrite_configs(connection, upgrade_sla_config).await?;
        tracing::debug!(rewritten, "reshaped business hours into schedules");
        Ok(())
    }

    async fn down(&self, connection: &mut PgConnection) -> AppResult<()> {
        let rewritten = rewrite_configs(connection, downgrade_sla_config).await?;
        tracing::debug!(rewritten, "collapsed business hour schedules");
        Ok(())
    }
}
