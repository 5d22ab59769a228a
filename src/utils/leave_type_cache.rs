use crate::model::leave_type::LeaveUnit;
use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// Leave types are read on every ledger operation and change rarely, so
/// lookups go through an in-memory cache keyed by id.
#[derive(Debug, Clone)]
pub struct CachedLeaveType {
    pub id: u64,
    pub name: String,
    pub unit: LeaveUnit,
    pub is_active: bool,
}

static LEAVE_TYPE_CACHE: Lazy<Cache<u64, CachedLeaveType>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

fn from_row(id: u64, name: String, unit: String, is_active: bool) -> CachedLeaveType {
    CachedLeaveType {
        id,
        name,
        unit: unit.parse().unwrap_or(LeaveUnit::Days),
        is_active,
    }
}

/// Put a freshly created/updated leave type into the cache.
pub async fn store(lt: CachedLeaveType) {
    LEAVE_TYPE_CACHE.insert(lt.id, lt).await;
}

/// Cache-aside lookup with a database fallback.
pub async fn get(pool: &MySqlPool, id: u64) -> Result<Option<CachedLeaveType>, sqlx::Error> {
    if let Some(hit) = LEAVE_TYPE_CACHE.get(&id).await {
        return Ok(Some(hit));
    }

    let row = sqlx::query_as::<_, (u64, String, String, bool)>(
        "SELECT id, name, unit, is_active FROM leave_types WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((id, name, unit, is_active)) => {
            let lt = from_row(id, name, unit, is_active);
            LEAVE_TYPE_CACHE.insert(id, lt.clone()).await;
            Ok(Some(lt))
        }
        None => Ok(None),
    }
}

/// Load every leave type into the in-memory cache (streamed)
pub async fn warmup_leave_type_cache(pool: &MySqlPool) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (u64, String, String, bool)>(
        "SELECT id, name, unit, is_active FROM leave_types",
    )
    .fetch(pool);

    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (id, name, unit, is_active) = row?;
        LEAVE_TYPE_CACHE
            .insert(id, from_row(id, name, unit, is_active))
            .await;
        total_count += 1;
    }

    log::info!("Leave type cache warmup complete: {} types", total_count);

    Ok(())
}
