use crate::DbError;
use analytics::{Predicate, RecordFilter, StoreError, TradeStore};
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{McapCategory, TradeRecord};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, QueryBuilder, Row};

const SELECT_RECORDS: &str = "SELECT symbol, company, sector, mcap_category, cooldown_setting, \
     holding_weeks, breakout_date, duration, return_percentage FROM trade_records";

const INSERT_RECORDS: &str = "INSERT INTO trade_records (symbol, company, sector, mcap_category, \
     cooldown_setting, holding_weeks, breakout_date, duration, return_percentage) ";

/// The `DbRepository` is the Postgres-backed record store. It encapsulates all SQL
/// touching the `trade_records` table.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// A row of the `trade_records` table, in column types.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbTradeRecord {
    pub symbol: String,
    pub company: Option<String>,
    pub sector: String,
    pub mcap_category: Option<String>,
    pub cooldown_setting: i32,
    pub holding_weeks: i32,
    pub breakout_date: NaiveDate,
    pub duration: f64,
    pub return_percentage: f64,
}

impl TryFrom<DbTradeRecord> for TradeRecord {
    type Error = DbError;

    fn try_from(row: DbTradeRecord) -> Result<Self, Self::Error> {
        let mcap_category = row
            .mcap_category
            .as_deref()
            .map(str::parse::<McapCategory>)
            .transpose()
            .map_err(|e| DbError::Malformed(format!("{}: {e}", row.symbol)))?;
        let cooldown_setting = u32::try_from(row.cooldown_setting).map_err(|_| {
            DbError::Malformed(format!("{}: negative cooldown_setting", row.symbol))
        })?;
        let holding_weeks = u32::try_from(row.holding_weeks)
            .map_err(|_| DbError::Malformed(format!("{}: negative holding_weeks", row.symbol)))?;

        Ok(TradeRecord {
            symbol: row.symbol,
            company: row.company,
            sector: row.sector,
            mcap_category,
            cooldown_setting,
            holding_weeks,
            breakout_date: row.breakout_date,
            duration: row.duration,
            return_percentage: row.return_percentage,
        })
    }
}

impl TryFrom<&TradeRecord> for DbTradeRecord {
    type Error = DbError;

    fn try_from(record: &TradeRecord) -> Result<Self, Self::Error> {
        if !record.has_finite_metrics() {
            return Err(DbError::Malformed(format!(
                "{}: non-finite duration or return",
                record.symbol
            )));
        }
        let column = |value: u32, name: &str| {
            i32::try_from(value).map_err(|_| {
                DbError::Malformed(format!("{}: {name} {value} out of range", record.symbol))
            })
        };

        Ok(DbTradeRecord {
            symbol: record.symbol.clone(),
            company: record.company.clone(),
            sector: record.sector.clone(),
            mcap_category: record.mcap_category.map(|tier| tier.as_str().to_string()),
            cooldown_setting: column(record.cooldown_setting, "cooldown_setting")?,
            holding_weeks: column(record.holding_weeks, "holding_weeks")?,
            breakout_date: record.breakout_date,
            duration: record.duration,
            return_percentage: record.return_percentage,
        })
    }
}

/// Appends one `AND` clause per predicate. Values are always bound, never inlined.
fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, filter: &RecordFilter) {
    builder.push(" WHERE TRUE");
    for predicate in filter.predicates() {
        match predicate {
            Predicate::HoldingWeeks(weeks) => {
                builder.push(" AND holding_weeks = ").push_bind(i64::from(*weeks));
            }
            Predicate::Cooldown(cooldown) => {
                builder
                    .push(" AND cooldown_setting = ")
                    .push_bind(i64::from(*cooldown));
            }
            Predicate::DateFrom(start) => {
                builder.push(" AND breakout_date >= ").push_bind(*start);
            }
            Predicate::DateTo(end) => {
                builder.push(" AND breakout_date <= ").push_bind(*end);
            }
            Predicate::Sector(sector) => {
                builder.push(" AND sector = ").push_bind(sector.clone());
            }
            Predicate::Mcap(tier) => {
                builder.push(" AND mcap_category = ").push_bind(tier.as_str());
            }
            Predicate::ExcludeMcap(tier) => {
                builder
                    .push(" AND mcap_category IS NOT NULL AND mcap_category <> ")
                    .push_bind(tier.as_str());
            }
        }
    }
}

/// The full `SELECT` for a filter, ordered by insertion.
fn select_query(filter: &RecordFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_RECORDS);
    push_predicates(&mut builder, filter);
    builder.push(" ORDER BY id");
    builder
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches every record matching `filter`, translated into a single `WHERE` clause.
    pub async fn fetch_records(&self, filter: &RecordFilter) -> Result<Vec<TradeRecord>, DbError> {
        let rows = select_query(filter)
            .build_query_as::<DbTradeRecord>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TradeRecord::try_from).collect()
    }

    /// Earliest and latest breakout date of one backtest configuration, computed by the
    /// database.
    pub async fn date_range(
        &self,
        holding_weeks: u32,
        cooldown: u32,
    ) -> Result<Option<(NaiveDate, NaiveDate)>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT MIN(breakout_date) AS min_date, MAX(breakout_date) AS max_date
            FROM trade_records
            WHERE holding_weeks = $1 AND cooldown_setting = $2
            "#,
        )
        .bind(i64::from(holding_weeks))
        .bind(i64::from(cooldown))
        .fetch_one(&self.pool)
        .await?;

        let min: Option<NaiveDate> = row.try_get("min_date")?;
        let max: Option<NaiveDate> = row.try_get("max_date")?;
        Ok(min.zip(max))
    }

    /// Distinct sector labels, alphabetically sorted.
    pub async fn distinct_sectors(&self) -> Result<Vec<String>, DbError> {
        let sectors = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT sector FROM trade_records ORDER BY sector",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sectors)
    }

    /// Replaces the whole table with `records` inside one transaction.
    ///
    /// Rows are inserted in batches of `batch_size`; `on_batch` receives the size of
    /// each committed-to-transaction batch so callers can report progress. Readers see
    /// either the old table or the new one, never a mix.
    pub async fn replace_all<F>(
        &self,
        records: &[TradeRecord],
        batch_size: usize,
        mut on_batch: F,
    ) -> Result<u64, DbError>
    where
        F: FnMut(usize),
    {
        let rows = records
            .iter()
            .map(DbTradeRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM trade_records")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tracing::info!(deleted, "Cleared existing trade records");

        let mut inserted = 0;
        for batch in rows.chunks(batch_size.max(1)) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(INSERT_RECORDS);
            builder.push_values(batch, |mut b, row| {
                b.push_bind(&row.symbol)
                    .push_bind(&row.company)
                    .push_bind(&row.sector)
                    .push_bind(&row.mcap_category)
                    .push_bind(row.cooldown_setting)
                    .push_bind(row.holding_weeks)
                    .push_bind(row.breakout_date)
                    .push_bind(row.duration)
                    .push_bind(row.return_percentage);
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
            on_batch(batch.len());
        }

        tx.commit().await?;
        tracing::info!(inserted, "Replaced trade records");
        Ok(inserted)
    }
}

#[async_trait]
impl TradeStore for DbRepository {
    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<TradeRecord>, StoreError> {
        Ok(self.fetch_records(filter).await?)
    }

    async fn date_range(
        &self,
        holding_weeks: u32,
        cooldown: u32,
    ) -> Result<Option<(NaiveDate, NaiveDate)>, StoreError> {
        Ok(DbRepository::date_range(self, holding_weeks, cooldown).await?)
    }

    async fn sectors(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.distinct_sectors().await?)
    }
}
