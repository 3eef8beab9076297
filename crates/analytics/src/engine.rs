use crate::binning::bin_durations;
use crate::cache::{CacheKey, ResultCache};
use crate::error::AnalyticsError;
use crate::filter::RecordFilter;
use crate::kpi::summarize;
use crate::params::{DashboardQuery, QueryDefaults};
use crate::report::{DateRange, DurationBin, KpiSummary, SectorPerformance, TrendPoint};
use crate::sector::analyze;
use crate::store::TradeStore;
use crate::trend::build_trend;
use configuration::{AnalyticsSettings, CacheSettings};
use core_types::TradeRecord;
use futures::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// The query-facing front of the aggregation engine.
///
/// Owns its collaborators behind trait objects so the same engine runs against
/// Postgres in production and `InMemoryStore` in tests. Cheap to clone; every clone
/// shares the same store and cache.
#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Arc<dyn TradeStore>,
    cache: Arc<dyn ResultCache>,
    analytics: AnalyticsSettings,
    cache_settings: CacheSettings,
}

impl AnalyticsEngine {
    pub fn new(
        store: Arc<dyn TradeStore>,
        cache: Arc<dyn ResultCache>,
        analytics: AnalyticsSettings,
        cache_settings: CacheSettings,
    ) -> Self {
        Self {
            store,
            cache,
            analytics,
            cache_settings,
        }
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.analytics
    }

    /// Defaults applied to requests that omit `weeks` or `cooldown_weeks`.
    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults::from(&self.analytics)
    }

    /// Scalar summary of the filtered subset.
    pub async fn kpi(&self, query: &DashboardQuery) -> Result<KpiSummary, AnalyticsError> {
        let mode = self.analytics.kpi_success_rate;
        let key = query.cache_key("kpi").with(format!("{mode:?}"));
        self.cached(key, self.cache_settings.query_ttl, async {
            let records = self.store.fetch(&query.to_filter()).await?;
            Ok::<_, AnalyticsError>(summarize(&records, mode))
        })
        .await
    }

    /// Duration × return-band histogram of the filtered subset.
    pub async fn duration_chart(
        &self,
        query: &DashboardQuery,
    ) -> Result<Vec<DurationBin>, AnalyticsError> {
        self.cached(query.cache_key("chart"), self.cache_settings.query_ttl, async {
            let records = self.store.fetch(&query.to_filter()).await?;
            Ok::<_, AnalyticsError>(bin_durations(&records))
        })
        .await
    }

    /// Sector × tier breakdown. The configured `excluded_tier` is dropped before
    /// grouping, on top of the query's own constraints.
    pub async fn sector_performance(
        &self,
        query: &DashboardQuery,
    ) -> Result<SectorPerformance, AnalyticsError> {
        let excluded = self.analytics.excluded_tier;
        let key = query.cache_key("sector_performance").with_opt(excluded);
        self.cached(key, self.cache_settings.analysis_ttl, async {
            let mut filter = query.to_filter();
            if let Some(tier) = excluded {
                filter = filter.exclude_mcap(tier);
            }
            let records = self.store.fetch(&filter).await?;
            Ok::<_, AnalyticsError>(analyze(&records, self.analytics.confidence_threshold))
        })
        .await
    }

    /// One point per configured holding period that has records, ascending.
    ///
    /// `cooldown` defaults to `trend_cooldown_weeks`. Each point covers the same
    /// records as `sector_performance` for that holding period, so the configured
    /// `excluded_tier` is dropped here too. Holding periods are fetched concurrently.
    pub async fn sector_trend(
        &self,
        cooldown: Option<u32>,
    ) -> Result<Vec<TrendPoint>, AnalyticsError> {
        let cooldown = cooldown.unwrap_or(self.analytics.trend_cooldown_weeks);
        let excluded = self.analytics.excluded_tier;
        let periods = &self.analytics.holding_periods;
        let key = CacheKey::new("sector_trend")
            .with(cooldown)
            .with_opt(excluded)
            .with(format!("{periods:?}"));

        self.cached(key, self.cache_settings.analysis_ttl, async {
            let fetches = periods.iter().map(|weeks| {
                let mut filter = RecordFilter::new().holding_weeks(*weeks).cooldown(cooldown);
                if let Some(tier) = excluded {
                    filter = filter.exclude_mcap(tier);
                }
                async move { (*weeks, self.store.fetch(&filter).await) }
            });

            let mut subsets: Vec<(u32, Vec<TradeRecord>)> = Vec::with_capacity(periods.len());
            for (weeks, result) in join_all(fetches).await {
                subsets.push((weeks, result?));
            }

            Ok::<_, AnalyticsError>(build_trend(
                subsets
                    .iter()
                    .map(|(weeks, records)| (*weeks, records.as_slice())),
            ))
        })
        .await
    }

    /// Earliest and latest breakout date for one backtest configuration.
    pub async fn date_range(
        &self,
        holding_weeks: u32,
        cooldown: u32,
    ) -> Result<DateRange, AnalyticsError> {
        let key = CacheKey::new("date_range").with(holding_weeks).with(cooldown);
        self.cached(key, self.cache_settings.date_range_ttl, async {
            let range = self.store.date_range(holding_weeks, cooldown).await?;
            Ok::<_, AnalyticsError>(DateRange {
                min_date: range.map(|(min, _)| min),
                max_date: range.map(|(_, max)| max),
            })
        })
        .await
    }

    /// Distinct sector labels, alphabetically sorted.
    pub async fn sectors(&self) -> Result<Vec<String>, AnalyticsError> {
        self.cached(CacheKey::new("sectors"), self.cache_settings.analysis_ttl, async {
            self.store.sectors().await.map_err(AnalyticsError::from)
        })
        .await
    }

    /// Returns the cached value for `key`, or runs `compute` and caches its success.
    ///
    /// A cached value that no longer decodes is treated as a miss.
    async fn cached<T, F>(&self, key: CacheKey, ttl: Duration, compute: F) -> Result<T, AnalyticsError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, AnalyticsError>>,
    {
        if let Some(value) = self.cache.get(&key) {
            match serde_json::from_value::<T>(value) {
                Ok(hit) => {
                    tracing::debug!(key = %key, "cache hit");
                    return Ok(hit);
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry"),
            }
        }

        tracing::debug!(key = %key, "cache miss");
        let result = compute.await?;
        self.cache.set(key, serde_json::to_value(&result)?, ttl);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::store::{InMemoryStore, StoreError};
    use crate::testing::{dataset, record};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use core_types::McapCategory;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts fetches so tests can tell a cache hit from a recomputation.
    struct CountingStore {
        inner: InMemoryStore,
        fetches: AtomicUsize,
    }

    impl CountingStore {
        fn new(records: Vec<TradeRecord>) -> Self {
            Self {
                inner: InMemoryStore::new(records),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TradeStore for CountingStore {
        async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<TradeRecord>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(filter).await
        }

        async fn date_range(
            &self,
            holding_weeks: u32,
            cooldown: u32,
        ) -> Result<Option<(NaiveDate, NaiveDate)>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.date_range(holding_weeks, cooldown).await
        }

        async fn sectors(&self) -> Result<Vec<String>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.sectors().await
        }
    }

    struct FailingStore;

    #[async_trait]
    impl TradeStore for FailingStore {
        async fn fetch(&self, _: &RecordFilter) -> Result<Vec<TradeRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn date_range(
            &self,
            _: u32,
            _: u32,
        ) -> Result<Option<(NaiveDate, NaiveDate)>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn sectors(&self) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    fn engine_over(store: Arc<dyn TradeStore>) -> (AnalyticsEngine, Arc<InMemoryCache>) {
        let cache = Arc::new(InMemoryCache::new());
        let engine = AnalyticsEngine::new(
            store,
            cache.clone(),
            AnalyticsSettings::default(),
            CacheSettings::default(),
        );
        (engine, cache)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn kpi_is_served_from_cache_on_repeat() {
        let store = Arc::new(CountingStore::new(dataset()));
        let (engine, cache) = engine_over(store.clone());
        let query = DashboardQuery::new(52, 52);

        let first = engine.kpi(&query).await.unwrap();
        let second = engine.kpi(&query).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.total_samples, 8);
        assert_eq!(store.fetches(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distinct_parameters_get_distinct_entries() {
        let store = Arc::new(CountingStore::new(dataset()));
        let (engine, cache) = engine_over(store.clone());

        let all = engine.kpi(&DashboardQuery::new(52, 52)).await.unwrap();
        let mut energy = DashboardQuery::new(52, 52);
        energy.sector = Some("Energy".to_string());
        let only_energy = engine.kpi(&energy).await.unwrap();

        assert_eq!(all.total_samples, 8);
        assert_eq!(only_energy.total_samples, 2);
        assert_eq!(store.fetches(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn sector_named_like_a_placeholder_does_not_share_the_unfiltered_entry() {
        let (engine, cache) = engine_over(Arc::new(InMemoryStore::new(dataset())));

        let mut dash = DashboardQuery::new(52, 52);
        dash.sector = Some("-".to_string());
        assert_eq!(engine.kpi(&dash).await.unwrap().total_samples, 0);

        let all = engine.kpi(&DashboardQuery::new(52, 52)).await.unwrap();
        assert_eq!(all.total_samples, 8);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn store_failures_propagate_and_are_not_cached() {
        let (engine, cache) = engine_over(Arc::new(FailingStore));
        let query = DashboardQuery::new(52, 52);

        let err = engine.kpi(&query).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::Store(StoreError::Unavailable(_))));
        assert!(engine.sector_trend(None).await.is_err());
        assert!(engine.date_range(52, 52).await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn sector_performance_drops_the_excluded_tier() {
        let (engine, _) = engine_over(Arc::new(InMemoryStore::new(dataset())));

        let performance = engine
            .sector_performance(&DashboardQuery::new(52, 52))
            .await
            .unwrap();

        assert_eq!(performance.total_samples, 7);
        let sectors: Vec<&str> = performance.sectors.iter().map(|r| r.sector.as_str()).collect();
        assert_eq!(sectors, vec!["Energy", "Pharma", "Technology"]);
        assert!(performance
            .sectors
            .iter()
            .all(|row| !row.sample_counts.contains_key(&McapCategory::Micro)));
    }

    #[tokio::test]
    async fn sector_performance_for_unknown_sector_is_empty() {
        let (engine, _) = engine_over(Arc::new(InMemoryStore::new(dataset())));
        let mut query = DashboardQuery::new(52, 52);
        query.sector = Some("Nonexistent".to_string());

        let performance = engine.sector_performance(&query).await.unwrap();
        assert!(performance.sectors.is_empty());
        assert_eq!(performance.total_samples, 0);
    }

    #[tokio::test]
    async fn trend_skips_holding_periods_without_records() {
        let (engine, _) = engine_over(Arc::new(InMemoryStore::new(dataset())));

        let points = engine.sector_trend(None).await.unwrap();
        let durations: Vec<u32> = points.iter().map(|p| p.duration).collect();
        // The 104-week records with cooldown 52 are a single TCS row.
        assert_eq!(durations, vec![52, 104]);
        assert_eq!(points[0].sample_size, 7);
        assert_eq!(points[1].sample_size, 1);

        let at_twenty = engine.sector_trend(Some(20)).await.unwrap();
        assert_eq!(at_twenty.len(), 1);
        assert_eq!(at_twenty[0].duration, 104);
    }

    #[tokio::test]
    async fn trend_point_matches_sector_performance_for_the_same_configuration() {
        let mut records = dataset();
        let mut untiered = record("NOTIER", "Energy", McapCategory::Mega).ret(50.0).build();
        untiered.mcap_category = None;
        records.push(untiered);
        let (engine, _) = engine_over(Arc::new(InMemoryStore::new(records)));

        let performance = engine
            .sector_performance(&DashboardQuery::new(52, 52))
            .await
            .unwrap();
        let points = engine.sector_trend(Some(52)).await.unwrap();
        let at_52 = points.iter().find(|p| p.duration == 52).unwrap();

        assert_eq!(at_52.sample_size, performance.total_samples);
        assert_eq!(at_52.confidence, performance.overall_confidence);
    }

    #[tokio::test]
    async fn chart_bins_only_successful_trades() {
        let (engine, _) = engine_over(Arc::new(InMemoryStore::new(dataset())));

        let rows = engine
            .duration_chart(&DashboardQuery::new(52, 52))
            .await
            .unwrap();
        let binned: usize = rows.iter().map(DurationBin::total).sum();
        // 45, 110, 22, 65 and 300 clear the 20% bar.
        assert_eq!(binned, 5);
    }

    #[tokio::test]
    async fn date_range_reports_bounds_or_nulls() {
        let records = vec![
            record("A", "Tech", McapCategory::Mega).on(date(2021, 3, 1)),
            record("B", "Tech", McapCategory::Mega).on(date(2019, 7, 15)),
            record("C", "Tech", McapCategory::Mega).on(date(2022, 1, 9)),
        ];
        let (engine, _) = engine_over(Arc::new(InMemoryStore::new(records)));

        let range = engine.date_range(52, 52).await.unwrap();
        assert_eq!(range.min_date, Some(date(2019, 7, 15)));
        assert_eq!(range.max_date, Some(date(2022, 1, 9)));

        let missing = engine.date_range(26, 52).await.unwrap();
        assert_eq!(missing, DateRange::default());
    }

    #[tokio::test]
    async fn sectors_are_sorted_and_distinct() {
        let (engine, _) = engine_over(Arc::new(InMemoryStore::new(dataset())));
        assert_eq!(
            engine.sectors().await.unwrap(),
            vec!["Energy", "Pharma", "Technology"]
        );
    }

    #[tokio::test]
    async fn undecodable_cache_entry_is_recomputed() {
        let store = Arc::new(CountingStore::new(dataset()));
        let (engine, cache) = engine_over(store.clone());
        cache.set(
            CacheKey::new("sectors"),
            serde_json::json!({"not": "a list"}),
            Duration::from_secs(60),
        );

        let sectors = engine.sectors().await.unwrap();
        assert_eq!(sectors.len(), 3);
        assert_eq!(store.fetches(), 1);
    }
}
