use crate::domain::{
    QueryCriteria, SessionRecord, SortDirection, SortKey, merge_batch, sort_records,
};

pub const BATCH_SIZE: usize = 100;

/// A fetch the pager wants executed. Tagged with the query version that
/// issued it so late responses from an abandoned query can be discarded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchRequest {
    pub version: u64,
    pub offset: usize,
    pub limit: usize,
    pub criteria: QueryCriteria,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FetchOutcome {
    Batch(Vec<SessionRecord>),
    Failed(String),
}

/// Single source of truth for the records fetched so far and their order.
///
/// The pager never performs I/O: operations hand back a `FetchRequest` for
/// the caller to execute, and completions come back through `apply_fetch`.
#[derive(Clone, Debug)]
pub struct SessionPager {
    cache: Vec<SessionRecord>,
    criteria: Option<QueryCriteria>,
    version: u64,
    in_flight: bool,
    exhausted: bool,
    page: usize,
    rows_per_page: usize,
    sort_key: SortKey,
    sort_direction: SortDirection,
    error: Option<String>,
}

impl SessionPager {
    pub fn new() -> Self {
        Self {
            cache: Vec::new(),
            criteria: None,
            version: 0,
            in_flight: false,
            exhausted: false,
            page: 0,
            rows_per_page: 5,
            sort_key: SortKey::SessionId,
            sort_direction: SortDirection::Desc,
            error: None,
        }
    }

    /// Freezes `criteria`, resets the cache and page, and returns the first
    /// batch fetch. Rows-per-page and the active sort survive resubmission.
    pub fn submit_query(&mut self, criteria: QueryCriteria) -> FetchRequest {
        self.version += 1;
        self.cache.clear();
        self.page = 0;
        self.exhausted = false;
        self.error = None;
        self.in_flight = true;
        self.criteria = Some(criteria.clone());

        FetchRequest {
            version: self.version,
            offset: 0,
            limit: BATCH_SIZE,
            criteria,
        }
    }

    /// Moves the viewport to `page` immediately; returns a fetch only when
    /// the requested page would run past the known data and the source may
    /// still have more rows.
    pub fn request_page(&mut self, page: usize) -> Option<FetchRequest> {
        self.page = page;

        if self.exhausted || self.in_flight {
            return None;
        }
        let criteria = self.criteria.clone()?;

        let last_row = page.saturating_add(1).saturating_mul(self.rows_per_page);
        if last_row < self.cache.len() {
            return None;
        }

        self.in_flight = true;
        Some(FetchRequest {
            version: self.version,
            offset: self.cache.len(),
            limit: BATCH_SIZE,
            criteria,
        })
    }

    /// Applies a completed fetch. Outcomes from a superseded query version
    /// are dropped without touching any state.
    pub fn apply_fetch(&mut self, version: u64, outcome: FetchOutcome) {
        if version != self.version {
            return;
        }
        self.in_flight = false;

        match outcome {
            FetchOutcome::Batch(batch) => {
                // A batch shorter than requested (including empty) means the
                // source has no more rows for this query.
                if batch.len() < BATCH_SIZE {
                    self.exhausted = true;
                }
                let existing = std::mem::take(&mut self.cache);
                self.cache = merge_batch(existing, batch, self.sort_key, self.sort_direction);
                self.error = None;
            }
            FetchOutcome::Failed(message) => {
                self.error = Some(message);
            }
        }
    }

    /// Same key flips direction; a fresh key starts descending. Re-orders
    /// the whole cache in place, keeps the current page.
    pub fn change_sort(&mut self, key: SortKey) {
        if key == self.sort_key {
            self.sort_direction = self.sort_direction.toggle();
        } else {
            self.sort_key = key;
            self.sort_direction = SortDirection::Desc;
        }
        sort_records(&mut self.cache, self.sort_key, self.sort_direction);
    }

    pub fn change_rows_per_page(&mut self, rows: usize) {
        if rows == 0 {
            return;
        }
        self.rows_per_page = rows;
        self.page = 0;
    }

    pub fn visible_slice(&self) -> &[SessionRecord] {
        let start = self
            .page
            .saturating_mul(self.rows_per_page)
            .min(self.cache.len());
        let end = start.saturating_add(self.rows_per_page).min(self.cache.len());
        &self.cache[start..end]
    }

    pub fn known_count(&self) -> usize {
        self.cache.len()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn loading(&self) -> bool {
        self.in_flight
    }

    pub fn exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionType;
    use time::macros::datetime;

    fn criteria() -> QueryCriteria {
        QueryCriteria {
            session_type: SessionType::Enter,
            user: String::new(),
            app_name: String::new(),
            since: datetime!(2026-08-01 00:00:00 UTC),
        }
    }

    fn record(session_id: i64) -> SessionRecord {
        SessionRecord {
            session_id,
            session_type: SessionType::Enter,
            user: format!("user{session_id}"),
            source_ip: "10.0.0.1".to_string(),
            app_name: "console".to_string(),
            proc_name: "web".to_string(),
            instance_no: 0,
            node_ip: "192.168.1.2".to_string(),
            status: "running".to_string(),
            created_at: session_id,
            ended_at: 0,
        }
    }

    fn batch(ids: impl Iterator<Item = i64>) -> Vec<SessionRecord> {
        ids.map(record).collect()
    }

    fn pager_with_full_batch() -> SessionPager {
        let mut pager = SessionPager::new();
        let request = pager.submit_query(criteria());
        pager.apply_fetch(request.version, FetchOutcome::Batch(batch(1..=100)));
        pager
    }

    #[test]
    fn submit_resets_cache_and_page() {
        let mut pager = pager_with_full_batch();
        pager.request_page(7);
        assert_eq!(pager.page(), 7);
        assert_eq!(pager.known_count(), 100);

        let request = pager.submit_query(criteria());
        assert_eq!(pager.page(), 0);
        assert_eq!(pager.known_count(), 0);
        assert_eq!(request.offset, 0);
        assert_eq!(request.limit, BATCH_SIZE);

        pager.apply_fetch(request.version, FetchOutcome::Batch(batch(1..=3)));
        assert_eq!(pager.known_count(), 3);
    }

    #[test]
    fn first_batch_lands_sorted_by_default_key_descending() {
        let mut pager = SessionPager::new();
        let request = pager.submit_query(criteria());
        pager.apply_fetch(
            request.version,
            FetchOutcome::Batch(vec![record(5), record(9), record(1)]),
        );
        let ids: Vec<i64> = pager
            .visible_slice()
            .iter()
            .map(|record| record.session_id)
            .collect();
        assert_eq!(ids, vec![9, 5, 1]);
    }

    #[test]
    fn page_inside_known_data_never_fetches() {
        let mut pager = pager_with_full_batch();
        // rows 90..95; last row index 95 < 100.
        assert!(pager.request_page(18).is_none());
        assert_eq!(pager.page(), 18);
    }

    #[test]
    fn boundary_page_fetches_next_batch_at_cache_size_offset() {
        let mut pager = pager_with_full_batch();
        // Page 19 covers rows 95..100; last row index 100 >= cache size 100.
        let request = pager.request_page(19).expect("boundary fetch");
        assert_eq!(request.offset, 100);
        assert_eq!(request.limit, BATCH_SIZE);
        assert_eq!(pager.page(), 19);
    }

    #[test]
    fn short_batch_exhausts_the_query() {
        let mut pager = pager_with_full_batch();
        let request = pager.request_page(19).expect("boundary fetch");
        pager.apply_fetch(request.version, FetchOutcome::Batch(batch(101..=160)));
        assert_eq!(pager.known_count(), 160);
        assert!(pager.exhausted());

        // 160 rows known, and no request ever fetches again for this query.
        assert!(pager.request_page(31).is_none());
        assert!(pager.request_page(500).is_none());
    }

    #[test]
    fn empty_batch_counts_as_exhaustion() {
        let mut pager = pager_with_full_batch();
        let request = pager.request_page(19).expect("boundary fetch");
        pager.apply_fetch(request.version, FetchOutcome::Batch(Vec::new()));
        assert_eq!(pager.known_count(), 100);
        assert!(pager.exhausted());
        assert!(pager.request_page(19).is_none());
    }

    #[test]
    fn repeated_page_requests_fetch_at_most_once() {
        let mut pager = pager_with_full_batch();
        assert!(pager.request_page(19).is_some());
        // Same page again while the fetch is outstanding: no second fetch.
        assert!(pager.request_page(19).is_none());

        pager.apply_fetch(pager.version, FetchOutcome::Batch(batch(101..=200)));
        // Cache now holds 200 rows; page 19 sits inside known data.
        assert!(pager.request_page(19).is_none());
    }

    #[test]
    fn stale_outcome_is_discarded() {
        let mut pager = pager_with_full_batch();
        let old = pager.request_page(19).expect("boundary fetch");

        let request = pager.submit_query(criteria());
        pager.apply_fetch(old.version, FetchOutcome::Batch(batch(500..=599)));
        assert_eq!(pager.known_count(), 0);
        assert!(pager.loading());

        pager.apply_fetch(request.version, FetchOutcome::Batch(batch(1..=10)));
        assert_eq!(pager.known_count(), 10);
        assert!(!pager.loading());
    }

    #[test]
    fn failure_surfaces_as_state_and_leaves_cache_alone() {
        let mut pager = pager_with_full_batch();
        let request = pager.request_page(19).expect("boundary fetch");
        pager.apply_fetch(
            request.version,
            FetchOutcome::Failed("connection refused".to_string()),
        );
        assert_eq!(pager.known_count(), 100);
        assert_eq!(pager.error(), Some("connection refused"));
        assert!(!pager.exhausted());

        // The next page request may try again; no automatic retry happened.
        assert!(pager.request_page(19).is_some());
    }

    #[test]
    fn failed_submit_leaves_an_empty_cache() {
        let mut pager = SessionPager::new();
        let request = pager.submit_query(criteria());
        pager.apply_fetch(request.version, FetchOutcome::Failed("timeout".to_string()));
        assert_eq!(pager.known_count(), 0);
        assert!(pager.visible_slice().is_empty());
        assert_eq!(pager.error(), Some("timeout"));
    }

    #[test]
    fn successful_batch_clears_a_previous_error() {
        let mut pager = SessionPager::new();
        let request = pager.submit_query(criteria());
        pager.apply_fetch(request.version, FetchOutcome::Failed("timeout".to_string()));

        let request = pager.submit_query(criteria());
        pager.apply_fetch(request.version, FetchOutcome::Batch(batch(1..=2)));
        assert!(pager.error().is_none());
    }

    #[test]
    fn no_fetch_before_first_submission() {
        let mut pager = SessionPager::new();
        assert!(pager.request_page(0).is_none());
        assert!(!pager.loading());
    }

    #[test]
    fn appended_batch_interleaves_under_the_active_sort() {
        let mut pager = SessionPager::new();
        let request = pager.submit_query(criteria());
        pager.apply_fetch(
            request.version,
            FetchOutcome::Batch(batch((1..=100).map(|id| id * 2))),
        );
        let request = pager.request_page(19).expect("boundary fetch");
        pager.apply_fetch(
            request.version,
            FetchOutcome::Batch(vec![record(151), record(3)]),
        );

        // Descending by session id: 151 belongs near the front, 3 at the back.
        assert_eq!(pager.known_count(), 102);
        pager.change_rows_per_page(102);
        let ids: Vec<i64> = pager
            .visible_slice()
            .iter()
            .map(|record| record.session_id)
            .collect();
        assert_eq!(ids[0], 200);
        assert_eq!(ids.iter().position(|&id| id == 151), Some(25));
        assert_eq!(ids[101], 2);
    }

    #[test]
    fn sort_toggles_on_same_key_and_restarts_desc_on_new_key() {
        let mut pager = SessionPager::new();
        let request = pager.submit_query(criteria());
        pager.apply_fetch(request.version, FetchOutcome::Batch(batch(1..=3)));

        pager.change_sort(SortKey::User);
        assert_eq!(pager.sort_key(), SortKey::User);
        assert_eq!(pager.sort_direction(), SortDirection::Desc);

        pager.change_sort(SortKey::User);
        assert_eq!(pager.sort_direction(), SortDirection::Asc);

        pager.change_sort(SortKey::Status);
        assert_eq!(pager.sort_key(), SortKey::Status);
        assert_eq!(pager.sort_direction(), SortDirection::Desc);
    }

    #[test]
    fn sort_change_keeps_the_page_and_triggers_no_fetch() {
        let mut pager = pager_with_full_batch();
        pager.request_page(3);
        pager.change_sort(SortKey::CreatedAt);
        assert_eq!(pager.page(), 3);
        assert!(!pager.loading());
    }

    #[test]
    fn rows_per_page_change_resets_page_without_fetching() {
        let mut pager = pager_with_full_batch();
        pager.request_page(10);
        pager.change_rows_per_page(25);
        assert_eq!(pager.page(), 0);
        assert_eq!(pager.rows_per_page(), 25);
        assert_eq!(pager.known_count(), 100);
        assert!(!pager.loading());

        pager.change_rows_per_page(0);
        assert_eq!(pager.rows_per_page(), 25);
    }

    #[test]
    fn visible_slice_is_clamped_to_known_data() {
        let mut pager = SessionPager::new();
        let request = pager.submit_query(criteria());
        pager.apply_fetch(request.version, FetchOutcome::Batch(batch(1..=7)));

        pager.request_page(1);
        assert_eq!(pager.visible_slice().len(), 2);
        pager.request_page(5);
        assert!(pager.visible_slice().is_empty());
    }
}
