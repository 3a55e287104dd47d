use crate::domain::analytics::{self, DashboardMetrics, GroupBreakdown};
use crate::domain::filter::{self, FilterCriteria};
use crate::domain::rsvp::{Rsvp, RsvpId, RsvpPatch};
use crate::domain::seating::{SeatingError, SeatingPlan, DEFAULT_TABLE_CAPACITY};
use crate::domain::selection::Selection;
use crate::domain::table::{self, SortColumn, SortSpec, DEFAULT_PAGE_SIZE};
use crate::repository::group_names::GroupNameStore;
use crate::repository::RecordStore;
use crate::services::bulk::{self, BulkOperation, BulkOutcome, BulkStep, StepAction};
use crate::services::cache::RsvpCache;
use crate::services::error_handling::{
    DashboardError, LogHelper, Notification, UserErrorFormatter,
};
use crate::services::export_service::{self, CsvLayout};
use crate::services::validation::InputValidator;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    pub table_page_size: usize,
    /// `limit` per `listRSVPs` page; `None` asks the store for everything.
    pub list_page_size: Option<usize>,
    pub table_capacity: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            table_page_size: DEFAULT_PAGE_SIZE,
            list_page_size: Some(100),
            table_capacity: DEFAULT_TABLE_CAPACITY,
        }
    }
}

/// One page of the sorted, filtered table.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    pub rows: Vec<Rsvp>,
    pub page_index: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

impl TablePage {
    pub fn can_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next(&self) -> bool {
        self.page_index + 1 < self.page_count
    }
}

struct FailedRun {
    label: String,
    steps: Vec<BulkStep>,
}

#[derive(Default)]
struct DashboardState {
    cache: RsvpCache,
    loaded: bool,
    load_error: Option<String>,
    criteria: FilterCriteria,
    selection: Selection,
    sort: Option<SortSpec>,
    page_index: usize,
    seating: Option<SeatingPlan>,
    last_failed: Option<FailedRun>,
    notifications: Vec<Notification>,
}

impl DashboardState {
    fn filtered(&self) -> Vec<&Rsvp> {
        filter::filter(self.cache.records(), &self.criteria)
    }

    /// Filtered rows in displayed (sorted) order, across all pages.
    fn displayed(&self) -> Vec<&Rsvp> {
        let mut rows = self.filtered();
        table::sort_rows(&mut rows, self.sort);
        rows
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn reconcile(&mut self, step: &BulkStep) {
        match &step.action {
            StepAction::Delete => {
                self.cache.apply_delete(&step.id);
                self.selection.deselect_removed(&step.id);
            }
            StepAction::Update(patch) => {
                if let Err(error) = self.cache.apply_update(&step.id, patch) {
                    warn!(rsvp_id = %step.id, error = %error, "Confirmed update for a record no longer cached");
                }
            }
        }
    }
}

/// The admin dashboard: a local cache of the record store plus the view
/// state layered over it.
///
/// Derived views are recomputed from the cache on every call. The state
/// lock is only ever held between suspension points, so independent edits
/// may be in flight together; each merges into the cache when it completes.
pub struct RsvpDashboard {
    store: Arc<dyn RecordStore>,
    group_store: Arc<dyn GroupNameStore>,
    options: DashboardOptions,
    state: RwLock<DashboardState>,
}

impl RsvpDashboard {
    pub fn new(
        store: Arc<dyn RecordStore>,
        group_store: Arc<dyn GroupNameStore>,
        options: DashboardOptions,
    ) -> Self {
        Self {
            store,
            group_store,
            options,
            state: RwLock::new(DashboardState::default()),
        }
    }

    pub fn options(&self) -> DashboardOptions {
        self.options
    }

    /// Seeds the cache from the store. On failure the cache is left empty
    /// and the error stays available through [`Self::load_error`].
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<usize, DashboardError> {
        let result = self.store.list_all(self.options.list_page_size).await;

        let mut state = self.state.write();
        state.selection.clear();
        state.page_index = 0;
        state.seating = None;
        state.last_failed = None;
        state.loaded = true;

        match result {
            Ok(records) => {
                state.cache.seed(records);
                state.load_error = None;
                info!(records = state.cache.len(), "Loaded RSVPs");
                Ok(state.cache.len())
            }
            Err(error) => {
                let error = DashboardError::from(error);
                LogHelper::log_load_failure(&error);
                let message = UserErrorFormatter::format_dashboard_error(&error);
                state.cache.seed(Vec::new());
                state.load_error = Some(message.clone());
                state.notify(Notification::error(format!("Failed to load RSVPs. {message}")));
                Err(error)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    pub fn load_error(&self) -> Option<String> {
        self.state.read().load_error.clone()
    }

    pub fn records(&self) -> Vec<Rsvp> {
        self.state.read().cache.records().to_vec()
    }

    pub fn record(&self, id: &RsvpId) -> Option<Rsvp> {
        self.state.read().cache.get(id).cloned()
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.state.read().criteria.clone()
    }

    /// Replaces the active filters. The table returns to its first page and
    /// the selection keeps only ids still visible.
    pub fn set_criteria(&self, criteria: FilterCriteria) {
        let mut state = self.state.write();
        let DashboardState {
            cache,
            criteria: current,
            selection,
            page_index,
            ..
        } = &mut *state;
        *current = criteria;
        *page_index = 0;
        selection.retain_visible(&filter::filter(cache.records(), current));
    }

    /// The filtered view in cache order.
    pub fn filtered(&self) -> Vec<Rsvp> {
        self.state.read().filtered().into_iter().cloned().collect()
    }

    /// The filtered view in displayed order.
    pub fn displayed(&self) -> Vec<Rsvp> {
        self.state.read().displayed().into_iter().cloned().collect()
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.state.read().sort
    }

    pub fn toggle_sort(&self, column: SortColumn) -> Option<SortSpec> {
        let mut state = self.state.write();
        state.sort = table::toggle_sort(state.sort, column);
        state.sort
    }

    pub fn set_sort(&self, sort: Option<SortSpec>) {
        self.state.write().sort = sort;
    }

    /// Moves to `index`, clamped into the current page range.
    pub fn set_page(&self, index: usize) -> usize {
        let mut state = self.state.write();
        let count = table::page_count(state.filtered().len(), self.options.table_page_size);
        state.page_index = index.min(count - 1);
        state.page_index
    }

    pub fn next_page(&self) -> usize {
        let index = self.state.read().page_index + 1;
        self.set_page(index)
    }

    pub fn previous_page(&self) -> usize {
        let index = self.state.read().page_index.saturating_sub(1);
        self.set_page(index)
    }

    pub fn current_page(&self) -> TablePage {
        let state = self.state.read();
        let rows = state.displayed();
        let page = table::paginate(&rows, state.page_index, self.options.table_page_size);
        TablePage {
            rows: page.rows.into_iter().cloned().collect(),
            page_index: page.page_index,
            page_count: page.page_count,
            total_rows: page.total_rows,
        }
    }

    /// Summary over the whole cache, regardless of filters.
    pub fn metrics(&self) -> DashboardMetrics {
        analytics::aggregate(self.state.read().cache.records())
    }

    pub fn group_breakdown(&self) -> Vec<GroupBreakdown> {
        analytics::group_breakdown(self.state.read().cache.records())
    }

    pub fn toggle_selection(&self, id: &RsvpId) -> bool {
        self.state.write().selection.toggle(id)
    }

    /// Selects exactly the records of the filtered view.
    pub fn select_all_visible(&self) {
        let mut state = self.state.write();
        let ids: Vec<RsvpId> = state.filtered().iter().map(|r| r.id.clone()).collect();
        state.selection.select_all(ids.iter());
    }

    pub fn clear_selection(&self) {
        self.state.write().selection.clear();
    }

    pub fn is_all_selected(&self) -> bool {
        let state = self.state.read();
        state.selection.is_all_selected(&state.filtered())
    }

    pub fn is_selected(&self, id: &RsvpId) -> bool {
        self.state.read().selection.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.state.read().selection.selected_count()
    }

    /// Selected ids in cache order.
    pub fn selected_ids(&self) -> Vec<RsvpId> {
        let state = self.state.read();
        let ids: HashSet<RsvpId> = state.selection.ids().cloned().collect();
        state.cache.ordered_subset(&ids)
    }

    pub fn selected_emails(&self) -> Vec<String> {
        let state = self.state.read();
        state.selection.selected_emails(&state.filtered())
    }

    pub fn clipboard_text(&self) -> String {
        export_service::clipboard_text(&self.selected_emails())
    }

    /// Sends an inline edit and merges it once the store confirms. A
    /// rejected value or a failed call leaves the cache untouched.
    #[instrument(skip(self, patch), fields(rsvp_id = %id))]
    pub async fn update_record(&self, id: &RsvpId, patch: &RsvpPatch) -> Result<Rsvp, DashboardError> {
        let checked = match InputValidator::validate_patch(patch) {
            Ok(checked) => checked,
            Err(error) => {
                self.notify_error(&error);
                return Err(error);
            }
        };
        if !self.state.read().cache.contains(id) {
            let error = DashboardError::RecordNotFound { id: id.clone() };
            self.notify_error(&error);
            return Err(error);
        }

        let confirmed = match self.store.update(id, &checked).await {
            Ok(confirmed) => confirmed,
            Err(error) => {
                LogHelper::log_record_operation("update", id, false);
                let error = DashboardError::from(error);
                self.notify_error(&error);
                return Err(error);
            }
        };
        LogHelper::log_record_operation("update", id, true);

        let mut state = self.state.write();
        let merged = match state.cache.apply_update(id, &checked) {
            Ok(merged) => merged.clone(),
            Err(error) => {
                warn!(error = %error, "Record deleted while its update was in flight");
                confirmed
            }
        };
        state.notify(Notification::success("RSVP updated"));
        Ok(merged)
    }

    #[instrument(skip(self), fields(rsvp_id = %id))]
    pub async fn delete_record(&self, id: &RsvpId) -> Result<(), DashboardError> {
        if !self.state.read().cache.contains(id) {
            let error = DashboardError::RecordNotFound { id: id.clone() };
            self.notify_error(&error);
            return Err(error);
        }

        if let Err(error) = self.store.delete(id).await {
            LogHelper::log_record_operation("delete", id, false);
            let error = DashboardError::from(error);
            self.notify_error(&error);
            return Err(error);
        }
        LogHelper::log_record_operation("delete", id, true);

        let mut state = self.state.write();
        state.cache.apply_delete(id);
        state.selection.deselect_removed(id);
        state.notify(Notification::success("RSVP deleted"));
        Ok(())
    }

    pub async fn bulk_delete(&self) -> BulkOutcome {
        self.run_bulk(BulkOperation::Delete).await
    }

    /// Assigns `group` to every selected record. A name not yet known is
    /// remembered in the local group store, whatever the per-record outcome.
    pub async fn bulk_assign_group(&self, group: &str) -> Result<BulkOutcome, DashboardError> {
        let group = InputValidator::validate_group_name(group)
            .map_err(|error| DashboardError::validation("group", error.to_string()))
            .inspect_err(|error| self.notify_error(error))?;

        let is_new = !group.is_empty() && !self.group_names().await.contains(&group);
        let outcome = self.run_bulk(BulkOperation::AssignGroup(group.clone())).await;

        if is_new {
            if let Err(error) = self.group_store.add(&group).await {
                let error = DashboardError::GroupStore(error.to_string());
                warn!(group = %group, error = %error, "Failed to persist custom group name");
                self.notify_error(&error);
            }
        }
        Ok(outcome)
    }

    async fn run_bulk(&self, operation: BulkOperation) -> BulkOutcome {
        let targets = {
            let mut state = self.state.write();
            let ids: HashSet<RsvpId> = state.selection.ids().cloned().collect();
            let targets = state.cache.ordered_subset(&ids);
            // Every target leaves the selection, whether or not its call succeeds.
            for id in &ids {
                state.selection.deselect_removed(id);
            }
            targets
        };

        let label = operation.to_string();
        let steps = operation.steps(&targets);
        self.execute_steps(label, steps).await
    }

    /// Re-runs the steps that failed in the previous bulk run, skipping
    /// records that have since left the cache. `None` when nothing failed.
    pub async fn retry_failed(&self) -> Option<BulkOutcome> {
        let run = {
            let mut state = self.state.write();
            let run = state.last_failed.take()?;
            let steps: Vec<BulkStep> = run
                .steps
                .into_iter()
                .filter(|step| state.cache.contains(&step.id))
                .collect();
            FailedRun {
                label: run.label,
                steps,
            }
        };
        if run.steps.is_empty() {
            return None;
        }
        Some(self.execute_steps(format!("retry {}", run.label), run.steps).await)
    }

    pub fn has_failed_steps(&self) -> bool {
        self.state
            .read()
            .last_failed
            .as_ref()
            .is_some_and(|run| !run.steps.is_empty())
    }

    async fn execute_steps(&self, label: String, steps: Vec<BulkStep>) -> BulkOutcome {
        let outcome = bulk::execute(self.store.as_ref(), &label, &steps, |step| {
            self.state.write().reconcile(step);
        })
        .await;

        let failed: HashSet<&RsvpId> = outcome.failed_ids.iter().collect();
        let failed_steps: Vec<BulkStep> = steps
            .into_iter()
            .filter(|step| failed.contains(&step.id))
            .collect();

        let mut state = self.state.write();
        state.notify(bulk_notification(&label, &outcome));
        state.last_failed = (!failed_steps.is_empty()).then_some(FailedRun {
            label,
            steps: failed_steps,
        });
        outcome
    }

    /// Distinct non-empty groups on cached records plus the locally
    /// remembered custom names, sorted.
    pub async fn group_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = {
            let state = self.state.read();
            state
                .cache
                .records()
                .iter()
                .filter(|r| !r.group.is_empty())
                .map(|r| r.group.clone())
                .collect()
        };
        match self.group_store.list().await {
            Ok(custom) => names.extend(custom.into_iter().filter(|n| !n.is_empty())),
            Err(error) => warn!(error = %error, "Could not read custom group names"),
        }
        names.into_iter().collect()
    }

    /// The displayed rows, optionally restricted to the selection.
    pub fn export_csv(&self, layout: CsvLayout, selected_only: bool) -> Result<String, DashboardError> {
        let state = self.state.read();
        let mut rows = state.displayed();
        if selected_only {
            rows.retain(|r| state.selection.contains(&r.id));
        }
        export_service::export_csv(&rows, layout).map_err(|e| DashboardError::Export(e.to_string()))
    }

    pub async fn export_to_file(
        &self,
        layout: CsvLayout,
        selected_only: bool,
        path: &Path,
    ) -> Result<usize, DashboardError> {
        let rows: Vec<Rsvp> = {
            let state = self.state.read();
            state
                .displayed()
                .into_iter()
                .filter(|r| !selected_only || state.selection.contains(&r.id))
                .cloned()
                .collect()
        };
        let refs: Vec<&Rsvp> = rows.iter().collect();
        export_service::export_to_file(&refs, layout, path)
            .await
            .map_err(|e| DashboardError::Export(format!("{e:#}")))
    }

    /// Current seating plan, built from the cache on first use.
    pub fn seating_plan(&self) -> SeatingPlan {
        let mut state = self.state.write();
        if state.seating.is_none() {
            let plan = SeatingPlan::from_records(state.cache.records(), self.options.table_capacity);
            state.seating = Some(plan);
        }
        state
            .seating
            .clone()
            .unwrap_or_else(|| SeatingPlan::empty(self.options.table_capacity))
    }

    /// Discards unsaved moves; the next plan is rebuilt from the cache.
    pub fn reset_seating(&self) {
        let mut state = self.state.write();
        if state.seating.take().is_some() {
            state.notify(Notification::info("Unsaved seating changes discarded"));
        }
    }

    pub fn move_guest(&self, id: &RsvpId, table: u32) -> Result<(), DashboardError> {
        self.seating_plan();
        let mut state = self.state.write();
        let capacity = self.options.table_capacity;
        let result = state
            .seating
            .get_or_insert_with(|| SeatingPlan::empty(capacity))
            .move_to_table(id, table)
            .map_err(|error| match error {
                SeatingError::TableFull { table, capacity } => {
                    DashboardError::TableFull { table, capacity }
                }
                SeatingError::NotSeated { id } => DashboardError::RecordNotFound { id },
                SeatingError::InvalidTable => {
                    DashboardError::validation("assignedTable", "table numbers start at 1")
                }
            });
        if let Err(error) = &result {
            state.notify(Notification::error(UserErrorFormatter::format_dashboard_error(error)));
        }
        result
    }

    /// Persists every seated guest's table, one update at a time.
    pub async fn save_seating(&self) -> BulkOutcome {
        let steps: Vec<BulkStep> = {
            let plan = self.seating_plan();
            let state = self.state.read();
            plan.assignments()
                .into_iter()
                .filter(|(id, _)| state.cache.contains(id))
                .map(|(id, table)| BulkStep {
                    id,
                    action: StepAction::Update(RsvpPatch::assigned_table(table)),
                })
                .collect()
        };
        self.execute_steps("save seating".to_string(), steps).await
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut self.state.write().notifications)
    }

    fn notify_error(&self, error: &DashboardError) {
        self.state
            .write()
            .notify(Notification::error(UserErrorFormatter::format_dashboard_error(error)));
    }
}

fn bulk_notification(label: &str, outcome: &BulkOutcome) -> Notification {
    if outcome.success_count + outcome.error_count == 0 {
        Notification::info(format!("{label}: nothing to do"))
    } else if outcome.error_count == 0 {
        Notification::success(format!("{label}: {} succeeded", outcome.success_count))
    } else {
        Notification::error(format!(
            "{label}: {} succeeded, {} failed",
            outcome.success_count, outcome.error_count
        ))
    }
}
