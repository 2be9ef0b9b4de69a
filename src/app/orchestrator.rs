//! Orchestration shared by the TUI and the CLI front-ends.
//!
//! The orchestrator owns all client state and is only ever touched from one
//! thread. Network calls run as tokio tasks that report back through an
//! unbounded channel; [`Orchestrator::apply`] handles one message at a time, so
//! a parse -> render step never interleaves with another render.
//!
//! Per material selection two tasks are spawned back to back (prices, vendors)
//! and each is applied as soon as it arrives. There is no join: a slow vendor
//! computation never holds back the chart, and a failure in one track leaves
//! the other one alone.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::controller::{FetchRequest, SelectionController, SelectionOutcome, Track, UploadController};
use crate::data::Gateway;
use crate::domain::{DatasetFiles, Material, PricePrediction, RecommendationResult, UploadReceipt};
use crate::error::RemoteError;
use crate::notify::{Notifier, Severity};
use crate::render::{
    ChartSlot, Region, TableRow, VendorSummary, build_chart_view, prediction_rows, vendor_rows,
    vendor_summary,
};

pub const EMPTY_MATERIALS_WARNING: &str = "No materials found. Please upload data files to begin.";
pub const UPLOAD_SUCCESS_FALLBACK: &str = "Upload successful.";

/// Results delivered by spawned gateway tasks.
#[derive(Debug)]
pub enum AppMessage {
    MaterialsLoaded(Result<Vec<Material>, RemoteError>),
    PricesResolved {
        cycle: u64,
        result: Result<PricePrediction, RemoteError>,
    },
    VendorsResolved {
        cycle: u64,
        result: Result<RecommendationResult, RemoteError>,
    },
    UploadFinished(Result<UploadReceipt, RemoteError>),
}

/// Snapshot of the controls' enablement state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub selected_material_id: Option<String>,
    pub fetch_in_flight: bool,
    pub upload_in_flight: bool,
}

/// Everything the analysis panel shows.
#[derive(Debug, Default)]
pub struct AnalysisView {
    /// Hidden until a non-empty material list has loaded.
    pub visible: bool,
    /// `Ready` carries the id of the chart held in `chart`.
    pub chart_region: Region<u64>,
    pub chart: ChartSlot,
    pub prediction_rows: Vec<TableRow>,
    pub vendor_detail: Region<VendorSummary>,
    pub vendor_rows: Vec<TableRow>,
    /// Last successful responses, kept for export.
    pub prediction: Option<PricePrediction>,
    pub recommendation: Option<RecommendationResult>,
}

pub struct Orchestrator {
    gateway: Arc<dyn Gateway>,
    runtime: Handle,
    tx: UnboundedSender<AppMessage>,
    rx: UnboundedReceiver<AppMessage>,
    pub selection: SelectionController,
    pub upload: UploadController,
    pub notifier: Notifier,
    pub view: AnalysisView,
    materials_loading: bool,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn Gateway>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            runtime,
            tx,
            rx,
            selection: SelectionController::new(),
            upload: UploadController::new(),
            notifier: Notifier::new(),
            view: AnalysisView::default(),
            materials_loading: false,
        }
    }

    pub fn ui_state(&self) -> UiState {
        UiState {
            selected_material_id: self.selection.selected().map(str::to_string),
            fetch_in_flight: self.selection.fetch_in_flight(),
            upload_in_flight: self.upload.spinner_visible(),
        }
    }

    pub fn materials_loading(&self) -> bool {
        self.materials_loading
    }

    /// Fetch the material list (startup and after a successful upload).
    pub fn load_materials(&mut self) {
        self.materials_loading = true;
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = gateway.list_materials().await;
            send(&tx, AppMessage::MaterialsLoaded(result));
        });
    }

    /// Selection-changed event. `index` is into `selection.options()`.
    pub fn on_selection_changed(&mut self, index: usize) {
        match self.selection.select(index) {
            SelectionOutcome::Suppressed => {
                tracing::debug!(index, "selection change ignored while fetch in flight");
            }
            SelectionOutcome::Cleared => {
                tracing::debug!("selection cleared");
            }
            SelectionOutcome::Fetch(req) => self.start_fetch(req),
        }
    }

    /// Fetch-triggered event (manual retry for the current selection).
    pub fn on_fetch_triggered(&mut self) {
        match self.selection.trigger() {
            Ok(Some(req)) => self.start_fetch(req),
            Ok(None) => tracing::debug!("fetch trigger ignored while fetch in flight"),
            Err(err) => self.notifier.notify(err.to_string(), Severity::Warning),
        }
    }

    /// Form-submitted event for the upload form.
    pub fn on_form_submitted(&mut self) {
        match self.upload.submit() {
            Ok(Some(files)) => self.start_upload(files),
            Ok(None) => tracing::debug!("upload submit ignored while uploading"),
            Err(err) => self.notifier.notify(err.to_string(), Severity::Warning),
        }
    }

    fn start_fetch(&mut self, req: FetchRequest) {
        tracing::info!(cycle = req.cycle, material_id = %req.material_id, "fetch cycle started");

        self.view.chart_region = Region::Loading("Loading price forecast...".to_string());
        self.view.vendor_detail = Region::Loading("Computing vendor recommendation...".to_string());
        self.view.vendor_rows.clear();
        self.view.prediction_rows.clear();

        let FetchRequest { cycle, material_id } = req;

        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        let id = material_id.clone();
        self.runtime.spawn(async move {
            let result = gateway.predict_prices(&id).await;
            send(&tx, AppMessage::PricesResolved { cycle, result });
        });

        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = gateway.recommend_vendor(&material_id).await;
            send(&tx, AppMessage::VendorsResolved { cycle, result });
        });
    }

    fn start_upload(&mut self, files: DatasetFiles) {
        tracing::info!(
            materials = %files.materials.display(),
            prices = %files.prices.display(),
            vendors = %files.vendors.display(),
            "upload started"
        );
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = gateway.upload_datasets(&files).await;
            send(&tx, AppMessage::UploadFinished(result));
        });
    }

    /// Apply every message that has already arrived. Returns `true` if any did.
    pub fn pump(&mut self) -> bool {
        let mut applied = false;
        while let Ok(msg) = self.rx.try_recv() {
            self.apply(msg);
            applied = true;
        }
        applied
    }

    /// Wait for the next message without applying it.
    pub async fn next_message(&mut self) -> Option<AppMessage> {
        self.rx.recv().await
    }

    pub fn apply(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::MaterialsLoaded(result) => self.apply_materials(result),
            AppMessage::PricesResolved { cycle, result } => self.apply_prices(cycle, result),
            AppMessage::VendorsResolved { cycle, result } => self.apply_vendors(cycle, result),
            AppMessage::UploadFinished(result) => self.apply_upload(result),
        }
    }

    fn apply_materials(&mut self, result: Result<Vec<Material>, RemoteError>) {
        self.materials_loading = false;
        match result {
            Ok(materials) if materials.is_empty() => {
                self.selection.set_materials(&[]);
                self.view.visible = false;
                self.notifier.notify(EMPTY_MATERIALS_WARNING, Severity::Warning);
            }
            Ok(materials) => {
                tracing::info!(count = materials.len(), "materials loaded");
                self.selection.set_materials(&materials);
                self.view.visible = true;
            }
            Err(err) => {
                self.selection.set_materials(&[]);
                self.view.visible = false;
                self.notifier.notify(err.message, Severity::Error);
            }
        }
    }

    fn apply_prices(&mut self, cycle: u64, result: Result<PricePrediction, RemoteError>) {
        if !self.selection.resolve(cycle, Track::Prices) {
            tracing::debug!(cycle, "stale price result dropped");
            return;
        }

        match result {
            Ok(prediction) => {
                tracing::info!(
                    cycle,
                    historical = prediction.historical.len(),
                    predictions = prediction.predictions.len(),
                    "price track resolved"
                );
                let chart_id = self.view.chart.render(build_chart_view(&prediction)).id;
                self.view.chart_region = Region::Ready(chart_id);
                self.view.prediction_rows = prediction_rows(&prediction.predictions);
                self.view.prediction = Some(prediction);
            }
            Err(err) => {
                self.view.chart.destroy();
                self.view.chart_region = Region::Error(err.message.clone());
                self.view.prediction_rows.clear();
                self.view.prediction = None;
                self.notifier.notify(err.message, Severity::Error);
            }
        }
    }

    fn apply_vendors(&mut self, cycle: u64, result: Result<RecommendationResult, RemoteError>) {
        if !self.selection.resolve(cycle, Track::Vendors) {
            tracing::debug!(cycle, "stale vendor result dropped");
            return;
        }

        match result {
            Ok(recommendation) => {
                tracing::info!(
                    cycle,
                    vendors = recommendation.all_vendors.len(),
                    best = %recommendation.best_vendor.vendor_id,
                    "vendor track resolved"
                );
                self.view.vendor_detail = Region::Ready(vendor_summary(&recommendation));
                self.view.vendor_rows = vendor_rows(&recommendation.all_vendors);
                self.view.recommendation = Some(recommendation);
            }
            Err(err) => {
                self.view.vendor_detail = Region::Error(err.message.clone());
                self.view.vendor_rows.clear();
                self.view.recommendation = None;
                self.notifier.notify(err.message, Severity::Error);
            }
        }
    }

    fn apply_upload(&mut self, result: Result<UploadReceipt, RemoteError>) {
        match result {
            Ok(receipt) => {
                self.upload.finish(true);
                let message = if receipt.message.trim().is_empty() {
                    UPLOAD_SUCCESS_FALLBACK.to_string()
                } else {
                    receipt.message
                };
                self.notifier.notify(message, Severity::Success);
                self.load_materials();
            }
            Err(err) => {
                self.upload.finish(false);
                self.notifier.notify(err.message, Severity::Error);
            }
        }
    }
}

fn send(tx: &UnboundedSender<AppMessage>, msg: AppMessage) {
    if tx.send(msg).is_err() {
        tracing::debug!("orchestrator gone; dropping gateway result");
    }
}
