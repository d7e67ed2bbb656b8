use std::sync::Arc;

use tokio::sync::RwLock;

use crate::services::congestion::{AliasMap, CongestionTable, TokenSortScorer};
use crate::services::gazetteer::Gazetteer;
use crate::services::risk::IncidentTable;
use crate::services::searoute::SeaRouter;

pub mod datasets;
pub mod health;
pub mod portswitch;
pub mod voyage;

/// All uploaded datasets, replaced wholesale on each upload.
#[derive(Default)]
pub struct DataStore {
    pub gazetteer: Option<Gazetteer>,
    pub congestion: CongestionTable,
    pub aliases: AliasMap,
    pub incidents: IncidentTable,
}

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub datasets: Arc<RwLock<DataStore>>,
    pub router: Arc<SeaRouter>,
    /// Fuzzy scorer shared by all congestion resolutions.
    pub scorer: Arc<TokenSortScorer>,
}
