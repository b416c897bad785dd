//! Configuration stores served from refreshed snapshots.
//!
//! This module bundles the hidden-fee schedules, the region rate table and
//! the hidden-fee exemption allow list, and starts their refresh tasks.

mod allow_list;
mod hidden_fee;
mod info;
mod region;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::{CacheRefresher, Refreshable, RowSource};
use crate::config::CacheSettings;
use crate::error::EngineResult;

pub use allow_list::{AllowListStore, HIDDEN_FEE_EXEMPT_DOMAIN};
pub use hidden_fee::{HIDDEN_FEE_DOMAIN, HiddenFeeStore, RuleBrief, RuleDetail};
pub use info::{ConfigInfo, ConfigInfoQuery};
pub use region::{REGION_RATE_DOMAIN, RegionRate, RegionStore, RegionTable, decode_region_table};

/// The configuration stores read by the pricing service.
#[derive(Clone)]
pub struct ConfigStores {
    /// Hidden-fee schedules.
    pub hidden_fee: Arc<HiddenFeeStore>,
    /// Region rate table.
    pub region: Arc<RegionStore>,
    /// Shops exempt from the hidden fee.
    pub allow_list: Arc<AllowListStore>,
}

impl ConfigStores {
    /// Creates empty stores that all read from `source`.
    pub fn new(source: Arc<dyn RowSource>, settings: &CacheSettings) -> Self {
        Self {
            hidden_fee: Arc::new(HiddenFeeStore::new(source.clone(), settings.batch_size)),
            region: Arc::new(RegionStore::new(source.clone(), settings.batch_size)),
            allow_list: Arc::new(AllowListStore::new(
                HIDDEN_FEE_EXEMPT_DOMAIN,
                source,
                settings.batch_size,
            )),
        }
    }

    /// Returns true once every store has published a snapshot.
    pub fn is_ready(&self) -> bool {
        self.hidden_fee.is_ready() && self.region.is_ready() && self.allow_list.is_ready()
    }

    /// Warms up every store, then spawns their refresh loops.
    ///
    /// Resolves only after each store has loaded once; the loops stop when
    /// `cancel` is triggered.
    pub async fn start(
        &self,
        settings: &CacheSettings,
        cancel: CancellationToken,
    ) -> EngineResult<Vec<JoinHandle<()>>> {
        let targets: [Arc<dyn Refreshable>; 3] = [
            self.hidden_fee.clone(),
            self.region.clone(),
            self.allow_list.clone(),
        ];
        let [hidden_fee, region, allow_list] =
            targets.map(|target| CacheRefresher::new(target, settings, cancel.clone()));

        tokio::try_join!(hidden_fee.warm_up(), region.warm_up(), allow_list.warm_up())?;
        info!("Configuration stores ready");

        Ok(vec![hidden_fee.spawn(), region.spawn(), allow_list.spawn()])
    }
}
