use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::sheets::SheetSink;
use crate::stats::StatsCache;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub sheets: Arc<dyn SheetSink>,
    pub stats_cache: StatsCache,
}
