use tokio::sync::broadcast;

use crate::db::{DbPool, OrmConn};
use crate::events::OrderEvent;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub events: broadcast::Sender<OrderEvent>,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        let (events, _) = broadcast::channel(crate::events::EVENT_BUFFER);
        Self { pool, orm, events }
    }
}
