use crate::config::Config;
use crate::db::PgStore;
use std::sync::Arc;
use tera::Tera;

pub struct AppState<S = PgStore> {
    pub store: S,
    pub config: Arc<Config>,
    pub tera: Arc<Tera>,
}
