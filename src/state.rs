use std::sync::Arc;

use crate::{assets::PhotoStorage, db::OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub photos: PhotoStorage,
    pub jwt_secret: Arc<str>,
}
