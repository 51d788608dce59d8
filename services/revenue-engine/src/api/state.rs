use std::sync::Arc;

use crate::engine::RevenueEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RevenueEngine>,
}

impl AppState {
    pub fn new(engine: Arc<RevenueEngine>) -> Self {
        Self { engine }
    }
}
