use std::sync::Arc;

use huntbook_core::{BookingCoordinator, GuideDirectory};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<BookingCoordinator>,
    pub guides: Arc<dyn GuideDirectory>,
}

impl AppState {
    pub fn new(coordinator: BookingCoordinator, guides: Arc<dyn GuideDirectory>) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            guides,
        }
    }
}
