use std::{path::PathBuf, sync::Arc};

#[derive(Clone)]
pub struct AppState {
    pub data_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(data_path: PathBuf) -> Self {
        Self {
            data_path: Arc::new(data_path),
        }
    }
}
