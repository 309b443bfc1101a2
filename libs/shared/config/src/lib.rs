use std::env;
use tracing::warn;

/// Default cap on rows returned by the booking list operations.
const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub scheduling_list_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let scheduling_list_limit = match env::var("SCHEDULING_LIST_LIMIT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("SCHEDULING_LIST_LIMIT is not a valid number, using default");
                DEFAULT_LIST_LIMIT
            }),
            Err(_) => DEFAULT_LIST_LIMIT,
        };

        Self {
            scheduling_list_limit,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scheduling_list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}
