pub mod chat;
pub mod rooms;
pub mod users;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}
