//! SQLite storage: connection management and the settings table

mod connection;
mod settings;

pub use connection::Database;
pub use settings::{
    delete_setting, get_setting, load_api_base, reset_api_base, save_api_base, set_setting,
    API_BASE_KEY,
};
