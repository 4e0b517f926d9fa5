pub mod config;
pub mod error;
pub mod external;
pub mod server;
pub mod structs;
pub mod trailing_window;
