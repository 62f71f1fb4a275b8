pub mod api;
pub mod calendar;
pub mod config;
pub mod day_view;
pub mod errors;
pub mod grid;
pub mod models;
pub mod permalink;
pub mod poem_card;
pub mod remote;
pub mod route;
pub mod saved_poem;
pub mod scope;
pub mod session;
pub mod ui;

pub use api::{HttpApi, RabbitApi};
pub use config::ClientConfig;
pub use route::Route;
pub use session::{Session, View};
