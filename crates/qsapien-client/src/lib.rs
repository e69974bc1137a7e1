//! Client-side orchestration for QSapien.
//!
//! UI code dispatches [`state::Action`]s into a [`store::Store`]. Long-lived
//! watcher tasks listen for request actions and run the matching flow:
//! login (token, then the portal cascade) and signup (then navigate home).
//! Every slice of [`state::RootState`] is updated only through its reducer.

pub mod api;
pub mod app;
pub mod error;
pub mod history;
pub mod login;
pub mod signup;
pub mod state;
pub mod storage;
pub mod store;

pub use api::{HttpApi, PortalApi};
pub use app::ClientApp;
pub use error::ClientError;
