//! Wire types shared by the QSapien server and its clients.

pub mod api;
