pub mod allowance;
pub mod db;
pub mod models;
pub mod plan_index;
pub mod quantity;
pub mod reconcile;
pub mod scaling;
pub mod service;
pub mod snapshot;
pub mod totals;
pub mod view;
