//! Satchel Core — journal entity model, provider adapter contracts,
//! reconcile/merge engine, and the per-profile sync orchestrator.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod providers;
pub mod reconcile;
pub mod removal;
pub mod sync;
