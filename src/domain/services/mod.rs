pub mod access;
pub mod auth_service;
pub mod directory;
pub mod ledger;
pub mod notifier;
pub mod registry;
