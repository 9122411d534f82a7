pub mod bootstrap;
pub mod config;
pub mod error;
pub mod keeper;
pub mod ledger;
pub mod middleware;
pub mod notifications;
pub mod server;

#[cfg(test)]
mod testing;
