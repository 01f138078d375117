//! Gateways to the external tools and the backup orchestrator built on them.

pub mod backup_service;
pub mod confirm;
pub mod database_service;
pub mod naming;
pub mod process;
pub mod scratch;
pub mod storage_service;

#[cfg(test)]
pub(crate) mod testing;
