mod db;
mod orders;
mod webhooks;

pub use db::MemoryDatabase;
