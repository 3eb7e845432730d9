pub mod memory;
pub mod models;
pub mod postgres;
pub mod repo;

pub use memory::MemoryUserRepo;
pub use models::{NewUser, Permission, Player, User};
pub use postgres::PgUserRepo;
pub use repo::{CreateOutcome, UserRepo};
