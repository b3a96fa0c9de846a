//! SeaORM entity definitions

pub mod lock;
pub mod prelude;
