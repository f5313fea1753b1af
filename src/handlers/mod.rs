pub mod roster;
pub mod vault;
