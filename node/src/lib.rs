pub mod blog;
pub mod opt;
pub mod seed;
