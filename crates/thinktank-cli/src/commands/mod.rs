pub mod debate;
pub mod formats;
pub mod personalities;
