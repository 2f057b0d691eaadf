pub mod check;
pub mod explain;

pub use check::CheckArgs;
