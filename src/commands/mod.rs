pub mod check;
pub mod detail;
pub mod kill;

pub use check::CheckCommand;
pub use detail::DetailCommand;
pub use kill::KillCommand;
