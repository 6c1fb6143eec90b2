pub mod computer;
pub mod traits;

pub use computer::ComputerTool;
pub use traits::Tool;
