pub mod session;

pub use session::{CommandResult, ShellFlavor, ShellSession};
