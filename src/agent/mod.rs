pub mod agent_loop;
pub mod logging;
pub mod memory;
pub mod system_prompt;

pub use agent_loop::Agent;
