pub mod base;
pub mod calculator;
pub mod file_list;
pub mod file_read;
pub mod file_write;
pub mod http_get;
pub mod script_run;
pub mod time_now;

pub use base::{Tool, ToolResult};
pub use calculator::CalculatorTool;
pub use file_list::FileListTool;
pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use http_get::HttpGetTool;
pub use script_run::ScriptRunTool;
pub use time_now::TimeNowTool;
