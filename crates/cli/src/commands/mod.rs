pub mod ask;
pub mod validate;

pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}
