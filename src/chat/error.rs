use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    /// Transport failure or non-success status from the LLM or tool server
    #[error("Connection error: {0}")]
    Connection(String),

    /// A response that does not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The tool server reported a failure; fed back to the model as text
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Tool arguments from the model could not be parsed; aborts the exchange
    #[error("Invalid arguments for tool {tool}: {reason}")]
    Argument { tool: String, reason: String },

    #[error("Model still requested tools after {0} tool rounds")]
    RoundLimit(usize),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Protocol(err.to_string())
        } else {
            ChatError::Connection(err.to_string())
        }
    }
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;
