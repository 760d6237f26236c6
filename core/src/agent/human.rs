//! Interactive agent
//!
//! Shows the observation to a person and returns whatever they type.

use super::{check_model_name, Agent};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};
use tokio::sync::Mutex;

/// Prompt written after the observation
pub const ACTION_PROMPT: &str = "Please enter the action: ";

/// Human agent reading actions from a line-oriented input.
///
/// Defaults to the process terminal; any reader/writer pair can be injected
/// with [`HumanAgent::with_io`].
pub struct HumanAgent<R = BufReader<Stdin>, W = Stdout> {
    model_name: String,
    io: Mutex<(R, W)>,
}

impl HumanAgent {
    /// Human agent bound to stdin/stdout
    pub fn new(model_name: &str) -> Result<Self> {
        Self::with_io(
            model_name,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
    }
}

impl<R, W> HumanAgent<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn with_io(model_name: &str, reader: R, writer: W) -> Result<Self> {
        Ok(Self {
            model_name: check_model_name(model_name)?,
            io: Mutex::new((reader, writer)),
        })
    }

    /// Give back the reader and writer
    pub fn into_io(self) -> (R, W) {
        self.io.into_inner()
    }
}

#[async_trait]
impl<R, W> Agent for HumanAgent<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn try_act(&self, observation: &str) -> Result<String> {
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;

        writer.write_all(observation.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.write_all(ACTION_PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(AgentError::InputClosed);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ERROR_PREFIX;

    #[tokio::test]
    async fn test_returns_typed_line() {
        let agent = HumanAgent::with_io("human", &b"hello\n"[..], Vec::new()).unwrap();
        assert_eq!(agent.act("You see a door.").await, "hello");

        let (_, output) = agent.into_io();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, "You see a door.\nPlease enter the action: ");
    }

    #[tokio::test]
    async fn test_line_kept_verbatim() {
        let agent =
            HumanAgent::with_io("human", &b"  [move] e2e4  \r\nsecond\n"[..], Vec::new()).unwrap();
        assert_eq!(agent.try_act("board").await.unwrap(), "  [move] e2e4  ");
        assert_eq!(agent.try_act("board").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let agent = HumanAgent::with_io("human", &b"pass"[..], Vec::new()).unwrap();
        assert_eq!(agent.try_act("obs").await.unwrap(), "pass");
    }

    #[tokio::test]
    async fn test_end_of_input() {
        let agent = HumanAgent::with_io("human", &b""[..], Vec::new()).unwrap();
        assert!(matches!(
            agent.try_act("obs").await,
            Err(AgentError::InputClosed)
        ));
        assert!(agent.act("obs").await.starts_with(ERROR_PREFIX));
    }

    #[test]
    fn test_name_required() {
        let err = HumanAgent::with_io("", &b""[..], Vec::new()).err().unwrap();
        assert!(err.is_configuration());

        let agent = HumanAgent::with_io("player-1", &b""[..], Vec::new()).unwrap();
        assert_eq!(agent.name(), "player-1");
    }
}
