//! Ask command handler.
//!
//! Sends one question, with any prior conversation, through the pipeline.

use super::{build_pipeline, render_result};
use clap::Args;
use docchat_core::{config::AppConfig, AppError, AppResult};
use docchat_knowledge::{
    is_blank_question, ChatReply, ChatRequest, HistoryEntry, NO_QUESTION_MESSAGE,
};
use std::path::{Path, PathBuf};

/// Ask one question against the document index
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Prior conversation message, oldest first (repeatable)
    #[arg(long = "history", value_name = "TEXT")]
    pub history: Vec<String>,

    /// JSON file holding the prior conversation
    #[arg(long, value_name = "FILE")]
    pub history_file: Option<PathBuf>,

    /// Output the reply as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let history = self.collect_history()?;
        let request = ChatRequest {
            question: self.question.clone(),
            history,
        };

        // Nothing to answer: reply without touching config or services
        if is_blank_question(request.question.as_deref()) {
            return self.print_reply(&ChatReply::NoQuestion {
                message: NO_QUESTION_MESSAGE.to_string(),
            });
        }

        let pipeline = build_pipeline(config)?;
        let reply = pipeline.handle(request).await;
        self.print_reply(&reply)?;

        match reply {
            ChatReply::Failure { error } => Err(AppError::Other(error)),
            _ => Ok(()),
        }
    }

    /// History from `--history-file` first, then any `--history` flags.
    fn collect_history(&self) -> AppResult<Vec<HistoryEntry>> {
        let mut history = match self.history_file {
            Some(ref path) => read_history_file(path)?,
            None => Vec::new(),
        };
        history.extend(self.history.iter().map(|t| HistoryEntry::from(t.as_str())));
        Ok(history)
    }

    fn print_reply(&self, reply: &ChatReply) -> AppResult<()> {
        if self.json {
            let json = serde_json::to_string_pretty(reply)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        match reply {
            ChatReply::NoQuestion { message } => println!("{}", message),
            ChatReply::Answer(result) => println!("{}", render_result(result)),
            // reported through the returned error
            ChatReply::Failure { .. } => {}
        }

        Ok(())
    }
}

/// Read a conversation from a JSON array of plain strings or
/// `{"role": ..., "text": ...}` objects.
pub fn read_history_file(path: &Path) -> AppResult<Vec<HistoryEntry>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::Serialization(format!(
            "Invalid history file {}: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_knowledge::Role;
    use std::fs;
    use tempfile::TempDir;

    fn command(history: &[&str], history_file: Option<PathBuf>) -> AskCommand {
        AskCommand {
            question: Some("And digital goods?".to_string()),
            history: history.iter().map(|s| s.to_string()).collect(),
            history_file,
            json: false,
        }
    }

    #[test]
    fn test_history_flags_keep_order() {
        let cmd = command(&["Refunds?", "30 days."], None);
        let history = cmd.collect_history().unwrap();

        assert_eq!(
            history,
            vec![HistoryEntry::from("Refunds?"), HistoryEntry::from("30 days.")]
        );
    }

    #[test]
    fn test_history_file_precedes_flags() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        fs::write(
            &path,
            r#"["Refunds?", {"role": "Assistant", "text": "30 days."}]"#,
        )
        .unwrap();

        let cmd = command(&["Thanks."], Some(path));
        let history = cmd.collect_history().unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history[0], HistoryEntry::from("Refunds?"));
        assert_eq!(
            history[1],
            HistoryEntry::Tagged {
                role: Role::Assistant,
                text: "30 days.".to_string()
            }
        );
        assert_eq!(history[2], HistoryEntry::from("Thanks."));
    }

    #[test]
    fn test_invalid_history_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        fs::write(&path, r#"{"not": "a list"}"#).unwrap();

        let result = read_history_file(&path);
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_blank_question_is_answered_without_config() {
        let cmd = AskCommand {
            question: Some("   ".to_string()),
            history: Vec::new(),
            history_file: None,
            json: true,
        };

        // Default config has no index name; the no-op path must not need one
        assert!(cmd.execute(&AppConfig::default()).await.is_ok());
    }
}
