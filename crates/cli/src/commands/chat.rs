//! Interactive chat loop.
//!
//! The pipeline is stateless, so the transcript lives here and the whole
//! of it is resubmitted with every question.

use super::{build_pipeline, render_result};
use clap::Args;
use docchat_core::{config::AppConfig, AppResult};
use docchat_knowledge::{is_blank_question, HistoryEntry, Role};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Commands that end the session.
const EXIT_WORDS: &[&str] = &["exit", "quit", "/exit", "/quit"];

/// Chat interactively, keeping the conversation between questions
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Print the sources under each answer
    #[arg(long)]
    pub show_sources: bool,
}

/// Conversation so far, with explicit roles.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<HistoryEntry>,
}

impl Transcript {
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Record one answered question.
    pub fn record(&mut self, question: &str, answer: &str) {
        self.entries.push(HistoryEntry::Tagged {
            role: Role::Human,
            text: question.to_string(),
        });
        self.entries.push(HistoryEntry::Tagged {
            role: Role::Assistant,
            text: answer.to_string(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ChatCommand {
    /// Execute the chat loop until EOF or an exit word.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat session");

        let pipeline = build_pipeline(config)?;
        let mut transcript = Transcript::default();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            prompt_marker()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let input = line.trim();

            if EXIT_WORDS.contains(&input) {
                break;
            }
            if input == "/reset" {
                transcript.clear();
                println!("(conversation cleared)");
                continue;
            }
            if is_blank_question(Some(input)) {
                continue;
            }

            match pipeline.answer(input, transcript.entries()).await {
                Ok(result) => {
                    if self.show_sources {
                        println!("{}", render_result(&result));
                    } else {
                        println!("{}", result.answer.trim_end());
                    }
                    transcript.record(input, &result.answer);
                }
                // a failed turn is reported and left out of the transcript
                Err(e) => {
                    tracing::error!("Question failed: {}", e);
                    eprintln!("error: {}", e);
                }
            }
        }

        tracing::info!(turns = transcript.entries().len(), "Chat session ended");
        Ok(())
    }
}

fn prompt_marker() -> AppResult<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_knowledge::normalize_entries;

    #[test]
    fn test_transcript_records_tagged_turns() {
        let mut transcript = Transcript::default();
        transcript.record("What is the refund policy?", "30 days.");
        transcript.record("And digital goods?", "Before download only.");

        let turns = normalize_entries(transcript.entries());
        let roles: Vec<Role> = turns.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::Human, Role::Assistant, Role::Human, Role::Assistant]
        );
        assert_eq!(turns[3].text, "Before download only.");
    }

    #[test]
    fn test_transcript_clear() {
        let mut transcript = Transcript::default();
        transcript.record("Hi", "Hello");
        transcript.clear();
        assert!(transcript.entries().is_empty());
    }
}
