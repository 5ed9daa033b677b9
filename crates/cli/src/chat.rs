//! # Interactive Chat
//!
//! A terminal loop over the Anti-To-Do chat endpoint. Lines starting with `/`
//! are commands; everything else is sent as a message.

use crate::{api_client::ApiClient, ui};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Intake used when `/new` starts a session.
pub struct Intake {
    pub role: String,
    pub industry: String,
    pub pains: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Recommendations,
    NewSession,
    Help,
    Quit,
    Unknown(&'a str),
    Message(&'a str),
    Empty,
}

fn parse_line(line: &str) -> Command<'_> {
    let line = line.trim();
    match line {
        "" => Command::Empty,
        "/recs" => Command::Recommendations,
        "/new" => Command::NewSession,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other if other.starts_with('/') => Command::Unknown(other),
        other => Command::Message(other),
    }
}

const HELP: &str = "Commands: /recs (recommendations), /new (new session), /help, /quit";

async fn new_session(client: &ApiClient, intake: &Intake) -> Result<i64> {
    let session = client
        .onboard(&intake.role, &intake.industry, &intake.pains)
        .await?;
    println!(
        "✅ Created session (Thread ID: {}), role: {}",
        session.thread_id,
        session.role_normalized.as_deref().unwrap_or(&intake.role)
    );
    Ok(session.thread_id)
}

/// Runs the chat loop until `/quit` or end of input.
pub async fn run(client: &ApiClient, thread_id: Option<i64>, intake: Intake) -> Result<()> {
    let mut thread_id = match thread_id {
        Some(id) => id,
        None => new_session(client, &intake).await?,
    };
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Unknown(cmd) => println!("Unknown command '{cmd}'. {HELP}"),
            Command::NewSession => match new_session(client, &intake).await {
                Ok(id) => thread_id = id,
                Err(e) => eprintln!("❌ {e}"),
            },
            Command::Recommendations => match client.recommendations(thread_id).await {
                Ok(recs) => print!("{}", ui::format_recommendations(&recs.items)),
                Err(e) => eprintln!("❌ {e}"),
            },
            Command::Message(message) => {
                info!(thread_id, "Sending chat message.");
                match client.chat(thread_id, message).await {
                    Ok(response) => println!("assistant> {}", response.reply),
                    Err(e) => eprintln!("❌ {e}"),
                }
            }
        }
    }

    println!("Bye.");
    Ok(())
}
