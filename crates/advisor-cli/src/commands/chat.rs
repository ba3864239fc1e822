use crate::client::Client;
use advisor_core::session::{ChatMessage, ChatSessionSummary, MessageRole};
use anyhow::Result;
use colored::Colorize;

pub async fn send(client: &Client, text: &str, session: Option<&str>) -> Result<()> {
    client.require_login().await?;
    if let Some(session_id) = session {
        client
            .chat
            .switch_session(&ChatSessionSummary::new(session_id))
            .await;
    }

    let Some(session_id) = client.chat.send(text).await else {
        anyhow::bail!("Nothing to send.");
    };

    if let Some(reply) = client.chat.messages().await.last() {
        print_message(reply);
    }
    println!("{} {}", "Session:".bright_black(), session_id);
    Ok(())
}

pub async fn sessions(client: &Client) -> Result<()> {
    client.require_login().await?;
    let sessions = client.chat.refresh_sessions().await;
    if sessions.is_empty() {
        println!("{}", "No chat sessions yet.".bright_black());
        return Ok(());
    }

    for session in sessions {
        let when = session
            .last_message_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{}  {:>16}  {:>3} msgs  {}",
            session.session_id.bright_cyan(),
            when,
            session.message_count,
            session.preview
        );
    }
    Ok(())
}

pub async fn history(client: &Client, session_id: &str) -> Result<()> {
    client.require_login().await?;
    client
        .chat
        .switch_session(&ChatSessionSummary::new(session_id))
        .await;

    let messages = client.chat.messages().await;
    if messages.is_empty() {
        println!("{}", "No messages.".bright_black());
    }
    for message in &messages {
        print_message(message);
    }
    Ok(())
}

pub async fn clear_history(client: &Client, session_id: &str) -> Result<()> {
    client.require_login().await?;
    client
        .chat
        .switch_session(&ChatSessionSummary::new(session_id))
        .await;
    client.chat.clear_active_history().await?;
    println!("{}", format!("Cleared history of {}.", session_id).green());
    Ok(())
}

pub async fn instructions(client: &Client, text: Option<&str>) -> Result<()> {
    client.require_login().await?;
    let Some(text) = text else {
        let current = match client.auth.identity() {
            Some(identity) => client.chat.load_ongoing_instructions(&identity).await,
            None => String::new(),
        };
        if current.is_empty() {
            println!("{}", "No ongoing instructions.".bright_black());
        } else {
            println!("{}", current);
        }
        return Ok(());
    };

    client.chat.update_instructions(text).await?;
    client.auth.set_ongoing_instructions(text);
    if let Some(notice) = client.chat.messages().await.last() {
        print_message(notice);
    }
    Ok(())
}

fn print_message(message: &ChatMessage) {
    let stamp = message.timestamp.format("%H:%M").to_string().bright_black();
    if message.is_system {
        println!("{} {}", stamp, message.content.bright_yellow());
        return;
    }
    match message.role {
        MessageRole::User => println!("{} {}", stamp, message.content.bright_white()),
        MessageRole::Assistant if message.is_error => {
            println!("{} {}", stamp, message.content.red())
        }
        MessageRole::Assistant => {
            for line in message.content.lines() {
                println!("{} {}", stamp, line.bright_blue());
            }
        }
    }
}
