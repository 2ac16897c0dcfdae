//! Chat command implementation.
//!
//! With `-m` each message is sent in order and the transcript printed.
//! Otherwise lines are read from stdin until EOF or `/exit`; `/clear`
//! starts over from the greeting.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use iterion_lib::assistant::{AssistantBackend, ChatMessage, ChatSession, Speaker};

use super::assistant_backend;
use crate::cli::{ChatArgs, Session};

/// Execute the chat command.
///
/// # Errors
///
/// Returns an error if stdin or stdout fails, or JSON serialization fails.
pub fn execute(args: &ChatArgs, session: &Session, json: bool) -> Result<()> {
    let backend = assistant_backend(&session.config.assistant);
    let project_count = session.scope().epics.len();
    let mut chat = ChatSession::new(backend, &session.org.name, project_count);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.message.is_empty() {
        let echo = !json;
        converse(&mut chat, io::stdin().lock(), &mut out, echo)?;
    } else {
        for message in &args.message {
            chat.send(message);
        }
        if !json {
            for message in chat.messages() {
                print_message(&mut out, message)?;
            }
        }
    }

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(chat.messages())?)?;
    }
    Ok(())
}

/// Drive a session from line input. Replies are written as they arrive
/// when `echo` is set.
fn converse<B, R, W>(chat: &mut ChatSession<B>, input: R, out: &mut W, echo: bool) -> Result<()>
where
    B: AssistantBackend,
    R: BufRead,
    W: Write,
{
    if echo {
        if let Some(greeting) = chat.messages().first() {
            print_message(out, greeting)?;
        }
    }
    for line in input.lines() {
        let line = line?;
        match line.trim() {
            "/exit" | "/quit" => break,
            "/clear" => {
                chat.clear();
                if echo {
                    writeln!(out, "(conversation cleared)")?;
                }
            }
            text => {
                if let Some(reply) = chat.send(text) {
                    if echo {
                        print_message(out, reply)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_message<W: Write>(out: &mut W, message: &ChatMessage) -> io::Result<()> {
    let label = match message.speaker {
        Speaker::User => "you",
        Speaker::Assistant => "ai",
    };
    writeln!(out, "{label}> {}", message.text)
}
