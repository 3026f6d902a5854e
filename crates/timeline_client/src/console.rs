//! Plain-text presentation loop: turns input lines into session actions and prints
//! live activity, replies and archived history.

use std::io::{self, Write};
use std::sync::Arc;

use agent_timeline::{ActivityRecord, ClientConfig, Message, Persona};
use agent_transport::TransportProfile;

use crate::commands::{parse_slash_command, SlashCommand};
use crate::runtime::{lock_unpoisoned, RuntimeController};

pub const HELP_TEXT: &str = "Commands: /help, /cancel, /retry, /history, /quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<W: Write> {
    runtime: Arc<RuntimeController>,
    persona: Persona,
    reasoning_model: String,
    out: W,
    printed_live: usize,
    awaiting_reply: bool,
}

impl<W: Write> Console<W> {
    pub fn new(runtime: Arc<RuntimeController>, config: &ClientConfig, out: W) -> Self {
        Self {
            runtime,
            persona: config.persona,
            reasoning_model: config.reasoning_model.clone(),
            out,
            printed_live: 0,
            awaiting_reply: false,
        }
    }

    pub fn greet(&mut self, profile: &TransportProfile) -> io::Result<()> {
        writeln!(
            self.out,
            "Connected to '{}' via {} as {} using {}. {HELP_TEXT}",
            profile.assistant_id, profile.transport_id, self.persona, self.reasoning_model
        )?;
        self.out.flush()
    }

    /// True until the submitted turn's outcome has been printed.
    pub fn is_busy(&self) -> bool {
        self.awaiting_reply || lock_unpoisoned(self.runtime.session()).is_working()
    }

    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        if let Some(command) = parse_slash_command(line) {
            return self.handle_command(command);
        }

        let session = Arc::clone(self.runtime.session());
        let mut session = lock_unpoisoned(&session);

        if let Some(error) = session.last_error() {
            writeln!(self.out, "Error: {error}. Use /retry to start over.")?;
            return Ok(Flow::Continue);
        }

        if session.is_working() {
            writeln!(self.out, "A turn is already running. Use /cancel to stop it.")?;
            return Ok(Flow::Continue);
        }

        let mut host = self.runtime.host();
        if session
            .submit(&mut host, line, self.persona, &self.reasoning_model)
            .is_some()
        {
            self.printed_live = 0;
            self.awaiting_reply = true;
        } else if let Some(error) = session.last_error() {
            writeln!(self.out, "Error: {error}")?;
        }

        Ok(Flow::Continue)
    }

    fn handle_command(&mut self, command: SlashCommand) -> io::Result<Flow> {
        let session = Arc::clone(self.runtime.session());
        let mut session = lock_unpoisoned(&session);

        match command {
            SlashCommand::Help => writeln!(self.out, "{HELP_TEXT}")?,
            SlashCommand::Cancel => {
                let was_working = session.is_working();
                let mut host = self.runtime.host();
                session.cancel(&mut host);
                self.printed_live = 0;
                self.awaiting_reply = false;
                if was_working {
                    writeln!(self.out, "Turn cancelled. Session reset.")?;
                } else {
                    writeln!(self.out, "Session reset.")?;
                }
            }
            SlashCommand::Retry => {
                // Also stops an in-flight worker so the next submit is accepted.
                let mut host = self.runtime.host();
                session.cancel(&mut host);
                self.printed_live = 0;
                self.awaiting_reply = false;
                writeln!(self.out, "Session reset.")?;
            }
            SlashCommand::History => {
                let mut archived = 0usize;
                for message in session.messages().iter().filter(|message| message.is_agent()) {
                    let Some(activity) = session.activity_for(message) else {
                        continue;
                    };
                    archived += 1;
                    writeln!(self.out, "{}", format_reply(message))?;
                    for record in activity {
                        writeln!(self.out, "  {}", format_activity(record))?;
                    }
                }
                if archived == 0 {
                    writeln!(self.out, "No archived activity yet.")?;
                }
            }
            SlashCommand::Quit => return Ok(Flow::Quit),
            SlashCommand::Unknown(command) => {
                writeln!(self.out, "Unknown command: {command}")?;
            }
        }

        self.out.flush()?;
        Ok(Flow::Continue)
    }

    /// Applies pending transport events and prints whatever they changed.
    pub fn poll(&mut self) -> io::Result<()> {
        self.runtime.flush_pending_events();

        let session = Arc::clone(self.runtime.session());
        let session = lock_unpoisoned(&session);

        if !self.awaiting_reply {
            return Ok(());
        }

        let records = session.live_timeline().records();
        for record in records.iter().skip(self.printed_live) {
            writeln!(self.out, "  {}", format_activity(record))?;
        }
        self.printed_live = self.printed_live.max(records.len());

        if !session.is_working() {
            self.awaiting_reply = false;

            if let Some(error) = session.last_error() {
                writeln!(self.out, "Error: {error}. Use /retry to start over.")?;
            } else if let Some(reply) = session.messages().last().filter(|m| m.is_agent()) {
                writeln!(self.out, "{}", format_reply(reply))?;
                match session.activity_for(reply) {
                    Some(activity) => {
                        writeln!(self.out, "  (activity archived: {} steps)", activity.len())?
                    }
                    None => writeln!(self.out, "  (activity not archived)")?,
                }
            }
        }

        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn format_activity(record: &ActivityRecord) -> String {
    format!("· {}: {}", record.title, record.description)
}

pub fn format_reply(message: &Message) -> String {
    match message.tool {
        Some(tool) => format!("agent [{}]: {}", tool.as_str(), message.content),
        None => format!("agent: {}", message.content),
    }
}
