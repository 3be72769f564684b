//! Interactive console standing in for a chat server.
//!
//! Every line read from stdin is either a command or chat text from the
//! current user in the current channel. Bot output goes to stdout.
use std::io::Write;

use anyhow::Result;
use async_trait::async_trait;
use catch_core::{ChannelId, GuildId, UserId};
use catch_runtime::{
    ChannelInfo, InboundMessage, RuleChange, RuntimeError, RuntimeHandle, SummonOutcome,
    Transport, TransportError,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{ConsoleCommand, HELP, SpawnCommand, parse_line};

/// The single server the console simulates.
pub const CONSOLE_GUILD: GuildId = GuildId(1);
pub const DEFAULT_CHANNEL: ChannelId = ChannelId(1);

/// Transport that prints to stdout.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), TransportError> {
        let mut out = std::io::stdout().lock();
        for line in text.lines() {
            writeln!(out, "[#{channel}] {line}").map_err(|e| TransportError::Send {
                channel,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    async fn fetch_channel(&self, channel: ChannelId) -> Result<ChannelInfo, TransportError> {
        Ok(ChannelInfo {
            id: channel,
            guild: Some(CONSOLE_GUILD),
            name: format!("channel-{channel}"),
        })
    }
}

struct Session {
    user: UserId,
    name: String,
    channel: ChannelId,
}

pub struct Console {
    handle: RuntimeHandle,
    session: Session,
}

impl Console {
    pub fn new(handle: RuntimeHandle, user: UserId) -> Self {
        Self {
            handle,
            session: Session {
                user,
                name: format!("user{user}"),
                channel: DEFAULT_CHANNEL,
            },
        }
    }

    /// Reads stdin until EOF or `/quit`.
    pub async fn run(mut self) -> Result<()> {
        println!("Type /help for commands.");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok(ConsoleCommand::Quit) => break,
                Ok(command) => {
                    if let Err(e) = self.execute(command).await {
                        println!("error: {e}");
                    }
                }
                Err(e) => println!("{e}"),
            }
        }
        Ok(())
    }

    async fn execute(&mut self, command: ConsoleCommand) -> Result<(), RuntimeError> {
        let session = &mut self.session;
        match command {
            ConsoleCommand::Say(text) => {
                let msg = InboundMessage::new(session.channel, CONSOLE_GUILD, session.user, text);
                self.handle.submit(msg).await?;
            }
            ConsoleCommand::As { user, name } => {
                session.user = user;
                session.name = name.unwrap_or_else(|| format!("user{user}"));
                println!("now speaking as {} ({user})", session.name);
            }
            ConsoleCommand::Channel(channel) => {
                session.channel = channel;
                println!("now in #{channel}");
            }
            ConsoleCommand::Summon => {
                let outcome = self
                    .handle
                    .summon(session.channel, session.user, session.name.clone())
                    .await?;
                if let SummonOutcome::Cooldown { remaining_secs } = outcome {
                    tracing::debug!(user = %session.user, remaining_secs, "summon on cooldown");
                }
            }
            ConsoleCommand::Inventory(group) => {
                let counts = self.handle.inventory(session.user).await?;
                let catalog = self.handle.catalog();
                let mut shown = 0;
                for item in catalog.filter_group(group) {
                    if let Some(count) = counts.get(item.key()) {
                        println!("{} ({}) x{count}", item.key(), item.display_name());
                        shown += 1;
                    }
                }
                if shown == 0 {
                    println!("{} has no {group} items yet.", session.name);
                }
            }
            ConsoleCommand::Progress => {
                let completion = self.handle.completion(session.user).await?;
                println!(
                    "{} has {} items, so their collection progress is {:.2}%",
                    session.name, completion.owned, completion.percent
                );
            }
            ConsoleCommand::Remaining => {
                let remaining = self.handle.remaining(session.user).await?;
                let keys: Vec<&str> = remaining.iter().map(|k| k.as_str()).collect();
                println!("{} left: {}", keys.len(), keys.join(", "));
            }
            ConsoleCommand::Spawn(spawn) => {
                if !self.handle.is_elevated(session.user) {
                    println!("You are not allowed to change spawn rules.");
                    return Ok(());
                }
                let channel = session.channel;
                self.spawn(channel, spawn)?;
            }
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => {}
        }
        Ok(())
    }

    fn spawn(&self, channel: ChannelId, command: SpawnCommand) -> Result<(), RuntimeError> {
        match command {
            SpawnCommand::Probability(value) => {
                let change = self.handle.set_probability(channel, CONSOLE_GUILD, value)?;
                println!("{}", describe(&change));
            }
            SpawnCommand::Interval(secs) => {
                let change = self.handle.set_interval(channel, CONSOLE_GUILD, secs)?;
                println!("{}", describe(&change));
            }
            SpawnCommand::Remove => {
                self.handle.remove_rule(channel)?;
                println!("Removed all spawn rules for #{channel}.");
            }
            SpawnCommand::List => {
                let rules = self.handle.rules(CONSOLE_GUILD);
                if rules.is_empty() {
                    println!("No spawn rules in this server.");
                }
                for rule in rules {
                    println!("#{}\n{}", rule.channel, rule.mode);
                }
            }
            SpawnCommand::Timers => {
                let timers = self.handle.timer_status(CONSOLE_GUILD);
                if timers.is_empty() {
                    println!("No timed channels in this server.");
                }
                for status in timers {
                    println!("#{}\n{status}", status.channel);
                }
            }
        }
        Ok(())
    }
}

/// One-line summary of a rule mutation for the admin who made it.
pub fn describe(change: &RuleChange) -> String {
    match change {
        RuleChange::Created(rule) => {
            format!("Created spawn rule for #{}:\n{}", rule.channel, rule.mode)
        }
        RuleChange::Updated { rule, .. } => {
            format!("Updated spawn rule for #{}:\n{}", rule.channel, rule.mode)
        }
        RuleChange::Degraded { cleared, rule } => format!(
            "Cleared the {cleared} of #{}; remaining rule:\n{}",
            rule.channel, rule.mode
        ),
        RuleChange::Removed(rule) => format!("Removed all spawn rules for #{}.", rule.channel),
        RuleChange::DimensionNotSet { dimension, rule } => {
            format!("#{} has no {dimension} to clear.", rule.channel)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catch_core::{Dimension, Interval, SpawnMode, SpawnRule};

    #[test]
    fn describes_changes() {
        let rule = SpawnRule::new(
            ChannelId(3),
            CONSOLE_GUILD,
            SpawnMode::Interval(Interval::new(60).unwrap()),
        );
        assert_eq!(
            describe(&RuleChange::Created(rule)),
            "Created spawn rule for #3:\nInterval: 60s"
        );
        assert_eq!(
            describe(&RuleChange::Degraded {
                cleared: Dimension::Probability,
                rule
            }),
            "Cleared the probability of #3; remaining rule:\nInterval: 60s"
        );
        assert_eq!(
            describe(&RuleChange::DimensionNotSet {
                dimension: Dimension::Probability,
                rule
            }),
            "#3 has no probability to clear."
        );
    }

    #[tokio::test]
    async fn console_channels_belong_to_the_console_guild() {
        let info = ConsoleTransport.fetch_channel(ChannelId(9)).await.unwrap();
        assert_eq!(info.guild, Some(CONSOLE_GUILD));
        assert!(ConsoleTransport.send(ChannelId(9), "hello\nworld").await.is_ok());
    }
}
