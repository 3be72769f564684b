//! Line commands typed into the console.
//!
//! Lines starting with `/` are commands; anything else is chat text posted
//! to the current channel as the current user.
use catch_core::{CategoryGroup, ChannelId, UserId};
use thiserror::Error;

pub const HELP: &str = "\
/as <user_id> [name]         speak as another user
/channel <channel_id>        switch channel
/summon                      summon a drop (hourly cooldown)
/inventory [group]           list caught items
/progress                    collection progress
/remaining                   items not caught yet
/spawn probability <p>       set drop chance per message (0 clears)
/spawn interval <secs>       set timed drops (0 clears)
/spawn remove                remove this channel's rules
/spawn list                  list rules of this server
/spawn timers                time until the next timed drops
/help
/quit";

#[derive(Clone, Debug, PartialEq)]
pub enum SpawnCommand {
    Probability(f64),
    Interval(i64),
    Remove,
    List,
    Timers,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConsoleCommand {
    Say(String),
    As { user: UserId, name: Option<String> },
    Channel(ChannelId),
    Summon,
    Inventory(CategoryGroup),
    Progress,
    Remaining,
    Spawn(SpawnCommand),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command `/{0}`; try /help")]
    Unknown(String),

    #[error("missing argument: {0}")]
    Missing(&'static str),

    #[error("invalid {what}: `{value}`")]
    Invalid { what: &'static str, value: String },
}

pub fn parse_line(line: &str) -> Result<ConsoleCommand, ParseError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ConsoleCommand::Say(line.to_owned()));
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default().to_lowercase();
    match name.as_str() {
        "as" => {
            let user = parse_arg(words.next(), "user id")?;
            let name = words.collect::<Vec<_>>().join(" ");
            Ok(ConsoleCommand::As {
                user,
                name: (!name.is_empty()).then_some(name),
            })
        }
        "channel" => Ok(ConsoleCommand::Channel(parse_arg(words.next(), "channel id")?)),
        "summon" => Ok(ConsoleCommand::Summon),
        "inventory" | "inv" => {
            let group = match words.next() {
                Some(word) => parse_arg(Some(word), "category group")?,
                None => CategoryGroup::All,
            };
            Ok(ConsoleCommand::Inventory(group))
        }
        "progress" => Ok(ConsoleCommand::Progress),
        "remaining" => Ok(ConsoleCommand::Remaining),
        "spawn" => parse_spawn(words.next(), words.next()).map(ConsoleCommand::Spawn),
        "help" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        _ => Err(ParseError::Unknown(name)),
    }
}

fn parse_spawn(sub: Option<&str>, value: Option<&str>) -> Result<SpawnCommand, ParseError> {
    match sub.map(str::to_lowercase).as_deref() {
        Some("probability") => Ok(SpawnCommand::Probability(parse_arg(value, "probability")?)),
        Some("interval") => Ok(SpawnCommand::Interval(parse_arg(value, "interval")?)),
        Some("remove") => Ok(SpawnCommand::Remove),
        Some("list") => Ok(SpawnCommand::List),
        Some("timers") => Ok(SpawnCommand::Timers),
        Some(other) => Err(ParseError::Invalid {
            what: "spawn subcommand",
            value: other.to_owned(),
        }),
        None => Err(ParseError::Missing("spawn subcommand")),
    }
}

fn parse_arg<T: std::str::FromStr>(
    word: Option<&str>,
    what: &'static str,
) -> Result<T, ParseError> {
    let word = word.ok_or(ParseError::Missing(what))?;
    word.parse().map_err(|_| ParseError::Invalid {
        what,
        value: word.to_owned(),
    })
}
