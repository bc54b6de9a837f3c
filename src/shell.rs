//! the interactive command prompt around a [`Scheduler`]

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    alarm::{AlarmId, DaySet},
    scheduler::Scheduler,
};

pub const HELP: &str = "\
Available Commands:
  add <time> <description> [repeat_days] [sound_file]
      add 07:30 \"Wake up for work\"
      add 09:00 \"Daily meeting\" 0,1,2,3,4
      add 10:00 \"Long run\" weekends
      add 18:00 \"End of day\" alarm.wav
  list                  list all alarms
  remove <alarm_id>     remove an alarm
  toggle <alarm_id>     turn an alarm on or off
  start                 start the alarm clock
  stop                  stop the alarm clock
  stop_sound            stop the sound that is playing
  help                  show this message
  quit                  exit

Time Format:
  24-hour: HH:MM (e.g. 07:30)
  12-hour: HH:MM AM/PM (e.g. 07:30 AM)

Repeat Days:
  0 = Monday, 1 = Tuesday, ..., 6 = Sunday
  e.g. 0,1,2,3,4 for weekdays, or one of weekdays, weekends, daily";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        time: String,
        description: String,
        repeat_days: Vec<u8>,
        sound_file: Option<PathBuf>,
    },
    List,
    Remove(String),
    Toggle(String),
    Start,
    Stop,
    StopSound,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Unknown command `{0}`. Type 'help' for available commands.")]
    Unknown(String),
    #[error("couldn't read command, check the quotes")]
    Quotes,
}

/// reads a comma separated day list or one of the named presets
fn parse_days(token: &str) -> Option<Vec<u8>> {
    match token.to_ascii_lowercase().as_str() {
        "weekdays" => return Some(DaySet::WEEKDAYS.indices()),
        "weekends" => return Some(DaySet::WEEKENDS.indices()),
        "daily" | "everyday" => return Some(DaySet::EVERY_DAY.indices()),
        _ => {}
    }
    token
        .split(',')
        .map(|day| day.trim().parse::<u8>().ok())
        .collect()
}

fn looks_like_sound_file(token: &str) -> bool {
    Path::new(token).extension().is_some() && parse_days(token).is_none()
}

fn parse_add(mut args: Vec<String>) -> Result<Command, CommandError> {
    const USAGE: &str = "add <time> <description> [repeat_days] [sound_file]";
    if args.len() < 2 {
        return Err(CommandError::Usage(USAGE));
    }
    let mut time = args.remove(0);
    if args
        .first()
        .is_some_and(|next| next.eq_ignore_ascii_case("am") || next.eq_ignore_ascii_case("pm"))
    {
        time = format!("{time} {}", args.remove(0));
    }

    // optional trailing arguments come off the end, the description always keeps one word
    let sound_file = if args.len() > 1 && args.last().is_some_and(|last| looks_like_sound_file(last)) {
        args.pop().map(PathBuf::from)
    } else {
        None
    };
    let repeat_days = match args.last().and_then(|last| parse_days(last)) {
        Some(days) if args.len() > 1 => {
            args.pop();
            days
        }
        _ => vec![],
    };
    if args.is_empty() {
        return Err(CommandError::Usage(USAGE));
    }
    Ok(Command::Add {
        time,
        description: args.join(" "),
        repeat_days,
        sound_file,
    })
}

/// # Errors
/// if the line isn't a known command or its arguments don't fit
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = shlex::split(line).ok_or(CommandError::Quotes)?;
    if words.is_empty() {
        return Ok(None);
    }
    let name = words.remove(0).to_lowercase();
    let single = |usage, words: Vec<String>| match <[String; 1]>::try_from(words) {
        Ok([id]) => Ok(id),
        Err(_) => Err(CommandError::Usage(usage)),
    };
    let command = match name.as_str() {
        "add" => parse_add(words)?,
        "list" => Command::List,
        "remove" => Command::Remove(single("remove <alarm_id>", words)?),
        "toggle" => Command::Toggle(single("toggle <alarm_id>", words)?),
        "start" => Command::Start,
        "stop" => Command::Stop,
        "stop_sound" => Command::StopSound,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(CommandError::Unknown(name)),
    };
    Ok(Some(command))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct Shell<'a> {
    scheduler: &'a Scheduler,
    time_format: String,
}

impl<'a> Shell<'a> {
    #[must_use]
    pub fn new(scheduler: &'a Scheduler, time_format: impl Into<String>) -> Self {
        Self {
            scheduler,
            time_format: time_format.into(),
        }
    }

    /// # Errors
    /// if writing to `out` fails
    pub fn execute(&self, command: Command, out: &mut impl Write) -> io::Result<Flow> {
        match command {
            Command::Add {
                time,
                description,
                repeat_days,
                sound_file,
            } => match self.scheduler.add(&time, description, &repeat_days, sound_file) {
                Ok(id) => writeln!(out, "Alarm added successfully with ID: {id}")?,
                Err(e) => writeln!(out, "Error: {e}")?,
            },
            Command::List => {
                let alarms = self.scheduler.list();
                if alarms.is_empty() {
                    writeln!(out, "No alarms set.")?;
                } else {
                    writeln!(out, "Current Alarms:")?;
                    for alarm in alarms {
                        writeln!(out, "\n{}", alarm.render(&self.time_format))?;
                    }
                }
            }
            Command::Remove(id) => {
                let removed = id
                    .parse::<AlarmId>()
                    .is_ok_and(|parsed| self.scheduler.remove(parsed));
                if removed {
                    writeln!(out, "Alarm {id} removed successfully.")?;
                } else {
                    writeln!(out, "Alarm {id} not found.")?;
                }
            }
            Command::Toggle(id) => {
                let toggled = id
                    .parse::<AlarmId>()
                    .is_ok_and(|parsed| self.scheduler.toggle(parsed));
                if toggled {
                    writeln!(out, "Alarm {id} toggled successfully.")?;
                } else {
                    writeln!(out, "Alarm {id} not found.")?;
                }
            }
            Command::Start => {
                self.scheduler.start();
                writeln!(out, "Alarm clock started.")?;
            }
            Command::Stop => {
                self.scheduler.stop();
                writeln!(out, "Alarm clock stopped.")?;
            }
            Command::StopSound => {
                if self.scheduler.stop_sound() {
                    writeln!(out, "Sound stopped successfully.")?;
                } else {
                    writeln!(out, "No sound is currently playing.")?;
                }
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// reads commands until `quit` or the end of `input`
    ///
    /// # Errors
    /// if reading `input` or writing `out` fails
    pub fn run(&self, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        write!(out, "Enter command: ")?;
        out.flush()?;
        for line in input.lines() {
            match parse_command(&line?) {
                Ok(Some(command)) => {
                    if self.execute(command, out)? == Flow::Quit {
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(e) => writeln!(out, "{e}")?,
            }
            write!(out, "Enter command: ")?;
            out.flush()?;
        }
        Ok(())
    }
}
