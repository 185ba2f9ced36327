// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive commands read from stdin.

use busline::{AppState, BoardingAction};

pub const HELP: &str = "\
Commands:
  fg              App moved to the foreground
  bg              App moved to the background
  restart         Tear down and start a new session
  status          Show connection state
  vehicles        List known vehicle positions
  board <id>      Report boarding a vehicle
  alight <id>     Report leaving a vehicle
  query [id]      Ask the server for vehicle status
  quit            Clean up and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Lifecycle(AppState),
    Restart,
    Status,
    Vehicles,
    Boarding {
        vehicle_id: String,
        action: BoardingAction,
    },
    Query(Option<String>),
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next().map(str::to_string);
    if words.next().is_some() {
        return Err(format!("too many arguments to '{}'", verb));
    }

    let command = match (verb, arg) {
        ("fg", None) => ConsoleCommand::Lifecycle(AppState::Foreground),
        ("bg", None) => ConsoleCommand::Lifecycle(AppState::Background),
        ("restart", None) => ConsoleCommand::Restart,
        ("status", None) => ConsoleCommand::Status,
        ("vehicles", None) => ConsoleCommand::Vehicles,
        ("board", Some(vehicle_id)) => ConsoleCommand::Boarding {
            vehicle_id,
            action: BoardingAction::Board,
        },
        ("alight", Some(vehicle_id)) => ConsoleCommand::Boarding {
            vehicle_id,
            action: BoardingAction::Alight,
        },
        ("board" | "alight", None) => return Err(format!("'{}' needs a vehicle id", verb)),
        ("query", vehicle_id) => ConsoleCommand::Query(vehicle_id),
        ("help", None) => ConsoleCommand::Help,
        ("quit" | "exit", None) => ConsoleCommand::Quit,
        (verb, _) => return Err(format!("unknown command '{}' (try 'help')", verb)),
    };
    Ok(Some(command))
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
