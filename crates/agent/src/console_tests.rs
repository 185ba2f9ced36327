// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    foreground = { "fg", ConsoleCommand::Lifecycle(AppState::Foreground) },
    background = { "bg", ConsoleCommand::Lifecycle(AppState::Background) },
    restart = { "restart", ConsoleCommand::Restart },
    status = { "  status  ", ConsoleCommand::Status },
    vehicles = { "vehicles", ConsoleCommand::Vehicles },
    query_all = { "query", ConsoleCommand::Query(None) },
    query_one = { "query B7", ConsoleCommand::Query(Some("B7".to_string())) },
    help = { "help", ConsoleCommand::Help },
    quit = { "quit", ConsoleCommand::Quit },
    exit = { "exit", ConsoleCommand::Quit },
)]
fn parses(line: &str, expected: ConsoleCommand) {
    assert_eq!(parse(line).unwrap(), Some(expected));
}

#[test]
fn parses_boarding() {
    assert_eq!(
        parse("board B7").unwrap(),
        Some(ConsoleCommand::Boarding {
            vehicle_id: "B7".to_string(),
            action: BoardingAction::Board,
        })
    );
    assert_eq!(
        parse("alight B7").unwrap(),
        Some(ConsoleCommand::Boarding {
            vehicle_id: "B7".to_string(),
            action: BoardingAction::Alight,
        })
    );
}

#[test]
fn blank_line_is_ignored() {
    assert_eq!(parse("").unwrap(), None);
    assert_eq!(parse("   \t").unwrap(), None);
}

#[parameterized(
    unknown = { "teleport", "unknown command" },
    board_without_id = { "board", "needs a vehicle id" },
    alight_without_id = { "alight", "needs a vehicle id" },
    extra_argument = { "board B7 now", "too many arguments" },
    argument_to_bare_command = { "status now", "unknown command" },
)]
fn rejects(line: &str, message: &str) {
    let err = parse(line).unwrap_err();
    assert!(err.contains(message), "{}", err);
}
