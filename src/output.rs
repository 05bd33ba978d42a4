//! Reporting for arrival boards: log lines, JSON and CSV append.

use anyhow::Result;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

use crate::arrivals::ArrivalBoard;
use crate::display::format_countdown;
use crate::model::Bound;
use csv::WriterBuilder;

/// Logs the board using Rust's debug pretty-print format.
pub fn print_pretty(board: &ArrivalBoard) {
    debug!("{:#?}", board);
}

/// Logs the board as pretty-printed JSON.
pub fn print_json(board: &ArrivalBoard) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(board)?);
    Ok(())
}

/// One line per arrival, roughly as the matrix would show it.
pub fn board_lines(board: &ArrivalBoard, now: i64) -> Vec<String> {
    let mut lines = Vec::new();
    for bound in Bound::ALL {
        lines.push(bound.label().to_string());
        let arrivals = board.get(bound);
        if arrivals.is_empty() {
            lines.push("  (no trains)".to_string());
        }
        for a in arrivals {
            lines.push(format!(
                "  {:<3} {:<16} {:>4}",
                a.route_id,
                a.destination,
                format_countdown(a.minutes_until(now))
            ));
        }
    }
    lines
}

/// A flattened arrival, one CSV row.
#[derive(Debug, Serialize)]
struct ArrivalRow<'a> {
    generated_at: String,
    bound: Bound,
    route_id: &'a str,
    destination: &'a str,
    arrival_epoch_seconds: i64,
    minutes_until: i64,
}

/// Appends every arrival on `board` as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &str, board: &ArrivalBoard) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    let now = board.generated_at.timestamp();
    let generated_at = board.generated_at.to_rfc3339();
    for bound in Bound::ALL {
        for a in board.get(bound) {
            writer.serialize(ArrivalRow {
                generated_at: generated_at.clone(),
                bound,
                route_id: &a.route_id,
                destination: &a.destination,
                arrival_epoch_seconds: a.arrival_epoch_seconds,
                minutes_until: a.minutes_until(now),
            })?;
        }
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Arrival;
    use std::fs;

    fn board() -> ArrivalBoard {
        let mut board = ArrivalBoard::empty();
        let now = board.generated_at.timestamp();
        board.northbound.push(Arrival {
            route_id: "R".to_string(),
            destination: "Whitehall St".to_string(),
            bound: Bound::Northbound,
            arrival_epoch_seconds: now + 300,
        });
        board
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&ArrivalBoard::empty());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&board()).unwrap();
    }

    #[test]
    fn test_board_lines() {
        let board = board();
        let lines = board_lines(&board, board.generated_at.timestamp());
        assert_eq!(lines[0], "NORTH BOUND");
        assert!(lines[1].contains("Whitehall St"));
        assert!(lines[1].ends_with("5m"));
        assert_eq!(lines[2], "SOUTH BOUND");
        assert_eq!(lines[3], "  (no trains)");
    }

    #[test]
    fn test_append_records_creates_file_once_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arrivals.csv");
        let path = path.to_str().unwrap();

        append_records(path, &board()).unwrap();
        append_records(path, &board()).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("generated_at,bound,route_id"));
        assert!(lines[1].contains(",northbound,R,Whitehall St,"));
        assert!(lines[1].ends_with(",5"));
    }
}
