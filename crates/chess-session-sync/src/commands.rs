//! Commands understood by the terminal client.

use chess_session_core::{GameState, Seat};
use thiserror::Error;

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move {
        from: String,
        to: String,
        promotion: Option<char>,
    },
    Undo,
    Reset,
    Load(String),
    Join { name: String, seat: Seat },
    Leave(String),
    Sync,
    Show,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `move` needs a source and target square
    #[error("Usage: move <from> <to> [q|r|b|n]")]
    MissingSquares,
    /// Promotion must be a single piece letter
    #[error("Invalid promotion '{0}'. Use one of q, r, b, n")]
    InvalidPromotion(String),
    /// `load` needs a FEN
    #[error("Usage: load <fen>")]
    MissingFen,
    /// `join` needs a name and a seat
    #[error("Usage: join <name> <w|b|s>")]
    MissingJoinArgs,
    #[error("Invalid seat '{0}'. Use w, b or s")]
    InvalidSeat(String),
    #[error("Usage: leave <name>")]
    MissingName,
    #[error("Unrecognized command '{0}'. Type 'help' to see available commands")]
    UnrecognizedCommand(String),
}

pub const HELP: &str = "\
move <from> <to> [q|r|b|n]  play a move
undo                        take back the last move
reset                       back to the starting position
load <fen>                  load a position
join <name> <w|b|s>         add a player or spectator
leave <name>                remove a player
sync                        fetch the shared board now
show                        print the board state
quit                        leave the session";

/// Parse one line of input
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match word {
        "move" | "m" => match args.as_slice() {
            [from, to] => Ok(Command::Move {
                from: from.to_string(),
                to: to.to_string(),
                promotion: None,
            }),
            [from, to, piece] => {
                let mut chars = piece.chars();
                match (chars.next(), chars.next()) {
                    (Some(p), None) if "qrbnQRBN".contains(p) => Ok(Command::Move {
                        from: from.to_string(),
                        to: to.to_string(),
                        promotion: Some(p.to_ascii_lowercase()),
                    }),
                    _ => Err(ParseError::InvalidPromotion(piece.to_string())),
                }
            }
            _ => Err(ParseError::MissingSquares),
        },
        "undo" => Ok(Command::Undo),
        "reset" => Ok(Command::Reset),
        "load" if rest.is_empty() => Err(ParseError::MissingFen),
        "load" => Ok(Command::Load(rest.to_string())),
        "join" => match args.as_slice() {
            [name, seat] => Seat::from_code(seat)
                .map(|seat| Command::Join {
                    name: name.to_string(),
                    seat,
                })
                .ok_or_else(|| ParseError::InvalidSeat(seat.to_string())),
            _ => Err(ParseError::MissingJoinArgs),
        },
        "leave" if rest.is_empty() => Err(ParseError::MissingName),
        "leave" => Ok(Command::Leave(rest.to_string())),
        "sync" => Ok(Command::Sync),
        "show" | "" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ParseError::UnrecognizedCommand(other.to_string())),
    }
}

/// Multi-line summary of a game for the terminal
pub fn render(game: &GameState) -> String {
    let mut out = format!("Turn {}\n{}\n{}\n", game.move_number(), game.status_line(), game.fen);

    if game.users.is_empty() {
        out.push_str("Add who is playing or spectating\n");
    }
    for user in game.users.iter() {
        out.push_str(&format!("  {:<9} {}\n", user.seat.label(), user.name));
    }
    out
}
