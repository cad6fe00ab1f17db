//! Text commands that reconfigure a running engine.
//!
//! A reader thread parses lines from stdin and forwards them over a channel.
//! The frame loop drains the channel between frames, so the engine is only
//! ever touched from the processing thread.

use crate::segmentation::{BackgroundVariant, EdgeOperator, SegmentationEngine, SeedPoint};
use clap::ValueEnum;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SelectEdge(bool),
    SelectBackground(bool),
    PassThrough,
    Variant(BackgroundVariant),
    Operator(EdgeOperator),
    Threshold(f32),
    Inverse(bool),
    Seed { x: u32, y: u32 },
    ShowMask(bool),
    Reset,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match head.as_str() {
            "edge" => Command::SelectEdge(toggle("edge", &args)?),
            "background" | "bg" => Command::SelectBackground(toggle("background", &args)?),
            "off" | "pass" => Command::PassThrough,
            "variant" => Command::Variant(choice(
                "variant",
                &args,
                "adaptive-hue|frame-diff|seed-fill",
            )?),
            "operator" => Command::Operator(choice("operator", &args, "canny|sobel")?),
            "threshold" => match args.as_slice() {
                [value] => {
                    let value = value.parse().map_err(|_| bad("threshold", "a number"))?;
                    Command::Threshold(value)
                }
                _ => return Err(bad("threshold", "a number")),
            },
            "inverse" => Command::Inverse(toggle("inverse", &args)?),
            "seed" => match args.as_slice() {
                [x, y] => {
                    let x = x.parse().map_err(|_| bad("seed", "two pixel coordinates"))?;
                    let y = y.parse().map_err(|_| bad("seed", "two pixel coordinates"))?;
                    Command::Seed { x, y }
                }
                _ => return Err(bad("seed", "two pixel coordinates")),
            },
            "mask" => Command::ShowMask(toggle("mask", &args)?),
            "reset" => Command::Reset,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn bad(command: &'static str, expected: &'static str) -> ParseError {
    ParseError::BadArgument { command, expected }
}

// A bare toggle command means "on".
fn toggle(command: &'static str, args: &[&str]) -> Result<bool, ParseError> {
    match args {
        [] => Ok(true),
        [word] => match word.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" | "yes" => Ok(true),
            "off" | "false" | "0" | "no" => Ok(false),
            _ => Err(bad(command, "on or off")),
        },
        _ => Err(bad(command, "on or off")),
    }
}

fn choice<T: ValueEnum>(
    command: &'static str,
    args: &[&str],
    expected: &'static str,
) -> Result<T, ParseError> {
    match args {
        [word] => <T as ValueEnum>::from_str(word, true).map_err(|_| bad(command, expected)),
        _ => Err(bad(command, expected)),
    }
}

/// Apply a command. Seed points are clamped into `frame_size`.
/// Returns `false` when the command asks the loop to stop.
pub fn apply(engine: &mut SegmentationEngine, command: Command, frame_size: (u32, u32)) -> bool {
    tracing::debug!(?command, "applying control command");
    match command {
        Command::SelectEdge(on) => engine.select_edge(on),
        Command::SelectBackground(on) => engine.select_background(on),
        Command::PassThrough => {
            engine.select_edge(false);
            engine.select_background(false);
        }
        Command::Variant(variant) => engine.set_variant(variant),
        Command::Operator(operator) => engine.set_edge_operator(operator),
        Command::Threshold(value) => engine.set_edge_threshold(value),
        Command::Inverse(on) => engine.set_inverse(on),
        Command::Seed { x, y } => {
            let seed = SeedPoint::new(x, y).clamped(frame_size.0, frame_size.1);
            tracing::info!("seed point set to [{}, {}]", seed.x, seed.y);
            engine.set_seed(seed);
        }
        Command::ShowMask(on) => engine.set_show_mask(on),
        Command::Reset => engine.reset(),
        Command::Quit => return false,
    }
    true
}

/// Read commands from `input` line by line until EOF or the receiver hangs up.
pub fn forward_commands<R: BufRead>(input: R, commands: &Sender<Command>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Stopped reading controls: {}", e);
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if commands.send(command).is_err() {
                    return;
                }
            }
            Err(e) => tracing::warn!("Ignoring control input: {}", e),
        }
    }
}

/// Spawn the stdin reader.
pub fn spawn_stdin_reader(commands: Sender<Command>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("controls".into())
        .spawn(move || forward_commands(std::io::stdin().lock(), &commands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::Mode;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn test_parse_toggles() {
        assert_eq!("edge".parse::<Command>(), Ok(Command::SelectEdge(true)));
        assert_eq!("edge off".parse::<Command>(), Ok(Command::SelectEdge(false)));
        assert_eq!("BG on".parse::<Command>(), Ok(Command::SelectBackground(true)));
        assert_eq!("inverse no".parse::<Command>(), Ok(Command::Inverse(false)));
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!("seed 10 20".parse::<Command>(), Ok(Command::Seed { x: 10, y: 20 }));
        assert_eq!("threshold 42.5".parse::<Command>(), Ok(Command::Threshold(42.5)));
        assert_eq!(
            "variant diff".parse::<Command>(),
            Ok(Command::Variant(BackgroundVariant::FrameDiff))
        );
        assert_eq!(
            "operator SOBEL".parse::<Command>(),
            Ok(Command::Operator(EdgeOperator::Sobel))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(ParseError::Empty));
        assert!(matches!(
            "launch".parse::<Command>(),
            Err(ParseError::Unknown(_))
        ));
        assert!(matches!(
            "seed 1".parse::<Command>(),
            Err(ParseError::BadArgument { command: "seed", .. })
        ));
        assert!(matches!(
            "variant blue".parse::<Command>(),
            Err(ParseError::BadArgument { .. })
        ));
    }

    #[test]
    fn test_apply_clamps_seed() {
        let mut engine = SegmentationEngine::default();
        assert!(apply(&mut engine, Command::Seed { x: 900, y: 5 }, (640, 480)));
        assert_eq!(engine.seed(), SeedPoint::new(639, 5));
    }

    #[test]
    fn test_apply_pass_through_and_quit() {
        let mut engine = SegmentationEngine::default();
        apply(&mut engine, Command::SelectEdge(true), (4, 4));
        assert_eq!(engine.mode(), Mode::Edge);
        apply(&mut engine, Command::PassThrough, (4, 4));
        assert_eq!(engine.mode(), Mode::PassThrough);
        assert!(!apply(&mut engine, Command::Quit, (4, 4)));
    }

    #[test]
    fn test_forward_skips_bad_lines() {
        let (tx, rx) = mpsc::channel();
        let input = Cursor::new("edge\nnonsense\n\nthreshold 12\nquit\n");
        forward_commands(input, &tx);
        drop(tx);

        let received: Vec<Command> = rx.iter().collect();
        assert_eq!(
            received,
            vec![
                Command::SelectEdge(true),
                Command::Threshold(12.0),
                Command::Quit
            ]
        );
    }
}
