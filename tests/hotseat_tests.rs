//! Hot-seat game driven by scripted input

use std::io::Cursor;

use chess_arena::hotseat::{run, HotseatConfig, HotseatEnd};
use chess_engine::{Color, GameOutcome};

fn play(config: &HotseatConfig, script: &str) -> (HotseatEnd, String) {
    let mut output = Vec::new();
    let end = run(config, Cursor::new(script.to_string()), &mut output).expect("game runs");
    (end, String::from_utf8(output).expect("utf-8 output"))
}

#[test]
fn test_fools_mate_ends_with_black_win() {
    let config = HotseatConfig {
        white: "ann".to_string(),
        black: "bob".to_string(),
        ..HotseatConfig::default()
    };
    let (end, output) = play(&config, "f2f3\ne7e5\ng2g4\nd8h4\n");

    assert_eq!(end, HotseatEnd::Finished(GameOutcome::Black));
    assert!(output.contains("ann, enter your move"));
    assert!(output.contains("bob, enter your move"));
    assert!(output.contains("Game over! Result: black (checkmate)"));
}

#[test]
fn test_bad_input_reprompts() {
    let (end, output) = play(&HotseatConfig::default(), "e9e4\ne2e5\ne2e4\nquit\n");

    assert_eq!(end, HotseatEnd::Quit);
    assert!(output.contains("Invalid move format, please try again."));
    assert!(output.contains("Illegal move, please try again."));
    // After the legal e2e4 it is Black's turn
    assert!(output.contains("Black, enter your move in UCI format (e.g. e7e5)"));
}

#[test]
fn test_end_of_input_quits() {
    let (end, output) = play(&HotseatConfig::default(), "e2e4\n");
    assert_eq!(end, HotseatEnd::Quit);
    assert!(!output.contains("Game over!"));
}

#[test]
fn test_engine_plays_its_color() {
    let config = HotseatConfig {
        engine: Some(Color::White),
        depth: 1,
        ..HotseatConfig::default()
    };
    let (end, output) = play(&config, "quit\n");

    assert_eq!(end, HotseatEnd::Quit);
    assert!(output.contains("White (engine) plays b1a3"));
    assert!(output.contains("Black, enter your move"));
}
