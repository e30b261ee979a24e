use super::*;

#[test]
fn quoted_text_stays_one_argument() {
    let input = parse_shell_line(r#"edit c-1 --text "two words""#).expect("parse");
    match input {
        ShellInput::Command(Command::Edit { id, text, file }) => {
            assert_eq!(id, "c-1");
            assert_eq!(text.as_deref(), Some("two words"));
            assert!(file.is_none());
        }
        other => panic!("unexpected input: {other:?}"),
    }
}

#[test]
fn unquoted_topic_words_are_collected() {
    match parse_shell_line("generate clean ocean water").expect("parse") {
        ShellInput::Command(Command::Generate { topic }) => {
            assert_eq!(topic.join(" "), "clean ocean water");
        }
        other => panic!("unexpected input: {other:?}"),
    }
}

#[test]
fn blank_and_quit_lines_are_recognised() {
    assert!(matches!(parse_shell_line("   "), Ok(ShellInput::Blank)));
    assert!(matches!(parse_shell_line("quit"), Ok(ShellInput::Quit)));
    assert!(matches!(parse_shell_line(" exit "), Ok(ShellInput::Quit)));
}

#[test]
fn unbalanced_quote_is_reported() {
    let err = parse_shell_line(r#"edit c-1 --text "unterminated"#).expect_err("must fail");
    assert!(err.starts_with("error:"));
}

#[test]
fn unknown_command_renders_clap_error() {
    assert!(parse_shell_line("frobnicate").is_err());
}
