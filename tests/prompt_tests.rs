use std::io::Cursor;

use todo_cli::prompt::Console;

fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
    Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

#[test]
fn choice_accepts_number_name_and_default() {
    let options = vec!["Low".to_string(), "High".to_string()];
    let mut c = console("2\nlow\n\n");
    assert_eq!(c.choice("Priority", &options, 0).unwrap(), 1);
    assert_eq!(c.choice("Priority", &options, 1).unwrap(), 0);
    assert_eq!(c.choice("Priority", &options, 1).unwrap(), 1);
}

#[test]
fn choice_reasks_on_invalid_input() {
    let options = vec!["A".to_string(), "B".to_string()];
    let mut c = console("9\nnope\nb\n");
    assert_eq!(c.choice("Pick", &options, 0).unwrap(), 1);
    let out = String::from_utf8(c.into_output()).unwrap();
    assert!(out.contains("Value \"9\" is invalid."));
    assert!(out.contains("Value \"nope\" is invalid."));
}

#[test]
fn closed_input_falls_back_to_defaults() {
    let options = vec!["A".to_string(), "B".to_string()];
    let mut c = console("");
    assert_eq!(c.ask("Name").unwrap(), "");
    assert_eq!(c.choice("Pick", &options, 1).unwrap(), 1);
    assert!(!c.confirm("Sure?", false).unwrap());
}
