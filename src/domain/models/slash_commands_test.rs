use super::SlashCommand;

#[test]
fn it_parse_empty_string() {
    let text = "";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_space_only() {
    let text = " ";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_single_slash() {
    let text = "/";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_invalid_prefix() {
    let text = "!q";
    assert!(SlashCommand::parse(text).is_none());
}

#[test]
fn it_parse_valid_prefix() {
    let text = "/q";
    let cmd = SlashCommand::parse(text);
    assert!(cmd.is_some());
    assert_eq!(cmd.unwrap().command, "/q");
}

#[test]
fn it_parse_plain_chat_text() {
    assert!(SlashCommand::parse("Hallo, wie geht's?").is_none());
}

#[test]
fn it_is_quit() {
    for text in ["/q", "/quit", "/exit"] {
        let cmd = SlashCommand::parse(text).unwrap();
        assert!(cmd.is_quit());
        assert!(!cmd.is_new_session());
    }
}

#[test]
fn it_is_new_session() {
    for text in ["/n", "/new"] {
        let cmd = SlashCommand::parse(text).unwrap();
        assert!(cmd.is_new_session());
        assert!(!cmd.is_help());
    }
}

#[test]
fn it_is_help() {
    for text in ["/h", "/help"] {
        let cmd = SlashCommand::parse(text).unwrap();
        assert!(cmd.is_help());
        assert!(!cmd.is_quit());
    }
}

#[test]
fn it_keeps_args() {
    let cmd = SlashCommand::parse("/new please now").unwrap();
    assert_eq!(cmd.args, vec!["please".to_string(), "now".to_string()]);
}
