use common::network::Event;
use common::{Action, Reply, ReplyKind};

/// What a line typed by the user asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Send(Event),
    Open(String),
    Quit,
    Help,
}

pub fn parse_input(line: &str, actions: &[Action]) -> Input {
    let line = line.trim();
    if line == "/quit" {
        return Input::Quit;
    }
    if let Some(rest) = line.strip_prefix("/start") {
        let payload = rest.trim();
        return Input::Send(Event::Start {
            payload: (!payload.is_empty()).then(|| payload.to_string()),
        });
    }

    let chosen = line
        .parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| actions.get(index));
    match chosen {
        Some(Action::Callback { selector, .. }) => Input::Send(Event::Press {
            selector: selector.clone(),
        }),
        Some(Action::Link { url, .. }) => Input::Open(url.clone()),
        None => Input::Help,
    }
}

pub fn render(reply: &Reply) -> String {
    let mut out = match reply.kind {
        ReplyKind::Message => String::new(),
        ReplyKind::Edit => "(edited) ".to_string(),
        ReplyKind::Alert => "[!] ".to_string(),
    };
    out.push_str(&reply.text);
    for (index, action) in reply.actions.iter().enumerate() {
        let label = match action {
            Action::Callback { label, .. } => label.clone(),
            Action::Link { label, url } => format!("{label} <{url}>"),
        };
        out.push_str(&format!("\n  [{}] {}", index + 1, label));
    }
    out
}

pub const HELP: &str = "type a button number, `/start [payload]` or `/quit`";

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Move, Selector};

    fn menu() -> Vec<Action> {
        vec![
            Action::callback("🎮 Play vs bot", Selector::PlayVsBot),
            Action::link("👥 Invite a friend", "https://t.me/sifa_games_bot?start=1"),
        ]
    }

    #[test]
    fn numbers_press_buttons() {
        assert_eq!(
            parse_input("1", &menu()),
            Input::Send(Event::Press {
                selector: "play_vs_bot".into()
            })
        );
        assert_eq!(
            parse_input(" 2 ", &menu()),
            Input::Open("https://t.me/sifa_games_bot?start=1".into())
        );
        assert_eq!(parse_input("0", &menu()), Input::Help);
        assert_eq!(parse_input("3", &menu()), Input::Help);
    }

    #[test]
    fn commands() {
        assert_eq!(parse_input("/quit", &[]), Input::Quit);
        assert_eq!(
            parse_input("/start", &[]),
            Input::Send(Event::Start { payload: None })
        );
        assert_eq!(
            parse_input("/start 42", &[]),
            Input::Send(Event::Start {
                payload: Some("42".into())
            })
        );
    }

    #[test]
    fn rendering_numbers_actions() {
        let reply = Reply::edit("Choose your gesture:")
            .with_action(Action::callback(Move::Rock.label(), Selector::BotMove(Move::Rock)));
        assert_eq!(render(&reply), "(edited) Choose your gesture:\n  [1] ✊ Rock");
    }
}
