//! Prefix commands: `pingcf`, `features`, `ping`, `help`.
//!
//! A message starting with the configured prefix (default `c;`) is a command
//! invocation. None of the commands take arguments.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use cfspy_core::config::DiscordConfig;
use cfspy_widget::{Card, Page, WidgetError};

use crate::respond::Responder;

const FEATURE_INFO: &str = "CFSpy watches for Codeforces links and shows helpful previews.\n\
Supported links include\n\
- _Blogs_: Shows some information about the blog.\n\
- _Comments_: Shows the comment information and content.\n\
- _Problems_: Shows some information about the problem.\n\
- _Profiles_: Shows some information about the user profile.\n\
- _Submissions_: Shows some information about the submission.\n\
- _Submissions with line numbers_: Shows a snippet from the submission containing the \
specified lines.";

const CF_HOME_URL: &str = "https://codeforces.com";
const PINGCF_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PingCf,
    Features,
    Ping,
    Help,
}

impl Command {
    /// In help-listing order.
    pub const ALL: [Command; 4] = [
        Command::PingCf,
        Command::Features,
        Command::Ping,
        Command::Help,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Command::PingCf => "pingcf",
            Command::Features => "features",
            Command::Ping => "ping",
            Command::Help => "help",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::PingCf => "Checks the latency of codeforces.com",
            Command::Features => "Shows information about automatic features",
            Command::Ping => "Checks the latency of the Discord REST API",
            Command::Help => "Shows the bot help message",
        }
    }

    fn from_id(id: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|c| c.id() == id)
    }
}

/// What a prefixed message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Command),
    /// Known command given arguments it does not take.
    IncorrectUsage(Command),
    /// The prefix alone.
    Missing,
    Unknown(String),
}

/// `None` when `content` is not a command at all.
pub fn parse(prefix: &str, content: &str) -> Option<Invocation> {
    let rest = content.strip_prefix(prefix)?;
    let mut tokens = rest.split_whitespace();
    let id = if rest.starts_with(char::is_whitespace) {
        ""
    } else {
        tokens.next().unwrap_or("")
    };
    let has_args = tokens.next().is_some();

    Some(match Command::from_id(id) {
        Some(command) if has_args => Invocation::IncorrectUsage(command),
        Some(command) => Invocation::Run(command),
        None if id.is_empty() => Invocation::Missing,
        None => Invocation::Unknown(id.to_string()),
    })
}

pub fn help_card(config: &DiscordConfig) -> Card {
    Command::ALL.into_iter().fold(
        Card::new()
            .title(&config.name)
            .description(format!("{}\nSupported commands:", config.description)),
        |card, c| card.field(c.id(), c.description(), true),
    )
}

pub fn features_page() -> Page {
    Page::new("", Some(Card::new().author("Features").description(FEATURE_INFO)))
}

pub fn rejection(prefix: &str, invocation: &Invocation) -> Option<String> {
    let help = format!("{prefix}{}", Command::Help.id());
    match invocation {
        Invocation::Run(_) => None,
        Invocation::IncorrectUsage(c) => Some(format!("Incorrect usage, expected `{}`", c.id())),
        Invocation::Missing => Some(format!("Missing command, send `{help}` for help")),
        Invocation::Unknown(id) => Some(format!("Unknown command `{id}`, send `{help}` for help")),
    }
}

/// Run one invocation to completion. Failures are logged here.
///
/// `web` is the shared client for requests outside Discord.
pub async fn dispatch(
    responder: Responder,
    config: DiscordConfig,
    web: reqwest::Client,
    invocation: Invocation,
) {
    let Invocation::Run(command) = invocation else {
        if let Some(text) = rejection(&config.prefix, &invocation) {
            debug!(%text, "command rejected");
            if let Err(e) = responder.respond_with_error(&text).await {
                warn!(error = %e, "command rejection reply failed");
            }
        }
        return;
    };

    info!(command = command.id(), "dispatching command");
    match command {
        Command::Help => {
            if let Err(e) = responder.send_card(&help_card(&config)).await {
                warn!(error = %e, "help reply failed");
            }
        }
        Command::Features => match responder.respond_with_one_page_preview(features_page()).await {
            Ok(()) | Err(WidgetError::Cancelled) => {}
            Err(e) => {
                warn!(error = %e, "features widget failed");
                if let Err(e) = responder.respond_with_internal_error().await {
                    warn!(error = %e, "internal error reply failed");
                }
            }
        },
        Command::Ping => ping(&responder).await,
        Command::PingCf => pingcf(&responder, &web).await,
    }
}

/// Result of one HEAD request to the Codeforces home page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfPing {
    Response { status: String, latency: Duration },
    TimedOut,
    Failed(String),
}

impl CfPing {
    pub fn text(&self) -> String {
        match self {
            CfPing::Response { status, latency } => format!(
                "Pinged <{CF_HOME_URL}>: Response {status}, Latency {}ms",
                latency.as_millis()
            ),
            CfPing::TimedOut => format!(
                "Connecting to <{CF_HOME_URL}> timed out after {}s",
                PINGCF_TIMEOUT.as_secs()
            ),
            CfPing::Failed(e) => format!("Error: {e}"),
        }
    }
}

async fn ping_codeforces(web: &reqwest::Client) -> CfPing {
    let start = Instant::now();
    match web.head(CF_HOME_URL).timeout(PINGCF_TIMEOUT).send().await {
        Ok(resp) => CfPing::Response {
            status: resp.status().to_string(),
            latency: start.elapsed(),
        },
        Err(e) if e.is_timeout() => CfPing::TimedOut,
        Err(e) => CfPing::Failed(e.to_string()),
    }
}

async fn pingcf(responder: &Responder, web: &reqwest::Client) {
    let outcome = ping_codeforces(web).await;
    debug!(?outcome, "codeforces pinged");
    if let Err(e) = responder.send_text(&outcome.text()).await {
        warn!(error = %e, "pingcf reply failed");
    }
}

async fn ping(responder: &Responder) {
    let start = Instant::now();
    let pong = match responder.send_text("pong!").await {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, "ping reply failed");
            return;
        }
    };
    let latency = start.elapsed();
    let text = format!("Latency {}ms", latency.as_millis());
    if let Err(e) = responder.edit_text(&pong, &text).await {
        warn!(error = %e, "ping edit failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_prefixed_messages_are_not_commands() {
        assert_eq!(parse("c;", "hello"), None);
        assert_eq!(parse("c;", " c;help"), None);
    }

    #[test]
    fn known_commands_parse() {
        assert_eq!(parse("c;", "c;help"), Some(Invocation::Run(Command::Help)));
        assert_eq!(parse("c;", "c;pingcf"), Some(Invocation::Run(Command::PingCf)));
        assert_eq!(parse("c;", "c;ping  "), Some(Invocation::Run(Command::Ping)));
        assert_eq!(
            parse("c;", "c;features"),
            Some(Invocation::Run(Command::Features))
        );
    }

    #[test]
    fn arguments_are_incorrect_usage() {
        assert_eq!(
            parse("c;", "c;ping now"),
            Some(Invocation::IncorrectUsage(Command::Ping))
        );
    }

    #[test]
    fn missing_and_unknown_commands() {
        assert_eq!(parse("c;", "c;"), Some(Invocation::Missing));
        assert_eq!(parse("c;", "c; help"), Some(Invocation::Missing));
        assert_eq!(
            parse("c;", "c;spy"),
            Some(Invocation::Unknown("spy".to_string()))
        );
    }

    #[test]
    fn rejection_texts_point_at_help() {
        assert_eq!(
            rejection("c;", &Invocation::Missing).as_deref(),
            Some("Missing command, send `c;help` for help")
        );
        assert_eq!(
            rejection("c;", &Invocation::Unknown("spy".into())).as_deref(),
            Some("Unknown command `spy`, send `c;help` for help")
        );
        assert_eq!(
            rejection("c;", &Invocation::IncorrectUsage(Command::Help)).as_deref(),
            Some("Incorrect usage, expected `help`")
        );
        assert_eq!(rejection("c;", &Invocation::Run(Command::Ping)), None);
    }

    #[test]
    fn help_lists_every_command_with_help_last() {
        let card = help_card(&DiscordConfig::default());
        assert_eq!(card.title.as_deref(), Some("CFSpy"));
        assert!(card
            .description
            .as_deref()
            .is_some_and(|d| d.ends_with("Supported commands:")));
        let ids: Vec<_> = card.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(ids, ["pingcf", "features", "ping", "help"]);
        assert!(card.fields.iter().all(|f| f.inline));
    }

    #[test]
    fn pingcf_replies() {
        let ok = CfPing::Response {
            status: "200 OK".to_string(),
            latency: Duration::from_millis(123),
        };
        assert_eq!(
            ok.text(),
            "Pinged <https://codeforces.com>: Response 200 OK, Latency 123ms"
        );
        assert_eq!(
            CfPing::TimedOut.text(),
            "Connecting to <https://codeforces.com> timed out after 5s"
        );
        assert_eq!(
            CfPing::Failed("dns error".to_string()).text(),
            "Error: dns error"
        );
        assert_eq!(
            parse("c;", "c;pingcf now"),
            Some(Invocation::IncorrectUsage(Command::PingCf))
        );
    }

    #[test]
    fn features_page_has_no_expansion() {
        let page = features_page();
        assert!(!page.has_expansion());
        assert_eq!(
            page.default.card.and_then(|c| c.author).as_deref(),
            Some("Features")
        );
    }
}
