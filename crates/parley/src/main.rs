//! Chats with the agent in the terminal.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::process::ExitCode;

use parley::terminal::TerminalView;
use parley::Session;
use tokio::io::{self, AsyncBufReadExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("failed to load .env: {err}"),
    }

    let mut view = TerminalView::new();
    let mut session: Session = Session::new();
    if let Err(err) = session.initialize() {
        view.show_error(&err);
        return ExitCode::FAILURE;
    }
    session.render_history(&mut view);

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("error reading input: {err}");
                return ExitCode::FAILURE;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Err(err) = session.submit(line, &mut view).await {
            view.show_error(&err);
        }
    }

    ExitCode::SUCCESS
}
