//! Interactive chat command.

use crate::chat::ChatSession;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Run the interactive chat command.
pub async fn run_chat(url: Option<&str>, settings: Settings) -> Result<()> {
    let endpoint_url = url.unwrap_or(&settings.chat.endpoint_url).to_string();
    let timeout = Duration::from_secs(settings.chat.timeout_secs);

    let mut session = ChatSession::new(&endpoint_url, timeout);

    println!("\n{}", style("YouTube Transcript Assistant").bold().cyan());
    println!(
        "{}\n",
        style("Ask something about the videos. 'exit' to quit, 'clear' to reset the session.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear();
            Output::info("Session history cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        session.submit(input).await;
        spinner.finish_and_clear();

        // Full history every turn, most recent first
        println!();
        for line in session.rendered_history() {
            println!("{}", line);
            println!();
        }
    }

    Ok(())
}
