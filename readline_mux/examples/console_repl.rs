// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Interactive demo. A background task prints a counter once a second, while you type
//! commands at the prompt. Try <kbd>Tab</kbd>, <kbd>Up</kbd>, <kbd>Down</kbd>,
//! <kbd>Ctrl+L</kbd>, <kbd>Ctrl+C</kbd> and <kbd>Ctrl+D</kbd>.
//!
//! ```text
//! cargo run --example console_repl -- --log-file /tmp/console_repl.log
//! ```

use std::{io::{self, BufRead, Write},
          str::FromStr,
          time::Duration};

use clap::Parser;
use miette::IntoDiagnostic;
use r3bl_readline_mux::{ConsoleOutput, DisplayPreference, InputDevice, LineStatus,
                        ReadlineBuffer, ReadlineConfig, TracingConfig, console_println};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tokio::{runtime::Runtime, task::JoinHandle, time::interval};

#[derive(Debug, Parser)]
#[command(about = "Type commands while a background task keeps printing")]
struct CliArgs {
    /// Also write logs to this file.
    #[arg(long)]
    log_file: Option<String>,

    #[arg(long, default_value = "> ")]
    prompt: String,

    /// Milliseconds between ticks of the background task.
    #[arg(long, default_value_t = 1_000)]
    tick_ms: u64,
}

/// More info:
/// - <https://docs.rs/strum_macros/latest/strum_macros/derive.EnumString.html>
/// - <https://docs.rs/strum_macros/latest/strum_macros/derive.Display.html>
#[derive(Debug, PartialEq, EnumString, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
enum Command {
    #[strum(ascii_case_insensitive)]
    StartTicker,

    #[strum(ascii_case_insensitive)]
    StopTicker,

    #[strum(ascii_case_insensitive)]
    Ask,

    #[strum(ascii_case_insensitive)]
    Clear,

    #[strum(ascii_case_insensitive)]
    History,

    #[strum(ascii_case_insensitive)]
    Help,

    #[strum(ascii_case_insensitive)]
    Exit,
}

fn main() -> miette::Result<()> {
    let cli_args = CliArgs::parse();

    let console = ConsoleOutput::new_stdout();
    let readline = ReadlineBuffer::new(
        console.clone(),
        InputDevice::new_crossterm(),
        ReadlineConfig::default(),
    );
    for command in Command::iter() {
        readline.add_completion(command.to_string());
    }

    let display = DisplayPreference::Console(console.clone());
    let tracing_config = match cli_args.log_file {
        Some(file) => TracingConfig::new_file_and_display(Some(file), display),
        None => TracingConfig::new_display(display),
    };
    tracing_config.install_global()?;

    let runtime = Runtime::new().into_diagnostic()?;
    let tick = Duration::from_millis(cli_args.tick_ms);
    let mut maybe_ticker: Option<JoinHandle<()>> = None;

    readline.start()?;
    readline.set_prompt(&cli_args.prompt)?;
    print_help(&console);

    loop {
        let line = match readline.get_line()? {
            LineStatus::Partial => continue,
            LineStatus::Empty => break,
            LineStatus::Full(line) => line,
        };

        if line.is_empty() {
            continue;
        }

        let Ok(command) = Command::from_str(&line) else {
            console_println!(console, "unknown command: {line}");
            continue;
        };

        match command {
            Command::StartTicker => {
                if maybe_ticker.is_none() {
                    maybe_ticker = Some(spawn_ticker(&runtime, console.clone(), tick));
                }
            }
            Command::StopTicker => {
                if let Some(ticker) = maybe_ticker.take() {
                    ticker.abort();
                }
            }
            Command::Ask => {
                let answer = {
                    let _guard = readline.suspend();
                    ask("Are you sure? (y/n) ").into_diagnostic()?
                };
                console_println!(console, "you answered: {answer:?}");
            }
            Command::Clear => readline.clear_screen()?,
            Command::History => {
                for (index, entry) in readline.history_entries().iter().enumerate() {
                    console_println!(console, "{index:>4}  {entry}");
                }
            }
            Command::Help => print_help(&console),
            Command::Exit => break,
        }
    }

    if let Some(ticker) = maybe_ticker.take() {
        ticker.abort();
    }
    readline.stop()?;
    println!("Goodbye");

    Ok(())
}

fn print_help(console: &ConsoleOutput) {
    let commands = Command::iter()
        .map(|it| it.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    console_println!(console, "Available commands: {commands}");
}

fn spawn_ticker(runtime: &Runtime, console: ConsoleOutput, tick: Duration) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut interval = interval(tick);
        let mut counter = 0_u64;
        loop {
            interval.tick().await;
            counter += 1;
            console_println!(console, "[ticker] {counter}");
            tracing::debug!(message = "tick", counter);
        }
    })
}

/// Plain, blocking, cooked mode question.
fn ask(question: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{question}")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}
