use anyhow::{Context, Result};
use auto_typer::clipboard::SystemClipboard;
use auto_typer::config::parse_duration;
use auto_typer::{
    Config, HotkeyManager, KeyCombo, ResumeOutcome, SessionEvent, SessionHost, SessionReport,
    SessionState, SystemPlatform, TyperError,
};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "autotype",
    version,
    about = "Types text into the focused window, one character at a time"
)]
struct Args {
    /// Text to type
    #[arg(short, long, conflicts_with_all = ["file", "clipboard"])]
    text: Option<String>,

    /// UTF-8 text file to type
    #[arg(short, long, conflicts_with = "clipboard")]
    file: Option<PathBuf>,

    /// Type the current clipboard text
    #[arg(long)]
    clipboard: bool,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Delay between characters (e.g. 10ms, 0.05s)
    #[arg(short, long, value_parser = parse_delay)]
    delay: Option<Duration>,

    /// Do not send the input method hotkey before typing
    #[arg(long)]
    no_switch_input: bool,

    /// Hotkey that switches to an ASCII input method
    #[arg(long, value_name = "COMBO")]
    input_hotkey: Option<String>,

    /// Global hotkey that cancels typing
    #[arg(long, value_name = "COMBO")]
    cancel_hotkey: Option<String>,

    /// Keep typing even if the target window loses focus
    #[arg(long)]
    no_focus_check: bool,

    /// Start at this character offset, e.g. the one printed after a pause
    #[arg(long, value_name = "N")]
    from: Option<usize>,

    /// Open the interactive prompt even when text was given
    #[arg(short, long)]
    interactive: bool,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "PATH")]
    save_config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_delay(s: &str) -> std::result::Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = build_config(&args)?;
    init_tracing(config.verbose);

    if let Some(path) = &args.save_config {
        config.save_to_file(path)?;
        println!("{} {}", "💾 Configuration saved to".green(), path);
        return Ok(ExitCode::SUCCESS);
    }

    let hotkeys = setup_cancel_hotkey(&config.cancel_hotkey);
    let mut host = SessionHost::new(SystemPlatform, config);

    let has_source = args.text.is_some() || args.file.is_some() || args.clipboard;
    if let Some(text) = &args.text {
        host.set_buffer(text.as_str());
    } else if let Some(path) = &args.file {
        host.load_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
    } else if args.clipboard {
        host.append_clipboard(&SystemClipboard)?;
    }

    let code = if has_source && !args.interactive {
        run_once(&mut host, hotkeys.as_ref(), args.from).await?
    } else {
        repl(&mut host, hotkeys.as_ref()).await?;
        ExitCode::SUCCESS
    };

    host.shutdown().await?;
    Ok(code)
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(delay) = args.delay {
        config.delay = delay;
    }
    if args.no_switch_input {
        config.switch_input_method = false;
    }
    if let Some(combo) = &args.input_hotkey {
        config.input_method_hotkey = combo.clone();
    }
    if let Some(combo) = &args.cancel_hotkey {
        config.cancel_hotkey = combo.clone();
    }
    if args.no_focus_check {
        config.detect_focus_loss = false;
    }
    config.verbose |= args.verbose;

    config.validate()?;
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "auto_typer=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// The cancel hotkey is a convenience; typing works without it.
fn setup_cancel_hotkey(combo: &str) -> Option<HotkeyManager> {
    let register = || -> auto_typer::Result<HotkeyManager> {
        let combo = KeyCombo::parse(combo)?;
        let mut manager = HotkeyManager::new()?;
        manager.register_cancel_hotkey(&combo)?;
        manager.start_listener()?;
        Ok(manager)
    };

    match register() {
        Ok(manager) => {
            println!(
                "{} {}",
                "🔥 Press".bright_black(),
                format!("{combo} to cancel typing from any window").bright_black()
            );
            Some(manager)
        }
        Err(e) => {
            tracing::warn!(error = %e, "cancel hotkey unavailable");
            None
        }
    }
}

async fn run_once(
    host: &mut SessionHost<SystemPlatform>,
    hotkeys: Option<&HotkeyManager>,
    from: Option<usize>,
) -> Result<ExitCode> {
    match from {
        Some(offset) => {
            if host.resume_from(offset)? == ResumeOutcome::NothingToResume {
                drain_pending(host);
                return Ok(ExitCode::SUCCESS);
            }
        }
        None => host.start()?,
    }
    watch_active(host, hotkeys);

    loop {
        tokio::select! {
            event = host.next_event() => {
                let Some(event) = event else { break };
                render_event(&event);
                if let SessionEvent::Finished(report) = event {
                    release_when_idle(host, hotkeys);
                    return Ok(exit_code_for(&report, host.resume_cursor()));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                host.cancel();
            }
        }
    }

    Ok(ExitCode::FAILURE)
}

fn exit_code_for(report: &SessionReport, resume_cursor: usize) -> ExitCode {
    match report.state {
        SessionState::Completed => ExitCode::SUCCESS,
        SessionState::Paused => {
            println!(
                "{} {}",
                "▶️  Continue later with".yellow(),
                format!("--from {resume_cursor}").bold()
            );
            ExitCode::from(2)
        }
        SessionState::Cancelled => ExitCode::from(130),
        _ => ExitCode::FAILURE,
    }
}

async fn repl(
    host: &mut SessionHost<SystemPlatform>,
    hotkeys: Option<&HotkeyManager>,
) -> Result<()> {
    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_command(host, hotkeys, &line) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => report_error(&e),
                }
            }
            event = host.next_event() => {
                let Some(event) = event else { break };
                render_event(&event);
                if matches!(event, SessionEvent::Finished(_)) {
                    release_when_idle(host, hotkeys);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if !host.cancel() {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn handle_command(
    host: &mut SessionHost<SystemPlatform>,
    hotkeys: Option<&HotkeyManager>,
    line: &str,
) -> auto_typer::Result<Flow> {
    let Some(command) = line.strip_prefix(':') else {
        host.append(line);
        host.append("\n");
        return Ok(Flow::Continue);
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim(), ""),
    };

    match name {
        "start" | "s" => {
            host.start()?;
            watch_active(host, hotkeys);
        }
        "resume" | "r" => match host.resume()? {
            ResumeOutcome::Started { from, remaining } => {
                println!(
                    "{}",
                    format!("▶️  Resuming at character {from}, {remaining} left").green()
                );
                watch_active(host, hotkeys);
            }
            ResumeOutcome::NothingToResume => {}
        },
        "cancel" | "c" => {
            if !host.cancel() {
                println!("{}", "No typing session is running.".yellow());
            }
        }
        "load" => {
            if arg.is_empty() {
                println!("{}", "Usage: :load <path>".yellow());
            } else {
                let chars = host.load_file(Path::new(arg))?;
                println!("{}", format!("📂 Loaded {chars} characters from {arg}").green());
            }
        }
        "save" => {
            let path = host.save_draft()?;
            println!("{}", format!("💾 Draft saved to {}", path.display()).green());
        }
        "paste" => {
            let chars = host.append_clipboard(&SystemClipboard)?;
            println!("{}", format!("📋 Appended {chars} characters").green());
        }
        "show" => {
            println!("{}", "----- buffer -----".bright_black());
            print!("{}", host.buffer());
            if !host.buffer().ends_with('\n') {
                println!();
            }
            println!("{}", "------------------".bright_black());
        }
        "clear" => host.clear(),
        "delay" => {
            let delay = parse_duration(arg)?;
            if delay.is_zero() {
                return Err(auto_typer::UserInputError::InvalidDelay.into());
            }
            host.config_mut().delay = delay;
            println!("{}", format!("⏱️  Delay set to {delay:?}").green());
        }
        "switch" => {
            let enabled = matches!(arg, "on" | "true" | "yes" | "1");
            host.config_mut().switch_input_method = enabled;
            println!(
                "{}",
                format!("🔄 Input method switch {}", if enabled { "on" } else { "off" }).green()
            );
        }
        "help" | "h" | "?" => print_help(),
        "quit" | "q" | "exit" => return Ok(Flow::Quit),
        other => println!("{}", format!("Unknown command ':{other}', try :help").yellow()),
    }

    Ok(Flow::Continue)
}

fn watch_active(host: &SessionHost<SystemPlatform>, hotkeys: Option<&HotkeyManager>) {
    if let (Some(hotkeys), Some(token)) = (hotkeys, host.active_cancel_token()) {
        hotkeys.watch(token);
    }
}

/// Stops the cancel hotkey from targeting a run that has ended. A late
/// report from an earlier run leaves the current run's token in place.
fn release_when_idle(host: &SessionHost<SystemPlatform>, hotkeys: Option<&HotkeyManager>) {
    if let (Some(hotkeys), None) = (hotkeys, host.current_launch()) {
        hotkeys.release();
    }
}

fn drain_pending(host: &mut SessionHost<SystemPlatform>) {
    while let Some(event) = host.try_next_event() {
        render_event(&event);
    }
}

fn render_event(event: &SessionEvent) {
    match event {
        SessionEvent::Log(log) => println!(
            "{} {}",
            format!("[{}]", log.timestamp.format("%H:%M:%S")).bright_black(),
            log.message
        ),
        SessionEvent::State(_) => {}
        SessionEvent::Finished(report) => {
            let summary = format!(
                "{:?}: {}/{} characters typed",
                report.state, report.injected, report.total
            );
            let styled = match report.state {
                SessionState::Completed => summary.green().bold(),
                SessionState::Paused | SessionState::Cancelled => summary.yellow().bold(),
                _ => summary.red().bold(),
            };
            println!("{styled}");
        }
    }
}

fn report_error(err: &TyperError) {
    if err.is_user_error() {
        println!("{} {}", "⚠️ ".yellow(), err.to_string().yellow());
    } else {
        eprintln!("{} {}", "❌".red(), err.to_string().red());
    }
}

fn print_help() {
    println!("{}", "⌨️  auto-typer".bold());
    println!("Type lines to add them to the buffer. Commands:");
    for (command, help) in [
        (":start", "type the buffer after a 5 second countdown"),
        (":cancel", "stop the running session"),
        (":resume", "continue a session that paused on focus loss"),
        (":load <path>", "replace the buffer with a UTF-8 text file"),
        (":save", "save the buffer as a draft"),
        (":paste", "append the clipboard text"),
        (":show", "print the buffer"),
        (":clear", "empty the buffer"),
        (":delay <dur>", "set the per-character delay, e.g. 20ms"),
        (":switch on|off", "toggle the input method hotkey"),
        (":quit", "exit"),
    ] {
        println!("  {:<16} {}", command.cyan(), help);
    }
}
