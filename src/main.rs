mod api;
mod config;
mod logging;
mod models;
mod schedule;
mod store;
mod tui;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tokio::task::JoinHandle;
use std::time::Duration;

use api::SchoolClient;
use config::Config;
use schedule::print::PrintLayout;
use tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--init") {
        let path = Config::generate_default()?;
        println!("Generated config file at: {}", path.display());
        println!("Edit it with your API URL, token and role, then run school-admin.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("school-admin — A terminal dashboard for school administration");
        println!();
        println!("USAGE:");
        println!("  school-admin           Start the TUI");
        println!("  school-admin --init    Generate a default config file");
        println!();
        println!("CONFIG:");
        println!("  File: ~/.config/school-admin/config.toml");
        println!("  Or set env vars: SCHOOL_ADMIN_URL, SCHOOL_ADMIN_TOKEN,");
        println!("  SCHOOL_ADMIN_USER and SCHOOL_ADMIN_ROLE (admin, dean or teacher)");
        println!("  Log filter: {} (default: info)", logging::LOG_ENV);
        println!();
        println!("KEYBINDINGS:");
        println!("  Tab / Shift+Tab   Switch tabs");
        println!("  1-8               Jump to tab");
        println!("  j / k / Up / Down Navigate lists and calendar blocks");
        println!("  h / l             Previous / next day (calendar)");
        println!("  g / G             Jump to top / bottom");
        println!("  Enter             View the selected record");
        println!("  a / e / d         Add / edit / delete (admin and dean only)");
        println!("  v                 Toggle calendar and list view");
        println!("  f  /  /           Open filters / search");
        println!("  c                 Clear filters");
        println!("  p / P             Print grid / table");
        println!("  r                 Refresh");
        println!("  q / Ctrl+C        Quit");
        return Ok(());
    }

    let (_log_guard, log_path) = logging::init()?;

    let config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `school-admin --init` to generate a config file,\n\
         or set the SCHOOL_ADMIN_URL environment variable."
    })?;

    let client = SchoolClient::new(&config.api_url, config.api_token.as_deref())?;
    tracing::info!(api_url = %config.api_url, role = ?config.role, log = %log_path.display(), "starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, client, &config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!(error = %format!("{e:#}"), "exited with error");
        eprintln!("Error: {e:#}");
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: SchoolClient,
    config: &Config,
) -> Result<()> {
    let mut app = App::new(client, config.session());
    app.start_fetch();

    loop {
        app.frame_count = app.frame_count.wrapping_add(1);
        terminal.draw(|f| tui::ui::render(f, &mut app))?;

        // ── Print hand-off, after the frame showing the request is drawn ──
        if let Some(layout) = app.print_requested.take() {
            app.status_message = match print(&app, layout, config.print_command.as_deref()) {
                Ok(path) => format!("Print view opened: {}", path.display()),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "print failed");
                    format!("Print failed: {e:#}")
                }
            };
        }

        if let Some(Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        })) = tui::event::poll_event(Duration::from_millis(100))?
        {
            tui::event::handle_key(&mut app, code, modifiers);
        }

        if !app.running {
            break;
        }

        // Apply completed background results without blocking.
        app.poll_fetch_result();
        app.poll_mutation_result();
        app.poll_detail_result();

        if app.needs_refresh {
            app.needs_refresh = false;
            app.start_fetch();
        }
    }

    Ok(())
}

/// Write the print document to a temp file and hand it to the configured
/// command or the platform opener. The file is left in place for the
/// browser to load.
fn print(app: &App, layout: PrintLayout, command: Option<&str>) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!(
        "school-admin-schedule-{}.html",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));
    std::fs::write(&path, app.print_document(layout))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    // Dropping the handle detaches the reaper task.
    drop(open_document(&path, command)?);
    tracing::info!(path = %path.display(), ?layout, "print document handed off");
    Ok(path)
}

/// Launch the opener and reap it in the background once it exits. The
/// handle resolves to the opener's exit status.
fn open_document(path: &Path, command: Option<&str>) -> Result<JoinHandle<Option<ExitStatus>>> {
    let mut cmd = match command.map(str::split_whitespace) {
        Some(mut parts) => {
            let program = parts.next().context("print_command is empty")?;
            let mut cmd = Command::new(program);
            cmd.args(parts);
            cmd
        }
        None if cfg!(target_os = "macos") => Command::new("open"),
        None if cfg!(target_os = "windows") => {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]);
            cmd
        }
        None => Command::new("xdg-open"),
    };
    let program = cmd.get_program().to_os_string();
    let mut child = cmd
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch {program:?}"))?;
    Ok(tokio::task::spawn_blocking(move || match child.wait() {
        Ok(status) => {
            tracing::debug!(?program, %status, "print opener exited");
            Some(status)
        }
        Err(e) => {
            tracing::warn!(?program, error = %e, "could not wait on print opener");
            None
        }
    }))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opener_is_waited_on_after_launch() {
        let handle = open_document(Path::new("/dev/null"), Some("true")).unwrap();
        let status = handle.await.unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[test]
    fn empty_print_command_is_rejected() {
        assert!(open_document(Path::new("/dev/null"), Some("   ")).is_err());
    }
}
