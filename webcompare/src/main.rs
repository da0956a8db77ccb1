use anyhow::Result;
use clap::ArgMatches;
use colored::Colorize;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use webcompare::commands::command_argument_builder;
use webcompare::handlers::*;
use webcompare_core::config::Settings;

const LOG_FILE: &str = "webcompare.log";

#[tokio::main]
async fn main() {
    let settings = Settings::load();
    let chosen_command = command_argument_builder(settings.diagnostics).get_matches();
    let settings = apply_overrides(settings, &chosen_command);

    // The terminal UI owns the screen, so its logs go to a file
    let log_file = matches!(chosen_command.subcommand(), Some(("ui", _)))
        .then(|| settings.data_dir.join(LOG_FILE));
    init_logging(log_file.as_deref());

    if let Err(e) = dispatch(&chosen_command, settings).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Some(path) = log_file
        && let Some(parent) = path.parent()
        && std::fs::create_dir_all(parent).is_ok()
        && let Ok(file) = OpenOptions::new().create(true).append(true).open(path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(chosen_command: &ArgMatches, settings: Settings) -> Result<()> {
    let quiet = chosen_command.get_flag("quiet");

    match chosen_command.subcommand() {
        None => {
            command_argument_builder(settings.diagnostics).print_help()?;
            Ok(())
        }
        Some(("init", primary_command)) => handle_init(primary_command, &settings),
        Some(("session", primary_command)) => match primary_command.subcommand() {
            Some(("show", _)) => handle_session_show(&Context::open(settings, quiet)?),
            Some(("end", _)) => handle_session_end(&settings),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some((name, primary_command)) => {
            let ctx = Context::open(settings, quiet)?;
            match (name, primary_command.subcommand()) {
                ("form", Some(("show", _))) => handle_form_show(&ctx),
                ("form", Some(("set", secondary_command))) => {
                    handle_form_set(secondary_command, &ctx)
                }
                ("form", Some(("add", _))) => handle_form_add(&ctx),
                ("form", Some(("remove", secondary_command))) => {
                    handle_form_remove(secondary_command, &ctx)
                }
                ("form", Some(("category", secondary_command))) => {
                    handle_form_category(secondary_command, &ctx)
                }
                ("form", Some(("reset", _))) => handle_form_reset(&ctx),
                ("form", Some(("submit", _))) => handle_form_submit(&ctx).await,
                ("analyze", _) => handle_analyze(primary_command, &ctx).await,
                ("view", Some(("summary", secondary_command))) => {
                    handle_view_summary(secondary_command, &ctx)
                }
                ("view", Some(("text", secondary_command))) => {
                    handle_view_text(secondary_command, &ctx)
                }
                ("view", Some(("vision", secondary_command))) => {
                    handle_view_vision(secondary_command, &ctx)
                }
                ("watch", _) => handle_watch(primary_command, &ctx).await,
                ("cache", Some(("clear", _))) => handle_cache_clear(&ctx),
                ("ui", _) => handle_ui(&ctx),
                _ => unreachable!("clap should ensure we don't get here"),
            }
        }
    }
}
