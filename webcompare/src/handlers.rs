use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Local, TimeDelta, Utc};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;
use webcompare_client::{AnalysisClient, ComparisonResult, WebsiteInput};
use webcompare_core::analyze::Analyzer;
use webcompare_core::cache::{EntryInfo, ResultCache};
use webcompare_core::config::{DATABASE_FILE, SESSION_FILE, Settings, expand_path};
use webcompare_core::data::Database;
use webcompare_core::draft::{Category, DraftStore, DraftSubmission, MIN_WEBSITES, SubmissionForm};
use webcompare_core::report::{
    ReportFormat, render_summary, render_text_analysis, render_vision,
};
use webcompare_core::session::{SessionId, current_session, end_session, peek_session};
use webcompare_core::source::{ViewData, compose};
use webcompare_core::views::Section;
use webcompare_tui::{BrowserOptions, run_browser};

/// Parse a URL, trying to add http:// if needed
pub fn normalize_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Try to parse as-is
    if Url::parse(raw).is_ok() {
        return Some(raw.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", raw);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    None
}

/// Parse a `NAME=URL` pair from the command line
pub fn parse_site(raw: &str) -> Result<WebsiteInput, String> {
    let (name, url) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected NAME=URL, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Missing website name in '{}'", raw));
    }
    let url = normalize_url(url)
        .ok_or_else(|| format!("Invalid URL for '{}': '{}'", name, url.trim()))?;

    Ok(WebsiteInput::new(name, url))
}

/// Applies `--api-url` and `--data-dir` on top of the environment
pub fn apply_overrides(mut settings: Settings, args: &ArgMatches) -> Settings {
    if let Some(url) = args.get_one::<Url>("api-url") {
        settings.api_url = url.to_string();
    }
    if let Some(dir) = args.get_one::<String>("data-dir") {
        settings = settings.with_data_dir(&expand_path(dir));
    }
    settings
}

pub fn format_age(age: TimeDelta) -> String {
    let secs = age.num_seconds();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// One line describing the cache entry as seen from `session`
pub fn describe_entry(info: Option<&EntryInfo>, session: &SessionId, now: DateTime<Utc>) -> String {
    let Some(info) = info else {
        return "No cached result".to_string();
    };

    let written = match info.written_at {
        Some(at) => format!("written {}", format_age(now - at)),
        None => "written at an unknown time".to_string(),
    };

    if info.owner.as_deref() == Some(session.as_str()) {
        format!("Cached result: {} bytes, {}", info.payload_bytes, written)
    } else {
        format!("Cached result belongs to another session ({})", written)
    }
}

pub fn render_form(draft: &DraftSubmission) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Category: {} ({})\n",
        draft.category.label(),
        draft.category
    ));
    output.push_str("Websites:\n");
    for (idx, website) in draft.websites.iter().enumerate() {
        let name = non_blank(&website.name).unwrap_or("-");
        let url = non_blank(&website.url).unwrap_or("-");
        output.push_str(&format!("  {:>2}. {:<24} {}\n", idx + 1, name, url));
    }

    let filled = draft.filled_websites().len();
    if filled >= MIN_WEBSITES {
        output.push_str(&format!("\n{} complete websites, ready to submit\n", filled));
    } else {
        output.push_str(&format!(
            "\n{} complete website(s), at least {} needed\n",
            filled, MIN_WEBSITES
        ));
    }

    output
}

fn non_blank(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

/// Everything a command needs once the data directory is known
pub struct Context {
    pub settings: Settings,
    pub cache: ResultCache,
    pub session: SessionId,
    pub quiet: bool,
}

impl Context {
    /// Opens the database (creating it on first use) and resumes or starts the session
    pub fn open(settings: Settings, quiet: bool) -> Result<Self> {
        fs::create_dir_all(&settings.data_dir).with_context(|| {
            format!(
                "Failed to create data directory {}",
                settings.data_dir.display()
            )
        })?;

        let db_path = settings.database_path();
        let cache = ResultCache::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        let session = current_session(&settings.session_store())?;
        debug!("Using session {}", session);
        if let Err(e) = cache.prune(&session) {
            warn!("Failed to prune stale storage: {}", e);
        }

        Ok(Self {
            settings,
            cache,
            session,
            quiet,
        })
    }

    pub fn form(&self) -> Result<SubmissionForm<'_>> {
        Ok(SubmissionForm::load(self.cache.database(), &self.session)?)
    }

    fn client(&self) -> Result<AnalysisClient> {
        Ok(AnalysisClient::new(&self.settings.api_url)?)
    }

    fn heading(&self, title: &str) {
        if self.quiet {
            return;
        }
        print_divider();
        println!("{}", format!("  {}", title).bright_white().bold());
        print_divider();
        println!();
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);
    Ok(spinner)
}

/// 1-based slot number from the command line to a 0-based index
fn slot(args: &ArgMatches) -> Result<usize> {
    let number = *args
        .get_one::<usize>("INDEX")
        .context("A website number is required")?;
    number.checked_sub(1).context("Website numbers start at 1")
}

fn parse_section(args: &ArgMatches) -> Result<Option<Section>> {
    args.get_one::<String>("section")
        .map(|s| s.parse::<Section>())
        .transpose()
        .map_err(anyhow::Error::msg)
}

fn parse_category(args: &ArgMatches, id: &str) -> Result<Category> {
    let raw = args
        .get_one::<String>(id)
        .context("A category is required")?;
    Ok(raw.parse::<Category>()?)
}

fn parse_format(args: &ArgMatches) -> ReportFormat {
    args.get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

/// Print a report, or save it when `--output` was given
fn emit(report: &str, args: &ArgMatches) -> Result<()> {
    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            fs::write(path, report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => println!("{}", report.trim_end()),
    }
    Ok(())
}

pub fn handle_init(args: &ArgMatches, settings: &Settings) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let data_dir = args
        .get_one::<String>("PATH")
        .map(|p| expand_path(p))
        .unwrap_or_else(|| settings.data_dir.clone());
    let force = args.get_flag("force");
    let db_path = data_dir.join(DATABASE_FILE);

    if !quiet {
        print_divider();
        println!("{}", "  WEBCOMPARE INITIALIZATION".bright_white().bold());
        print_divider();
        println!();
        println!(
            "{} Target: {}",
            "→".blue(),
            data_dir.display().to_string().bright_white()
        );
        println!();
    }

    if Database::exists(&db_path) {
        if force {
            println!(
                "{} Deleting existing database (force mode)",
                "→".yellow().bold()
            );
            Database::drop(&db_path)?;
            println!("{} Existing database removed", "✓".green().bold());
        } else {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!("Database already exists at:");
            println!(
                "  {} {}",
                "•".yellow(),
                db_path.display().to_string().bright_white()
            );
            println!(
                "{}",
                "Overwriting discards the cached results and saved forms.".yellow()
            );
            println!();

            let response = print_prompt("Would you like to overwrite it? [y/N]:")?;
            println!();

            if response == "y" || response == "yes" {
                Database::drop(&db_path)?;
                println!("{} Existing database removed", "✓".green().bold());
            } else {
                println!("{} Keeping existing database", "→".blue());
            }
        }
        println!();
    }

    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    if !Database::exists(&db_path) {
        println!("{} Creating database...", "→".blue());
        Database::new(&db_path)
            .with_context(|| format!("Failed to create database {}", db_path.display()))?;
        info!("Initialized database at {}", db_path.display());
        println!(
            "{} Database initialized: {}",
            "✓".green().bold(),
            db_path.display().to_string().bright_white()
        );
    }

    if !quiet {
        println!();
        print_divider();
        println!("{}", "  INITIALIZATION COMPLETE".green().bold());
        print_divider();
        println!();
        println!(
            "{} Data directory: {}",
            "✓".green().bold(),
            data_dir.display().to_string().bright_white()
        );
        println!(
            "{} Database: {}",
            "✓".green().bold(),
            db_path.display().to_string().bright_white()
        );
        println!(
            "{} Session file: {}",
            "✓".green().bold(),
            data_dir.join(SESSION_FILE).display().to_string().bright_white()
        );
        println!();
    }
    Ok(())
}

pub fn handle_form_show(ctx: &Context) -> Result<()> {
    let form = ctx.form()?;
    ctx.heading("COMPARISON FORM");
    print!("{}", render_form(form.draft()));
    Ok(())
}

pub fn handle_form_set(args: &ArgMatches, ctx: &Context) -> Result<()> {
    let index = slot(args)?;
    let name = args.get_one::<String>("name").map(String::as_str);
    let url = match args.get_one::<String>("url") {
        Some(raw) if raw.trim().is_empty() => Some(String::new()),
        Some(raw) => Some(normalize_url(raw).with_context(|| format!("Invalid URL '{}'", raw))?),
        None => None,
    };
    if name.is_none() && url.is_none() {
        bail!("Nothing to change: pass --name and/or --url");
    }

    let mut form = ctx.form()?;
    form.set_website(index, name, url.as_deref())?;
    println!("{} Updated website {}", "✓".green().bold(), index + 1);
    print!("{}", render_form(form.draft()));
    Ok(())
}

pub fn handle_form_add(ctx: &Context) -> Result<()> {
    let mut form = ctx.form()?;
    let index = form.add_website()?;
    println!("{} Added website slot {}", "✓".green().bold(), index + 1);
    Ok(())
}

pub fn handle_form_remove(args: &ArgMatches, ctx: &Context) -> Result<()> {
    let index = slot(args)?;
    let mut form = ctx.form()?;
    let removed = form.remove_website(index)?;
    let label = non_blank(&removed.name).unwrap_or("empty slot");
    println!(
        "{} Removed website {} ({})",
        "✓".green().bold(),
        index + 1,
        label
    );
    Ok(())
}

pub fn handle_form_category(args: &ArgMatches, ctx: &Context) -> Result<()> {
    let category = parse_category(args, "CATEGORY")?;
    let mut form = ctx.form()?;
    form.set_category(category)?;
    println!(
        "{} Category set to {}",
        "✓".green().bold(),
        category.label().bright_white()
    );
    Ok(())
}

pub fn handle_form_reset(ctx: &Context) -> Result<()> {
    let mut form = ctx.form()?;
    form.reset()?;
    println!("{} Form reset", "✓".green().bold());
    Ok(())
}

pub async fn handle_form_submit(ctx: &Context) -> Result<()> {
    let form = ctx.form()?;
    let client = ctx.client()?;
    let analyzer = Analyzer::new(&client, &ctx.cache, &ctx.session);

    let count = form.draft().filled_websites().len();
    let progress = spinner(format!("Comparing {} websites...", count))?;
    let result = analyzer.submit_form(&form).await;
    progress.finish_and_clear();

    report_analysis(ctx, result?)
}

pub async fn handle_analyze(args: &ArgMatches, ctx: &Context) -> Result<()> {
    let websites: Vec<WebsiteInput> = args
        .get_many::<WebsiteInput>("site")
        .map(|sites| sites.cloned().collect())
        .unwrap_or_default();
    let category = parse_category(args, "category")?;

    let client = ctx.client()?;
    let analyzer = Analyzer::new(&client, &ctx.cache, &ctx.session);

    let progress = spinner(format!("Comparing {} websites...", websites.len()))?;
    let result = analyzer.submit(&websites, category).await;
    progress.finish_and_clear();

    report_analysis(ctx, result?)
}

fn report_analysis(ctx: &Context, result: ComparisonResult) -> Result<()> {
    println!(
        "{} Analysis complete: {} websites compared",
        "✓".green().bold(),
        result.full.len()
    );
    if !ctx.quiet {
        println!();
        let report = render_summary(&ViewData::Live(result), None, ReportFormat::Text)?;
        println!("{}", report.trim_end());
    }
    Ok(())
}

pub fn handle_view_summary(args: &ArgMatches, ctx: &Context) -> Result<()> {
    let sources = compose(&ctx.cache, ctx.session.clone(), ctx.settings.diagnostics);
    let report = render_summary(&sources.load(), parse_section(args)?, parse_format(args))?;
    emit(&report, args)
}

pub fn handle_view_text(args: &ArgMatches, ctx: &Context) -> Result<()> {
    let sources = compose(&ctx.cache, ctx.session.clone(), ctx.settings.diagnostics);
    let report = render_text_analysis(&sources.load(), parse_section(args)?, parse_format(args))?;
    emit(&report, args)
}

pub fn handle_view_vision(args: &ArgMatches, ctx: &Context) -> Result<()> {
    let sources = compose(&ctx.cache, ctx.session.clone(), ctx.settings.diagnostics);
    let website = args.get_one::<String>("website").map(String::as_str);
    let report = render_vision(
        &sources.load(),
        &ctx.settings.asset_base,
        website,
        parse_format(args),
    )?;
    emit(&report, args)
}

pub async fn handle_watch(args: &ArgMatches, ctx: &Context) -> Result<()> {
    let section = parse_section(args)?;
    let sources = compose(&ctx.cache, ctx.session.clone(), ctx.settings.diagnostics);
    println!(
        "{}",
        render_summary(&sources.load(), section, ReportFormat::Text)?.trim_end()
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _subscription = ctx.cache.on_external_write(&ctx.session, move |fresh| {
        let _ = tx.send(fresh);
    })?;

    println!();
    println!(
        "{} Watching for new results (Ctrl+C to stop)",
        "→".blue().bold()
    );

    loop {
        tokio::select! {
            update = rx.recv() => {
                let Some(fresh) = update else { break };
                info!("Cache entry changed in another context");
                println!();
                print_divider();
                println!(
                    "{} Results changed at {}",
                    "↻".cyan().bold(),
                    Local::now().format("%H:%M:%S")
                );
                print_divider();
                let report = render_summary(&sources.resolve(fresh), section, ReportFormat::Text)?;
                println!("{}", report.trim_end());
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("{} Stopped watching", "✓".green().bold());
                break;
            }
        }
    }
    Ok(())
}

pub fn handle_session_show(ctx: &Context) -> Result<()> {
    let info = ctx.cache.entry_info()?;
    ctx.heading("SESSION");
    println!(
        "{} Session: {}",
        "→".blue(),
        ctx.session.as_str().bright_white()
    );
    println!(
        "{} Session file: {}",
        "→".blue(),
        ctx.settings.session_file.display()
    );
    println!(
        "{} {}",
        "→".blue(),
        describe_entry(info.as_ref(), &ctx.session, Utc::now())
    );
    Ok(())
}

/// Ends the session without minting a new one
pub fn handle_session_end(settings: &Settings) -> Result<()> {
    let store = settings.session_store();
    let Some(session) = peek_session(&store)? else {
        println!("{} No active session", "→".blue());
        return Ok(());
    };

    let db_path = settings.database_path();
    if Database::exists(&db_path) {
        let db = Database::new(&db_path)?;
        DraftStore::new(&db, &session).clear()?;
    }
    end_session(&store)?;

    info!("Ended session {}", session);
    println!("{} Session {} ended", "✓".green().bold(), session);
    Ok(())
}

pub fn handle_cache_clear(ctx: &Context) -> Result<()> {
    ctx.cache.clear()?;
    info!("Cleared the result cache");
    println!("{} Cache cleared", "✓".green().bold());
    Ok(())
}

pub fn handle_ui(ctx: &Context) -> Result<()> {
    run_browser(
        &ctx.cache,
        &ctx.session,
        BrowserOptions {
            asset_base: ctx.settings.asset_base.clone(),
            diagnostics: ctx.settings.diagnostics,
        },
    )
}
