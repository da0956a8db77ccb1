use crate::CLAP_STYLING;
use crate::handlers::parse_site;
use clap::{arg, command};
use url::Url;

const CATEGORIES: [&str; 5] = ["ecommerce", "blog", "portfolio", "corporate", "saas"];
const SECTIONS: [&str; 4] = ["full", "header", "main", "footer"];
const FORMATS: [&str; 2] = ["text", "json"];

fn section_arg() -> clap::Arg {
    arg!(-s --"section" <SECTION>)
        .required(false)
        .help("Only show one section")
        .value_parser(SECTIONS)
}

fn format_arg() -> clap::Arg {
    arg!(-f --"format" <FORMAT>)
        .required(false)
        .help("Report format: text, json")
        .value_parser(FORMATS)
        .default_value("text")
}

fn output_arg() -> clap::Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help("Save report to file (default: display to screen)")
        .value_parser(clap::value_parser!(std::path::PathBuf))
}

/// `cache` is only offered when `diagnostics` is set
pub fn command_argument_builder(diagnostics: bool) -> clap::Command {
    let cmd = clap::Command::new("webcompare")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("webcompare")
        .about("Compare website designs and browse the results")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress headers and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"api-url" <URL>)
                .required(false)
                .global(true)
                .help("Analysis endpoint (overrides WEBCOMPARE_API_URL)")
                .value_parser(clap::value_parser!(Url)),
        )
        .arg(
            arg!(--"data-dir" <PATH>)
                .required(false)
                .global(true)
                .help("Directory holding the database (overrides WEBCOMPARE_HOME)"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the webcompare database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the webcompare database (default: ~/.config/webcompare/)"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrites any existing database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("form")
                .about("Edit and submit the comparison form for this session")
                .subcommand_required(true)
                .subcommand(command!("show").about("Show the saved form"))
                .subcommand(
                    command!("set")
                        .about("Set the name and/or URL of a website slot")
                        .arg(
                            arg!(<INDEX>)
                                .help("Website number, starting at 1")
                                .value_parser(clap::value_parser!(usize)),
                        )
                        .arg(
                            arg!(-n --"name" <NAME>)
                                .required(false)
                                .help("Display name of the website"),
                        )
                        .arg(
                            arg!(-u --"url" <URL>)
                                .required(false)
                                .help("Address of the website (an empty value clears it)"),
                        ),
                )
                .subcommand(command!("add").about("Add an empty website slot"))
                .subcommand(
                    command!("remove").about("Remove a website slot").arg(
                        arg!(<INDEX>)
                            .help("Website number, starting at 1")
                            .value_parser(clap::value_parser!(usize)),
                    ),
                )
                .subcommand(
                    command!("category").about("Set the website category").arg(
                        arg!(<CATEGORY>)
                            .help("One of: ecommerce, blog, portfolio, corporate, saas")
                            .value_parser(CATEGORIES),
                    ),
                )
                .subcommand(command!("reset").about("Discard the saved form"))
                .subcommand(command!("submit").about("Send the form for analysis")),
        )
        .subcommand(
            command!("analyze")
                .about("Compare websites given on the command line, bypassing the saved form")
                .arg(
                    arg!(-s --"site" <SITE>)
                        .required(true)
                        .help("A website to compare, as NAME=URL (repeat for each website)")
                        .action(clap::ArgAction::Append)
                        .value_parser(parse_site),
                )
                .arg(
                    arg!(-c --"category" <CATEGORY>)
                        .required(false)
                        .help("Website category")
                        .value_parser(CATEGORIES)
                        .default_value("ecommerce"),
                ),
        )
        .subcommand(
            command!("view")
                .about("Show the cached comparison for this session")
                .subcommand_required(true)
                .subcommand(
                    command!("summary")
                        .about("Comparison table and top performer")
                        .arg(section_arg())
                        .arg(format_arg())
                        .arg(output_arg()),
                )
                .subcommand(
                    command!("text")
                        .about("Strengths, weaknesses and recommendations per section")
                        .arg(section_arg())
                        .arg(format_arg())
                        .arg(output_arg()),
                )
                .subcommand(
                    command!("vision")
                        .about("Visual design improvements per website")
                        .arg(
                            arg!(-w --"website" <NAME>)
                                .required(false)
                                .help("Only show one website"),
                        )
                        .arg(format_arg())
                        .arg(output_arg()),
                ),
        )
        .subcommand(
            command!("watch")
                .about("Print the summary again whenever another window updates the results")
                .arg(section_arg()),
        )
        .subcommand(
            command!("session")
                .about("Inspect or end the current session")
                .subcommand_required(true)
                .subcommand(command!("show").about("Show the session and its cached result"))
                .subcommand(command!("end").about("End the session and discard its form")),
        )
        .subcommand(command!("ui").about("Browse the results in a terminal UI"));

    if diagnostics {
        cmd.subcommand(
            command!("cache")
                .about("Diagnostics: manage the result cache")
                .subcommand_required(true)
                .subcommand(command!("clear").about("Remove the cached result and saved forms")),
        )
    } else {
        cmd
    }
}
