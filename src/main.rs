//! Catalog search shell
//!
//! Drives the search bar and results panels of one simulated browser tab
//! from stdin.

use anyhow::Result;
use catalog_search::{
    autocomplete::{ProductsStatus, SelectOutcome, SuggestionItem},
    bootstrap::{mount_page, MountedPage, PageDocument},
    config,
    location::{Location, MemoryLocation},
    results::ResultsStatus,
    shell::{Command, HELP},
    AutocompleteCoordinator, SessionState,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_URL: &str = "https://shop.example/";

#[tokio::main]
async fn main() -> Result<()> {
    let Some(url) = parse_args()? else {
        return Ok(());
    };

    // Load configuration
    let settings = config::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_env("CATALOG_SEARCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(settings.general.log_level()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting catalog-search v{}", catalog_search::VERSION);

    let settings = config::init(settings)?;
    info!("Loaded {} catalogs", settings.catalogs.len());

    let location = Arc::new(MemoryLocation::new(url));
    let mut session = SessionState::from_settings(settings.clone(), location.clone())?;
    let mut page = mount(&session).await;
    render(&page, &session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        run(command, &mut page, &session).await;

        if let Some(href) = location.take_navigation() {
            info!("Loading {}", href);
            page.unmount();
            session = session.reload();
            page = mount(&session).await;
            render(&page, &session);
        } else {
            page.refresh_panels().await;
        }
    }

    page.unmount();
    Ok(())
}

/// Mount the page at the current URL and run the panels' initial fetch
async fn mount(session: &SessionState) -> MountedPage {
    let document = PageDocument::for_path(&session.current_path(), &session.settings);
    let page = mount_page(&document, session);
    page.refresh_panels().await;
    page
}

async fn run(command: Command, page: &mut MountedPage, session: &SessionState) {
    match command {
        Command::Type(text) => match page.autocomplete.as_mut() {
            Some(bar) => {
                bar.type_text(&text).await;
                render_suggestions(bar, session);
            }
            None => println!("no search bar on this page"),
        },
        Command::Submit(text) => match page.autocomplete.as_mut() {
            Some(bar) => println!("{:?}", bar.submit(&text)),
            None => println!("no search bar on this page"),
        },
        Command::Switch(id) => match page.autocomplete.as_mut() {
            Some(bar) => println!("{:?}", bar.switch_catalog(&id)),
            None => println!("no search bar on this page"),
        },
        Command::Pick(n) => match page.autocomplete.as_mut() {
            Some(bar) => match bar.select(n - 1) {
                SelectOutcome::Product(hit) => {
                    println!("opened product {} ({})", hit.name, hit.object_id)
                }
                SelectOutcome::Submitted(outcome) => println!("{:?}", outcome),
                SelectOutcome::Nothing => println!("no entry #{}", n),
            },
            None => println!("no search bar on this page"),
        },
        Command::Refine {
            catalog_id,
            attribute,
            value,
        } => match page.panel(&catalog_id) {
            Some(panel) => match panel.toggle_refinement(&attribute, &value) {
                Ok(active) => {
                    let state = if active { "on" } else { "off" };
                    println!("{}={} {}", attribute, value, state)
                }
                Err(e) => println!("{}", e),
            },
            None => println!("no panel for {}", catalog_id),
        },
        Command::Clear(catalog_id) => match page.panel(&catalog_id) {
            Some(panel) => panel.clear_refinements(),
            None => println!("no panel for {}", catalog_id),
        },
        Command::Page { catalog_id, page: n } => match page.panel(&catalog_id) {
            Some(panel) => panel.set_page(n - 1),
            None => println!("no panel for {}", catalog_id),
        },
        Command::Cart {
            catalog_id,
            object_id,
        } => match page.panel(&catalog_id) {
            Some(panel) if panel.add_to_cart(&object_id) => {
                println!("added {} to cart", object_id)
            }
            Some(_) => println!("{} is not shown on {}", object_id, catalog_id),
            None => println!("no panel for {}", catalog_id),
        },
        Command::Open(url) => session.location.assign(&url),
        Command::Show => {
            page.refresh_panels().await;
            render(page, session);
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

fn render(page: &MountedPage, session: &SessionState) {
    println!("== {}", session.location.href());
    if let Some(bar) = &page.autocomplete {
        let (label, options) = bar.catalog_options();
        let options: Vec<String> = options
            .iter()
            .map(|o| {
                let mark = if o.selected { "*" } else { " " };
                format!("{}{} ({})", mark, o.catalog_label, o.catalog_id)
            })
            .collect();
        println!("[{}] {}", label, options.join("  "));
        let input = if bar.input().is_empty() {
            format!("<{}>", bar.placeholder())
        } else {
            bar.input().to_string()
        };
        println!("search: {}", input);
    }

    for panel in &page.panels {
        let snapshot = panel.snapshot();
        println!(
            "-- {} '{}' page {}",
            snapshot.catalog_id,
            snapshot.query,
            snapshot.page + 1
        );
        for refinement in &snapshot.refinements {
            println!("   {}: {}", refinement.label, refinement.value);
        }
        match &snapshot.status {
            ResultsStatus::Idle => println!("   (not loaded)"),
            ResultsStatus::Ready(response) => {
                println!("   {} hits", response.nb_hits);
                for hit in &response.hits {
                    let price = hit.price.map(|p| format!("${:.2}", p)).unwrap_or_default();
                    println!("   {:>8} {} {}", hit.object_id, hit.name, price);
                }
            }
            ResultsStatus::Error(e) => println!("   error: {}", e),
        }
    }
}

fn render_suggestions(bar: &AutocompleteCoordinator, session: &SessionState) {
    let view = bar.view();
    for (n, item) in view.items().iter().enumerate() {
        match item {
            SuggestionItem::Recent(query) => println!("{:>3}. (recent) {}", n + 1, query),
            SuggestionItem::Suggestion(s) => println!("{:>3}. {}", n + 1, s.query),
            SuggestionItem::Product(hit) => {
                println!("{:>3}. [{}] {}", n + 1, hit.object_id, hit.name)
            }
        }
    }
    match &view.status {
        ProductsStatus::NoResults(message) => println!("     {}", message),
        ProductsStatus::Error(e) => {
            warn!("Suggestions unavailable on {}: {}", session.current_path(), e);
            println!("     suggestions unavailable");
        }
        ProductsStatus::Idle | ProductsStatus::Ready => {}
    }
}

/// Returns the initial URL, or None when only help or version was requested
fn parse_args() -> Result<Option<String>> {
    let mut url = DEFAULT_URL.to_string();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-u" | "--url" => {
                url = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--url requires a value"))?;
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("catalog-search {}", catalog_search::VERSION);
                return Ok(None);
            }
            other => anyhow::bail!("unexpected argument '{}'", other),
        }
    }
    url::Url::parse(&url)?;
    Ok(Some(url))
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
catalog-search v{}
Multi-catalog product search shell

USAGE:
    catalog-search [OPTIONS]

OPTIONS:
    -u, --url <URL>        Initial page URL (default: {})
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    CATALOG_SEARCH_SETTINGS_PATH  Path to settings.yml
    CATALOG_SEARCH_LOG            Log filter (default: info, debug with CATALOG_SEARCH_DEBUG)
    CATALOG_SEARCH_DEBUG          Debug logging (true/false)
    CATALOG_SEARCH_APP_ID         Search application id
    CATALOG_SEARCH_API_KEY        Search-only API key
    CATALOG_SEARCH_USER_TOKEN     Analytics user token

{}
"#,
        catalog_search::VERSION,
        DEFAULT_URL,
        HELP
    );
}
