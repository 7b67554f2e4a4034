use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pecha_reader::config::FileStore;
use pecha_reader::reader::{Applied, ChapterPane, NavigationParams, NewChapter, ScrollMetrics, SlotMatcher};
use pecha_reader::text::Section;
use pecha_reader::{Config, ContentSource, PechaClient, ReadingSession};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pecha")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Override the API base URL from config.json
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a text in a chapter pane and print its first pages
    Read {
        /// Text to read
        text_id: String,
        /// Content tree within the text
        #[arg(long)]
        content_id: Option<String>,
        /// Translation version to interleave
        #[arg(long)]
        version_id: Option<String>,
        /// Segment to open on
        #[arg(long)]
        segment_id: Option<String>,
        /// Page to start from
        #[arg(long, default_value_t = 0)]
        index: u32,
        /// Number of pages to load
        #[arg(short, long, default_value_t = 3)]
        pages: u32,
    },
    /// Resume the session from a reader URL query string
    Open {
        /// Query string, e.g. "text_id=..&content_id=.."
        query: String,
    },
    /// Print the table of contents of a text
    Toc {
        /// Text to inspect
        text_id: String,
    },
    /// List open chapters
    Chapters,
    /// Close a chapter
    Close {
        /// Chapter id, as printed by `chapters`
        id: String,
    },
    /// Close every chapter and clear the session
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pecha_reader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    let client = PechaClient::new(&config.api_base_url, config.request_timeout())
        .context("Failed to create API client")?;
    let store = FileStore::open(Config::session_path()?);

    match cli.command {
        Commands::Read { text_id, content_id, version_id, segment_id, index, pages } => {
            let mut session = ReadingSession::mount(store, config, None);
            let new = NewChapter {
                text_id,
                content_id,
                segment_id,
                version_id,
                section_id: None,
                content_index: index,
            };
            let after = session.chapters().last().map(|s| s.id.clone());
            let Some(id) = session.add_chapter(new, after.as_deref()) else {
                bail!(
                    "Already reading {} chapters; close one first",
                    session.config().max_chapters
                );
            };
            read_pages(&mut session, &client, &id, pages).await?;
        }
        Commands::Open { query } => {
            let nav = NavigationParams::parse_query(&query).context("Query has no text_id")?;
            let mut session = ReadingSession::mount(store, config, Some(&nav));
            let ids: Vec<String> = session.chapters().iter().map(|s| s.id.clone()).collect();
            for id in ids {
                read_pages(&mut session, &client, &id, 1).await?;
            }
        }
        Commands::Toc { text_id } => {
            let toc = client.table_of_contents(&text_id).await?;
            for section in &toc.sections {
                print_toc(section, 0);
            }
        }
        Commands::Chapters => {
            let session = ReadingSession::mount(store, config, None);
            if session.chapters().is_empty() {
                println!("No open chapters");
            }
            for slot in session.chapters() {
                println!(
                    "{}  text={} content={} version={}",
                    slot.id,
                    slot.text_id,
                    slot.content_id.as_deref().unwrap_or("-"),
                    slot.version_id.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::Close { id } => {
            let mut session = ReadingSession::mount(store, config, None);
            let before = session.chapters().len();
            if session.remove_chapter(&SlotMatcher::by_id(&id)).len() == before {
                bail!("No open chapter with id {}", id);
            }
        }
        Commands::Reset => {
            let session = ReadingSession::mount(store, config, None);
            session.unmount();
        }
    }

    Ok(())
}

/// Load the first page of a chapter plus `pages - 1` more, then print it
async fn read_pages(
    session: &mut ReadingSession<FileStore>,
    client: &PechaClient,
    id: &str,
    pages: u32,
) -> Result<()> {
    let mut requests: Vec<_> =
        session.pane_mut(id).and_then(ChapterPane::initial_request).into_iter().collect();

    for page in 0..pages.max(1) {
        if requests.is_empty() {
            break;
        }
        for outcome in session.fetch(client, requests).await {
            if let Applied::Failed(e) = outcome.applied {
                return Err(e).context(format!("Failed to load chapter {}", outcome.pane_id));
            }
        }
        if page + 1 == pages {
            break;
        }
        // An empty viewport always reads as scrolled to the bottom
        requests = session.on_scroll(id, &ScrollMetrics::default());
    }

    let pane = session.pane(id).context("Chapter was closed")?;
    println!("== {} ({})", pane.slot().text_id, pane.id());
    for section in pane.content().sections() {
        print_section(section, 0);
    }
    Ok(())
}

fn print_section(section: &Section, depth: usize) {
    let indent = "  ".repeat(depth);
    if let Some(title) = &section.title {
        println!("{}# {}", indent, title);
    }
    for segment in &section.segments {
        println!("{}{}", indent, segment.content);
    }
    for child in &section.sections {
        print_section(child, depth + 1);
    }
}

fn print_toc(section: &Section, depth: usize) {
    println!("{}{}  [{}]", "  ".repeat(depth), section.title.as_deref().unwrap_or("Untitled"), section.id);
    for child in &section.sections {
        print_toc(child, depth + 1);
    }
}
