use anyhow::Context;
use clap::{Parser, Subcommand};
use motorpool_app::modules::vehicles::models::{ListParams, SortDirection, SortField, SortSpec};
use motorpool_app::modules::vehicles::preferences::PreferenceStore;
use motorpool_app::modules::vehicles::routes::ListModelsQuery;
use motorpool_app::modules::vehicles::session::ListSession;
use motorpool_app::Application;
use motorpool_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "motorpool", version, about = "Vehicle make and model catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Apply pending SQLite migrations
    Migrate,
    /// Print all makes ordered by name
    Makes,
    /// Print one page of models
    Models {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// One of id, name, abrv, make.name
        #[arg(long)]
        sort_field: Option<String>,
        /// asc or desc
        #[arg(long)]
        sort_direction: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        make_id: Option<i64>,
    },
    /// Print models using the saved list preferences, updating them first
    Browse {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        make_id: Option<i64>,
        #[arg(long)]
        sort_field: Option<String>,
        #[arg(long)]
        sort_direction: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        page: Option<u32>,
        /// Drop the saved search and make filter
        #[arg(long)]
        clear: bool,
    },
}

fn parse_wire<T: serde::de::DeserializeOwned>(raw: &str, what: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("invalid {what} '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load motorpool settings")?;
    motorpool_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => Application::build(settings).await?.serve().await,
        Command::Migrate => {
            let applied = motorpool_app::app::migrate(&settings).await?;
            tracing::info!(applied, "migrations applied");
            Ok(())
        }
        Command::Makes => {
            let app = Application::build(settings).await?;
            let makes = app.catalog().list_makes().await?;
            println!("{}", serde_json::to_string_pretty(&makes)?);
            app.shutdown().await
        }
        Command::Models {
            page,
            limit,
            sort_field,
            sort_direction,
            search,
            make_id,
        } => {
            let query: ListModelsQuery = serde_json::from_value(serde_json::json!({
                "page": page,
                "limit": limit,
                "sortField": sort_field,
                "sortDirection": sort_direction,
                "search": search,
                "makeId": make_id,
            }))
            .with_context(|| "invalid list arguments")?;

            let app = Application::build(settings).await?;
            let models = app.catalog().list_models(&ListParams::from(query)).await?;
            println!("{}", serde_json::to_string_pretty(&models)?);
            app.shutdown().await
        }
        Command::Browse {
            search,
            make_id,
            sort_field,
            sort_direction,
            limit,
            page,
            clear,
        } => {
            let store = PreferenceStore::in_dir(&settings.preferences.dir);
            let app = Application::build(settings).await?;
            let mut session = ListSession::with_preferences(app.catalog().clone(), store);

            if clear {
                session.clear_filters();
            }
            if let Some(search) = search {
                session.set_search(search);
            }
            if make_id.is_some() {
                session.set_make(make_id);
            }
            if sort_field.is_some() || sort_direction.is_some() {
                let current = session.state().sort;
                let field = match sort_field.as_deref() {
                    Some(raw) => parse_wire::<SortField>(raw, "sort field")?,
                    None => current.field,
                };
                let direction = match sort_direction.as_deref() {
                    Some(raw) => parse_wire::<SortDirection>(raw, "sort direction")?,
                    None => current.direction,
                };
                session.set_sort(SortSpec::new(field, direction));
            }
            if let Some(limit) = limit {
                session.set_limit(limit);
            }
            if let Some(page) = page {
                session.set_page(page);
            }

            session.refresh().await;
            let view = session.view();
            match (&view.error, &view.page) {
                (Some(error), _) => anyhow::bail!("{}", error.message),
                (None, Some(page)) => println!("{}", serde_json::to_string_pretty(page)?),
                (None, None) => anyhow::bail!("list query was superseded"),
            }
            app.shutdown().await
        }
    }
}
