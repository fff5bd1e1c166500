use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde_json::Value;
use simplelog::{ConfigBuilder, WriteLogger};

use portail::backend::{AuthProvider, DataStore, MemoryStore, RestStore, seed};
use portail::core::auth::{self, AdminSession};
use portail::core::config::{self, CliOverrides, ResolvedConfig};
use portail::core::crud::CrudService;
use portail::core::search::{ContentType, SearchService};
use portail::core::state::App;
use portail::core::{analytics, catalog, format, public};
use portail::tui;

#[derive(Parser)]
#[command(name = "portail", about = "Ministry portal administration console")]
struct Args {
    /// Use a seeded in-memory backend instead of the hosted one
    #[arg(long)]
    demo: bool,
    /// Admin account email
    #[arg(long)]
    email: Option<String>,
    /// Hosted backend URL
    #[arg(long)]
    backend_url: Option<String>,
    /// Rows per page in the console
    #[arg(long)]
    page_size: Option<usize>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and open the admin console (default)
    Admin,
    /// Export a model as CSV
    Export {
        model: String,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Equality filter, `field=value`; repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Create rows from a CSV file
    Import { model: String, file: PathBuf },
    /// Search the public collections
    Search {
        query: String,
        #[arg(long = "type")]
        only: Option<String>,
    },
    News {
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Print one published article in full
        #[arg(long)]
        id: Option<String>,
    },
    Projects {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        status: Option<String>,
    },
    Tenders {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Careers {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Events {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Publications {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        category: Option<String>,
    },
    /// Row counts and most searched terms
    Dashboard,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected field=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Ignoring config file: {e}");
        Default::default()
    });
    let overrides = CliOverrides {
        backend_url: args.backend_url.clone(),
        email: args.email.clone(),
        page_size: args.page_size,
    };
    let config = config::resolve(&file_config, &overrides);

    // Initialize file logger - writes to portail.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("portail.log") {
        let _ = WriteLogger::init(config.log_level, log_config, log_file);
    }
    info!("Portail starting up (demo: {})", args.demo);

    let command = args.command.unwrap_or(Command::Admin);
    let result = if args.demo {
        let store = Arc::new(MemoryStore::new());
        seed::populate(&store);
        execute(store, &config, command, true).await
    } else {
        let store = Arc::new(RestStore::new(
            config.backend_url.clone(),
            config.anon_key.clone(),
        ));
        execute(store, &config, command, false).await
    };

    if let Err(message) = result {
        error!("{}", message);
        eprintln!("{message}");
        std::process::exit(1);
    }
    Ok(())
}

async fn sign_in<S>(store: &S, config: &ResolvedConfig, demo: bool) -> Result<AdminSession, String>
where
    S: DataStore + AuthProvider,
{
    let (email, password) = if demo {
        (
            config.email.clone().unwrap_or_else(|| seed::DEMO_EMAIL.to_string()),
            config.password.clone().unwrap_or_else(|| seed::DEMO_PASSWORD.to_string()),
        )
    } else {
        let email = config
            .email
            .clone()
            .ok_or("No admin email: set --email, PORTAIL_EMAIL or [admin] email")?;
        let password = config
            .password
            .clone()
            .ok_or("No password: set PORTAIL_PASSWORD")?;
        (email, password)
    };
    auth::sign_in(store, store, &email, &password, &config.allowed_roles)
        .await
        .map_err(|e| format!("Connexion refusée : {e}"))
}

fn service_for(
    store: Arc<dyn DataStore>,
    config: &ResolvedConfig,
    name: &str,
) -> Result<CrudService, String> {
    let model = catalog::find(name).ok_or_else(|| format!("Modèle inconnu : {name}"))?;
    Ok(CrudService::new(store, Arc::new(model)).with_export_limit(config.export_limit))
}

async fn execute<S>(
    store: Arc<S>,
    config: &ResolvedConfig,
    command: Command,
    demo: bool,
) -> Result<(), String>
where
    S: DataStore + AuthProvider + 'static,
{
    let data: Arc<dyn DataStore> = store.clone();
    let today = chrono::Local::now().date_naive();
    let failed = |e: portail::backend::StoreError| format!("Erreur lors du chargement : {e}");

    match command {
        Command::Admin => {
            let user = sign_in(&*store, config, demo).await?;
            let app = App::from_config(data, config, Some(user));
            tui::run(app).map_err(|e| format!("Terminal error: {e}"))
        }
        Command::Export {
            model,
            out,
            filters,
        } => {
            sign_in(&*store, config, demo).await?;
            let service = service_for(data, config, &model)?;
            let filters: BTreeMap<String, Value> = filters
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            let csv = service
                .export(&filters)
                .await
                .map_err(|e| format!("{} ({e})", e.user_message("de l'export")))?;
            match out {
                Some(path) => {
                    fs::write(&path, csv).map_err(|e| format!("{}: {e}", path.display()))?;
                    println!("Export écrit dans {}", path.display());
                }
                None => print!("{csv}"),
            }
            Ok(())
        }
        Command::Import { model, file } => {
            let user = sign_in(&*store, config, demo).await?;
            let text =
                fs::read_to_string(&file).map_err(|e| format!("{}: {e}", file.display()))?;
            let service = service_for(data, config, &model)?.with_audit(
                portail::core::crud::AuditTrail {
                    user_id: user.user_id().to_string(),
                },
            );
            let report = service
                .import(&text)
                .await
                .map_err(|e| format!("{} ({e})", e.user_message("de l'import")))?;
            println!("{} élément(s) créé(s)", report.created);
            for (row, reason) in &report.failed {
                println!("  ligne {row} : {reason}");
            }
            if !report.ignored_columns.is_empty() {
                warn!("Ignored columns: {:?}", report.ignored_columns);
                println!("Colonnes ignorées : {}", report.ignored_columns.join(", "));
            }
            Ok(())
        }
        Command::Search { query, only } => {
            let only = match only {
                Some(name) => Some(
                    ContentType::parse(&name).ok_or_else(|| format!("Type inconnu : {name}"))?,
                ),
                None => None,
            };
            let results = SearchService::new(data)
                .with_limit(config.per_collection_limit)
                .with_logging(config.log_searches)
                .search(&query, only)
                .await;
            if results.hits.is_empty() {
                println!("Aucun résultat pour « {query} »");
            }
            for hit in &results.hits {
                println!(
                    "[{}] {} · {}",
                    hit.content_type.label(),
                    hit.title,
                    format::long_date(&hit.created_at)
                );
            }
            Ok(())
        }
        Command::News { id: Some(id), .. } => {
            let article = public::news_detail(&*data, &id).await.map_err(failed)?;
            print!("{}", public::render_news_detail(&article));
            Ok(())
        }
        Command::News { limit, id: None } => {
            let items = public::latest_news(&*data, limit).await.map_err(failed)?;
            print!("{}", public::render_news(&items));
            Ok(())
        }
        Command::Projects { limit, status } => {
            let items = public::projects(&*data, status.as_deref(), limit)
                .await
                .map_err(failed)?;
            print!("{}", public::render_projects(&items));
            Ok(())
        }
        Command::Tenders { limit } => {
            let items = public::open_tenders(&*data, today, limit)
                .await
                .map_err(failed)?;
            print!("{}", public::render_tenders(&items));
            Ok(())
        }
        Command::Careers { limit } => {
            let items = public::open_careers(&*data, today, limit)
                .await
                .map_err(failed)?;
            print!("{}", public::render_careers(&items));
            Ok(())
        }
        Command::Events { limit } => {
            let items = public::upcoming_events(&*data, today, limit)
                .await
                .map_err(failed)?;
            print!("{}", public::render_events(&items));
            Ok(())
        }
        Command::Publications { limit, category } => {
            let items = public::publications(&*data, category.as_deref(), limit)
                .await
                .map_err(failed)?;
            print!("{}", public::render_publications(&items));
            Ok(())
        }
        Command::Dashboard => {
            sign_in(&*store, config, demo).await?;
            let dashboard = analytics::load(&*data, &catalog::all()).await;
            println!("Collections");
            for (label, count) in &dashboard.counts {
                match count {
                    Some(n) => println!("  {label:<24} {n}"),
                    None => println!("  {label:<24} -"),
                }
            }
            println!("Recherches fréquentes");
            for (term, count) in &dashboard.top_terms {
                println!("  {term:<24} {count}");
            }
            Ok(())
        }
    }
}
