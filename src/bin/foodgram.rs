use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use foodgram::{
    actions::set_user_role,
    connection::connect,
    load_ingredients, load_tags,
    routes::{routes, AppState},
    schema::UserRole,
    Config,
};

#[derive(Parser)]
#[command(name = "foodgram", about = "Recipe sharing backend", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Import `name,measurement_unit` rows from a CSV file
    LoadIngredients {
        #[arg(default_value = "data/ingredients.csv")]
        path: PathBuf,
    },
    /// Import `name,color,slug` rows from a CSV file
    LoadTags { path: PathBuf },
    /// Give an existing user the admin role
    PromoteAdmin { email: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    let config = Config::from_env()?;
    let pool = connect(&config.database_url).await?;

    match args.command {
        Command::Serve => {
            let state = AppState::new(pool.clone(), &config)?;
            let (address, server) = warp::serve(routes(state))
                .bind_with_graceful_shutdown(config.bind_address, async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("Failed to listen for shutdown signal: {e}");
                    }
                });

            log::info!("Listening on http://{address}");
            server.await;
            log::info!("Server stopped");
        }
        Command::LoadIngredients { path } => {
            let report = load_ingredients(&path, &pool).await?;
            println!("{} ingredients created, {} skipped", report.created, report.skipped);
        }
        Command::LoadTags { path } => {
            let report = load_tags(&path, &pool).await?;
            println!("{} tags created, {} skipped", report.created, report.skipped);
        }
        Command::PromoteAdmin { email } => {
            if !set_user_role(&email, UserRole::Admin, &pool).await? {
                return Err(format!("No user with email {email}").into());
            }
            println!("{email} is now an admin");
        }
    }

    pool.close().await;
    Ok(())
}
