use std::sync::Arc;

use clap::Parser;
use todo_app::{Exit, HttpCollection};
use todo_core::InMemoryCollection;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Live todo list backed by a shared collection service")]
struct Cli {
    /// Base URL of the todo service
    #[arg(short, long, env = "TODO_SERVER", default_value = "http://127.0.0.1:3000")]
    server: String,

    /// User to sign in as
    #[arg(short, long, env = "TODO_USER", default_value = "demo")]
    user: String,

    /// Keep todos in this process instead of talking to a server
    #[arg(long)]
    local: bool,
}

/// Logs go to stderr so stdout only carries the rendered list.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "todo_app=info,todo_core=info".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn session(cli: Cli) -> anyhow::Result<Exit> {
    if cli.local {
        let store = Arc::new(InMemoryCollection::new());
        return Ok(todo_app::run(store.clone(), store).await);
    }
    let remote = Arc::new(HttpCollection::sign_in(&cli.server, &cli.user).await?);
    Ok(todo_app::run(remote.clone(), remote).await)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    println!("{}\n", todo_app::terminal::HELP);

    let runtime = tokio::runtime::Runtime::new()?;
    let exit = runtime.block_on(session(cli));
    // stdin is read on a blocking thread that would otherwise hold shutdown open
    runtime.shutdown_background();

    if exit? == Exit::SignOut {
        println!("signed out");
    }
    Ok(())
}
