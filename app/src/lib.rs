//! Host for the todo list: executes `todo-core` requests over HTTP and
//! drives a `TodoListView` from the terminal.

pub mod remote;
pub mod terminal;

use std::sync::Arc;

use todo_core::{Authenticator, RemoteCollection, TodoListView};
use tokio::io::BufReader;

pub use remote::HttpCollection;
pub use terminal::Exit;

/// Mount a view on `remote`, run the terminal loop on stdin/stdout, then
/// tear the view down the way the loop ended.
pub async fn run<R, A>(remote: Arc<R>, auth: Arc<A>) -> Exit
where
    R: RemoteCollection,
    A: Authenticator,
{
    let view = TodoListView::mount(remote, auth);
    let renderer = tokio::spawn(terminal::redraw(view.changes(), tokio::io::stdout()));

    let exit = terminal::drive(&view, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await;
    match exit {
        Exit::SignOut => view.sign_out().await,
        Exit::Quit => view.unmount(),
    }

    if let Err(e) = renderer.await {
        tracing::warn!(error = %e, "renderer task failed");
    }
    exit
}
