//! Line-oriented front-end for a mounted `TodoListView`.
//!
//! A plain line becomes the draft and is submitted. Lines starting with `:`
//! are commands. The list is redrawn whenever a snapshot replaces the mirror.

use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use todo_core::{Authenticator, RemoteCollection, Snapshot, TodoListView};

pub const HELP: &str = "\
type a line to add it as a todo
  :rm <n>     delete the n-th todo
  :retry      resubmit the last draft that failed
  :signout    sign out and exit
  :quit       exit without signing out
  :help       show this text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Retry,
    Delete(usize),
    SignOut,
    Quit,
    Help,
    Invalid(String),
}

/// How the input loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    SignOut,
    Quit,
}

pub fn parse_command(line: &str) -> Command {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Submit(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("rm"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Command::Delete(n),
            _ => Command::Invalid(format!("not an item number: {n}")),
        },
        (Some("retry"), None) => Command::Retry,
        (Some("signout"), None) => Command::SignOut,
        (Some("quit") | Some("q"), None) => Command::Quit,
        (Some("help"), None) => Command::Help,
        _ => Command::Invalid(format!("unknown command: {line}")),
    }
}

/// Draw the list as numbered lines.
pub fn render(items: &Snapshot) -> String {
    let mut out = String::from("My todos\n");
    if items.is_empty() {
        out.push_str("  (nothing yet)\n");
    }
    for (i, todo) in items.iter().enumerate() {
        out.push_str(&format!("  {:>2}. {}\n", i + 1, todo.content));
    }
    out
}

/// Redraw on every mirror change until the mirror's writer goes away.
pub async fn redraw<W: AsyncWrite + Unpin>(mut changes: watch::Receiver<Snapshot>, mut out: W) {
    loop {
        let frame = render(&changes.borrow_and_update());
        if out.write_all(frame.as_bytes()).await.is_err() || out.flush().await.is_err() {
            return;
        }
        if changes.changed().await.is_err() {
            return;
        }
    }
}

/// Feed input lines to the view until sign-out, quit, end of input, or
/// a failed write to `out`.
///
/// Creates and deletes run concurrently with further input; all of them are
/// finished or dropped before this returns.
pub async fn drive<R, A, I, W>(view: &TodoListView<R, A>, input: I, mut out: W) -> Exit
where
    R: RemoteCollection,
    A: Authenticator,
    I: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut pending: FuturesUnordered<LocalBoxFuture<'_, ()>> = FuturesUnordered::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "reading input");
                        break;
                    }
                };
                let reply = match parse_command(&line) {
                    Command::Submit(text) => {
                        view.set_draft(text);
                        pending.push(view.create().boxed_local());
                        None
                    }
                    Command::Retry => {
                        pending.push(view.create().boxed_local());
                        None
                    }
                    Command::Delete(n) => {
                        match view.items().get(n - 1) {
                            Some(todo) => pending.push(view.delete(todo.id).boxed_local()),
                            None => tracing::debug!(n, "no such item"),
                        }
                        None
                    }
                    Command::Help => Some(HELP.to_string()),
                    Command::Invalid(msg) => Some(msg),
                    Command::SignOut => return finish(pending, Exit::SignOut).await,
                    Command::Quit => return finish(pending, Exit::Quit).await,
                };
                if let Some(text) = reply {
                    if let Err(e) = write_line(&mut out, &text).await {
                        tracing::debug!(error = %e, "output closed");
                        return finish(pending, Exit::Quit).await;
                    }
                }
            }
            Some(()) = pending.next(), if !pending.is_empty() => {}
        }
    }
    finish(pending, Exit::Quit).await
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(format!("{text}\n").as_bytes()).await?;
    out.flush().await
}

async fn finish(mut pending: FuturesUnordered<LocalBoxFuture<'_, ()>>, exit: Exit) -> Exit {
    while pending.next().await.is_some() {}
    exit
}
