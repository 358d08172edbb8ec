use std::sync::Arc;

use listsync_authority::Authority;
use listsync_connection::{MemoryTransport, Transport, WebSocketTransport};
use listsync_engine::{Session, SessionConfig};
use listsync_model::Document;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::mpsc;

use crate::command::{Command, CommandError, HELP};
use crate::config::Settings;
use crate::render::render;

/// Name of the list served by `--loopback`.
const LOOPBACK_LIST: &str = "Todo List";

/// Runs the session until stdin ends or `quit` is entered.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
	let (transport, _authority): (Arc<dyn Transport>, Option<Authority>) = if settings.loopback {
		let (transport, listener) = MemoryTransport::new();
		let authority = Authority::spawn(Document::new(LOOPBACK_LIST), listener);
		(Arc::new(transport), Some(authority))
	} else {
		(Arc::new(WebSocketTransport::new()), None)
	};

	let (documents_tx, mut documents) = mpsc::unbounded_channel();
	let config = SessionConfig::new(settings.connection()).resync_on_divergence(settings.resync_on_divergence);
	let session = Session::start(transport, config, move |document: Arc<Document>| {
		let _ = documents_tx.send(document);
	});

	let mut out = tokio::io::stdout();
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	write(&mut out, &render(None)).await?;

	loop {
		tokio::select! {
			document = documents.recv() => {
				let Some(document) = document else {
					break;
				};
				write(&mut out, &render(Some(&document))).await?;
			}
			line = lines.next_line() => {
				let Some(line) = line? else {
					break;
				};
				if !handle_line(&session, &line, &mut out).await? {
					break;
				}
			}
		}
	}

	session.close().await;
	Ok(())
}

/// Returns `false` when the user asked to leave.
async fn handle_line(session: &Session, line: &str, out: &mut Stdout) -> anyhow::Result<bool> {
	let command = match line.parse::<Command>() {
		Ok(command) => command,
		Err(CommandError::Empty) => return Ok(true),
		Err(e) => {
			write(out, &format!("{e}\n{HELP}\n")).await?;
			return Ok(true);
		}
	};

	match command {
		Command::Quit => return Ok(false),
		Command::Show => write(out, &render(session.document().as_deref())).await?,
		Command::Help => write(out, &format!("{HELP}\n")).await?,
		command => match command.to_action(session.document().as_deref()) {
			Ok(Some(action)) => session.dispatch(action),
			Ok(None) => tracing::debug!(?command, "cli.nothing_to_send"),
			Err(e) => write(out, &format!("{e}\n")).await?,
		},
	}
	Ok(true)
}

async fn write(out: &mut Stdout, text: &str) -> std::io::Result<()> {
	out.write_all(text.as_bytes()).await?;
	out.flush().await
}
