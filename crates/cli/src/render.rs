use std::fmt::Write as _;

use listsync_model::Document;

pub const LOADING: &str = "Loading...";

/// Text view of the list: a loading line until the first document arrives.
pub fn render(document: Option<&Document>) -> String {
	let Some(document) = document else {
		return format!("{LOADING}\n");
	};

	let mut out = String::new();
	let _ = writeln!(out, "== {} ==", document.name);
	if document.items.is_empty() {
		out.push_str("(empty)\n");
	}
	for (key, item) in &document.items {
		let mark = if item.done { 'x' } else { ' ' };
		let _ = writeln!(out, "[{mark}] {key}: {}", item.label);
	}
	out
}
