//! Folds an XML token stream into nested JSON-style maps.

// crates.io
use quick_xml::{Reader, events::Event};
// self
use crate::{_prelude::*, error::ResponseError};

#[derive(Default)]
struct Frame {
	name: String,
	text: Option<String>,
	children: Option<Map<String, Value>>,
}
impl Frame {
	fn open(name: &[u8]) -> Self {
		Self { name: String::from_utf8_lossy(name).into_owned(), ..Default::default() }
	}

	fn insert(&mut self, name: String, value: Value) {
		self.text = None;
		self.children.get_or_insert_with(Map::new).insert(name, value);
	}

	fn set_text(&mut self, text: String) {
		if text.trim().is_empty() || self.children.is_some() {
			return;
		}

		self.text = Some(text);
	}

	fn into_value(self) -> Value {
		match (self.children, self.text) {
			(Some(children), _) => Value::Object(children),
			(None, Some(text)) => Value::String(text),
			(None, None) => Value::Null,
		}
	}
}

/// Parses `body` into the map accumulated under the synthetic root frame.
///
/// Each element becomes a key named after its local name. Character data becomes the
/// element's scalar value; nested elements turn it into a map. Sibling elements sharing a
/// name overwrite each other, last write wins. Empty elements map to `null`.
pub(super) fn fold(body: &str) -> Result<Map<String, Value>, ResponseError> {
	let mut reader = Reader::from_str(body);

	reader.config_mut().trim_text(true);

	let mut stack = vec![Frame::default()];

	loop {
		match reader.read_event().map_err(|source| ResponseError::Xml { source })? {
			Event::Start(start) => stack.push(Frame::open(start.local_name().as_ref())),
			Event::Empty(empty) => {
				let name = String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();

				if let Some(frame) = stack.last_mut() {
					frame.insert(name, Value::Null);
				}
			},
			Event::Text(text) => {
				let text = text.unescape().map_err(|source| ResponseError::Xml { source })?;

				if let Some(frame) = stack.last_mut() {
					frame.set_text(text.into_owned());
				}
			},
			Event::CData(data) => {
				let text = String::from_utf8_lossy(&data.into_inner()).into_owned();

				if let Some(frame) = stack.last_mut() {
					frame.set_text(text);
				}
			},
			Event::End(_) if stack.len() > 1 => {
				let Some(mut frame) = stack.pop() else { break };
				let name = std::mem::take(&mut frame.name);

				if let Some(parent) = stack.last_mut() {
					parent.insert(name, frame.into_value());
				}
			},
			Event::Eof => break,
			_ => {},
		}
	}

	Ok(stack.into_iter().next().and_then(|root| root.children).unwrap_or_default())
}
