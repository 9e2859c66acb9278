//! JSONL packet captures.
//!
//! One `MeshEvent` per line, adjacently tagged:
//! `{"kind": "position", "payload": {"from": 5, "data": {...}}}`.

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use meshmap_core::{DataStore, MeshConfig, MeshEvent, PacketDispatcher};

use crate::error::CliError;

/// Read a capture from a file, or stdin for `-`.
pub fn load(path: &Path) -> Result<Vec<MeshEvent>, CliError> {
    let (source, text) = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        ("<stdin>".to_owned(), text)
    } else {
        let source = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CliError::CaptureNotFound {
                    path: source.clone(),
                }
            } else {
                CliError::Io(e)
            }
        })?;
        (source, text)
    };

    let events = parse(&source, &text)?;
    debug!(%source, packets = events.len(), "loaded capture");
    Ok(events)
}

/// Parse capture text. Blank lines and `#` comments are skipped; the first
/// malformed line aborts with its 1-based line number.
pub fn parse(source: &str, text: &str) -> Result<Vec<MeshEvent>, CliError> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str(line).map_err(|e| CliError::BadPacket {
                path: source.to_owned(),
                line: line_no,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// A capture applied to a fresh store.
pub struct Replayed {
    pub store: Arc<DataStore>,
    pub dispatcher: PacketDispatcher,
}

/// Apply every packet synchronously, in file order.
pub fn replay(events: Vec<MeshEvent>, config: &MeshConfig) -> Replayed {
    let store = Arc::new(DataStore::new());
    let dispatcher = PacketDispatcher::new(store.clone(), config);
    for event in events {
        dispatcher.dispatch(event);
    }
    Replayed { store, dispatcher }
}
