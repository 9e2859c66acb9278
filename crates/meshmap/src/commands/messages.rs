//! Message log handler.

use std::sync::Arc;

use tabled::Tabled;

use meshmap_core::{Message, MessageFilter, MessageState, NodeNum};

use crate::capture;
use crate::cli::{MessagesArgs, StateFilter};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MessageRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Ch")]
    channel: u32,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Received")]
    received: String,
    #[tabled(rename = "Text")]
    text: String,
}

impl From<&Arc<Message>> for MessageRow {
    fn from(m: &Arc<Message>) -> Self {
        let p = &m.packet;
        Self {
            id: p.id,
            from: p.from.to_string(),
            to: if p.to.is_broadcast() {
                "^all".into()
            } else {
                p.to.to_string()
            },
            channel: p.channel,
            kind: p.kind.to_string(),
            state: m.state.to_string(),
            received: util::format_epoch(p.rx_time.unwrap_or(0)),
            text: p.text.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: MessagesArgs, ctx: &Context) -> Result<(), CliError> {
    let mut filters = Vec::new();
    if let Some(state) = args.state {
        filters.push(MessageFilter::State(match state {
            StateFilter::Waiting => MessageState::Waiting,
            StateFilter::Ack => MessageState::Ack,
            StateFilter::Unknown => MessageState::Unknown,
        }));
    }
    if let Some(ref from) = args.from {
        filters.push(MessageFilter::From(from.parse::<NodeNum>()?));
    }
    if let Some(channel) = args.channel {
        filters.push(MessageFilter::Channel(channel));
    }

    let replayed = capture::replay(capture::load(&args.capture.file)?, &ctx.mesh);
    let messages: Vec<Arc<Message>> = replayed
        .store
        .messages_snapshot()
        .iter()
        .filter(|m| filters.iter().all(|f| f.matches(m)))
        .cloned()
        .collect();

    let out = output::render_list(
        ctx.output,
        &messages,
        |m| MessageRow::from(m),
        |m| format!("{}\t{}\t{}", m.packet.from, m.state, m.packet.text),
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
