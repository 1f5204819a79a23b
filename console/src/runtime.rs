use crate::commands;
use crate::error::ConsoleError;
use crate::state::AppState;
use tracing::{debug, warn};

/// Canned caller dialogue replayed into the active call.
pub const TRANSCRIPT_SCRIPT: [&str; 10] = [
    "Emergency Dispatch Fire and Rescue, what is the location of the emergency?",
    "Hello, this is Miller. At 45 Leopold Street, smoke is coming out of the window!",
    "Okay, 45 Leopold Street. Which floor?",
    "Third floor, I think. It's the large building on the corner.",
    "Are there any persons inside the apartment?",
    "I'm not sure, but an elderly lady lives there. I rang the doorbell but no answer.",
    "Understood. We are dispatching units immediately. Do you see flames?",
    "Not yet, but the smoke is getting thicker and it is black.",
    "Please wait on the street and guide the fire department. Do not put yourself in danger.",
    "Yes, I will. Please hurry!",
];

pub trait EventSink: Send + Sync + 'static {
    fn emit_json(&self, event: &str, payload: serde_json::Value);
}

pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit_json(&self, _event: &str, _payload: serde_json::Value) {}
}

#[derive(Clone, Debug)]
pub struct TranscriptPlayback {
    lines: Vec<String>,
    next: usize,
}

impl TranscriptPlayback {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }

    pub fn scripted() -> Self {
        Self::new(TRANSCRIPT_SCRIPT)
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.lines.len()
    }
}

pub fn start(state: &AppState) -> std::thread::JoinHandle<()> {
    start_with_sink(state, NoopSink)
}

/// Replays the scripted call on a background thread, one line per
/// configured interval, until the script runs out.
pub fn start_with_sink(state: &AppState, sink: impl EventSink) -> std::thread::JoinHandle<()> {
    let state_clone = state.clone();
    let interval = state.config.playback_interval;
    std::thread::spawn(move || {
        let mut playback = TranscriptPlayback::scripted();
        loop {
            match emit_tick(&state_clone, &sink, &mut playback) {
                Ok(true) => std::thread::sleep(interval),
                Ok(false) => break,
                Err(err) => {
                    warn!(error = %err, "transcript playback stopped");
                    break;
                }
            }
        }
        debug!("transcript playback finished");
    })
}

/// Appends the next scripted line and re-runs the supervisor. Returns
/// `false` once the script is exhausted.
pub fn emit_tick(
    state: &AppState,
    sink: &impl EventSink,
    playback: &mut TranscriptPlayback,
) -> Result<bool, ConsoleError> {
    let Some(line) = playback.lines.get(playback.next).cloned() else {
        return Ok(false);
    };
    let index = playback.next;
    playback.next += 1;

    let (before, after) = state.with_cad(|cad| {
        let before = serde_json::to_value(commands::advisory_dto(cad))?;
        cad.append_transcript(line.clone());
        let after = serde_json::to_value(commands::advisory_dto(cad))?;
        Ok((before, after))
    })?;

    sink.emit_json(
        "transcript-line",
        serde_json::json!({ "index": index, "line": line }),
    );
    if before != after {
        sink.emit_json("advisory-updated", after);
    }
    Ok(true)
}
