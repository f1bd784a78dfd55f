mod event;
mod sink;

pub use event::MatchEvent;
pub use sink::{CollectingSink, EventSink};
