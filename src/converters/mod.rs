pub mod deck;
pub mod sink;

pub use deck::{render_snapshot, ConversionReport, DeckConverter};
pub use sink::{CallRecorder, DeckSink};
