use crate::errors::{DeckError, Result};
use crate::models::primitives::{
    ConnectorSpec, DeckCall, PictureSpec, ShapeSpec, SlideSpec, TableSpec, TextBoxSpec,
};

/// The primitive serializer a deck is drawn into.
///
/// Calls arrive in paint order: `create_slide` first, then that slide's primitives. All
/// geometry is in pixels; converting to the target format's units is the sink's job.
pub trait DeckSink {
    fn create_slide(&mut self, slide: SlideSpec) -> Result<()>;
    fn create_text(&mut self, text: TextBoxSpec) -> Result<()>;
    fn create_shape(&mut self, shape: ShapeSpec) -> Result<()>;
    fn create_table(&mut self, table: TableSpec) -> Result<()>;
    fn create_picture(&mut self, picture: PictureSpec) -> Result<()>;
    fn create_connector(&mut self, connector: ConnectorSpec) -> Result<()>;

    /// Dispatches one recorded call to the matching method.
    fn apply(&mut self, call: DeckCall) -> Result<()> {
        match call {
            DeckCall::CreateSlide(spec) => self.create_slide(spec),
            DeckCall::CreateText(spec) => self.create_text(spec),
            DeckCall::CreateShape(spec) => self.create_shape(spec),
            DeckCall::CreateTable(spec) => self.create_table(spec),
            DeckCall::CreatePicture(spec) => self.create_picture(spec),
            DeckCall::CreateConnector(spec) => self.create_connector(spec),
        }
    }
}

/// A sink that keeps every call, for serialization to JSON or replay into another sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallRecorder {
    calls: Vec<DeckCall>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DeckCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<DeckCall> {
        self.calls
    }

    pub fn slide_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DeckCall::CreateSlide(_)))
            .count()
    }

    /// Serializes the recorded sequence as a pretty-printed JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.calls)?)
    }

    /// Primitives belong to the most recent slide, so one must be open first.
    fn push_primitive(&mut self, call: DeckCall) -> Result<()> {
        if self.calls.is_empty() {
            return Err(DeckError::Sink(format!(
                "{} before any createSlide",
                call.op_name()
            )));
        }
        self.calls.push(call);
        Ok(())
    }

    /// Feeds every recorded call, in order, into `sink`.
    pub fn replay(&self, sink: &mut dyn DeckSink) -> Result<()> {
        for call in &self.calls {
            sink.apply(call.clone())?;
        }
        Ok(())
    }
}

impl DeckSink for CallRecorder {
    fn create_slide(&mut self, slide: SlideSpec) -> Result<()> {
        self.calls.push(DeckCall::CreateSlide(slide));
        Ok(())
    }

    fn create_text(&mut self, text: TextBoxSpec) -> Result<()> {
        self.push_primitive(DeckCall::CreateText(text))
    }

    fn create_shape(&mut self, shape: ShapeSpec) -> Result<()> {
        self.push_primitive(DeckCall::CreateShape(shape))
    }

    fn create_table(&mut self, table: TableSpec) -> Result<()> {
        self.push_primitive(DeckCall::CreateTable(table))
    }

    fn create_picture(&mut self, picture: PictureSpec) -> Result<()> {
        self.push_primitive(DeckCall::CreatePicture(picture))
    }

    fn create_connector(&mut self, connector: ConnectorSpec) -> Result<()> {
        self.push_primitive(DeckCall::CreateConnector(connector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{colors::RgbColor, common::Rect, primitives::BackgroundSpec};

    fn sample_calls() -> Vec<DeckCall> {
        vec![
            DeckCall::CreateSlide(SlideSpec {
                id: "slide_0".to_string(),
                width: 1280.0,
                height: 720.0,
                background: BackgroundSpec::Solid {
                    color: RgbColor::WHITE,
                },
            }),
            DeckCall::CreatePicture(PictureSpec {
                rect: Rect::new(1.0, 2.0, 3.0, 4.0),
                data: b"png".to_vec(),
            }),
        ]
    }

    #[test]
    fn test_recorded_json_shape() {
        let mut recorder = CallRecorder::new();
        for call in sample_calls() {
            recorder.apply(call).unwrap();
        }
        let value: serde_json::Value = serde_json::from_str(&recorder.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["op"], "createSlide");
        assert_eq!(value[0]["background"]["kind"], "solid");
        assert_eq!(value[1]["op"], "createPicture");
        assert_eq!(value[1]["data"], "cG5n");

        let parsed: Vec<DeckCall> = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, sample_calls());
    }

    #[test]
    fn test_primitive_without_slide_is_rejected() {
        let mut recorder = CallRecorder::new();
        let picture = sample_calls().remove(1);
        let error = recorder.apply(picture).unwrap_err();
        assert!(matches!(error, DeckError::Sink(_)));
        assert!(error.to_string().contains("createPicture"));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_replay_preserves_order() {
        let mut first = CallRecorder::new();
        for call in sample_calls() {
            first.apply(call).unwrap();
        }
        let mut second = CallRecorder::new();
        first.replay(&mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.slide_count(), 1);
    }
}
