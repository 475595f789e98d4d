//! JavaScript entry points. Every function takes and returns JSON strings so the host page
//! can hand over a document dump and receive the deck call sequence.

use wasm_bindgen::prelude::*;

use crate::compiler;
use crate::config::RenderConfig;
use crate::converters::render_snapshot;
use crate::errors::Result;
use crate::extraction::extract_document;
use crate::models::dom::Document;

/// Installs the panic hook and routes `log` output to the browser console.
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(target_arch = "wasm32")]
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Console logger already installed");
    }
}

fn to_js_error(error: crate::errors::DeckError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_config(config_json: Option<String>) -> Result<RenderConfig> {
    let config = match config_json.as_deref().map(str::trim) {
        None | Some("") => RenderConfig::default(),
        Some(json) => serde_json::from_str(json)?,
    };
    config.validate()?;
    Ok(config)
}

fn extract_json(snapshot_json: &str) -> Result<String> {
    let mut document = Document::from_json(snapshot_json)?;
    let slides = extract_document(&mut document)?;
    Ok(serde_json::to_string(&slides)?)
}

fn render_json(snapshot_json: &str, config_json: Option<String>) -> Result<String> {
    let config = parse_config(config_json)?;
    render_snapshot(snapshot_json, &config)?.to_json()
}

/// Compiles slide markup to an HTML page.
#[wasm_bindgen(js_name = compileMarkup)]
pub fn compile_markup(input: &str) -> std::result::Result<String, JsValue> {
    compiler::compile(input).map_err(to_js_error)
}

/// Extracts the slide model from a document dump.
#[wasm_bindgen(js_name = extractSlides)]
pub fn extract_slides(snapshot_json: &str) -> std::result::Result<String, JsValue> {
    extract_json(snapshot_json).map_err(to_js_error)
}

/// Renders a document dump to the deck call sequence. `config_json` may be omitted.
#[wasm_bindgen(js_name = renderDeck)]
pub fn render_deck(
    snapshot_json: &str,
    config_json: Option<String>,
) -> std::result::Result<String, JsValue> {
    render_json(snapshot_json, config_json).map_err(to_js_error)
}
