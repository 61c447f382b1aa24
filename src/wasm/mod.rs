mod boundaries;
mod constants;
mod session;
mod validate;

pub use boundaries::{JsRpc, JsStorage, JsWallet};
pub use session::TokenStudio;

// Re-export constants and validation functions
pub use constants::*;
pub use validate::*;

use wasm_bindgen::prelude::*;

/// Module initialization: route `log` records to the browser console and
/// panic messages to `console.error`.
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
    }
}
