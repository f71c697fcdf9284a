//! prompt-box.nvim: Neovim binding for prompt-box
//!
//! Exposes the core app to Lua through a single `call(command, args)` entry
//! point. The Lua side renders the view model and re-renders on
//! `User PromptBoxChanged`; notifications go through `vim.notify`.
//!
//! ## Architecture
//!
//! - **Rust (nvim-oxi)**: prompt store, persistence, online fetch
//! - **Lua**: UI, keymaps, confirmation prompts

pub mod bridge;
pub mod ffi;
pub mod host;
pub mod logging;
pub mod runtime;

use nvim_oxi::{Dictionary, Function, Object};

/// Plugin entry point - called when Neovim loads the plugin
///
/// The function name determines the exported symbol: prompt_box_nvim ->
/// luaopen_prompt_box_nvim
#[nvim_oxi::plugin]
fn prompt_box_nvim() -> nvim_oxi::Result<Dictionary> {
    let mut exports = Dictionary::new();

    exports.insert(
        "call",
        Function::<(String, Object), Object>::from_fn(|(command, args): (String, Object)| {
            ffi::call(command, args)
        }),
    );
    exports.insert(
        "setup",
        Function::<Object, Object>::from_fn(ffi::setup),
    );
    exports.insert(
        "commands",
        Function::<(), Vec<String>>::from_fn(|()| ffi::command_names()),
    );

    Ok(exports)
}
