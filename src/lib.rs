//! # Idea Garden Core
//!
//! Storage and placement core for the Idea Garden, a small note-taking toy in
//! which every idea is planted as a flower. The host UI (browser shell,
//! Flutter, desktop webview) draws the garden; this crate owns the ideas.
//!
//! ## Features
//!
//! - **Single-slot persistence**: the whole garden is one JSON array under one
//!   key, rewritten after every change
//! - **LMDB-backed slot** for hosts, in-memory slot for tests
//! - **Deterministic placement**: randomness is injected, so a seed replays a
//!   garden exactly
//! - **Host-driven timers**: spotlight and bloom-form delays advance only when
//!   the host ticks them
//! - **Safe error handling**: nothing in the garden is fatal; every failure
//!   degrades to a safe default
//!
//! ## Quick Start
//!
//! ```no_run
//! use idea_garden_core::{add_idea, load_ideas, open_garden};
//! use std::ffi::CString;
//! use std::ptr;
//!
//! let name = CString::new("my_garden").unwrap();
//! let garden = open_garden(name.as_ptr(), ptr::null());
//!
//! let ideas = load_ideas(garden);
//!
//! let candidate = CString::new(
//!     r#"{"title":"Cafe","description":"A cozy place","flowerType":"tulip"}"#,
//! ).unwrap();
//! let planted = add_idea(garden, candidate.as_ptr());
//! ```
//!
//! ## FFI Functions
//!
//! Every function answers with a JSON-serialized [`AppResponse`]; release it
//! with [`free_response`].
//!
//! - [`open_garden`] - Open or create a garden
//! - [`load_ideas`] - Read the saved garden into memory
//! - [`add_idea`] - Plant a new idea
//! - [`clear_new_flag`] - End an idea's spotlight early
//! - [`tick_garden`] - Fire due spotlight timers
//! - [`get_ideas`] - Current snapshot
//! - [`get_render_order`] - Back-to-front paint order with z ranks
//! - [`generate_grass`] - Decorative grass patches for a garden mount
//! - [`clear_garden`] - Wipe the persisted slot
//! - [`close_garden`] - Close storage and release the handle

pub mod app_response;
pub mod bloom_form;
pub mod description;
pub mod garden_config;
pub mod garden_state;
pub mod grass;
pub mod idea_model;
pub mod idea_store;
pub mod random_source;
pub mod render_order;
pub mod slot_storage;
pub mod spotlight;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::time::Instant;

use log::{info, warn};
use serde::Serialize;

pub use crate::app_response::AppResponse;
use crate::garden_config::GardenConfig;
use crate::garden_state::GardenState;
use crate::idea_model::IdeaCandidate;

/// Opens (or creates) the garden stored at `<name>.lmdb`.
///
/// # Parameters
///
/// * `name` - Null-terminated C string with the garden name
/// * `config_json` - Optional null-terminated JSON overriding [`GardenConfig`]
///   fields; pass null for the defaults
///
/// # Returns
///
/// A pointer to the [`GardenState`], or null on failure. The handle must be
/// released with [`close_garden`].
///
/// # Safety
///
/// `name` must point to a valid null-terminated string; `config_json` must do
/// the same or be null.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use idea_garden_core::open_garden;
///
/// let name = CString::new("garden").unwrap();
/// let config = CString::new(r#"{"spotlight_ms":1000}"#).unwrap();
/// let garden = open_garden(name.as_ptr(), config.as_ptr());
/// assert!(!garden.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn open_garden(name: *const c_char, config_json: *const c_char) -> *mut GardenState {
    if name.is_null() {
        warn!("Null name pointer passed to open_garden");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = if config_json.is_null() {
        GardenConfig::default()
    } else {
        let parsed = unsafe { CStr::from_ptr(config_json).to_str() }
            .map_err(|e| AppResponse::BadRequest(format!("Invalid UTF-8 in config: {e}")))
            .and_then(GardenConfig::from_json);
        match parsed {
            Ok(config) => config,
            Err(e) => {
                warn!("Rejected garden config: {e}");
                return std::ptr::null_mut();
            }
        }
    };

    match GardenState::init(name_str, config) {
        Ok(state) => {
            info!("✅ Garden '{}' opened", name_str);
            Box::into_raw(Box::new(state))
        }
        Err(e) => {
            warn!("❌ Failed to open garden '{}': {}", name_str, e);
            std::ptr::null_mut()
        }
    }
}

/// Reads the saved garden and returns it as a JSON array.
///
/// Every loaded idea comes back with `isNew` cleared.
///
/// # Parameters
///
/// * `state` - Handle returned by [`open_garden`]
///
/// # Returns
///
/// `Ok` with the ideas array. A missing or corrupt save answers with
/// `Ok("[]")`, never an error. A null handle answers with `BadRequest`.
///
/// # Safety
///
/// `state` must be null or a live handle from [`open_garden`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use std::ptr;
/// use idea_garden_core::{free_response, load_ideas, open_garden};
///
/// let name = CString::new("garden").unwrap();
/// let garden = open_garden(name.as_ptr(), ptr::null());
/// let ideas = load_ideas(garden);
/// free_response(ideas);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn load_ideas(state: *mut GardenState) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_state("load_ideas"),
    };
    let ideas = state.load();
    json_response(&ideas)
}

/// Plants an idea.
///
/// # Parameters
///
/// * `state` - Handle returned by [`open_garden`]
/// * `json_ptr` - Null-terminated C string holding the candidate JSON
///
/// # Returns
///
/// `Ok` with the created idea, `isNew` set; its spotlight ends on the first
/// [`tick_garden`] after the configured delay. Malformed JSON answers with
/// `SerializationError`. An unknown `flowerType` or a blank title or
/// description answers with `ValidationError`.
///
/// # Safety
///
/// `state` must be null or a live handle; `json_ptr` must be null or point to
/// a null-terminated string.
///
/// # JSON Format
///
/// ```json
/// {
///   "title": "NYC Cat Cafe",
///   "description": "A cafe with adoptable cats",
///   "flowerType": "tulip",
///   "flowerImage": null
/// }
/// ```
///
/// `flowerType` is one of `sunflower`, `tulip`, `rose`, `daisy` or `custom`.
/// `flowerImage` is kept only for `custom`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_idea(state: *mut GardenState, json_ptr: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_state("add_idea"),
    };

    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(err) => return err,
    };

    let candidate = match IdeaCandidate::from_json(&json_str) {
        Ok(c) => c,
        Err(e) => return response_to_c_string(&e),
    };

    match state.plant(candidate, Instant::now()) {
        Ok(idea) => json_response(&idea),
        Err(e) => response_to_c_string(&e),
    }
}

/// Clears `isNew` on the idea with `id`.
///
/// # Parameters
///
/// * `state` - Handle returned by [`open_garden`]
/// * `id` - Null-terminated C string with the idea id
///
/// # Returns
///
/// `Ok` echoing the id. Unknown ids are not an error.
///
/// # Safety
///
/// `state` must be null or a live handle; `id` must be null or point to a
/// null-terminated string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_new_flag(state: *mut GardenState, id: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_state("clear_new_flag"),
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    state.clear_new_flag(&id_str);
    response_to_c_string(&AppResponse::success(id_str))
}

/// Fires spotlight timers that are due.
///
/// Hosts call this from their own timer or frame loop.
///
/// # Parameters
///
/// * `state` - Handle returned by [`open_garden`]
///
/// # Returns
///
/// `Ok` with a JSON array of the ids whose `isNew` flag was just cleared.
///
/// # Safety
///
/// `state` must be null or a live handle from [`open_garden`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn tick_garden(state: *mut GardenState) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_state("tick_garden"),
    };
    let fired = state.tick(Instant::now());
    json_response(&fired)
}

/// Current in-memory garden, in insertion order.
///
/// # Parameters
///
/// * `state` - Handle returned by [`open_garden`]
///
/// # Returns
///
/// `Ok` with the ideas array. Nothing is read from storage.
///
/// # Safety
///
/// `state` must be null or a live handle from [`open_garden`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_ideas(state: *mut GardenState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_state("get_ideas"),
    };
    json_response(state.ideas())
}

/// Ideas back to front as `[{"id": ..., "z": ...}]`.
///
/// # Returns
///
/// `Ok` with the paint order. Ideas still in their spotlight rank 1000; the
/// rest rank `10 + floor(y)`. Ties keep insertion order.
///
/// # Safety
///
/// `state` must be null or a live handle from [`open_garden`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_render_order(state: *mut GardenState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_state("get_render_order"),
    };
    json_response(&state.render_order())
}

/// Fresh set of decorative grass patches. Call once per garden mount.
///
/// # Returns
///
/// `Ok` with an array of `{"id", "x", "y", "scale", "crowded"}` patches.
///
/// # Safety
///
/// `state` must be null or a live handle from [`open_garden`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn generate_grass(state: *mut GardenState) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_state("generate_grass"),
    };
    json_response(&state.grass())
}

/// Deletes the saved garden. Not a user action; meant for host resets.
///
/// # Returns
///
/// `Ok("Garden cleared")`, or `DatabaseError` if the slot could not be
/// removed.
///
/// # Safety
///
/// `state` must be null or a live handle from [`open_garden`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_garden(state: *mut GardenState) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_state("clear_garden"),
    };

    match state.clear_storage() {
        Ok(()) => response_to_c_string(&AppResponse::success("Garden cleared")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Closes the storage and frees the handle.
///
/// # Parameters
///
/// * `state` - Handle returned by [`open_garden`]
///
/// # Returns
///
/// `Ok("Garden closed")`, or `BadRequest` for a null handle.
///
/// # Safety
///
/// `state` must come from [`open_garden`] and must not be used afterwards.
/// Closing the same handle twice is undefined behaviour.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_garden(state: *mut GardenState) -> *const c_char {
    if state.is_null() {
        return bad_state("close_garden");
    }

    let mut state = unsafe { Box::from_raw(state) };
    match state.close() {
        Ok(()) => response_to_c_string(&AppResponse::success("Garden closed")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Releases a string returned by any function in this crate.
///
/// # Safety
///
/// `ptr` must be null or a string returned by this crate that has not been
/// freed yet.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr as *mut c_char));
    }
}

fn bad_state(function: &str) -> *const c_char {
    let error = AppResponse::BadRequest(format!("Null state pointer passed to {function}"));
    response_to_c_string(&error)
}

/// Serializes `value` into an `Ok` envelope.
fn json_response<T: Serialize + ?Sized>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Error serializing to JSON: {e:?}"));
            response_to_c_string(&error)
        }
    }
}

/// Converts an [`AppResponse`] to a C string owned by the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String, reporting null pointers and
/// invalid UTF-8 as a ready-made error response.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
