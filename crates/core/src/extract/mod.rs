//! Heuristic extraction of catalog, episode and stream data from rendered
//! pages.
//!
//! All functions here are synchronous over an owned [`LoadedPage`]
//! snapshot; the parsed document never outlives the call.
//!
//! [`LoadedPage`]: crate::browser::LoadedPage

mod catalog;
mod episodes;
mod links;
mod selector;
mod stream;

pub use catalog::{extract_catalog, MAX_GENRES};
pub use episodes::{extract_episodes, infer_number_from_title};
pub use links::{first_number, resolve_link};
pub use selector::{all_texts, clean_text, compile, first_group, first_text, Extract, FieldQuery};
pub use stream::{
    probe_dom, probe_iframe, probe_video, resolve_loaded, resolve_stream, scan_scripts, EMBED_HOSTS,
};
