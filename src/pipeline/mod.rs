//! Pipeline stages for directory-to-table extraction.
//!
//! Each submodule implements one step; data only moves forward, and the
//! filesystem is the hand-off between the extraction and table stages.
//!
//! ## Data Flow
//!
//! ```text
//! classify ──▶ legacy ──▶ extract ──▶ normalize ──▶ table
//!  (walk)     (doc→docx)  (per file)   (strip \n\t)   (CSV rows)
//! ```
//!
//! 1. [`classify`]: walk the tree and bucket files by extension
//! 2. [`legacy`]: rename `.doc` files clear of collisions and convert them
//!    to `.docx` via an external converter
//! 3. [`extract`]: one text file per source through the format extractors
//!    ([`ocr`] / [`cloud`] for images, [`pdf`], [`docx`], [`html`]), named by
//!    [`naming`] and encoded by [`encoding`]
//! 4. [`normalize`]: drop line breaks and tabs from every text file
//! 5. [`table`]: append one row per text file above the size threshold

pub mod classify;
pub mod cloud;
pub mod docx;
pub mod encoding;
pub mod extract;
pub mod html;
pub mod legacy;
pub mod naming;
pub mod normalize;
pub mod ocr;
pub mod pdf;
pub mod table;
