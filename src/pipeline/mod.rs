//! Pipeline stages for deck generation.
//!
//! Each submodule implements exactly one transformation step and can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! outline ──▶ content ─┬─▶ assemble ──▶ render
//! (plan)      (bodies) │   (markup)     (bytes)
//!                      └── image ◀── keywords
//! ```
//!
//! 1. [`outline`]: validated `{title, kind}` plan of exact length
//! 2. [`content`]: sanitized HTML body per slide
//! 3. [`keywords`]: 1–3 topical keywords for image search
//! 4. [`image`]: tiered image URL resolution
//! 5. [`assemble`]: pure fold of fragments into one HTML document
//! 6. [`render`]: the rendering collaborator; the only stage without a fallback
//!
//! [`markup`] holds the pure text transforms the stages share.

pub mod assemble;
pub mod content;
pub mod image;
pub mod keywords;
pub mod markup;
pub mod outline;
pub mod render;
