//! # mailsort-mime
//!
//! Extracts the classifiable text of an email: the decoded subject and a
//! plain-text body.
//!
//! ## Features
//!
//! - **Message parsing**: Headers, folded lines and nested multipart bodies
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded words
//! - **Body selection**: `text/plain` first, `text/html` converted to text otherwise
//! - **Attachments**: File names from `Content-Disposition` or `Content-Type`
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsort_mime::Message;
//!
//! let raw_message = "From: sender@example.com\r\n\
//!                    Subject: =?utf-8?B?6ri06riJIOqzteyngA==?=\r\n\
//!                    Content-Type: text/plain; charset=utf-8\r\n\
//!                    \r\n\
//!                    Please reply ASAP!";
//!
//! let message = Message::parse(raw_message)?;
//! println!("Subject: {}", message.subject());
//! println!("Body: {}", message.body_text()?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::{ContentType, Disposition};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
