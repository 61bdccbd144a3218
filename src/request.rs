//! Request building blocks: body encoding and URL composition.

mod body;
mod url;

pub use body::Body;
pub use url::{append_query, join_url};
