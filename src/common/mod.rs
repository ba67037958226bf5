pub mod data;
pub mod http;
pub(crate) mod util;
