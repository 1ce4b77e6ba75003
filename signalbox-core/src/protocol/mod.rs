mod codec;
mod command;
mod error;

pub use codec::{FIELD_SEPARATOR, decode, decode_str, encode};
pub use command::{ANNOUNCE, CLOSE, Command, LEAVE, TO};
pub use error::ProtocolError;
