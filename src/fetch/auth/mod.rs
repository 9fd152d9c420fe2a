mod session;

pub use session::{Authenticated, Session};
