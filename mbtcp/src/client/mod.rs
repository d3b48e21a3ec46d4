mod session;

pub use session::ClientSession;
