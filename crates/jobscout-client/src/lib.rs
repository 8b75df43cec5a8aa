pub mod boards;
pub mod transport;

pub use boards::{Adzuna, Indeed, Seek};
pub use transport::{ReqwestTransport, TransportConfig};
