pub mod dispatcher;
pub mod request;
pub mod response;

pub use dispatcher::{Dispatcher, Outcome, Reply};
pub use request::{InvocationContext, RequestBody, RequestInput};
pub use response::RestResponse;
