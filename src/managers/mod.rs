pub mod dispatcher;
pub mod endpoints;
