pub mod connctx;
pub mod registry;
pub mod dispatcher;
pub mod lifecycle;
