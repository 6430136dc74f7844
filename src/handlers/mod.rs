pub mod lutim_handlers;
pub mod object_handlers;
pub mod replies;
