mod common;
mod pipeline;
mod responses;
mod routing;
mod sourcing;
