pub mod gate;
pub mod mapper;
pub mod outcome;
pub mod parser;
pub mod pipeline;
