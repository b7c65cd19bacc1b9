pub mod crawler;
pub mod lines;
pub mod table;
pub mod xyz;
